//! Client configuration, loadable from the `[clio]` table of the agent TOML.

use std::time::Duration;

use serde::Deserialize;

/// Connection, quota and retry settings for `ApiClient`.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// API base URL, without trailing slash.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Value sent in the `X-API-VERSION` header.
    #[serde(default = "default_api_version")]
    pub api_version: String,
    /// Per-attempt request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_requests_per_minute")]
    pub requests_per_minute: usize,
    #[serde(default = "default_requests_per_hour")]
    pub requests_per_hour: usize,
    /// Retries after the first attempt for transient failures.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Backoff unit: attempt `n` waits `backoff_base_ms * 2^n`.
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
}

fn default_base_url() -> String {
    "https://app.clio.com/api/v4".into()
}
fn default_api_version() -> String {
    "4.0.9".into()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_requests_per_minute() -> usize {
    300
}
fn default_requests_per_hour() -> usize {
    10_000
}
fn default_max_retries() -> u32 {
    3
}
fn default_backoff_base_ms() -> u64 {
    1000
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_version: default_api_version(),
            timeout_secs: default_timeout_secs(),
            requests_per_minute: default_requests_per_minute(),
            requests_per_hour: default_requests_per_hour(),
            max_retries: default_max_retries(),
            backoff_base_ms: default_backoff_base_ms(),
        }
    }
}

impl ClientConfig {
    /// Defaults pointed at another base URL.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }
}
