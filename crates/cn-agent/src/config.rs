//! Agent configuration, loadable from TOML with environment overrides.

use serde::Deserialize;

use cn_cli_tools::CliConfig;
use cn_clio_client::ClientConfig;

/// Environment variable holding the Clio bearer token.
pub const TOKEN_ENV: &str = "CLIO_ACCESS_TOKEN";

/// Top-level configuration for the agent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AgentConfig {
    #[serde(default)]
    pub server: ServerConfig,
    /// Clio API client settings. The token is never read from here.
    #[serde(default)]
    pub clio: ClientConfig,
    #[serde(default)]
    pub cli: CliConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Listen address (e.g., "0.0.0.0").
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl AgentConfig {
    /// Load config from a TOML file path.
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Apply `CN_AGENT_HOST` / `CN_AGENT_PORT`.
    pub fn with_env_overrides(self) -> anyhow::Result<Self> {
        self.with_overrides(
            std::env::var("CN_AGENT_HOST").ok(),
            std::env::var("CN_AGENT_PORT").ok(),
        )
    }

    pub fn with_overrides(
        mut self,
        host: Option<String>,
        port: Option<String>,
    ) -> anyhow::Result<Self> {
        if let Some(host) = host.filter(|h| !h.trim().is_empty()) {
            self.server.host = host;
        }
        if let Some(port) = port {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|e| anyhow::anyhow!("invalid CN_AGENT_PORT {port:?}: {e}"))?;
        }
        Ok(self)
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Bearer token from `CLIO_ACCESS_TOKEN`, if set and non-blank.
pub fn access_token_from_env() -> Option<String> {
    std::env::var(TOKEN_ENV)
        .ok()
        .filter(|t| !t.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = AgentConfig::default();
        assert_eq!(config.listen_addr(), "0.0.0.0:8000");
        assert_eq!(config.clio.max_retries, 3);
        assert_eq!(config.cli.timeout_secs, 300);
    }

    #[test]
    fn empty_toml_uses_defaults() {
        let config: AgentConfig = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.clio.base_url, "https://app.clio.com/api/v4");
    }

    #[test]
    fn deserialize_full_config() {
        let toml = r#"
[server]
host = "127.0.0.1"
port = 9100

[clio]
base_url = "https://eu.app.clio.com/api/v4"
requests_per_minute = 120
max_retries = 1

[cli]
root_dir = "/opt/clio-tools"
timeout_secs = 45
"#;
        let config: AgentConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.listen_addr(), "127.0.0.1:9100");
        assert_eq!(config.clio.base_url, "https://eu.app.clio.com/api/v4");
        assert_eq!(config.clio.requests_per_minute, 120);
        assert_eq!(config.clio.requests_per_hour, 10_000); // default
        assert_eq!(config.clio.max_retries, 1);
        assert_eq!(config.cli.timeout_secs, 45);
    }

    #[test]
    fn overrides_replace_listen_address() {
        let config = AgentConfig::default()
            .with_overrides(Some("localhost".into()), Some("8080".into()))
            .unwrap();
        assert_eq!(config.listen_addr(), "localhost:8080");
    }

    #[test]
    fn invalid_port_override_rejected() {
        let result = AgentConfig::default().with_overrides(None, Some("eighty".into()));
        assert!(result.is_err());
    }

    #[test]
    fn from_file_reads_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agent.toml");
        std::fs::write(&path, "[server]\nport = 7000\n").unwrap();
        let config = AgentConfig::from_file(path.to_str().unwrap()).unwrap();
        assert_eq!(config.server.port, 7000);
    }
}
