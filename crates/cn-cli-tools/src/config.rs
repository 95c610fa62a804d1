//! CLI manager configuration, the `[cli]` table of the agent TOML.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct CliConfig {
    /// Directory holding the service executables. `None` means `$HOME`.
    #[serde(default)]
    pub root_dir: Option<PathBuf>,
    /// Wall-clock limit for one command.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Cap on each of stdout and stderr.
    #[serde(default = "default_max_output_bytes")]
    pub max_output_bytes: usize,
}

fn default_timeout_secs() -> u64 {
    300
}

fn default_max_output_bytes() -> usize {
    1024 * 1024
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            root_dir: None,
            timeout_secs: default_timeout_secs(),
            max_output_bytes: default_max_output_bytes(),
        }
    }
}

impl CliConfig {
    pub fn with_root(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: Some(root_dir.into()),
            ..Self::default()
        }
    }

    /// `root_dir`, else `$HOME`, else the current directory.
    pub fn resolved_root(&self) -> PathBuf {
        self.root_dir
            .clone()
            .or_else(|| std::env::var_os("HOME").map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = CliConfig::default();
        assert!(config.root_dir.is_none());
        assert_eq!(config.timeout(), Duration::from_secs(300));
        assert_eq!(config.max_output_bytes, 1024 * 1024);
    }

    #[test]
    fn explicit_root_wins() {
        let config = CliConfig::with_root("/opt/clio");
        assert_eq!(config.resolved_root(), PathBuf::from("/opt/clio"));
    }

    #[test]
    fn from_toml() {
        let config: CliConfig = toml::from_str(
            r#"
root_dir = "/srv/tools"
timeout_secs = 60
"#,
        )
        .unwrap();
        assert_eq!(config.root_dir, Some(PathBuf::from("/srv/tools")));
        assert_eq!(config.timeout_secs, 60);
        assert_eq!(config.max_output_bytes, 1024 * 1024);
    }
}
