use std::path::PathBuf;

use cn_protocol::calls::CliService;

/// Errors from locating or running a CLI service.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("service '{service}' not found at {}", path.display())]
    ServiceNotFound { service: CliService, path: PathBuf },

    #[error("failed to start {service}: {source}")]
    Spawn {
        service: CliService,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{service} timed out after {secs}s")]
    Timeout { service: CliService, secs: u64 },
}

pub type CliResult<T> = Result<T, CliError>;
