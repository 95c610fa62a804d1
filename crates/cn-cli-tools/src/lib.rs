//! Local CLI service integration.
//!
//! Each `CliService` maps to one executable under a root directory
//! (`$HOME` by default). Commands run directly, never through a shell, with
//! a timeout and an output cap.

pub mod config;
pub mod error;
pub mod manager;

pub use config::CliConfig;
pub use error::{CliError, CliResult};
pub use manager::{CliManager, CliOutput};
