//! Validation errors for inbound protocol messages.

use thiserror::Error;

/// Errors raised while validating requests before they reach the core.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("query must not be empty")]
    EmptyQuery,

    #[error("query is {len} characters, maximum is {max}")]
    QueryTooLong { len: usize, max: usize },

    #[error("timeout must be between {min} and {max} seconds, got {got}")]
    InvalidTimeout { got: u64, min: u64, max: u64 },
}
