//! Clio client error types.

use std::time::Duration;

use thiserror::Error;

/// Longest slice of an error body kept in a `ClientError`.
pub const BODY_EXCERPT_CHARS: usize = 512;

/// Terminal failures surfaced by the client.
///
/// Self-imposed rate-limit waits and server throttles are never errors;
/// retries are invisible until they run out.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("configuration error: {0}")]
    Configuration(String),

    /// 4xx other than a throttled 429. Never retried.
    #[error("client error {status}: {body}")]
    Client { status: u16, body: String },

    /// 5xx (or an unusable 429) still failing after every retry.
    #[error("server error {status} after {attempts} attempts: {body}")]
    Server {
        status: u16,
        attempts: u32,
        body: String,
    },

    #[error("transport error after {attempts} attempts: {source}")]
    Transport {
        attempts: u32,
        #[source]
        source: reqwest::Error,
    },

    #[error("invalid response body: {0}")]
    Decode(String),

    /// The caller's overall deadline elapsed; in-flight I/O was dropped.
    #[error("deadline of {0:?} exceeded")]
    DeadlineExceeded(Duration),
}

impl ClientError {
    /// HTTP status attached to the error, if one was observed.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Client { status, .. } | ClientError::Server { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ClientError::DeadlineExceeded(_))
    }
}

/// Convenience alias for client results.
pub type ClientResult<T> = Result<T, ClientError>;

/// Trim a response body to `BODY_EXCERPT_CHARS` characters.
pub(crate) fn excerpt(body: &str) -> String {
    match body.char_indices().nth(BODY_EXCERPT_CHARS) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn excerpt_keeps_short_bodies() {
        assert_eq!(excerpt(r#"{"error":"nope"}"#), r#"{"error":"nope"}"#);
    }

    #[test]
    fn excerpt_truncates_on_char_boundary() {
        let body = "é".repeat(BODY_EXCERPT_CHARS + 10);
        let cut = excerpt(&body);
        assert!(cut.ends_with("..."));
        assert_eq!(cut.chars().count(), BODY_EXCERPT_CHARS + 3);
    }

    #[test]
    fn status_exposed_for_http_errors() {
        let err = ClientError::Client {
            status: 404,
            body: "missing".into(),
        };
        assert_eq!(err.status(), Some(404));
        assert!(ClientError::Configuration("x".into()).status().is_none());
    }
}
