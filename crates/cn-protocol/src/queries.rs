use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calls::{ApiCall, CliCall};
use crate::error::ProtocolError;

/// Longest query text accepted.
pub const MAX_QUERY_CHARS: usize = 1000;
/// Bounds for `QueryOptions::timeout`, in seconds.
pub const MIN_TIMEOUT_SECS: u64 = 1;
pub const MAX_TIMEOUT_SECS: u64 = 300;

/// Processing lifecycle of a stored query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

/// Per-request processing options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryOptions {
    /// Overall deadline for the request, in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    /// Attach `QueryMetadata` to the response.
    #[serde(default)]
    pub include_metadata: bool,
    /// Realise the interpreted calls instead of only describing them.
    #[serde(default)]
    pub execute: bool,
}

fn default_timeout() -> u64 {
    30
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            include_metadata: false,
            execute: false,
        }
    }
}

/// Request to interpret a natural-language query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<QueryOptions>,
}

impl QueryRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            context: None,
            options: None,
        }
    }

    /// Reject empty, oversized, or out-of-range requests.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        if self.query.trim().is_empty() {
            return Err(ProtocolError::EmptyQuery);
        }
        let len = self.query.chars().count();
        if len > MAX_QUERY_CHARS {
            return Err(ProtocolError::QueryTooLong {
                len,
                max: MAX_QUERY_CHARS,
            });
        }
        if let Some(options) = &self.options
            && !(MIN_TIMEOUT_SECS..=MAX_TIMEOUT_SECS).contains(&options.timeout)
        {
            return Err(ProtocolError::InvalidTimeout {
                got: options.timeout,
                min: MIN_TIMEOUT_SECS,
                max: MAX_TIMEOUT_SECS,
            });
        }
        Ok(())
    }
}

/// Human-facing part of an interpretation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterpretationSummary {
    /// Echo of the input, unnormalised.
    pub query: String,
    pub interpretation: String,
    pub suggested_actions: Vec<String>,
}

/// Full interpreter output for one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interpretation {
    pub result: InterpretationSummary,
    pub api_calls: Vec<ApiCall>,
    pub cli_calls: Vec<CliCall>,
    /// Heuristic match quality in [0, 1].
    pub confidence_score: f64,
    /// Whitespace-delimited token count of the input.
    pub tokens_used: usize,
}

impl Interpretation {
    pub fn is_empty(&self) -> bool {
        self.api_calls.is_empty() && self.cli_calls.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryMetadata {
    pub processing_time_ms: f64,
    pub tokens_used: usize,
    pub confidence_score: f64,
}

/// Stored record of a processed query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    pub id: Uuid,
    pub status: QueryStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<InterpretationSummary>,
    /// Error message if status is Failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub api_calls: Vec<ApiCall>,
    #[serde(default)]
    pub cli_calls: Vec<CliCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<QueryMetadata>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl QueryResponse {
    /// A freshly accepted query, not yet interpreted.
    pub fn processing() -> Self {
        Self {
            id: Uuid::now_v7(),
            status: QueryStatus::Processing,
            result: None,
            error: None,
            api_calls: Vec::new(),
            cli_calls: Vec::new(),
            metadata: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }
}

/// Page bookkeeping for list responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationInfo {
    pub page: usize,
    pub limit: usize,
    pub total: usize,
    pub pages: usize,
    pub has_next: bool,
    pub has_prev: bool,
}

impl PaginationInfo {
    /// `page` is 1-based; `limit` must be non-zero.
    pub fn new(page: usize, limit: usize, total: usize) -> Self {
        let pages = total.div_ceil(limit.max(1));
        Self {
            page,
            limit,
            total,
            pages,
            has_next: page < pages,
            has_prev: page > 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryListResponse {
    pub queries: Vec<QueryResponse>,
    pub pagination: PaginationInfo,
}

/// Liveness report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}
