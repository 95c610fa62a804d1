//! Natural-language query interpretation.
//!
//! Converts free text ("check health status", "create custom field named
//! priority") into API and CLI call descriptors with a heuristic confidence.
//!
//! - **Pattern tables** (`patterns`): ordered regex rules, first match wins.
//! - **Keyword fallback** (`processor`): used only when no table rule matched.

pub mod patterns;
pub mod processor;

use async_trait::async_trait;
use cn_protocol::queries::{Interpretation, QueryOptions};
use serde_json::{Map, Value};

/// Anything that can turn a query into call descriptors.
#[async_trait]
pub trait QueryInterpreter: Send + Sync {
    /// Interpret `query`. Never fails; an unmatched query yields no calls.
    async fn interpret(
        &self,
        query: &str,
        context: &Map<String, Value>,
        options: &QueryOptions,
    ) -> Interpretation;

    /// Name of this interpreter (for logging).
    fn name(&self) -> &str;
}

pub use processor::NlpProcessor;
