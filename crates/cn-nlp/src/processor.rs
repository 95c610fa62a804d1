//! Query processor: pattern tables, keyword fallback, confidence and
//! human-readable summaries.

use async_trait::async_trait;
use serde_json::{Map, Value};

use cn_protocol::calls::{ApiCall, CliCall, CliService, HttpMethod};
use cn_protocol::queries::{Interpretation, InterpretationSummary, QueryOptions};

use crate::QueryInterpreter;
use crate::patterns::{self, RE_FIELD_NAME};

const NO_MATCH_CONFIDENCE: f64 = 0.1;
const BASE_CONFIDENCE: f64 = 0.5;
const PATTERN_WEIGHT: f64 = 0.3;
const MULTI_CALL_BONUS: f64 = 0.1;

const NO_ACTION: &str = "No specific action identified";

const EXAMPLE_PHRASINGS: [&str; 3] = [
    "Try asking to 'list queries' or 'show health status'",
    "Use 'clio list' to see Clio items",
    "Ask to 'list custom fields' to see available fields",
];

const REFINEMENT_TIPS: [&str; 3] = [
    "You can add filters like 'status completed' for query lists",
    "Use specific field names when creating custom fields",
    "Check the health endpoint to verify system status",
];

/// Stateless regex interpreter.
pub struct NlpProcessor;

impl NlpProcessor {
    pub fn new() -> Self {
        Self
    }

    /// Map `query` to at most one API call and at most one CLI call.
    ///
    /// Same input, same output. Unmatched or non-ASCII input yields an empty
    /// interpretation with confidence 0.1, never an error.
    pub fn process_query(
        &self,
        query: &str,
        context: &Map<String, Value>,
        options: &QueryOptions,
    ) -> Interpretation {
        tracing::info!(
            query,
            context_keys = context.len(),
            execute = options.execute,
            "processing query"
        );

        let normalized = query.to_lowercase();
        let normalized = normalized.trim();

        let mut api_calls: Vec<ApiCall> = patterns::match_api(normalized).into_iter().collect();
        let mut cli_calls: Vec<CliCall> = patterns::match_cli(normalized).into_iter().collect();

        if api_calls.is_empty() && cli_calls.is_empty() {
            let (api, cli) = infer_intent(normalized);
            api_calls.extend(api);
            cli_calls.extend(cli);
        }

        let confidence_score = confidence(normalized, &api_calls, &cli_calls);

        let interpretation = Interpretation {
            result: InterpretationSummary {
                query: query.to_string(),
                interpretation: describe(&api_calls, &cli_calls),
                suggested_actions: suggestions(&api_calls, &cli_calls),
            },
            api_calls,
            cli_calls,
            confidence_score,
            tokens_used: query.split_whitespace().count(),
        };

        tracing::info!(
            api_calls = interpretation.api_calls.len(),
            cli_calls = interpretation.cli_calls.len(),
            confidence = interpretation.confidence_score,
            "query interpreted"
        );

        interpretation
    }
}

impl Default for NlpProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QueryInterpreter for NlpProcessor {
    async fn interpret(
        &self,
        query: &str,
        context: &Map<String, Value>,
        options: &QueryOptions,
    ) -> Interpretation {
        self.process_query(query, context, options)
    }

    fn name(&self) -> &str {
        "regex"
    }
}

/// Keyword fallback, consulted only when neither table matched.
fn infer_intent(query: &str) -> (Option<ApiCall>, Option<CliCall>) {
    if contains_any(query, &["show", "list", "display", "get"]) {
        if query.contains("query") || query.contains("queries") {
            return (Some(ApiCall::new("/queries", HttpMethod::Get)), None);
        }
        if query.contains("clio") {
            return (None, Some(CliCall::new(CliService::ClioService, "list", Vec::new())));
        }
        if query.contains("custom field") {
            return (
                None,
                Some(CliCall::new(CliService::CustomFieldsManager, "list", Vec::new())),
            );
        }
    } else if contains_any(query, &["create", "add", "new"]) && query.contains("custom field") {
        let name: Vec<String> = RE_FIELD_NAME
            .captures(query)
            .map(|caps| caps[1].trim().to_string())
            .into_iter()
            .collect();
        return (
            None,
            Some(CliCall::new(CliService::CustomFieldsManager, "create", name)),
        );
    }
    (None, None)
}

fn contains_any(text: &str, words: &[&str]) -> bool {
    words.iter().any(|w| text.contains(w))
}

/// 0.1 with no calls. Otherwise 0.5, plus 0.3 / rule count for every
/// individual pattern that matches, plus 0.1 for more than one call, capped at 1.
fn confidence(query: &str, api_calls: &[ApiCall], cli_calls: &[CliCall]) -> f64 {
    let calls = api_calls.len() + cli_calls.len();
    if calls == 0 {
        return NO_MATCH_CONFIDENCE;
    }

    let per_hit = PATTERN_WEIGHT / patterns::rule_count() as f64;
    let mut score = BASE_CONFIDENCE + per_hit * patterns::pattern_hits(query) as f64;
    if calls > 1 {
        score += MULTI_CALL_BONUS;
    }
    score.min(1.0)
}

fn describe(api_calls: &[ApiCall], cli_calls: &[CliCall]) -> String {
    let api = api_calls.iter().filter_map(|call| match call.endpoint.as_str() {
        "/health" => Some("Check system health status"),
        "/queries" => Some("List processed queries"),
        _ => None,
    });
    let cli = cli_calls
        .iter()
        .filter_map(|call| match (call.service, call.command.as_str()) {
            (CliService::ClioService, "list") => Some("List items from Clio service"),
            (CliService::ClioService, "search") => Some("Search Clio service"),
            (CliService::CustomFieldsManager, "list") => Some("List custom fields"),
            (CliService::CustomFieldsManager, "create") => Some("Create a new custom field"),
            _ => None,
        });

    let phrases: Vec<&str> = api.chain(cli).collect();
    if phrases.is_empty() {
        NO_ACTION.to_string()
    } else {
        phrases.join("; ")
    }
}

fn suggestions(api_calls: &[ApiCall], cli_calls: &[CliCall]) -> Vec<String> {
    let tips = if api_calls.is_empty() && cli_calls.is_empty() {
        &EXAMPLE_PHRASINGS
    } else {
        &REFINEMENT_TIPS
    };
    tips.iter().map(|s| s.to_string()).collect()
}
