//! Ordered pattern tables for API and CLI intents.
//!
//! Tables are compiled once and never mutated. Within a table the first rule
//! with any matching regex wins; rule order is significant.

use std::sync::LazyLock;

use cn_protocol::calls::{ApiCall, CliCall, CliService, HttpMethod};
use regex::Regex;
use serde_json::{Map, Value};

type Payload = Map<String, Value>;

/// Maps matching queries to one API call.
pub struct ApiRule {
    pub name: &'static str,
    pub patterns: Vec<Regex>,
    pub endpoint: &'static str,
    pub method: HttpMethod,
    /// Pulls request parameters out of the normalised query.
    pub extract: fn(&str) -> Option<Payload>,
}

impl ApiRule {
    pub fn matches(&self, query: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(query))
    }

    pub fn to_call(&self, query: &str) -> ApiCall {
        ApiCall::new(self.endpoint, self.method).with_payload((self.extract)(query))
    }
}

/// Maps matching queries to one CLI call. Capture groups become arguments.
pub struct CliRule {
    pub name: &'static str,
    pub patterns: Vec<Regex>,
    pub service: CliService,
    pub command: &'static str,
}

impl CliRule {
    /// Trimmed capture groups of the first matching pattern, or `None`.
    pub fn captures(&self, query: &str) -> Option<Vec<String>> {
        self.patterns.iter().find_map(|re| {
            re.captures(query).map(|caps| {
                caps.iter()
                    .skip(1)
                    .flatten()
                    .map(|m| m.as_str().trim().to_string())
                    .collect()
            })
        })
    }

    pub fn to_call(&self, query: &str) -> Option<CliCall> {
        self.captures(query)
            .map(|args| CliCall::new(self.service, self.command, args))
    }
}

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns.iter().map(|p| Regex::new(p).unwrap()).collect()
}

static RE_LIMIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:show|limit|top) (\d+)").unwrap());

static RE_STATUS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"status (\w+)").unwrap());

/// Field name after "named" / "called".
pub static RE_FIELD_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:named |called )([a-zA-Z0-9_-]+)").unwrap());

fn no_payload(_: &str) -> Option<Payload> {
    None
}

/// `limit` and `status` filters for the query listing.
pub fn query_list_payload(query: &str) -> Option<Payload> {
    let mut payload = Payload::new();
    if let Some(limit) = RE_LIMIT
        .captures(query)
        .and_then(|c| c[1].parse::<u64>().ok())
    {
        payload.insert("limit".into(), Value::from(limit));
    }
    if let Some(caps) = RE_STATUS.captures(query) {
        payload.insert("status".into(), Value::from(&caps[1]));
    }
    (!payload.is_empty()).then_some(payload)
}

pub static API_RULES: LazyLock<Vec<ApiRule>> = LazyLock::new(|| {
    vec![
        ApiRule {
            name: "health",
            patterns: compile(&["health", "status", "alive", "running"]),
            endpoint: "/health",
            method: HttpMethod::Get,
            extract: no_payload,
        },
        ApiRule {
            name: "list_queries",
            patterns: compile(&[
                "list queries",
                "show queries",
                "get queries",
                "query history",
            ]),
            endpoint: "/queries",
            method: HttpMethod::Get,
            extract: query_list_payload,
        },
    ]
});

pub static CLI_RULES: LazyLock<Vec<CliRule>> = LazyLock::new(|| {
    vec![
        CliRule {
            name: "clio_list",
            patterns: compile(&["clio list", "list clio", "show clio items"]),
            service: CliService::ClioService,
            command: "list",
        },
        CliRule {
            name: "clio_search",
            patterns: compile(&["clio search (.+)", "search clio for (.+)"]),
            service: CliService::ClioService,
            command: "search",
        },
        CliRule {
            name: "custom_fields_list",
            patterns: compile(&[
                "list custom fields",
                "show custom fields",
                "custom fields list",
            ]),
            service: CliService::CustomFieldsManager,
            command: "list",
        },
        CliRule {
            name: "custom_fields_create",
            patterns: compile(&[
                r"create custom field (?:named |called )?([a-zA-Z0-9_-]+)",
                r"add custom field (?:named |called )?([a-zA-Z0-9_-]+)",
            ]),
            service: CliService::CustomFieldsManager,
            command: "create",
        },
    ]
});

/// First API rule matching `query`.
pub fn match_api(query: &str) -> Option<ApiCall> {
    API_RULES
        .iter()
        .find(|rule| rule.matches(query))
        .map(|rule| rule.to_call(query))
}

/// First CLI rule matching `query`.
pub fn match_cli(query: &str) -> Option<CliCall> {
    CLI_RULES.iter().find_map(|rule| rule.to_call(query))
}

/// Number of rules across both tables.
pub fn rule_count() -> usize {
    API_RULES.len() + CLI_RULES.len()
}

/// Number of individual patterns, across both tables, that match `query`.
pub fn pattern_hits(query: &str) -> usize {
    let api = API_RULES
        .iter()
        .flat_map(|r| &r.patterns)
        .filter(|re| re.is_match(query))
        .count();
    let cli = CLI_RULES
        .iter()
        .flat_map(|r| &r.patterns)
        .filter(|re| re.is_match(query))
        .count();
    api + cli
}
