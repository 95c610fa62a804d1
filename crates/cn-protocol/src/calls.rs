//! Call descriptors — pre-execution descriptions of API and CLI invocations.
//!
//! The interpreter emits these with only the intent fields populated. The
//! execution fields (`response`, `status_code`, `stdout`, ...) stay empty
//! until a dispatcher realises the call.

use serde::{Deserialize, Serialize};

/// HTTP methods an API call descriptor may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The local command-line services the agent knows how to drive.
///
/// Closed set: adding a service means adding a variant and its executable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CliService {
    #[serde(rename = "clio_service")]
    ClioService,
    #[serde(rename = "custom-fields-manager")]
    CustomFieldsManager,
}

impl CliService {
    /// Every known service, in a stable order.
    pub const ALL: [CliService; 2] = [CliService::ClioService, CliService::CustomFieldsManager];

    /// File name of the executable implementing this service.
    pub fn executable_name(&self) -> &'static str {
        match self {
            CliService::ClioService => "clio_service",
            CliService::CustomFieldsManager => "custom-fields-manager",
        }
    }
}

impl std::fmt::Display for CliService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.executable_name())
    }
}

/// API call descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiCall {
    /// Endpoint path, relative to the API base URL (e.g. "/health").
    pub endpoint: String,
    pub method: HttpMethod,
    /// JSON payload (query filters for GET, body otherwise).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Map<String, serde_json::Value>>,
    /// Response body, recorded after execution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<serde_json::Value>,
    /// HTTP status, recorded after execution when one was observed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    /// Wall-clock execution time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<f64>,
}

impl ApiCall {
    pub fn new(endpoint: impl Into<String>, method: HttpMethod) -> Self {
        Self {
            endpoint: endpoint.into(),
            method,
            payload: None,
            response: None,
            status_code: None,
            duration_ms: None,
        }
    }

    pub fn with_payload(mut self, payload: Option<serde_json::Map<String, serde_json::Value>>) -> Self {
        self.payload = payload;
        self
    }

    /// Whether a dispatcher has already realised this call.
    pub fn is_executed(&self) -> bool {
        self.duration_ms.is_some()
    }
}

/// CLI call descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CliCall {
    pub service: CliService,
    /// Subcommand name (always `args[0]`).
    pub command: String,
    /// Full ordered argument vector passed to the executable: the command
    /// name followed by any values captured from the query.
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stdout: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
    /// 0 until executed.
    #[serde(default)]
    pub exit_code: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<f64>,
}

impl CliCall {
    pub fn new(service: CliService, command: impl Into<String>, extra_args: Vec<String>) -> Self {
        let command = command.into();
        let mut args = Vec::with_capacity(extra_args.len() + 1);
        args.push(command.clone());
        args.extend(extra_args);
        Self {
            service,
            command,
            args,
            stdout: None,
            stderr: None,
            exit_code: 0,
            duration_ms: None,
        }
    }

    pub fn is_executed(&self) -> bool {
        self.duration_ms.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_method_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&HttpMethod::Get).unwrap(), r#""GET""#);
        assert_eq!(serde_json::to_string(&HttpMethod::Patch).unwrap(), r#""PATCH""#);
    }

    #[test]
    fn cli_service_wire_names() {
        assert_eq!(
            serde_json::to_string(&CliService::ClioService).unwrap(),
            r#""clio_service""#
        );
        let parsed: CliService = serde_json::from_str(r#""custom-fields-manager""#).unwrap();
        assert_eq!(parsed, CliService::CustomFieldsManager);
    }

    #[test]
    fn unknown_cli_service_rejected() {
        assert!(serde_json::from_str::<CliService>(r#""rm""#).is_err());
    }

    #[test]
    fn cli_call_prepends_command() {
        let call = CliCall::new(
            CliService::CustomFieldsManager,
            "create",
            vec!["test_field".into()],
        );
        assert_eq!(call.args, vec!["create", "test_field"]);
        assert_eq!(call.exit_code, 0);
        assert!(!call.is_executed());
    }

    #[test]
    fn unexecuted_api_call_omits_execution_fields() {
        let call = ApiCall::new("/health", HttpMethod::Get);
        let json = serde_json::to_value(&call).unwrap();
        assert_eq!(json["endpoint"], "/health");
        assert_eq!(json["method"], "GET");
        assert!(json.get("response").is_none());
        assert!(json.get("status_code").is_none());
    }
}
