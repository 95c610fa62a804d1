use serde::{Deserialize, Serialize};

use crate::calls::CliService;

/// Direct request to run a command on one of the local CLI services.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliRequest {
    pub service: CliService,
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    /// JSON payload delivered on the command's standard input.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_data: Option<serde_json::Value>,
}

/// Captured result of a CLI invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliResponse {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub duration_ms: f64,
    /// Parsed stdout, when it looked like and was valid JSON.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parsed_output: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_request_args_default_empty() {
        let req: CliRequest =
            serde_json::from_str(r#"{"service": "clio_service", "command": "list"}"#).unwrap();
        assert_eq!(req.service, CliService::ClioService);
        assert!(req.args.is_empty());
        assert!(req.input_data.is_none());
    }

    #[test]
    fn cli_response_skips_missing_parsed_output() {
        let resp = CliResponse {
            stdout: "plain text".into(),
            stderr: String::new(),
            exit_code: 0,
            duration_ms: 3.5,
            parsed_output: None,
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(!json.contains("parsed_output"));
    }
}
