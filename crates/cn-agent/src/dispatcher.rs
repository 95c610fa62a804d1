//! Realises interpreted call descriptors.
//!
//! API calls go through the rate-limited `ApiClient`, CLI calls through the
//! `CliManager`. Results are written back into the descriptors in place, so
//! a call cut short by a deadline simply stays unexecuted.

use std::sync::Arc;
use std::time::Instant;

use serde_json::{Value, json};

use cn_cli_tools::CliManager;
use cn_clio_client::{ApiClient, method_for};
use cn_protocol::calls::{ApiCall, CliCall, HttpMethod};

pub struct Dispatcher {
    api: Arc<ApiClient>,
    cli: Arc<CliManager>,
}

impl Dispatcher {
    pub fn new(api: Arc<ApiClient>, cli: Arc<CliManager>) -> Self {
        Self { api, cli }
    }

    /// Execute every call in order: API calls first, then CLI calls.
    pub async fn execute(&self, api_calls: &mut [ApiCall], cli_calls: &mut [CliCall]) {
        for call in api_calls.iter_mut() {
            self.execute_api(call).await;
        }
        for call in cli_calls.iter_mut() {
            self.execute_cli(call).await;
        }
    }

    /// GET payloads become query parameters; other methods send them as the JSON body.
    pub async fn execute_api(&self, call: &mut ApiCall) {
        let started = Instant::now();
        let (params, body) = match (&call.payload, call.method) {
            (Some(payload), HttpMethod::Get) => (query_params(payload), None),
            (Some(payload), _) => (Vec::new(), Some(Value::Object(payload.clone()))),
            (None, _) => (Vec::new(), None),
        };

        let result = self
            .api
            .request(method_for(call.method), &call.endpoint, &params, body.as_ref())
            .await;
        call.duration_ms = Some(started.elapsed().as_secs_f64() * 1000.0);

        match result {
            Ok(response) => {
                tracing::info!(
                    endpoint = %call.endpoint,
                    status = response.status,
                    "API call executed"
                );
                call.status_code = Some(response.status);
                call.response = Some(response.body);
            }
            Err(e) => {
                tracing::warn!(endpoint = %call.endpoint, error = %e, "API call failed");
                call.status_code = e.status();
                call.response = Some(json!({ "error": e.to_string() }));
            }
        }
    }

    /// Failures to start or finish the process are recorded as exit code 1.
    pub async fn execute_cli(&self, call: &mut CliCall) {
        let started = Instant::now();
        match self.cli.run(call.service, &call.args, None).await {
            Ok(output) => {
                call.stdout = Some(output.stdout);
                call.stderr = Some(output.stderr);
                call.exit_code = output.exit_code;
            }
            Err(e) => {
                tracing::warn!(service = %call.service, error = %e, "CLI call failed");
                call.stdout = Some(String::new());
                call.stderr = Some(e.to_string());
                call.exit_code = 1;
            }
        }
        call.duration_ms = Some(started.elapsed().as_secs_f64() * 1000.0);
    }
}

/// Flatten a payload into query pairs; strings are sent unquoted.
fn query_params(payload: &serde_json::Map<String, Value>) -> Vec<(String, String)> {
    payload
        .iter()
        .map(|(k, v)| {
            let value = match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (k.clone(), value)
        })
        .collect()
}
