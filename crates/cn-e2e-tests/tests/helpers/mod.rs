//! Shared test harness for E2E integration tests.
//!
//! Wires the agent router to a wiremock Clio server and a scratch directory
//! of CLI service scripts, exercising real code paths across every crate.

#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;
use wiremock::MockServer;

use cn_agent::routes::build_router;
use cn_agent::state::AppState;
use cn_cli_tools::{CliConfig, CliManager};
use cn_clio_client::{ApiClient, ClientConfig};
use cn_protocol::calls::CliService;

/// End-to-end harness: agent state + router, mock Clio API, CLI script root.
pub struct TestHarness {
    pub state: AppState,
    pub router: Router,
    /// Stands in for `https://app.clio.com/api/v4`.
    pub clio: MockServer,
    /// Directory holding `clio_service` / `custom-fields-manager` scripts.
    pub cli_root: TempDir,
}

impl TestHarness {
    pub async fn new() -> Self {
        let clio = MockServer::start().await;
        let cli_root = TempDir::new().unwrap();

        let state = AppState::new(
            clio_client(&clio),
            CliManager::new(&CliConfig::with_root(cli_root.path())),
        );
        let router = build_router(state.clone());

        Self {
            state,
            router,
            clio,
            cli_root,
        }
    }

    /// Write an executable `/bin/sh` script for `service`.
    #[cfg(unix)]
    pub fn install_script(&self, service: CliService, body: &str) {
        use std::os::unix::fs::PermissionsExt;

        let path = self.cli_root.path().join(service.executable_name());
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Request::get(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn post(&self, uri: &str, body: &Value) -> (StatusCode, Value) {
        self.send(
            Request::post(uri)
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(body).unwrap()))
                .unwrap(),
        )
        .await
    }

    /// POST /query with metadata, describing only.
    pub async fn query(&self, text: &str) -> (StatusCode, Value) {
        self.post(
            "/query",
            &json!({"query": text, "options": {"include_metadata": true}}),
        )
        .await
    }

    /// POST /query with `execute: true`.
    pub async fn execute_query(&self, text: &str) -> (StatusCode, Value) {
        self.post(
            "/query",
            &json!({"query": text, "options": {"execute": true, "timeout": 10}}),
        )
        .await
    }

    /// Non-JSON bodies (e.g. extractor rejections) come back as `Null`.
    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }
}

/// Authenticated client against the mock server, millisecond backoff.
pub fn clio_client(server: &MockServer) -> ApiClient {
    clio_client_with(server, |_| {})
}

pub fn clio_client_with(server: &MockServer, tweak: impl FnOnce(&mut ClientConfig)) -> ApiClient {
    let mut config = ClientConfig {
        backoff_base_ms: 1,
        timeout_secs: 5,
        ..ClientConfig::with_base_url(server.uri())
    };
    tweak(&mut config);
    ApiClient::new(config).unwrap().with_auth_token("e2e-token")
}
