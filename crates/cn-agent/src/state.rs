//! Shared application state for the Axum server.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use cn_cli_tools::CliManager;
use cn_clio_client::ApiClient;
use cn_nlp::{NlpProcessor, QueryInterpreter};
use cn_protocol::queries::QueryResponse;

use crate::config::AgentConfig;
use crate::dispatcher::Dispatcher;
use crate::error::{ServiceError, ServiceResult};

/// Shared application state, cheap to clone into handlers.
#[derive(Clone)]
pub struct AppState {
    /// In-memory query store; the only mutable state the agent shares.
    pub queries: Arc<RwLock<HashMap<Uuid, QueryResponse>>>,
    pub interpreter: Arc<dyn QueryInterpreter>,
    pub cli: Arc<CliManager>,
    pub dispatcher: Arc<Dispatcher>,
}

impl AppState {
    /// State around an API client and CLI manager, with the regex interpreter.
    pub fn new(api: ApiClient, cli: CliManager) -> Self {
        let cli = Arc::new(cli);
        let dispatcher = Dispatcher::new(Arc::new(api), cli.clone());
        Self {
            queries: Arc::new(RwLock::new(HashMap::new())),
            interpreter: Arc::new(NlpProcessor::new()),
            cli,
            dispatcher: Arc::new(dispatcher),
        }
    }

    /// Build everything from config. A missing token leaves API execution
    /// failing per call rather than refusing to start.
    pub fn from_config(config: &AgentConfig, token: Option<String>) -> ServiceResult<Self> {
        let mut api = ApiClient::new(config.clio.clone())
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        match token {
            Some(token) => api.set_auth_token(token),
            None => tracing::warn!("no Clio access token; API calls will fail until one is set"),
        }
        let cli = CliManager::new(&config.cli);
        for service in cli.list_available_services() {
            tracing::info!(service = %service, "CLI service available");
        }
        Ok(Self::new(api, cli))
    }

    pub fn with_interpreter(mut self, interpreter: Arc<dyn QueryInterpreter>) -> Self {
        self.interpreter = interpreter;
        self
    }

    pub async fn query_count(&self) -> usize {
        self.queries.read().await.len()
    }
}
