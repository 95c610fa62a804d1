//! Query and CLI operations behind the REST routes.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use cn_protocol::cli::{CliRequest, CliResponse};
use cn_protocol::queries::{QueryMetadata, QueryRequest, QueryResponse, QueryStatus};

use crate::error::{ServiceError, ServiceResult};
use crate::state::AppState;

/// Filters for `list_queries`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryFilter {
    pub status: Option<QueryStatus>,
    /// Inclusive lower bound on `created_at`.
    pub created_after: Option<DateTime<Utc>>,
}

impl QueryFilter {
    fn matches(&self, query: &QueryResponse) -> bool {
        self.status.is_none_or(|s| query.status == s)
            && self.created_after.is_none_or(|t| query.created_at >= t)
    }
}

impl AppState {
    /// Interpret a query, optionally executing its calls, and store the result.
    ///
    /// The record is stored as `processing` before interpretation starts.
    /// With `execute`, the calls run under the request's `timeout`; hitting
    /// it marks the query `failed` while keeping any results already recorded.
    pub async fn process_query(&self, request: QueryRequest) -> ServiceResult<QueryResponse> {
        request.validate()?;
        let options = request.options.clone().unwrap_or_default();
        let context = request.context.clone().unwrap_or_default();

        let started = Instant::now();
        let mut response = QueryResponse::processing();
        let id = response.id;
        self.queries.write().await.insert(id, response.clone());

        tracing::info!(
            query_id = %id,
            query_len = request.query.chars().count(),
            interpreter = self.interpreter.name(),
            "processing query"
        );

        let interpretation = self
            .interpreter
            .interpret(&request.query, &context, &options)
            .await;

        response.result = Some(interpretation.result);
        response.api_calls = interpretation.api_calls;
        response.cli_calls = interpretation.cli_calls;
        response.status = QueryStatus::Completed;

        if options.execute {
            let deadline = Duration::from_secs(options.timeout);
            let run = self
                .dispatcher
                .execute(&mut response.api_calls, &mut response.cli_calls);
            if tokio::time::timeout(deadline, run).await.is_err() {
                tracing::warn!(query_id = %id, timeout_secs = options.timeout, "query execution timed out");
                response.status = QueryStatus::Failed;
                response.error = Some(format!("query timed out after {}s", options.timeout));
            }
        }

        if options.include_metadata {
            response.metadata = Some(QueryMetadata {
                processing_time_ms: started.elapsed().as_secs_f64() * 1000.0,
                tokens_used: interpretation.tokens_used,
                confidence_score: interpretation.confidence_score,
            });
        }
        response.completed_at = Some(Utc::now());

        self.queries.write().await.insert(id, response.clone());
        tracing::info!(
            query_id = %id,
            status = ?response.status,
            api_calls = response.api_calls.len(),
            cli_calls = response.cli_calls.len(),
            "query processed"
        );
        Ok(response)
    }

    pub async fn get_query(&self, id: Uuid) -> ServiceResult<QueryResponse> {
        self.queries
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound(format!("query '{id}' not found")))
    }

    /// One page of stored queries, newest first, plus the filtered total.
    pub async fn list_queries(
        &self,
        page: usize,
        limit: usize,
        filter: &QueryFilter,
    ) -> (Vec<QueryResponse>, usize) {
        let store = self.queries.read().await;
        let mut matching: Vec<&QueryResponse> =
            store.values().filter(|q| filter.matches(q)).collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let total = matching.len();
        let offset = page.saturating_sub(1).saturating_mul(limit);
        let queries = matching
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();
        (queries, total)
    }

    /// Run a CLI command directly. Failures come back as exit code 1 with
    /// the error text on stderr.
    pub async fn execute_cli(&self, request: CliRequest) -> CliResponse {
        let started = Instant::now();
        tracing::info!(
            service = %request.service,
            command = %request.command,
            "executing CLI request"
        );

        let result = self
            .cli
            .execute_command(
                request.service,
                &request.command,
                &request.args,
                request.input_data.as_ref(),
            )
            .await;

        match result {
            Ok(output) => output.into(),
            Err(e) => {
                tracing::error!(service = %request.service, error = %e, "CLI request failed");
                CliResponse {
                    stdout: String::new(),
                    stderr: e.to_string(),
                    exit_code: 1,
                    duration_ms: started.elapsed().as_secs_f64() * 1000.0,
                    parsed_output: None,
                }
            }
        }
    }
}
