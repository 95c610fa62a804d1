//! Query processing and history endpoints.

use axum::Json;
use axum::extract::{Path, Query, State};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use cn_protocol::queries::{
    PaginationInfo, QueryListResponse, QueryRequest, QueryResponse, QueryStatus,
};

use crate::error::{ServiceError, ServiceResult};
use crate::service::QueryFilter;
use crate::state::AppState;

const MAX_PAGE_LIMIT: usize = 100;

/// Query string for `GET /queries`.
#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default = "default_page")]
    pub page: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
    pub status: Option<QueryStatus>,
    pub created_after: Option<DateTime<Utc>>,
}

fn default_page() -> usize {
    1
}

fn default_limit() -> usize {
    20
}

/// POST /query — interpret (and optionally execute) a natural-language query.
pub async fn process_query(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> ServiceResult<Json<QueryResponse>> {
    let response = state.process_query(request).await?;
    Ok(Json(response))
}

/// GET /queries — stored queries, newest first.
pub async fn list_queries(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ServiceResult<Json<QueryListResponse>> {
    if params.page < 1 {
        return Err(ServiceError::BadRequest("page must be >= 1".into()));
    }
    if !(1..=MAX_PAGE_LIMIT).contains(&params.limit) {
        return Err(ServiceError::BadRequest(format!(
            "limit must be between 1 and {MAX_PAGE_LIMIT}"
        )));
    }

    let filter = QueryFilter {
        status: params.status,
        created_after: params.created_after,
    };
    let (queries, total) = state.list_queries(params.page, params.limit, &filter).await;

    Ok(Json(QueryListResponse {
        queries,
        pagination: PaginationInfo::new(params.page, params.limit, total),
    }))
}

/// GET /queries/{id}
pub async fn get_query(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ServiceResult<Json<QueryResponse>> {
    Ok(Json(state.get_query(id).await?))
}
