//! Direct CLI execution endpoint.

use axum::Json;
use axum::extract::State;

use cn_protocol::cli::{CliRequest, CliResponse};

use crate::state::AppState;

/// POST /cli/execute — run a command on a local CLI service.
///
/// Always 200; a failed command reports a non-zero `exit_code`.
pub async fn execute_cli(
    State(state): State<AppState>,
    Json(request): Json<CliRequest>,
) -> Json<CliResponse> {
    Json(state.execute_cli(request).await)
}
