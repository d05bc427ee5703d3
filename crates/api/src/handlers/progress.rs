//! Progress polling, workflow status and the job-slot reset.

use axum::extract::{Path, State};
use axum::Json;

use letterdesk_core::status::{compute_status, WorkflowStatus};
use letterdesk_jobs::ProgressState;

use crate::error::AppResult;
use crate::handlers::parse_variant;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/workflows/{variant}/progress
///
/// Always 200: a default idle snapshot exists before any job has run.
pub async fn progress(
    State(state): State<AppState>,
    Path(variant): Path<String>,
) -> AppResult<Json<DataResponse<ProgressState>>> {
    parse_variant(&variant)?;
    Ok(Json(DataResponse {
        data: state.tracker.snapshot(),
    }))
}

/// GET /api/v1/workflows/{variant}/status
pub async fn status(
    State(state): State<AppState>,
    Path(variant): Path<String>,
) -> AppResult<Json<DataResponse<WorkflowStatus>>> {
    let variant = parse_variant(&variant)?;
    let status = compute_status(&state.config.data_root, variant).await?;
    Ok(Json(DataResponse { data: status }))
}

/// POST /api/v1/workflows/{variant}/reset
///
/// 409 while a stage is Running; the running child keeps the slot.
pub async fn reset(
    State(state): State<AppState>,
    Path(variant): Path<String>,
) -> AppResult<Json<DataResponse<ProgressState>>> {
    parse_variant(&variant)?;
    state.tracker.reset()?;
    tracing::info!("job slot reset");
    Ok(Json(DataResponse {
        data: state.tracker.snapshot(),
    }))
}
