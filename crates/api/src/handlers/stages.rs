//! Generate and merge: the two script-backed workflow stages.
//!
//! Preconditions are checked before the job slot is touched, so a rejected
//! request never leaves a stale Failed state behind. Both stages clean their
//! output directories first: letters from a previous roster must never mix
//! into the new batch.

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use letterdesk_core::artifacts::{self, ArtifactKind};
use letterdesk_core::workflow::WorkflowVariant;
use letterdesk_jobs::{Stage, StageRunner};

use crate::error::{AppError, AppResult};
use crate::handlers::parse_variant;
use crate::response::DataResponse;
use crate::state::AppState;

/// Stage completion payload.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageResponse {
    pub message: String,
    pub output: String,
}

/// POST /api/v1/workflows/{variant}/generate
pub async fn generate(
    State(state): State<AppState>,
    Path(variant): Path<String>,
) -> AppResult<Json<DataResponse<StageResponse>>> {
    let variant = parse_variant(&variant)?;
    let layout = variant.layout();
    let root = &state.config.data_root;

    let script = layout.generator_path(root);
    if tokio::fs::metadata(&script).await.is_err() {
        return Err(AppError::InternalError(format!(
            "Letter generation script not found: {}",
            layout.generator_script
        )));
    }
    if layout.find_roster(root).await.is_none() {
        return Err(AppError::BadRequest(
            "Please upload the roster file first".into(),
        ));
    }

    // Fresh batch: drop every artifact from the previous roster.
    artifacts::clean_artifacts(root, variant, ArtifactKind::All).await;

    run_stage(&state, variant, Stage::Generate, &script).await
}

/// POST /api/v1/workflows/{variant}/merge
pub async fn merge(
    State(state): State<AppState>,
    Path(variant): Path<String>,
) -> AppResult<Json<DataResponse<StageResponse>>> {
    let variant = parse_variant(&variant)?;
    let layout = variant.layout();
    let root = &state.config.data_root;

    let script = layout.merger_path(root);
    if tokio::fs::metadata(&script).await.is_err() {
        return Err(AppError::InternalError(format!(
            "PDF merge script not found: {}",
            layout.merger_script
        )));
    }

    artifacts::clean_artifacts(root, variant, ArtifactKind::Merged).await;

    run_stage(&state, variant, Stage::Merge, &script).await
}

async fn run_stage(
    state: &AppState,
    variant: WorkflowVariant,
    stage: Stage,
    script: &std::path::Path,
) -> AppResult<Json<DataResponse<StageResponse>>> {
    let runner = StageRunner::new(state.tracker.clone())
        .with_interpreter(state.config.script_interpreter.clone());
    let outcome = runner.run(stage, script, &state.config.data_root).await?;

    if outcome.exit_code != 0 {
        return Err(AppError::StageFailed {
            message: format!("{stage} failed"),
            details: outcome.diagnostics().trim().to_owned(),
            exit_code: outcome.exit_code,
        });
    }

    tracing::info!(%variant, %stage, "stage finished");
    Ok(Json(DataResponse {
        data: StageResponse {
            message: format!("{stage} completed successfully"),
            output: outcome.stdout.trim().to_owned(),
        },
    }))
}
