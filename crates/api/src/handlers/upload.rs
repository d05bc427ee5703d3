//! Roster upload.
//!
//! The uploaded spreadsheet is saved under its canonical roster filename in
//! the variant's upload directory, then copied to the processing location
//! next to the letter scripts. The copy is best-effort: the generator falls
//! back to the upload location when the processing copy is missing.

use axum::extract::{Multipart, Path, State};
use axum::Json;
use serde::Serialize;

use letterdesk_core::roster::RosterSummary;

use crate::error::{AppError, AppResult};
use crate::handlers::parse_variant;
use crate::response::DataResponse;
use crate::state::AppState;

/// Maximum accepted roster size (10 MiB).
const MAX_ROSTER_BYTES: usize = 10 * 1024 * 1024;

/// Upload response payload.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub filename: String,
    pub record_count: usize,
    pub distribution: std::collections::BTreeMap<String, usize>,
}

fn has_spreadsheet_extension(filename: &str) -> bool {
    let lower = filename.to_ascii_lowercase();
    lower.ends_with(".xlsx") || lower.ends_with(".xls")
}

/// POST /api/v1/workflows/{variant}/upload
pub async fn upload_roster(
    State(state): State<AppState>,
    Path(variant): Path<String>,
    mut multipart: Multipart,
) -> AppResult<Json<DataResponse<UploadResponse>>> {
    let variant = parse_variant(&variant)?;
    let layout = variant.layout();
    let root = &state.config.data_root;

    let mut file_bytes = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("malformed multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let original = field.file_name().unwrap_or_default().to_owned();
        if !has_spreadsheet_extension(&original) {
            return Err(AppError::BadRequest(
                "Only .xlsx and .xls files are accepted".into(),
            ));
        }
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("could not read upload: {e}")))?;
        if bytes.len() > MAX_ROSTER_BYTES {
            return Err(AppError::BadRequest("File exceeds the 10 MiB limit".into()));
        }
        file_bytes = Some(bytes);
        break;
    }

    let Some(bytes) = file_bytes else {
        return Err(AppError::BadRequest("Missing \"file\" field".into()));
    };

    let upload_dir = root.join(layout.upload_subdir);
    tokio::fs::create_dir_all(&upload_dir)
        .await
        .map_err(|e| AppError::InternalError(format!("could not create upload dir: {e}")))?;
    let upload_path = upload_dir.join(layout.roster_filename);
    tokio::fs::write(&upload_path, &bytes)
        .await
        .map_err(|e| AppError::InternalError(format!("could not save roster: {e}")))?;

    // Best-effort copy next to the letter scripts.
    let processing_path = root.join(layout.roster_filename);
    if let Err(e) = tokio::fs::copy(&upload_path, &processing_path).await {
        tracing::warn!(error = %e, "could not copy roster to processing location");
    }

    let summary: RosterSummary = state.analyzer.summarize(&upload_path).await?;
    tracing::info!(
        %variant,
        records = summary.record_count,
        "roster uploaded"
    );

    Ok(Json(DataResponse {
        data: UploadResponse {
            filename: layout.roster_filename.to_owned(),
            record_count: summary.record_count,
            distribution: summary.distribution,
        },
    }))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_check_is_case_insensitive() {
        assert!(has_spreadsheet_extension("Roster.XLSX"));
        assert!(has_spreadsheet_extension("data.xls"));
        assert!(!has_spreadsheet_extension("roster.csv"));
        assert!(!has_spreadsheet_extension("xlsx"));
    }
}
