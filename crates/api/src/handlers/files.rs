//! Artifact listing and single-PDF download.
//!
//! Download paths are built strictly from the variant layout plus a parsed
//! category; the filename segment is rejected outright if it carries path
//! separators or parent references.

use std::str::FromStr;

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;

use letterdesk_core::artifacts::{list_artifacts, FileListing};
use letterdesk_core::category::RecoveryCategory;
use letterdesk_core::CoreError;

use crate::error::{AppError, AppResult};
use crate::handlers::parse_variant;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/workflows/{variant}/files
pub async fn list_files(
    State(state): State<AppState>,
    Path(variant): Path<String>,
) -> AppResult<Json<DataResponse<FileListing>>> {
    let variant = parse_variant(&variant)?;
    let listing = list_artifacts(&state.config.data_root, variant).await?;
    Ok(Json(DataResponse { data: listing }))
}

fn is_safe_filename(filename: &str) -> bool {
    !filename.is_empty()
        && !filename.contains('/')
        && !filename.contains('\\')
        && !filename.contains("..")
}

/// GET /api/v1/workflows/{variant}/download/{kind}/{category}/{filename}
pub async fn download(
    State(state): State<AppState>,
    Path((variant, kind, category, filename)): Path<(String, String, String, String)>,
) -> AppResult<Response> {
    let variant = parse_variant(&variant)?;
    let layout = variant.layout();
    let category = RecoveryCategory::from_str(&category)?;

    if !is_safe_filename(&filename) {
        return Err(AppError::BadRequest("Invalid filename".into()));
    }

    let dir = match kind.as_str() {
        "individual" => layout.individual_dir(&state.config.data_root, category),
        "merged" => layout.merged_dir(&state.config.data_root, category),
        other => {
            return Err(AppError::BadRequest(format!(
                "Unknown artifact kind: {other}"
            )))
        }
    };
    let Some(dir) = dir else {
        return Err(CoreError::NotFound(format!("category {category}")).into());
    };

    let path = dir.join(&filename);
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|_| CoreError::NotFound(format!("file {filename}")))?;

    tracing::debug!(%variant, %category, filename = %filename, "artifact downloaded");
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/pdf".to_owned()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    )
        .into_response())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn traversal_filenames_are_rejected() {
        assert!(!is_safe_filename("../secret.pdf"));
        assert!(!is_safe_filename("a/../../b.pdf"));
        assert!(!is_safe_filename("dir/letter.pdf"));
        assert!(!is_safe_filename("dir\\letter.pdf"));
        assert!(!is_safe_filename(""));
        assert!(is_safe_filename("MED_2025_230.pdf"));
    }
}
