//! Batch email dispatch.
//!
//! Loads the recipients from the uploaded roster, then walks them through
//! the batch sender while feeding attempt counts into the progress tracker.
//! Per-recipient failures land in the report; only preconditions and slot
//! contention reject the request.

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;

use letterdesk_core::roster::recipients_from_rows;
use letterdesk_jobs::Stage;
use letterdesk_mailer::{send_batch, BatchReport};

use crate::error::{AppError, AppResult};
use crate::handlers::parse_variant;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body; defaults to every category.
#[derive(Debug, Deserialize)]
pub struct SendEmailsRequest {
    #[serde(default = "default_categories")]
    pub categories: Vec<String>,
}

fn default_categories() -> Vec<String> {
    vec!["all".to_owned()]
}

impl Default for SendEmailsRequest {
    fn default() -> Self {
        Self {
            categories: default_categories(),
        }
    }
}

/// POST /api/v1/workflows/{variant}/send-emails
pub async fn send_emails(
    State(state): State<AppState>,
    Path(variant): Path<String>,
    body: Option<Json<SendEmailsRequest>>,
) -> AppResult<Json<DataResponse<BatchReport>>> {
    let variant = parse_variant(&variant)?;
    let layout = variant.layout();
    let root = &state.config.data_root;
    let Json(request) = body.unwrap_or_default();

    let Some(roster) = layout.find_roster(root).await else {
        return Err(AppError::BadRequest(
            "Please upload the roster file first".into(),
        ));
    };

    state.tracker.begin(Stage::Email)?;
    state
        .tracker
        .update(10, "Preparing email batch...", serde_json::Value::Null);

    let rows = match state.analyzer.rows(&roster).await {
        Ok(rows) => rows,
        Err(e) => {
            state.tracker.fail("Could not read the uploaded roster");
            return Err(e.into());
        }
    };
    let recipients = recipients_from_rows(&rows);
    if recipients.is_empty() {
        state.tracker.fail("No valid email addresses in the roster");
        return Err(AppError::BadRequest(
            "No valid email addresses in the roster".into(),
        ));
    }

    let progress_tracker = state.tracker.clone();
    let report = send_batch(
        state.mailer.as_ref(),
        root,
        variant,
        &recipients,
        &request.categories,
        &state.config.sender_name,
        |done, total| {
            let progress = 10 + (done * 85 / total.max(1)) as u8;
            progress_tracker.update(
                progress.min(95),
                format!("Sending emails ({done}/{total})"),
                serde_json::json!({ "sent": done, "selected": total }),
            );
        },
    )
    .await;

    state.tracker.complete(format!(
        "Emails sent: {} succeeded, {} failed, {} skipped",
        report.success, report.failed, report.skipped
    ));

    Ok(Json(DataResponse { data: report }))
}
