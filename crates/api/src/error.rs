use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use letterdesk_core::CoreError;
use letterdesk_jobs::JobError;
use letterdesk_mailer::MailError;

/// Application-level error type for HTTP handlers.
///
/// Wraps the domain, job and mail errors and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `letterdesk_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A job orchestration error from `letterdesk_jobs`.
    #[error(transparent)]
    Job(#[from] JobError),

    /// An email delivery error from `letterdesk_mailer`.
    #[error(transparent)]
    Mail(#[from] MailError),

    /// An external letter script exited non-zero.
    #[error("{message}")]
    StageFailed {
        message: String,
        details: String,
        exit_code: i32,
    },

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Script failures carry their diagnostics in a dedicated shape the
        // office UI renders verbatim.
        if let AppError::StageFailed {
            message,
            details,
            exit_code,
        } = &self
        {
            tracing::error!(exit_code, error = %message, "stage failed");
            let body = json!({
                "error": message,
                "details": details,
                "exitCode": exit_code,
                "code": "STAGE_FAILED",
            });
            return (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(body)).into_response();
        }

        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::NotFound(what) => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{what} not found"),
                ),
                CoreError::Analyzer(msg) => {
                    tracing::error!(error = %msg, "roster analyzer error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "ANALYZER_ERROR",
                        "Could not read the uploaded roster".to_string(),
                    )
                }
                CoreError::Io(err) => {
                    tracing::error!(error = %err, "I/O error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        "An internal error occurred".to_string(),
                    )
                }
            },

            // --- JobError variants ---
            AppError::Job(job) => match job {
                JobError::StageInProgress(stage) => (
                    StatusCode::CONFLICT,
                    "STAGE_IN_PROGRESS",
                    format!("A {stage} job is already in progress"),
                ),
                JobError::SpawnFailed { script, .. } => {
                    tracing::error!(script = %script, "spawn failed");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "SPAWN_FAILED",
                        format!("Failed to start {script}"),
                    )
                }
                JobError::Io(err) => {
                    tracing::error!(error = %err, "job I/O error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        "An internal error occurred".to_string(),
                    )
                }
            },

            // --- MailError variants ---
            AppError::Mail(MailError::Disabled) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "EMAIL_NOT_CONFIGURED",
                "Email delivery is not configured".to_string(),
            ),
            AppError::Mail(err) => {
                tracing::error!(error = %err, "mail error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "EMAIL_ERROR",
                    "Email delivery failed".to_string(),
                )
            }

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    msg.clone(),
                )
            }

            // Returned early above; kept for exhaustiveness.
            AppError::StageFailed { message, .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "STAGE_FAILED",
                message.clone(),
            ),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}
