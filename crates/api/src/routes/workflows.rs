use axum::routing::{get, post};
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Workflow routes, nested under `/api/v1/workflows/{variant}`.
///
/// | Method | Path                                   | Handler                     |
/// |--------|----------------------------------------|-----------------------------|
/// | POST   | `/upload`                              | roster upload (multipart)   |
/// | POST   | `/generate`                            | run the generator script    |
/// | POST   | `/merge`                               | run the merger script       |
/// | POST   | `/send-emails`                         | batch email dispatch        |
/// | POST   | `/reset`                               | reset the job slot          |
/// | GET    | `/progress`                            | job progress snapshot       |
/// | GET    | `/status`                              | workflow step status        |
/// | GET    | `/files`                               | artifact listing            |
/// | GET    | `/download/{kind}/{category}/{filename}` | single-PDF download       |
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/upload", post(handlers::upload::upload_roster))
        .route("/generate", post(handlers::stages::generate))
        .route("/merge", post(handlers::stages::merge))
        .route("/send-emails", post(handlers::emails::send_emails))
        .route("/reset", post(handlers::progress::reset))
        .route("/progress", get(handlers::progress::progress))
        .route("/status", get(handlers::progress::status))
        .route("/files", get(handlers::files::list_files))
        .route(
            "/download/{kind}/{category}/{filename}",
            get(handlers::files::download),
        )
}
