pub mod health;
pub mod workflows;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /workflows/{variant}/upload                          roster upload (POST, multipart)
/// /workflows/{variant}/generate                        run letter generation (POST)
/// /workflows/{variant}/merge                           run PDF merge (POST)
/// /workflows/{variant}/send-emails                     batch email dispatch (POST)
/// /workflows/{variant}/reset                           reset the job slot (POST)
/// /workflows/{variant}/progress                        job progress snapshot (GET)
/// /workflows/{variant}/status                          workflow step status (GET)
/// /workflows/{variant}/files                           artifact listing (GET)
/// /workflows/{variant}/download/{kind}/{category}/{f}  single-PDF download (GET)
/// ```
///
/// `{variant}` is one of `arrears`, `motor`, `health`.
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/workflows/{variant}", workflows::router())
}
