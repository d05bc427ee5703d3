use std::sync::Arc;

use letterdesk_core::roster::RosterAnalyzer;
use letterdesk_jobs::ProgressTracker;
use letterdesk_mailer::{MailError, Mailer, OutboundEmail};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration (data root, interpreter, sender identity).
    pub config: Arc<ServerConfig>,
    /// The single shared job slot, polled by the progress endpoint.
    pub tracker: ProgressTracker,
    /// Outbound email delivery.
    pub mailer: Arc<dyn Mailer>,
    /// External spreadsheet analyzer.
    pub analyzer: Arc<dyn RosterAnalyzer>,
    /// Whether a real SMTP transport is wired in (reported by the probe).
    pub email_enabled: bool,
}

/// [`Mailer`] used when no SMTP host is configured; every send is rejected.
pub struct DisabledMailer;

#[async_trait::async_trait]
impl Mailer for DisabledMailer {
    async fn send(&self, _email: OutboundEmail) -> Result<String, MailError> {
        Err(MailError::Disabled)
    }
}
