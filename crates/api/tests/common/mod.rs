//! Shared test fixtures: a mock analyzer, a recording mailer and the app
//! router wired against a temporary data root.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use axum::Router;

use letterdesk_api::config::ServerConfig;
use letterdesk_api::router::build_app_router;
use letterdesk_api::state::AppState;
use letterdesk_core::roster::{RosterAnalyzer, RosterRow, RosterSummary};
use letterdesk_core::CoreError;
use letterdesk_jobs::ProgressTracker;
use letterdesk_mailer::{MailError, Mailer, OutboundEmail};

/// Build a test `ServerConfig` rooted at a temporary directory.
///
/// The script interpreter is `sh` so tests can drop shell scripts in place
/// of the production letter scripts.
pub fn test_config(data_root: &Path) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        data_root: data_root.to_path_buf(),
        script_interpreter: "sh".to_string(),
        analyzer_program: "sh".to_string(),
        analyzer_script: data_root.join("analyze.sh"),
        sender_name: "NICL Collections".to_string(),
    }
}

/// [`RosterAnalyzer`] returning canned data.
pub struct MockAnalyzer {
    pub summary: RosterSummary,
    pub rows: Vec<RosterRow>,
}

impl Default for MockAnalyzer {
    fn default() -> Self {
        Self {
            summary: RosterSummary {
                record_count: 0,
                distribution: BTreeMap::new(),
            },
            rows: Vec::new(),
        }
    }
}

#[async_trait::async_trait]
impl RosterAnalyzer for MockAnalyzer {
    async fn summarize(&self, _roster: &Path) -> Result<RosterSummary, CoreError> {
        Ok(self.summary.clone())
    }

    async fn rows(&self, _roster: &Path) -> Result<Vec<RosterRow>, CoreError> {
        Ok(self.rows.clone())
    }
}

/// [`Mailer`] that records every accepted email.
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<OutboundEmail>>,
}

#[async_trait::async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: OutboundEmail) -> Result<String, MailError> {
        self.sent.lock().unwrap().push(email);
        Ok("<recorded@test>".into())
    }
}

/// A router plus the pieces tests poke at directly.
pub struct TestApp {
    pub router: Router,
    pub tracker: ProgressTracker,
    pub mailer: Arc<RecordingMailer>,
}

/// Build the full application router with all middleware layers, mirroring
/// the construction in `main.rs`.
pub fn build_test_app(data_root: &Path, analyzer: MockAnalyzer) -> TestApp {
    let config = test_config(data_root);
    let tracker = ProgressTracker::new();
    let mailer = Arc::new(RecordingMailer::default());

    let state = AppState {
        config: Arc::new(config.clone()),
        tracker: tracker.clone(),
        mailer: Arc::clone(&mailer) as Arc<dyn Mailer>,
        analyzer: Arc::new(analyzer),
        email_enabled: true,
    };

    TestApp {
        router: build_app_router(state, &config),
        tracker,
        mailer,
    }
}
