//! Error type for job orchestration.

use crate::tracker::Stage;

/// Errors produced while starting or driving a workflow stage.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    /// A stage is already running; concurrent triggers are rejected.
    #[error("a {0} job is already in progress")]
    StageInProgress(Stage),

    /// The external process could not be spawned at all.
    #[error("failed to start {script}: {source}")]
    SpawnFailed {
        script: String,
        #[source]
        source: std::io::Error,
    },

    /// An underlying I/O operation on the child process failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
