//! Shared progress slot for the single in-flight job.
//!
//! The tracker is an injectable handle over one mutex-guarded state slot.
//! Handlers clone it into request futures and background tasks; the poll
//! endpoint serialises [`ProgressState`] directly. `begin` doubles as the
//! concurrency guard: only one stage may be Running at a time, and a second
//! trigger fails instead of silently interleaving two external processes.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use serde_json::Value;

use letterdesk_core::progress_line::ProgressUpdate;

use crate::error::JobError;

/// The workflow stage a job belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Generate,
    Merge,
    Email,
}

impl Stage {
    /// Human-readable label used in progress messages.
    pub fn label(self) -> &'static str {
        match self {
            Self::Generate => "letter generation",
            Self::Merge => "PDF merge",
            Self::Email => "email dispatch",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Lifecycle of the job slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Idle,
    Running,
    Completed,
    Failed,
}

/// The state served by the progress poll endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressState {
    pub status: JobStatus,
    pub progress: u8,
    pub message: Option<String>,
    pub step: Option<Stage>,
    pub details: Value,
}

impl Default for ProgressState {
    fn default() -> Self {
        Self {
            status: JobStatus::Idle,
            progress: 0,
            message: None,
            step: None,
            details: Value::Null,
        }
    }
}

/// Cloneable handle over the shared job slot.
#[derive(Debug, Clone, Default)]
pub struct ProgressTracker {
    inner: Arc<Mutex<ProgressState>>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ProgressState> {
        // State writes are plain field assignments; a poisoned lock still
        // holds a coherent snapshot.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current state, for the poll endpoint.
    pub fn snapshot(&self) -> ProgressState {
        self.lock().clone()
    }

    /// Currently reported progress.
    pub fn progress(&self) -> u8 {
        self.lock().progress
    }

    /// Claim the job slot for a stage.
    ///
    /// Fails when another stage is already Running; terminal states
    /// (Completed, Failed) and Idle are free to claim.
    pub fn begin(&self, stage: Stage) -> Result<(), JobError> {
        let mut state = self.lock();
        if state.status == JobStatus::Running {
            let running = state.step.unwrap_or(stage);
            return Err(JobError::StageInProgress(running));
        }
        *state = ProgressState {
            status: JobStatus::Running,
            progress: 0,
            message: None,
            step: Some(stage),
            details: Value::Null,
        };
        Ok(())
    }

    /// Overwrite progress and message, and shallow-merge `details` over the
    /// previous details map (last write wins per key).
    pub fn update(&self, progress: u8, message: impl Into<String>, details: Value) {
        let mut state = self.lock();
        state.progress = progress;
        state.message = Some(message.into());
        merge_details(&mut state.details, details);
    }

    /// Merge details without touching the progress bar or message.
    pub fn merge_details(&self, details: Value) {
        merge_details(&mut self.lock().details, details);
    }

    /// Raise the bar to `progress` if it is ahead of the current value.
    ///
    /// The compare and the write share one lock, so a fresher value written
    /// by the line parser is never pulled backwards by a stale timer target.
    /// Lower or equal targets are discarded whole, message and details too.
    pub fn raise_to(&self, progress: u8, message: impl Into<String>, details: Value) {
        let mut state = self.lock();
        if progress <= state.progress {
            return;
        }
        state.progress = progress;
        state.message = Some(message.into());
        merge_details(&mut state.details, details);
    }

    /// Apply a parsed progress-line update.
    pub fn apply(&self, update: &ProgressUpdate) {
        let mut state = self.lock();
        if let Some(progress) = update.progress {
            state.progress = progress;
            if let Some(message) = &update.message {
                state.message = Some(message.clone());
            }
        }
        merge_details(&mut state.details, update.details.clone());
    }

    /// Terminal success: progress 100.
    pub fn complete(&self, message: impl Into<String>) {
        let mut state = self.lock();
        state.status = JobStatus::Completed;
        state.progress = 100;
        state.message = Some(message.into());
    }

    /// Terminal failure: progress 0.
    pub fn fail(&self, message: impl Into<String>) {
        let mut state = self.lock();
        state.status = JobStatus::Failed;
        state.progress = 0;
        state.message = Some(message.into());
    }

    /// Back to the idle default.
    ///
    /// Refused while a job is Running: clearing the slot mid-run would let
    /// a second trigger race the live child over the artifact directories.
    pub fn reset(&self) -> Result<(), JobError> {
        let mut state = self.lock();
        if state.status == JobStatus::Running {
            let running = state.step.unwrap_or(Stage::Generate);
            return Err(JobError::StageInProgress(running));
        }
        *state = ProgressState::default();
        Ok(())
    }
}

fn merge_details(current: &mut Value, incoming: Value) {
    match incoming {
        Value::Null => {}
        Value::Object(map) => {
            if let Value::Object(existing) = current {
                for (key, value) in map {
                    existing.insert(key, value);
                }
            } else {
                *current = Value::Object(map);
            }
        }
        other => *current = other,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    #[test]
    fn default_snapshot_is_idle() {
        let tracker = ProgressTracker::new();
        let state = tracker.snapshot();
        assert_eq!(state.status, JobStatus::Idle);
        assert_eq!(state.progress, 0);
        assert_eq!(state.step, None);
    }

    #[test]
    fn begin_rejects_concurrent_stage() {
        let tracker = ProgressTracker::new();
        tracker.begin(Stage::Generate).unwrap();
        assert_matches!(
            tracker.begin(Stage::Merge),
            Err(JobError::StageInProgress(Stage::Generate))
        );
    }

    #[test]
    fn begin_allowed_after_terminal_states() {
        let tracker = ProgressTracker::new();
        tracker.begin(Stage::Generate).unwrap();
        tracker.complete("done");
        tracker.begin(Stage::Merge).unwrap();
        assert_eq!(tracker.snapshot().step, Some(Stage::Merge));

        tracker.fail("broke");
        tracker.begin(Stage::Generate).unwrap();
        assert_eq!(tracker.snapshot().status, JobStatus::Running);
    }

    #[test]
    fn details_merge_is_shallow_and_keeps_omitted_keys() {
        let tracker = ProgressTracker::new();
        tracker.begin(Stage::Generate).unwrap();
        tracker.update(20, "setup", json!({"total": 100, "stage": "L0"}));
        tracker.update(25, "rows", json!({"current": 5}));

        let state = tracker.snapshot();
        assert_eq!(state.progress, 25);
        assert_eq!(state.details["total"], 100);
        assert_eq!(state.details["stage"], "L0");
        assert_eq!(state.details["current"], 5);
    }

    #[test]
    fn apply_without_progress_keeps_bar() {
        let tracker = ProgressTracker::new();
        tracker.begin(Stage::Generate).unwrap();
        tracker.update(40, "working", Value::Null);
        tracker.apply(&ProgressUpdate {
            progress: None,
            message: None,
            details: json!({"type": "skip", "message": "row 3 skipped"}),
        });

        let state = tracker.snapshot();
        assert_eq!(state.progress, 40);
        assert_eq!(state.message.as_deref(), Some("working"));
        assert_eq!(state.details["type"], "skip");
    }

    #[test]
    fn terminal_transitions_pin_progress() {
        let tracker = ProgressTracker::new();
        tracker.begin(Stage::Merge).unwrap();
        tracker.update(55, "merging", Value::Null);
        tracker.complete("merged in 01:23");
        let state = tracker.snapshot();
        assert_eq!(state.status, JobStatus::Completed);
        assert_eq!(state.progress, 100);

        tracker.begin(Stage::Merge).unwrap();
        tracker.fail("merger exited with code 2");
        let state = tracker.snapshot();
        assert_eq!(state.status, JobStatus::Failed);
        assert_eq!(state.progress, 0);
    }

    #[test]
    fn raise_to_discards_stale_lower_targets() {
        let tracker = ProgressTracker::new();
        tracker.begin(Stage::Generate).unwrap();
        tracker.update(50, "row 5 of 10", json!({"current": 5}));

        // A timer target computed before the parser wrote 50 must lose.
        tracker.raise_to(15, "Still processing... (01:05 elapsed)", json!({"elapsedMinutes": 1}));
        let state = tracker.snapshot();
        assert_eq!(state.progress, 50);
        assert_eq!(state.message.as_deref(), Some("row 5 of 10"));
        assert_eq!(state.details.get("elapsedMinutes"), None);

        tracker.raise_to(60, "Still processing... (10:00 elapsed)", json!({"elapsedMinutes": 10}));
        let state = tracker.snapshot();
        assert_eq!(state.progress, 60);
        assert_eq!(state.details["elapsedMinutes"], 10);
        assert_eq!(state.details["current"], 5);
    }

    #[test]
    fn reset_restores_default_after_terminal_state() {
        let tracker = ProgressTracker::new();
        tracker.begin(Stage::Email).unwrap();
        tracker.update(60, "sending", json!({"sent": 3}));
        tracker.complete("sent");
        tracker.reset().unwrap();
        assert_eq!(tracker.snapshot(), ProgressState::default());
    }

    #[test]
    fn reset_refused_while_running_keeps_the_guard() {
        let tracker = ProgressTracker::new();
        tracker.begin(Stage::Generate).unwrap();
        tracker.update(42, "mid-flight", Value::Null);

        assert_matches!(
            tracker.reset(),
            Err(JobError::StageInProgress(Stage::Generate))
        );
        // The slot still rejects a second stage.
        assert_matches!(
            tracker.begin(Stage::Merge),
            Err(JobError::StageInProgress(Stage::Generate))
        );
        assert_eq!(tracker.progress(), 42);
    }

    #[test]
    fn snapshot_serialises_camel_case() {
        let tracker = ProgressTracker::new();
        tracker.begin(Stage::Generate).unwrap();
        let json = serde_json::to_value(tracker.snapshot()).unwrap();
        assert_eq!(json["status"], "running");
        assert_eq!(json["step"], "generate");
    }
}
