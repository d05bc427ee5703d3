//! Drives one external letter script to completion.
//!
//! The runner owns the whole lifecycle of a stage: claim the job slot, spawn
//! the script with piped stdio, feed its stdout through the progress-line
//! parser, keep the bar moving with a time-based escalator while the script
//! is silent, and land the tracker in a terminal state that matches the exit
//! code. Preconditions (script present, roster uploaded) are the caller's
//! job; the tracker is never touched for a request that fails them.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use letterdesk_core::progress_line;

use crate::error::JobError;
use crate::tracker::{ProgressTracker, Stage};

/// Maximum stderr captured (1 MiB); verbose scripts get truncated, not OOMed.
const MAX_STDERR_BYTES: u64 = 1024 * 1024;

/// Time-based progress escalation for a silent script.
#[derive(Debug, Clone, Copy)]
pub struct EscalatorProfile {
    pub base: u8,
    pub step: u8,
    pub unit: Duration,
}

impl EscalatorProfile {
    /// Generation runs long: +5% per minute from 10%.
    pub const GENERATE: Self = Self {
        base: 10,
        step: 5,
        unit: Duration::from_secs(60),
    };

    /// Merging is quicker: +5% per 30 seconds from 10%.
    pub const MERGE: Self = Self {
        base: 10,
        step: 5,
        unit: Duration::from_secs(30),
    };

    /// Progress after `elapsed`, capped at 90 so completion stays reserved
    /// for the real exit.
    pub fn progress_at(&self, elapsed: Duration) -> u8 {
        let units = (elapsed.as_secs() / self.unit.as_secs()) as u64;
        let raw = u64::from(self.base) + u64::from(self.step) * units;
        raw.min(90) as u8
    }

    fn for_stage(stage: Stage) -> Self {
        match stage {
            Stage::Merge => Self::MERGE,
            Stage::Generate | Stage::Email => Self::GENERATE,
        }
    }
}

/// `MM:SS` display for elapsed wall time.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Background task that raises the bar on a 1-second tick while the script
/// is quiet. It only ever raises: a fresher line-parser value wins, and the
/// escalator catches up later instead of fighting it.
pub fn spawn_escalator(
    tracker: ProgressTracker,
    profile: EscalatorProfile,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    // Elapsed time runs from this call, not from the task's first poll.
    let start = tokio::time::Instant::now();
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(Duration::from_secs(1));
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tick.tick() => {
                    let elapsed = start.elapsed();
                    let target = profile.progress_at(elapsed);
                    let secs = elapsed.as_secs();
                    tracker.raise_to(
                        target,
                        format!("Still processing... ({} elapsed)", format_elapsed(elapsed)),
                        serde_json::json!({
                            "elapsed": format_elapsed(elapsed),
                            "elapsedMinutes": secs / 60,
                            "elapsedSeconds": secs % 60,
                        }),
                    );
                }
            }
        }
    })
}

/// Outcome of a finished (or failed) script run.
#[derive(Debug)]
pub struct JobOutcome {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
}

impl JobOutcome {
    /// Diagnostic text for a failed run: stderr, or stdout when the script
    /// wrote its complaint to the wrong stream.
    pub fn diagnostics(&self) -> &str {
        if self.stderr.trim().is_empty() {
            &self.stdout
        } else {
            &self.stderr
        }
    }
}

/// Runs one workflow stage as an external interpreted script.
#[derive(Debug, Clone)]
pub struct StageRunner {
    tracker: ProgressTracker,
    interpreter: String,
}

impl StageRunner {
    pub fn new(tracker: ProgressTracker) -> Self {
        Self {
            tracker,
            interpreter: "python3".to_owned(),
        }
    }

    /// Override the interpreter (tests drive shell scripts through `sh`).
    pub fn with_interpreter(mut self, interpreter: impl Into<String>) -> Self {
        self.interpreter = interpreter.into();
        self
    }

    /// Run `script` under `cwd` and drive the tracker to a terminal state.
    ///
    /// A non-zero exit is a normal outcome here (`Ok` with the exit code);
    /// only slot contention, spawn failure and child I/O are `Err`.
    pub async fn run(
        &self,
        stage: Stage,
        script: &Path,
        cwd: &Path,
    ) -> Result<JobOutcome, JobError> {
        self.tracker.begin(stage)?;
        self.tracker.update(
            10,
            format!("Starting {stage}..."),
            serde_json::Value::Null,
        );

        let script_name = script
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| script.display().to_string());

        let start = std::time::Instant::now();
        let mut child = match Command::new(&self.interpreter)
            .arg(script)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                tracing::error!(%stage, script = %script_name, error = %e, "spawn failed");
                self.tracker
                    .fail(format!("Failed to start {stage} process"));
                return Err(JobError::SpawnFailed {
                    script: script_name,
                    source: e,
                });
            }
        };

        tracing::info!(%stage, script = %script_name, "stage started");

        let cancel = CancellationToken::new();
        let escalator = spawn_escalator(
            self.tracker.clone(),
            EscalatorProfile::for_stage(stage),
            cancel.clone(),
        );

        let stdout_handle = child.stdout.take();
        let stderr_handle = child.stderr.take();

        let stdout_tracker = self.tracker.clone();
        let stdout_task = tokio::spawn(async move {
            let mut collected = String::new();
            let Some(stdout) = stdout_handle else {
                return collected;
            };
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if line.trim().is_empty() {
                    continue;
                }
                tracing::debug!(line = %line, "script output");
                if let Some(update) = progress_line::parse_line(&line) {
                    stdout_tracker.apply(&update);
                }
                collected.push_str(&line);
                collected.push('\n');
            }
            collected
        });

        let stderr_task = tokio::spawn(async move {
            let mut buf = String::new();
            if let Some(mut stderr) = stderr_handle {
                let _ = (&mut stderr)
                    .take(MAX_STDERR_BYTES)
                    .read_to_string(&mut buf)
                    .await;
                // Keep draining past the cap; a full pipe would stall wait().
                let _ = tokio::io::copy(&mut stderr, &mut tokio::io::sink()).await;
            }
            buf
        });

        let wait_result = child.wait().await;

        // Kill the escalator before any terminal transition so it can never
        // overwrite a completed/failed message with "Still processing".
        cancel.cancel();
        let _ = escalator.await;

        let status = match wait_result {
            Ok(status) => status,
            Err(e) => {
                self.tracker.fail(format!("{stage} process was lost"));
                return Err(e.into());
            }
        };

        let duration = start.elapsed();
        let stdout = stdout_task.await.unwrap_or_default();
        let stderr = stderr_task.await.unwrap_or_default();
        let exit_code = status.code().unwrap_or(-1);

        let outcome = JobOutcome {
            exit_code,
            stdout,
            stderr,
            duration,
        };

        if exit_code == 0 {
            let elapsed = format_elapsed(duration);
            tracing::info!(%stage, %elapsed, "stage completed");
            self.tracker
                .complete(format!("{stage} completed successfully in {elapsed}"));
        } else {
            tracing::error!(%stage, exit_code, "stage failed");
            self.tracker
                .fail(format!("{stage} failed (exit code {exit_code})"));
        }

        Ok(outcome)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
