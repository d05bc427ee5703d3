//! Job orchestration: the shared progress tracker, the stage runner that
//! drives external letter scripts, and the subprocess-backed roster analyzer.

pub mod analyzer;
pub mod error;
pub mod runner;
pub mod tracker;

pub use error::JobError;
pub use runner::{JobOutcome, StageRunner};
pub use tracker::{JobStatus, ProgressState, ProgressTracker, Stage};
