//! Domain logic for the letterdesk collections/renewals back office.
//!
//! Everything in this crate is HTTP-agnostic: recovery categories and their
//! tone metadata, the per-variant workflow layout table, the progress-line
//! parser for external generator output, the recipient-to-artifact resolver,
//! and the file-system-derived workflow status aggregator.

pub mod artifacts;
pub mod category;
pub mod error;
pub mod progress_line;
pub mod resolver;
pub mod roster;
pub mod status;
pub mod workflow;

pub use error::CoreError;
