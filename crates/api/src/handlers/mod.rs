//! Request handlers, grouped by concern.

pub mod emails;
pub mod files;
pub mod progress;
pub mod stages;
pub mod upload;

use std::str::FromStr;

use letterdesk_core::workflow::WorkflowVariant;

use crate::error::{AppError, AppResult};

/// Parse the `{variant}` path segment.
pub(crate) fn parse_variant(variant: &str) -> AppResult<WorkflowVariant> {
    WorkflowVariant::from_str(variant).map_err(AppError::from)
}
