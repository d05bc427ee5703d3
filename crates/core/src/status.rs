//! Workflow status derived from the file system.
//!
//! The four-step status (upload → generate → merge → email-ready) is a pure
//! probe over the artifact directories: nothing is cached and nothing is
//! persisted, so the status always reflects what is actually on disk rather
//! than what the workflow history claims happened.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;

use crate::error::CoreError;
use crate::workflow::WorkflowVariant;

/// Per-category artifact counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryCounts {
    pub individual: usize,
    pub merged: usize,
}

/// Coarse-grained workflow position for one variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowStatus {
    pub upload: bool,
    pub generate: bool,
    pub merge: bool,
    pub can_send_emails: bool,
    /// 1 = awaiting upload, 2 = ready to generate, 3 = ready to merge,
    /// 4 = ready to email.
    pub current_step: u8,
    pub recovery_stats: BTreeMap<String, CategoryCounts>,
}

/// Count `.pdf` files directly inside `dir` (case-insensitive extension).
///
/// A missing directory counts as zero; other I/O errors propagate.
async fn count_pdfs(dir: &Path) -> Result<usize, CoreError> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e.into()),
    };
    let mut count = 0;
    while let Some(entry) = entries.next_entry().await? {
        if entry
            .file_name()
            .to_string_lossy()
            .to_ascii_lowercase()
            .ends_with(".pdf")
        {
            count += 1;
        }
    }
    Ok(count)
}

/// Probe the file system and derive the workflow status for a variant.
pub async fn compute_status(
    root: &Path,
    variant: WorkflowVariant,
) -> Result<WorkflowStatus, CoreError> {
    let layout = variant.layout();

    let mut status = WorkflowStatus {
        upload: false,
        generate: false,
        merge: false,
        can_send_emails: false,
        current_step: 1,
        recovery_stats: layout
            .categories
            .iter()
            .map(|d| (d.category.tag().to_owned(), CategoryCounts::default()))
            .collect(),
    };

    if layout.find_roster(root).await.is_some() {
        status.upload = true;
        status.current_step = 2;
    }

    let mut total_individual = 0;
    for dirs in layout.categories {
        let count = count_pdfs(&root.join(dirs.individual)).await?;
        if let Some(stats) = status.recovery_stats.get_mut(dirs.category.tag()) {
            stats.individual = count;
        }
        total_individual += count;
    }
    if total_individual > 0 {
        status.generate = true;
        status.current_step = 3;
    }

    let mut total_merged = 0;
    for dirs in layout.categories {
        let count = count_pdfs(&root.join(dirs.merged)).await?;
        if let Some(stats) = status.recovery_stats.get_mut(dirs.category.tag()) {
            stats.merged = count;
        }
        total_merged += count;
    }
    if total_merged > 0 {
        status.merge = true;
        status.can_send_emails = true;
        status.current_step = 4;
    }

    Ok(status)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
