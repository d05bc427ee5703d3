//! Artifact directory listings and cleanup.
//!
//! Listings feed the file browser in the office UI; cleanup runs before a
//! fresh generation or merge so stale PDFs from the previous roster can never
//! leak into the new batch.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::CoreError;
use crate::workflow::WorkflowVariant;

/// Which artifact directories an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Individual,
    Merged,
    All,
}

/// One listed PDF.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactFile {
    pub name: String,
    /// File size in KiB, rounded up.
    pub size_kb: u64,
    pub modified: DateTime<Utc>,
    /// Relative download path served by the API.
    pub download_url: String,
}

/// Per-category listing of individual and merged letters.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CategoryListing {
    pub individual: Vec<ArtifactFile>,
    pub merged: Vec<ArtifactFile>,
}

/// Full artifact listing for one variant, keyed by category tag.
#[derive(Debug, Clone, Serialize)]
pub struct FileListing {
    pub categories: std::collections::BTreeMap<String, CategoryListing>,
}

/// Outcome of a cleanup pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupReport {
    pub deleted: usize,
    pub failed: usize,
}

async fn list_dir(
    dir: &Path,
    variant: WorkflowVariant,
    tag: &str,
    kind: &str,
) -> Result<Vec<ArtifactFile>, CoreError> {
    let mut files = Vec::new();
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(files),
        Err(e) => return Err(e.into()),
    };
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        if !name.to_ascii_lowercase().ends_with(".pdf") {
            continue;
        }
        let meta = entry.metadata().await?;
        let modified = meta.modified().map(DateTime::<Utc>::from).unwrap_or_else(|_| Utc::now());
        files.push(ArtifactFile {
            download_url: format!("/api/v1/workflows/{variant}/download/{kind}/{tag}/{name}"),
            size_kb: meta.len().div_ceil(1024),
            modified,
            name,
        });
    }
    files.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(files)
}

/// List every generated and merged PDF for a variant.
pub async fn list_artifacts(
    root: &Path,
    variant: WorkflowVariant,
) -> Result<FileListing, CoreError> {
    let layout = variant.layout();
    let mut categories = std::collections::BTreeMap::new();
    for dirs in layout.categories {
        let tag = dirs.category.tag();
        let listing = CategoryListing {
            individual: list_dir(&root.join(dirs.individual), variant, tag, "individual").await?,
            merged: list_dir(&root.join(dirs.merged), variant, tag, "merged").await?,
        };
        categories.insert(tag.to_owned(), listing);
    }
    Ok(FileListing { categories })
}

async fn clean_dir(dir: &Path, report: &mut CleanupReport) {
    let Ok(mut entries) = tokio::fs::read_dir(dir).await else {
        return;
    };
    while let Ok(Some(entry)) = entries.next_entry().await {
        let name = entry.file_name().to_string_lossy().into_owned();
        if !name.to_ascii_lowercase().ends_with(".pdf") {
            continue;
        }
        match tokio::fs::remove_file(entry.path()).await {
            Ok(()) => report.deleted += 1,
            Err(e) => {
                report.failed += 1;
                tracing::warn!(path = %entry.path().display(), error = %e, "failed to delete artifact");
            }
        }
    }
}

/// Delete PDFs from the selected artifact directories.
///
/// Individual deletion failures are counted and logged, never propagated:
/// leftover files degrade the next run but must not block it.
pub async fn clean_artifacts(
    root: &Path,
    variant: WorkflowVariant,
    which: ArtifactKind,
) -> CleanupReport {
    let layout = variant.layout();
    let mut report = CleanupReport::default();
    for dirs in layout.categories {
        if matches!(which, ArtifactKind::Individual | ArtifactKind::All) {
            clean_dir(&root.join(dirs.individual), &mut report).await;
        }
        if matches!(which, ArtifactKind::Merged | ArtifactKind::All) {
            clean_dir(&root.join(dirs.merged), &mut report).await;
        }
    }
    tracing::info!(
        %variant,
        deleted = report.deleted,
        failed = report.failed,
        "artifact cleanup finished"
    );
    report
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
