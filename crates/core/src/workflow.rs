//! Workflow variants and the data-driven layout table.
//!
//! A variant is the product line the workflow serves (arrears collections,
//! motor renewals, health renewals). Everything that differs between the
//! variants — roster filename, upload fallback location, generator/merger
//! scripts, category-to-directory mapping — lives in one static table so
//! handlers never branch on the variant.
//!
//! The renewal variants are single-tier: their layout maps only L0 to the
//! letters directories, which lines up with recipient derivation (rosters
//! without a recovery-action column default every row to L0).

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::category::RecoveryCategory;
use crate::error::CoreError;

/// The product line a workflow run belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowVariant {
    Arrears,
    Motor,
    Health,
}

/// Directory pair for one recovery category within a variant.
#[derive(Debug, Clone, Copy)]
pub struct CategoryDirs {
    pub category: RecoveryCategory,
    /// Directory holding individually generated letters, relative to the data root.
    pub individual: &'static str,
    /// Directory holding merged batch-print PDFs, relative to the data root.
    pub merged: &'static str,
}

/// Static configuration for one workflow variant.
#[derive(Debug, Clone, Copy)]
pub struct WorkflowLayout {
    pub variant: WorkflowVariant,
    /// Canonical roster filename at the processing location (data root).
    pub roster_filename: &'static str,
    /// Upload destination, also probed as the fallback roster location.
    pub upload_subdir: &'static str,
    /// External letter-generation script, relative to the data root.
    pub generator_script: &'static str,
    /// External PDF-merging script, relative to the data root.
    pub merger_script: &'static str,
    /// Category-to-directory mapping for this variant.
    pub categories: &'static [CategoryDirs],
}

const ARREARS_LAYOUT: WorkflowLayout = WorkflowLayout {
    variant: WorkflowVariant::Arrears,
    roster_filename: "Extracted_Arrears_Data.xlsx",
    upload_subdir: "uploads/arrears",
    generator_script: "recovery_processor.py",
    merger_script: "arrears_merger.py",
    categories: &[
        CategoryDirs {
            category: RecoveryCategory::L0,
            individual: "L0",
            merged: "L0_Merge",
        },
        CategoryDirs {
            category: RecoveryCategory::L1,
            individual: "L1",
            merged: "L1_Merge",
        },
        CategoryDirs {
            category: RecoveryCategory::L2,
            individual: "L2",
            merged: "L2_Merge",
        },
        CategoryDirs {
            category: RecoveryCategory::Med,
            individual: "output_mise_en_demeure",
            merged: "MED_Merge",
        },
    ],
};

const MOTOR_LAYOUT: WorkflowLayout = WorkflowLayout {
    variant: WorkflowVariant::Motor,
    roster_filename: "Extracted_Motor_Data.xlsx",
    upload_subdir: "uploads/motor",
    generator_script: "motor_processor.py",
    merger_script: "motor_merger.py",
    categories: &[CategoryDirs {
        category: RecoveryCategory::L0,
        individual: "Motor_Letters",
        merged: "Motor_Merge",
    }],
};

const HEALTH_LAYOUT: WorkflowLayout = WorkflowLayout {
    variant: WorkflowVariant::Health,
    roster_filename: "Extracted_Health_Data.xlsx",
    upload_subdir: "uploads/health",
    generator_script: "health_processor.py",
    merger_script: "health_merger.py",
    categories: &[CategoryDirs {
        category: RecoveryCategory::L0,
        individual: "Health_Letters",
        merged: "Health_Merge",
    }],
};

impl WorkflowVariant {
    /// The layout table entry for this variant.
    pub fn layout(self) -> &'static WorkflowLayout {
        match self {
            Self::Arrears => &ARREARS_LAYOUT,
            Self::Motor => &MOTOR_LAYOUT,
            Self::Health => &HEALTH_LAYOUT,
        }
    }
}

impl WorkflowLayout {
    /// Candidate roster locations, primary (processing) location first.
    pub fn roster_candidates(&self, root: &Path) -> [PathBuf; 2] {
        [
            root.join(self.roster_filename),
            root.join(self.upload_subdir).join(self.roster_filename),
        ]
    }

    /// The first existing roster location, if any.
    pub async fn find_roster(&self, root: &Path) -> Option<PathBuf> {
        for candidate in self.roster_candidates(root) {
            if tokio::fs::metadata(&candidate).await.is_ok() {
                return Some(candidate);
            }
        }
        None
    }

    /// Absolute path of the generator script.
    pub fn generator_path(&self, root: &Path) -> PathBuf {
        root.join(self.generator_script)
    }

    /// Absolute path of the merger script.
    pub fn merger_path(&self, root: &Path) -> PathBuf {
        root.join(self.merger_script)
    }

    /// Directory pair for a category, or `None` when the variant has no tier
    /// mapping for it (renewal variants only map L0).
    pub fn dirs_for(&self, category: RecoveryCategory) -> Option<&CategoryDirs> {
        self.categories.iter().find(|d| d.category == category)
    }

    /// Individual-letters directory for a category.
    pub fn individual_dir(&self, root: &Path, category: RecoveryCategory) -> Option<PathBuf> {
        self.dirs_for(category).map(|d| root.join(d.individual))
    }

    /// Merged-letters directory for a category.
    pub fn merged_dir(&self, root: &Path, category: RecoveryCategory) -> Option<PathBuf> {
        self.dirs_for(category).map(|d| root.join(d.merged))
    }
}

impl fmt::Display for WorkflowVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Arrears => "arrears",
            Self::Motor => "motor",
            Self::Health => "health",
        };
        f.write_str(name)
    }
}

impl FromStr for WorkflowVariant {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "arrears" => Ok(Self::Arrears),
            "motor" => Ok(Self::Motor),
            "health" => Ok(Self::Health),
            other => Err(CoreError::Validation(format!(
                "unknown workflow variant: {other}"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrears_maps_all_four_tiers() {
        let layout = WorkflowVariant::Arrears.layout();
        assert_eq!(layout.categories.len(), 4);
        let med = layout.dirs_for(RecoveryCategory::Med).unwrap();
        assert_eq!(med.individual, "output_mise_en_demeure");
        assert_eq!(med.merged, "MED_Merge");
    }

    #[test]
    fn renewal_variants_are_single_tier() {
        for variant in [WorkflowVariant::Motor, WorkflowVariant::Health] {
            let layout = variant.layout();
            assert_eq!(layout.categories.len(), 1);
            assert!(layout.dirs_for(RecoveryCategory::L0).is_some());
            assert!(layout.dirs_for(RecoveryCategory::L2).is_none());
        }
    }

    #[test]
    fn roster_candidates_prefer_processing_location() {
        let layout = WorkflowVariant::Arrears.layout();
        let [primary, fallback] = layout.roster_candidates(Path::new("/data"));
        assert_eq!(
            primary,
            Path::new("/data/Extracted_Arrears_Data.xlsx")
        );
        assert_eq!(
            fallback,
            Path::new("/data/uploads/arrears/Extracted_Arrears_Data.xlsx")
        );
    }

    #[tokio::test]
    async fn find_roster_falls_back_to_upload_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = WorkflowVariant::Arrears.layout();
        assert!(layout.find_roster(tmp.path()).await.is_none());

        let upload_dir = tmp.path().join(layout.upload_subdir);
        std::fs::create_dir_all(&upload_dir).unwrap();
        std::fs::write(upload_dir.join(layout.roster_filename), b"x").unwrap();

        let found = layout.find_roster(tmp.path()).await.unwrap();
        assert!(found.starts_with(upload_dir));
    }

    #[test]
    fn variant_parses_from_path_segment() {
        assert_eq!(
            "arrears".parse::<WorkflowVariant>().unwrap(),
            WorkflowVariant::Arrears
        );
        assert_eq!(
            "Motor".parse::<WorkflowVariant>().unwrap(),
            WorkflowVariant::Motor
        );
        assert!("life".parse::<WorkflowVariant>().is_err());
    }
}
