//! Roster rows, recipients and the spreadsheet-analyzer boundary.
//!
//! Spreadsheet parsing itself is an external collaborator; this module only
//! defines the interface ([`RosterAnalyzer`]) and the conversion from raw
//! roster rows to email [`Recipient`]s.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::category::RecoveryCategory;
use crate::error::CoreError;

/// Placeholder used when the roster carries no policyholder name.
pub const DEFAULT_RECIPIENT_NAME: &str = "Valued Customer";

/// Placeholder used when the roster carries no policy number.
pub const DEFAULT_POLICY_NO: &str = "N/A";

/// One raw row from the uploaded roster, as reported by the analyzer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RosterRow {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub policy_no: Option<String>,
    /// Free-text recovery action, e.g. `"SMS 2 + L0"`. Absent for renewal rosters.
    #[serde(default)]
    pub recovery_action: Option<String>,
    #[serde(default)]
    pub arrears: Option<f64>,
}

/// Headline numbers reported after an upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterSummary {
    pub record_count: usize,
    /// Free-text recovery action → row count. Rosters without the
    /// categorisation column report everything under `"Unknown"`.
    pub distribution: BTreeMap<String, usize>,
}

/// A policyholder eligible for an outbound email.
#[derive(Debug, Clone, Serialize)]
pub struct Recipient {
    pub email: String,
    pub name: String,
    pub policy_no: String,
    pub category: RecoveryCategory,
    pub arrears: f64,
}

impl Recipient {
    /// Build a recipient from a roster row.
    ///
    /// Returns `None` for rows without a plausible email address (must
    /// contain `@`); missing fields get their documented defaults and the
    /// category is derived from the free-text recovery action.
    pub fn from_row(row: &RosterRow) -> Option<Self> {
        let email = row.email.as_deref()?.trim();
        if !email.contains('@') {
            return None;
        }
        Some(Self {
            email: email.to_owned(),
            name: row
                .name
                .as_deref()
                .filter(|n| !n.trim().is_empty())
                .unwrap_or(DEFAULT_RECIPIENT_NAME)
                .to_owned(),
            policy_no: row
                .policy_no
                .as_deref()
                .filter(|p| !p.trim().is_empty())
                .unwrap_or(DEFAULT_POLICY_NO)
                .to_owned(),
            category: RecoveryCategory::from_action(row.recovery_action.as_deref().unwrap_or("")),
            arrears: row.arrears.unwrap_or(0.0),
        })
    }
}

/// Convert roster rows to recipients, dropping rows without a usable email.
pub fn recipients_from_rows(rows: &[RosterRow]) -> Vec<Recipient> {
    rows.iter().filter_map(Recipient::from_row).collect()
}

/// Boundary to the external spreadsheet analyzer.
///
/// Implementations are expected to tolerate a missing categorisation column
/// by bucketing every row under a single `"Unknown"` key.
#[async_trait::async_trait]
pub trait RosterAnalyzer: Send + Sync {
    /// Record count and recovery-action distribution for an uploaded roster.
    async fn summarize(&self, roster: &Path) -> Result<RosterSummary, CoreError>;

    /// All rows of the roster, for recipient construction at send time.
    async fn rows(&self, roster: &Path) -> Result<Vec<RosterRow>, CoreError>;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn row(email: Option<&str>, action: Option<&str>) -> RosterRow {
        RosterRow {
            email: email.map(str::to_owned),
            recovery_action: action.map(str::to_owned),
            ..RosterRow::default()
        }
    }

    #[test]
    fn rows_without_at_sign_are_dropped() {
        let rows = [
            row(Some("a@example.com"), Some("L1")),
            row(Some("not-an-email"), Some("L1")),
            row(None, Some("L1")),
        ];
        let recipients = recipients_from_rows(&rows);
        assert_eq!(recipients.len(), 1);
        assert_eq!(recipients[0].email, "a@example.com");
    }

    #[test]
    fn defaults_are_applied() {
        let recipient = Recipient::from_row(&row(Some("a@example.com"), None)).unwrap();
        assert_eq!(recipient.name, DEFAULT_RECIPIENT_NAME);
        assert_eq!(recipient.policy_no, DEFAULT_POLICY_NO);
        assert_eq!(recipient.category, RecoveryCategory::L0);
        assert_eq!(recipient.arrears, 0.0);
    }

    #[test]
    fn category_derived_from_free_text_action() {
        let recipient =
            Recipient::from_row(&row(Some("a@example.com"), Some("SMS 2 + L0"))).unwrap();
        assert_eq!(recipient.category, RecoveryCategory::L0);

        let recipient = Recipient::from_row(&row(Some("a@example.com"), Some("MED"))).unwrap();
        assert_eq!(recipient.category, RecoveryCategory::Med);
    }

    #[test]
    fn blank_name_falls_back_to_placeholder() {
        let mut r = row(Some("a@example.com"), None);
        r.name = Some("   ".to_owned());
        let recipient = Recipient::from_row(&r).unwrap();
        assert_eq!(recipient.name, DEFAULT_RECIPIENT_NAME);
    }
}
