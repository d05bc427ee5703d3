//! Recipient-to-artifact matching.
//!
//! Generated letter filenames come from an external process whose naming
//! convention is not a stable join key, so matching is layered: exact
//! expected filename, then normalized policy-number containment, then name,
//! then the local part of the email address. A miss is a per-recipient
//! failure, never a batch abort.

use std::path::{Path, PathBuf};

use crate::roster::Recipient;
use crate::workflow::WorkflowVariant;

/// Lowercase a search term and map every non-alphanumeric character to `_`,
/// mirroring how the generator scripts sanitise filenames.
pub fn normalize_term(term: &str) -> String {
    term.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// Strip a leading category token (`MED/`, `L0_`, …) from a policy number.
///
/// Policy numbers in the roster often embed the tier as a prefix while the
/// generated filename carries it separately, so the prefix only hurts the
/// containment search.
fn strip_category_prefix<'a>(policy_no: &'a str, tag: &str) -> &'a str {
    let rest = policy_no
        .strip_prefix(tag)
        .or_else(|| policy_no.strip_prefix(&tag.to_ascii_lowercase()));
    match rest {
        Some(rest) if rest.starts_with(['/', '_', '-', ' ']) => &rest[1..],
        _ => policy_no,
    }
}

/// List the `.pdf` filenames in a directory; unreadable directories behave
/// as empty.
async fn pdf_names(dir: &Path) -> Vec<String> {
    let mut names = Vec::new();
    let Ok(mut entries) = tokio::fs::read_dir(dir).await else {
        return names;
    };
    while let Ok(Some(entry)) = entries.next_entry().await {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.to_ascii_lowercase().ends_with(".pdf") {
            names.push(name);
        }
    }
    names
}

/// Find the generated letter for a recipient.
///
/// The directory is resolved strictly from the recipient's category via the
/// variant layout — never from caller-supplied input. Returns `None` when
/// the variant has no directory for the tier, the directory is missing, or
/// no filename matches any search term.
pub async fn find_artifact(
    root: &Path,
    variant: WorkflowVariant,
    recipient: &Recipient,
    expected_filename: Option<&str>,
) -> Option<PathBuf> {
    let dir = variant.layout().individual_dir(root, recipient.category)?;
    let names = pdf_names(&dir).await;
    if names.is_empty() {
        return None;
    }

    if let Some(expected) = expected_filename {
        if let Some(exact) = names.iter().find(|n| n.as_str() == expected) {
            return Some(dir.join(exact));
        }
        tracing::debug!(
            expected,
            email = %recipient.email,
            "expected letter filename not present, falling back to search terms"
        );
    }

    let policy_term = strip_category_prefix(&recipient.policy_no, recipient.category.tag());
    let terms = [policy_term, &recipient.name, local_part(&recipient.email)];

    for term in terms {
        let needle = normalize_term(term);
        if needle.is_empty() {
            continue;
        }
        if let Some(hit) = names
            .iter()
            .find(|n| n.to_ascii_lowercase().contains(&needle))
        {
            return Some(dir.join(hit));
        }
    }

    None
}

fn local_part(email: &str) -> &str {
    email.split('@').next().unwrap_or(email)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::RecoveryCategory;

    fn recipient(policy_no: &str, category: RecoveryCategory) -> Recipient {
        Recipient {
            email: "jane.doe@example.com".to_owned(),
            name: "Jane Doe".to_owned(),
            policy_no: policy_no.to_owned(),
            category,
            arrears: 1500.0,
        }
    }

    fn seed(root: &Path, dir: &str, files: &[&str]) {
        let dir = root.join(dir);
        std::fs::create_dir_all(&dir).unwrap();
        for f in files {
            std::fs::write(dir.join(f), b"%PDF-1.4").unwrap();
        }
    }

    #[test]
    fn normalize_maps_separators_to_underscores() {
        assert_eq!(normalize_term("MED/2025/230"), "med_2025_230");
        assert_eq!(normalize_term("Jane Doe-Smith"), "jane_doe_smith");
        assert_eq!(normalize_term(""), "");
    }

    #[tokio::test]
    async fn policy_number_with_category_prefix_matches() {
        let tmp = tempfile::tempdir().unwrap();
        seed(
            tmp.path(),
            "output_mise_en_demeure",
            &["MED_2025_230_9_1195.pdf", "MED_2025_999_1_0001.pdf"],
        );

        let found = find_artifact(
            tmp.path(),
            WorkflowVariant::Arrears,
            &recipient("MED/2025/230/9/1195", RecoveryCategory::Med),
            None,
        )
        .await
        .unwrap();
        assert!(found.ends_with("output_mise_en_demeure/MED_2025_230_9_1195.pdf"));
    }

    #[tokio::test]
    async fn expected_filename_wins_over_search_terms() {
        let tmp = tempfile::tempdir().unwrap();
        seed(tmp.path(), "L0", &["custom_name.pdf", "jane_doe.pdf"]);

        let found = find_artifact(
            tmp.path(),
            WorkflowVariant::Arrears,
            &recipient("POL-1", RecoveryCategory::L0),
            Some("custom_name.pdf"),
        )
        .await
        .unwrap();
        assert!(found.ends_with("L0/custom_name.pdf"));
    }

    #[tokio::test]
    async fn falls_back_to_name_then_email_local_part() {
        let tmp = tempfile::tempdir().unwrap();
        seed(tmp.path(), "L1", &["letter_jane_doe_final.pdf"]);

        let found = find_artifact(
            tmp.path(),
            WorkflowVariant::Arrears,
            &recipient("UNMATCHED-99", RecoveryCategory::L1),
            None,
        )
        .await
        .unwrap();
        assert!(found.ends_with("L1/letter_jane_doe_final.pdf"));

        // Only the email local part matches.
        seed(tmp.path(), "L2", &["jane_doe_1977.pdf"]);
        let mut r = recipient("UNMATCHED-99", RecoveryCategory::L2);
        r.name = "Someone Else".to_owned();
        let found = find_artifact(tmp.path(), WorkflowVariant::Arrears, &r, None)
            .await
            .unwrap();
        assert!(found.ends_with("L2/jane_doe_1977.pdf"));
    }

    #[tokio::test]
    async fn no_match_returns_none() {
        let tmp = tempfile::tempdir().unwrap();
        seed(tmp.path(), "L0", &["someone_else.pdf"]);

        let mut r = recipient("POL-42", RecoveryCategory::L0);
        r.name = "Bob".to_owned();
        r.email = "bob@example.com".to_owned();
        let found = find_artifact(tmp.path(), WorkflowVariant::Arrears, &r, None).await;
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn missing_directory_behaves_as_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let found = find_artifact(
            tmp.path(),
            WorkflowVariant::Arrears,
            &recipient("POL-42", RecoveryCategory::L0),
            None,
        )
        .await;
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn renewal_variant_has_no_dir_for_upper_tiers() {
        let tmp = tempfile::tempdir().unwrap();
        seed(tmp.path(), "Motor_Letters", &["jane_doe.pdf"]);

        let found = find_artifact(
            tmp.path(),
            WorkflowVariant::Motor,
            &recipient("POL-42", RecoveryCategory::L2),
            None,
        )
        .await;
        assert!(found.is_none());
    }
}
