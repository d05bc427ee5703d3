//! Sequential batch send with per-recipient fault isolation.
//!
//! One bad recipient never aborts the batch: a missing letter, an unreadable
//! file or a provider rejection is recorded in the report and the loop moves
//! on to the next policyholder.

use std::path::Path;

use serde::Serialize;

use letterdesk_core::resolver;
use letterdesk_core::roster::Recipient;
use letterdesk_core::workflow::WorkflowVariant;

use crate::content;
use crate::delivery::{Mailer, OutboundEmail, PdfAttachment};

/// One failed recipient.
#[derive(Debug, Clone, Serialize)]
pub struct BatchError {
    pub email: String,
    pub error: String,
}

/// Outcome of a batch send.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub success: usize,
    pub failed: usize,
    pub skipped: usize,
    pub errors: Vec<BatchError>,
}

fn selected(recipient: &Recipient, filter: &[String]) -> bool {
    filter.iter().any(|f| {
        f.eq_ignore_ascii_case("all") || f.eq_ignore_ascii_case(recipient.category.tag())
    })
}

/// Send the letter email to every recipient passing the category filter.
///
/// `filter` is a list of category tags, with `"all"` as the select-everything
/// sentinel. `on_progress` is called after each attempted send with
/// `(attempted, selected_total)`.
pub async fn send_batch(
    mailer: &dyn Mailer,
    root: &Path,
    variant: WorkflowVariant,
    recipients: &[Recipient],
    filter: &[String],
    sender_name: &str,
    mut on_progress: impl FnMut(usize, usize),
) -> BatchReport {
    let targets: Vec<&Recipient> = recipients.iter().filter(|r| selected(r, filter)).collect();
    let total = targets.len();

    let mut report = BatchReport {
        skipped: recipients.len() - total,
        ..BatchReport::default()
    };

    for (index, recipient) in targets.into_iter().enumerate() {
        let result = send_one(mailer, root, variant, recipient, sender_name).await;
        match result {
            Ok(message_id) => {
                tracing::debug!(to = %recipient.email, %message_id, "letter email sent");
                report.success += 1;
            }
            Err(error) => {
                tracing::warn!(to = %recipient.email, %error, "letter email failed");
                report.failed += 1;
                report.errors.push(BatchError {
                    email: recipient.email.clone(),
                    error,
                });
            }
        }
        on_progress(index + 1, total);
    }

    tracing::info!(
        %variant,
        success = report.success,
        failed = report.failed,
        skipped = report.skipped,
        "batch send finished"
    );
    report
}

async fn send_one(
    mailer: &dyn Mailer,
    root: &Path,
    variant: WorkflowVariant,
    recipient: &Recipient,
    sender_name: &str,
) -> Result<String, String> {
    let letter = resolver::find_artifact(root, variant, recipient, None)
        .await
        .ok_or_else(|| "PDF file not found".to_owned())?;
    let content_bytes = tokio::fs::read(&letter)
        .await
        .map_err(|e| format!("could not read letter: {e}"))?;
    let filename = letter
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| format!("{}.pdf", recipient.policy_no));

    let composed = content::compose(sender_name, recipient);
    let email = OutboundEmail {
        to: recipient.email.clone(),
        to_name: recipient.name.clone(),
        subject: composed.subject,
        html: composed.html,
        text: composed.text,
        attachment: Some(PdfAttachment {
            filename,
            content: content_bytes,
        }),
    };

    mailer.send(email).await.map_err(|e| e.to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
