//! Outbound email: SMTP delivery, tier-toned message composition and the
//! per-recipient batch loop that attaches the generated letters.

pub mod batch;
pub mod content;
pub mod delivery;

pub use batch::{send_batch, BatchReport};
pub use delivery::{MailError, Mailer, MailerConfig, OutboundEmail, PdfAttachment, SmtpMailer};
