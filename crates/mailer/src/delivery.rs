//! SMTP delivery via the `lettre` async transport.
//!
//! Configuration is loaded from environment variables; if `SMTP_HOST` is not
//! set, [`MailerConfig::from_env`] returns `None` and the API falls back to a
//! disabled mailer that rejects every send.

use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for email delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    /// SMTP transport-level failure (authentication, connection, rejection).
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// The recipient or sender address could not be parsed.
    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The MIME message could not be assembled.
    #[error("Email build error: {0}")]
    Build(String),

    /// No SMTP host is configured.
    #[error("email delivery is not configured")]
    Disabled,
}

// ---------------------------------------------------------------------------
// MailerConfig
// ---------------------------------------------------------------------------

/// Default SMTP port (STARTTLS).
const DEFAULT_SMTP_PORT: u16 = 587;

/// Default sender address when `SMTP_FROM` is not set.
const DEFAULT_FROM_ADDRESS: &str = "collections@nicl.local";

/// Default sender display name when `SMTP_FROM_NAME` is not set.
const DEFAULT_FROM_NAME: &str = "NICL Collections";

/// Configuration for the SMTP delivery service.
#[derive(Debug, Clone)]
pub struct MailerConfig {
    /// SMTP server hostname.
    pub smtp_host: String,
    /// SMTP server port (defaults to 587).
    pub smtp_port: u16,
    /// RFC 5322 "From" address.
    pub from_address: String,
    /// Display name on the "From" header; also used in subject lines.
    pub from_name: String,
    /// Optional "Reply-To" address.
    pub reply_to: Option<String>,
    /// Optional SMTP username.
    pub smtp_user: Option<String>,
    /// Optional SMTP password.
    pub smtp_password: Option<String>,
}

impl MailerConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` if `SMTP_HOST` is not set, signalling that email
    /// delivery is not configured and should be disabled.
    ///
    /// | Variable         | Required | Default                  |
    /// |------------------|----------|--------------------------|
    /// | `SMTP_HOST`      | yes      | —                        |
    /// | `SMTP_PORT`      | no       | `587`                    |
    /// | `SMTP_FROM`      | no       | `collections@nicl.local` |
    /// | `SMTP_FROM_NAME` | no       | `NICL Collections`       |
    /// | `SMTP_REPLY_TO`  | no       | —                        |
    /// | `SMTP_USER`      | no       | —                        |
    /// | `SMTP_PASSWORD`  | no       | —                        |
    pub fn from_env() -> Option<Self> {
        let smtp_host = std::env::var("SMTP_HOST").ok()?;
        Some(Self {
            smtp_host,
            smtp_port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_SMTP_PORT),
            from_address: std::env::var("SMTP_FROM")
                .unwrap_or_else(|_| DEFAULT_FROM_ADDRESS.to_string()),
            from_name: std::env::var("SMTP_FROM_NAME")
                .unwrap_or_else(|_| DEFAULT_FROM_NAME.to_string()),
            reply_to: std::env::var("SMTP_REPLY_TO").ok(),
            smtp_user: std::env::var("SMTP_USER").ok(),
            smtp_password: std::env::var("SMTP_PASSWORD").ok(),
        })
    }
}

// ---------------------------------------------------------------------------
// Mailer
// ---------------------------------------------------------------------------

/// A generated letter attached to an outbound email.
#[derive(Debug, Clone)]
pub struct PdfAttachment {
    pub filename: String,
    pub content: Vec<u8>,
}

/// One fully composed outbound email.
#[derive(Debug, Clone)]
pub struct OutboundEmail {
    pub to: String,
    pub to_name: String,
    pub subject: String,
    pub html: String,
    pub text: String,
    pub attachment: Option<PdfAttachment>,
}

/// Delivery seam; the batch loop and handlers only see this trait.
#[async_trait::async_trait]
pub trait Mailer: Send + Sync {
    /// Send one email; returns the message id on acceptance.
    async fn send(&self, email: OutboundEmail) -> Result<String, MailError>;
}

/// [`Mailer`] backed by the lettre async SMTP transport (STARTTLS).
pub struct SmtpMailer {
    config: MailerConfig,
}

impl SmtpMailer {
    pub fn new(config: MailerConfig) -> Self {
        Self { config }
    }

    fn build_message(&self, email: &OutboundEmail, message_id: &str) -> Result<Message, MailError> {
        let from = Mailbox::new(
            Some(self.config.from_name.clone()),
            self.config.from_address.parse()?,
        );
        let to = Mailbox::new(Some(email.to_name.clone()), email.to.parse()?);

        let mut builder = Message::builder()
            .from(from)
            .to(to)
            .subject(email.subject.clone())
            .message_id(Some(message_id.to_owned()));
        if let Some(reply_to) = &self.config.reply_to {
            builder = builder.reply_to(reply_to.parse()?);
        }

        let alternative =
            MultiPart::alternative_plain_html(email.text.clone(), email.html.clone());
        let body = match &email.attachment {
            Some(pdf) => {
                let content_type = ContentType::parse("application/pdf")
                    .map_err(|e| MailError::Build(e.to_string()))?;
                MultiPart::mixed()
                    .multipart(alternative)
                    .singlepart(Attachment::new(pdf.filename.clone()).body(
                        pdf.content.clone(),
                        content_type,
                    ))
            }
            None => alternative,
        };

        builder
            .multipart(body)
            .map_err(|e| MailError::Build(e.to_string()))
    }
}

#[async_trait::async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: OutboundEmail) -> Result<String, MailError> {
        let message_id = format!("<{}@{}>", Uuid::new_v4(), self.config.smtp_host);
        let message = self.build_message(&email, &message_id)?;

        let mut transport_builder =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.smtp_host)?
                .port(self.config.smtp_port);
        if let (Some(user), Some(pass)) = (&self.config.smtp_user, &self.config.smtp_password) {
            transport_builder =
                transport_builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        let transport = transport_builder.build();
        transport.send(message).await?;

        tracing::info!(to = %email.to, subject = %email.subject, "email sent");
        Ok(message_id)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> MailerConfig {
        MailerConfig {
            smtp_host: "smtp.example.com".into(),
            smtp_port: 587,
            from_address: "collections@nicl.local".into(),
            from_name: "NICL Collections".into(),
            reply_to: Some("recovery@nicl.local".into()),
            smtp_user: None,
            smtp_password: None,
        }
    }

    fn email(attachment: Option<PdfAttachment>) -> OutboundEmail {
        OutboundEmail {
            to: "jane.doe@example.com".into(),
            to_name: "Jane Doe".into(),
            subject: "NICL Collections - Payment Reminder - Policy POL-1".into(),
            html: "<p>hello</p>".into(),
            text: "hello".into(),
            attachment,
        }
    }

    #[test]
    fn from_env_returns_none_without_smtp_host() {
        std::env::remove_var("SMTP_HOST");
        assert!(MailerConfig::from_env().is_none());
    }

    #[test]
    fn builds_multipart_message_with_attachment() {
        let mailer = SmtpMailer::new(config());
        let message = mailer
            .build_message(
                &email(Some(PdfAttachment {
                    filename: "POL-1.pdf".into(),
                    content: b"%PDF-1.4".to_vec(),
                })),
                "<test@smtp.example.com>",
            )
            .unwrap();
        let raw = String::from_utf8_lossy(&message.formatted()).into_owned();
        assert!(raw.contains("application/pdf"));
        assert!(raw.contains("POL-1.pdf"));
        assert!(raw.contains("Reply-To"));
        assert!(raw.contains("Payment Reminder"));
    }

    #[test]
    fn builds_plain_message_without_attachment() {
        let mailer = SmtpMailer::new(config());
        let message = mailer
            .build_message(&email(None), "<test@smtp.example.com>")
            .unwrap();
        let raw = String::from_utf8_lossy(&message.formatted()).into_owned();
        assert!(!raw.contains("application/pdf"));
        assert!(raw.contains("text/html"));
    }

    #[test]
    fn bad_recipient_address_is_an_address_error() {
        let mailer = SmtpMailer::new(config());
        let mut bad = email(None);
        bad.to = "not an address".into();
        let err = mailer.build_message(&bad, "<id@x>").unwrap_err();
        assert!(matches!(err, MailError::Address(_)));
    }
}
