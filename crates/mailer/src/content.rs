//! Tier-toned message composition.
//!
//! The wording escalates with the recovery category: L0 is a friendly
//! reminder, L1 a formal notice, L2 an urgent final notice and MED a legal
//! notice carrying the mise-en-demeure warning block. Both an HTML and a
//! plain-text body are produced for every email.

use letterdesk_core::category::RecoveryCategory;
use letterdesk_core::roster::Recipient;

/// Subject and both bodies for one outbound email.
#[derive(Debug, Clone)]
pub struct EmailContent {
    pub subject: String,
    pub html: String,
    pub text: String,
}

/// Lead paragraph for the tier's wording register.
fn tone_paragraph(category: RecoveryCategory) -> &'static str {
    match category.tone_profile().tone {
        "friendly" => {
            "This is a friendly reminder that a premium payment on your \
             insurance policy is currently overdue. We would appreciate your \
             prompt settlement of the amount below."
        }
        "formal" => {
            "Our records show that the premium on your insurance policy \
             remains unpaid despite our previous reminder. Please settle the \
             outstanding amount below without further delay."
        }
        "urgent" => {
            "Despite previous notices, the premium arrears on your insurance \
             policy remain outstanding. Immediate settlement is required to \
             avoid suspension of your cover."
        }
        _ => {
            "This letter constitutes a formal notice (mise en demeure) in \
             respect of the unpaid premium on your insurance policy. You are \
             required to settle the full outstanding amount within the period \
             stated in the attached notice."
        }
    }
}

/// `Rs 12,345.67` display with thousands grouping.
fn format_amount(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = cents / 100;
    let frac = cents % 100;
    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    let sign = if amount < 0.0 { "-" } else { "" };
    format!("Rs {sign}{grouped}.{frac:02}")
}

const PAYMENT_METHODS: &str = "Payments can be made at any of our branches, \
by bank transfer quoting your policy number, or through our online portal.";

const LEGAL_WARNING: &str = "Failing settlement within the stated period, \
this matter will be referred for legal action without further notice, and \
any resulting costs will be borne by you.";

/// Compose the outbound email for a recipient.
///
/// The subject is `"<sender> - <notice title> - Policy <no>"`, the format the
/// collections team filters their sent folder by.
pub fn compose(sender_name: &str, recipient: &Recipient) -> EmailContent {
    let profile = recipient.category.tone_profile();
    let subject = format!(
        "{sender_name} - {} - Policy {}",
        profile.title, recipient.policy_no
    );
    let amount = format_amount(recipient.arrears);
    let lead = tone_paragraph(recipient.category);
    let legal = recipient.category == RecoveryCategory::Med;

    let mut html = format!(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <div style="background-color: {color}; color: #ffffff; padding: 16px 24px;">
    <h2 style="margin: 0;">{title}</h2>
  </div>
  <div style="padding: 24px;">
    <p>Dear {name},</p>
    <p>{lead}</p>
    <table style="border-collapse: collapse; margin: 16px 0;">
      <tr><td style="padding: 4px 12px 4px 0;"><strong>Policy number</strong></td><td>{policy}</td></tr>
      <tr><td style="padding: 4px 12px 4px 0;"><strong>Amount due</strong></td><td>{amount}</td></tr>
    </table>
    <p>{payment}</p>
"#,
        color = profile.color,
        title = profile.title,
        name = recipient.name,
        lead = lead,
        policy = recipient.policy_no,
        amount = amount,
        payment = PAYMENT_METHODS,
    );
    if legal {
        html.push_str(&format!(
            r#"    <p style="border-left: 4px solid {}; padding-left: 12px;"><strong>{LEGAL_WARNING}</strong></p>
"#,
            profile.color
        ));
    }
    html.push_str(
        r#"    <p>The corresponding notice is attached to this email.</p>
    <p>Kind regards,<br/>Collections Department</p>
  </div>
</div>"#,
    );

    let mut text = format!(
        "{title}\n\nDear {name},\n\n{lead}\n\nPolicy number: {policy}\nAmount due: {amount}\n\n{payment}\n",
        title = profile.title,
        name = recipient.name,
        lead = lead,
        policy = recipient.policy_no,
        amount = amount,
        payment = PAYMENT_METHODS,
    );
    if legal {
        text.push('\n');
        text.push_str(LEGAL_WARNING);
        text.push('\n');
    }
    text.push_str("\nThe corresponding notice is attached to this email.\n\nKind regards,\nCollections Department\n");

    EmailContent {
        subject,
        html,
        text,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
