//! Recovery categories (escalation tiers) and their tone metadata.
//!
//! The four tiers are a closed set: L0 (friendly reminder), L1 (formal
//! notice), L2 (urgent notice) and MED (legal notice / mise en demeure).
//! Roster rows carry a free-text recovery action such as `"SMS 2 + L0"`;
//! [`RecoveryCategory::from_action`] derives the tier by substring
//! containment and defaults to L0.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// One of the four fixed escalation tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecoveryCategory {
    #[serde(rename = "L0")]
    L0,
    #[serde(rename = "L1")]
    L1,
    #[serde(rename = "L2")]
    L2,
    #[serde(rename = "MED")]
    Med,
}

/// All tiers in escalation order.
pub const ALL_CATEGORIES: [RecoveryCategory; 4] = [
    RecoveryCategory::L0,
    RecoveryCategory::L1,
    RecoveryCategory::L2,
    RecoveryCategory::Med,
];

/// Tone metadata used when composing the outbound email for a tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ToneProfile {
    /// Human-readable notice title, e.g. "Final Payment Notice".
    pub title: &'static str,
    /// Escalation urgency, `low` through `critical`.
    pub urgency: &'static str,
    /// Accent colour for the HTML template.
    pub color: &'static str,
    /// Wording register: `friendly`, `formal`, `urgent` or `legal`.
    pub tone: &'static str,
}

impl RecoveryCategory {
    /// The marker substring used in roster data and directory naming.
    pub fn tag(self) -> &'static str {
        match self {
            Self::L0 => "L0",
            Self::L1 => "L1",
            Self::L2 => "L2",
            Self::Med => "MED",
        }
    }

    /// Derive a tier from a free-text recovery action.
    ///
    /// Containment test in escalation order; anything unrecognised (including
    /// an empty string) falls back to L0.
    pub fn from_action(action: &str) -> Self {
        for category in ALL_CATEGORIES {
            if action.contains(category.tag()) {
                return category;
            }
        }
        Self::L0
    }

    /// Subject-line notice name for the tier.
    pub fn notice_title(self) -> &'static str {
        self.tone_profile().title
    }

    /// Tone metadata for email composition.
    pub fn tone_profile(self) -> ToneProfile {
        match self {
            Self::L0 => ToneProfile {
                title: "Payment Reminder",
                urgency: "low",
                color: "#f59e0b",
                tone: "friendly",
            },
            Self::L1 => ToneProfile {
                title: "First Payment Notice",
                urgency: "medium",
                color: "#f97316",
                tone: "formal",
            },
            Self::L2 => ToneProfile {
                title: "Final Payment Notice",
                urgency: "high",
                color: "#dc2626",
                tone: "urgent",
            },
            Self::Med => ToneProfile {
                title: "Legal Notice (Mise en Demeure)",
                urgency: "critical",
                color: "#991b1b",
                tone: "legal",
            },
        }
    }
}

impl fmt::Display for RecoveryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for RecoveryCategory {
    type Err = CoreError;

    /// Parse an exact tier tag (case-insensitive), e.g. from a URL segment.
    ///
    /// Unlike [`RecoveryCategory::from_action`] this rejects unknown input
    /// instead of defaulting, so route parameters cannot silently select L0.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "L0" => Ok(Self::L0),
            "L1" => Ok(Self::L1),
            "L2" => Ok(Self::L2),
            "MED" => Ok(Self::Med),
            other => Err(CoreError::Validation(format!(
                "invalid recovery category: {other}"
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
    fn from_action_matches_embedded_tag() {
        assert_eq!(
            RecoveryCategory::from_action("SMS 2 + L0"),
            RecoveryCategory::L0
        );
        assert_eq!(RecoveryCategory::from_action("L1"), RecoveryCategory::L1);
        assert_eq!(
            RecoveryCategory::from_action("escalate to L2"),
            RecoveryCategory::L2
        );
        assert_eq!(
            RecoveryCategory::from_action("MED referral"),
            RecoveryCategory::Med
        );
    }

    #[test]
    fn from_action_defaults_to_l0() {
        assert_eq!(RecoveryCategory::from_action(""), RecoveryCategory::L0);
        assert_eq!(
            RecoveryCategory::from_action("no tier here"),
            RecoveryCategory::L0
        );
    }

    #[test]
    fn from_str_is_strict() {
        assert_eq!(
            "med".parse::<RecoveryCategory>().unwrap(),
            RecoveryCategory::Med
        );
        assert!("L9".parse::<RecoveryCategory>().is_err());
        assert!("".parse::<RecoveryCategory>().is_err());
    }

    #[test]
    fn serde_uses_tags() {
        let json = serde_json::to_string(&RecoveryCategory::Med).unwrap();
        assert_eq!(json, "\"MED\"");
        let back: RecoveryCategory = serde_json::from_str("\"L2\"").unwrap();
        assert_eq!(back, RecoveryCategory::L2);
    }

    #[test]
    fn tone_escalates_with_tier() {
        assert_eq!(RecoveryCategory::L0.tone_profile().tone, "friendly");
        assert_eq!(RecoveryCategory::Med.tone_profile().urgency, "critical");
        assert_eq!(
            RecoveryCategory::Med.notice_title(),
            "Legal Notice (Mise en Demeure)"
        );
    }
}
