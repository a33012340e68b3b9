//! Entitlement tiers and the provider evidence that moves a user between them.
//!
//! A tier only ever changes on explicit evidence from the billing provider:
//! an active subscription promotes to [`Tier::Paid`], a cancelled or expired
//! one demotes to [`Tier::Free`]. Every other status (or no data at all)
//! leaves the stored tier untouched.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Tier
// ---------------------------------------------------------------------------

/// Text value stored in `entitlements.tier` for free users.
pub const TIER_FREE: &str = "free";

/// Text value stored in `entitlements.tier` for paying users.
pub const TIER_PAID: &str = "paid";

/// A user's paid-feature access level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    #[default]
    Free,
    Paid,
}

impl Tier {
    /// The column value for this tier.
    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Free => TIER_FREE,
            Tier::Paid => TIER_PAID,
        }
    }

    /// Parse a stored column value. Unknown values yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            TIER_FREE => Some(Tier::Free),
            TIER_PAID => Some(Tier::Paid),
            _ => None,
        }
    }

    pub fn is_paid(self) -> bool {
        self == Tier::Paid
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Subscription status evidence
// ---------------------------------------------------------------------------

/// Provider subscription statuses that confirm paid access.
pub const ACTIVE_STATUSES: &[&str] = &["active", "trialing"];

/// Provider subscription statuses that explicitly end paid access.
pub const TERMINAL_STATUSES: &[&str] = &["canceled", "unpaid", "incomplete_expired"];

/// Map a provider subscription status to the tier it is evidence for.
///
/// Returns `None` for transitional statuses (`past_due`, `incomplete`,
/// `paused`, unknown values): those are not evidence either way.
pub fn tier_evidence(status: &str) -> Option<Tier> {
    if ACTIVE_STATUSES.contains(&status) {
        Some(Tier::Paid)
    } else if TERMINAL_STATUSES.contains(&status) {
        Some(Tier::Free)
    } else {
        None
    }
}

/// Whether a provider subscription status grants paid access.
pub fn is_active_status(status: &str) -> bool {
    tier_evidence(status) == Some(Tier::Paid)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_tier_is_free() {
        assert_eq!(Tier::default(), Tier::Free);
    }

    #[test]
    fn tier_round_trips_through_column_value() {
        assert_eq!(Tier::parse(Tier::Paid.as_str()), Some(Tier::Paid));
        assert_eq!(Tier::parse(Tier::Free.as_str()), Some(Tier::Free));
    }

    #[test]
    fn unknown_tier_value_is_rejected() {
        assert_eq!(Tier::parse("enterprise"), None);
        assert_eq!(Tier::parse("PAID"), None);
    }

    #[test]
    fn tier_serializes_lowercase() {
        let json = serde_json::to_string(&Tier::Paid).unwrap();
        assert_eq!(json, "\"paid\"");
    }

    #[test]
    fn active_and_trialing_are_paid_evidence() {
        assert_eq!(tier_evidence("active"), Some(Tier::Paid));
        assert_eq!(tier_evidence("trialing"), Some(Tier::Paid));
        assert!(is_active_status("active"));
    }

    #[test]
    fn terminal_statuses_are_free_evidence() {
        for status in TERMINAL_STATUSES {
            assert_eq!(tier_evidence(status), Some(Tier::Free), "{status}");
        }
    }

    #[test]
    fn transitional_statuses_are_not_evidence() {
        for status in ["past_due", "incomplete", "paused", "", "something_new"] {
            assert_eq!(tier_evidence(status), None, "{status}");
            assert!(!is_active_status(status));
        }
    }
}
