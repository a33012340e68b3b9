//! Notification kinds, links and the per-day idempotency key.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::DbId;

// ---------------------------------------------------------------------------
// Kind
// ---------------------------------------------------------------------------

/// Severity shown next to a notification in the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Info,
    Warning,
    Success,
    Error,
}

impl NotificationKind {
    /// The column value stored in `notifications.kind`.
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationKind::Info => "info",
            NotificationKind::Warning => "warning",
            NotificationKind::Success => "success",
            NotificationKind::Error => "error",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "info" => Some(NotificationKind::Info),
            "warning" => Some(NotificationKind::Warning),
            "success" => Some(NotificationKind::Success),
            "error" => Some(NotificationKind::Error),
            _ => None,
        }
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Links
// ---------------------------------------------------------------------------

/// Link to the billing settings page.
pub const BILLING_LINK: &str = "/dashboard/settings/billing";

/// Link to a project's detail page. Deadline alerts for a milestone point here.
pub fn project_link(project_id: DbId) -> String {
    format!("/dashboard/projects/{project_id}")
}

// ---------------------------------------------------------------------------
// Welcome notification
// ---------------------------------------------------------------------------

/// Title of the notification emitted when the pull path upgrades a user.
pub const WELCOME_TITLE: &str = "Welcome to Pro!";

/// Body of the notification emitted when the pull path upgrades a user.
pub const WELCOME_MESSAGE: &str =
    "Your subscription is active. All paid features are now unlocked.";

// ---------------------------------------------------------------------------
// Idempotency key
// ---------------------------------------------------------------------------

/// Build the `(title, link, day)` key used to suppress a second identical
/// notification on the same calendar day.
///
/// The datastore enforces uniqueness of `(user_id, dedupe_key)`.
pub fn dedupe_key(title: &str, link: &str, day: NaiveDate) -> String {
    format!("{day}|{link}|{title}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trips_through_column_value() {
        for kind in [
            NotificationKind::Info,
            NotificationKind::Warning,
            NotificationKind::Success,
            NotificationKind::Error,
        ] {
            assert_eq!(NotificationKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(NotificationKind::parse("critical"), None);
    }

    #[test]
    fn project_link_embeds_id() {
        assert_eq!(project_link(42), "/dashboard/projects/42");
    }

    #[test]
    fn dedupe_key_differs_per_day() {
        let d1 = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2025, 3, 2).unwrap();
        let a = dedupe_key("Milestone Due 1 Week", "/dashboard/projects/1", d1);
        let b = dedupe_key("Milestone Due 1 Week", "/dashboard/projects/1", d2);
        assert_ne!(a, b);
        assert_eq!(a, "2025-03-01|/dashboard/projects/1|Milestone Due 1 Week");
    }
}
