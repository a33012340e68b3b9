//! Notification entity model and DTOs.

use atrium_core::notification::NotificationKind;
use atrium_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `notifications` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Notification {
    pub id: DbId,
    pub user_id: DbId,
    pub kind: String,
    pub title: String,
    pub message: String,
    pub link: Option<String>,
    pub is_read: bool,
    pub created_at: Timestamp,
}

/// DTO for inserting a notification.
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: DbId,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub link: Option<String>,
    /// When set, a second insert with the same `(user_id, dedupe_key)` is
    /// rejected by the datastore and reported as a duplicate.
    pub dedupe_key: Option<String>,
}
