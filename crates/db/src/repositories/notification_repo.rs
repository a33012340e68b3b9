//! Repository for the `notifications` table.

use atrium_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::notification::{NewNotification, Notification};

/// Column list for `notifications` queries.
const COLUMNS: &str = "id, user_id, kind, title, message, link, is_read, created_at";

/// Provides insert and query operations for notifications.
pub struct NotificationRepo;

impl NotificationRepo {
    /// Insert a notification, returning the generated ID.
    ///
    /// Returns `None` when `dedupe_key` is set and the user already has a
    /// notification with that key.
    pub async fn create(
        pool: &PgPool,
        input: &NewNotification,
    ) -> Result<Option<DbId>, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO notifications (user_id, kind, title, message, link, dedupe_key) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (user_id, dedupe_key) DO NOTHING \
             RETURNING id",
        )
        .bind(input.user_id)
        .bind(input.kind.as_str())
        .bind(&input.title)
        .bind(&input.message)
        .bind(&input.link)
        .bind(&input.dedupe_key)
        .fetch_optional(pool)
        .await
    }

    /// Whether the user already has a notification with this title and link
    /// created at or after `since`.
    pub async fn exists_since(
        pool: &PgPool,
        user_id: DbId,
        title: &str,
        link: &str,
        since: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS ( \
                SELECT 1 FROM notifications \
                WHERE user_id = $1 AND title = $2 AND link = $3 AND created_at >= $4 \
             )",
        )
        .bind(user_id)
        .bind(title)
        .bind(link)
        .bind(since)
        .fetch_one(pool)
        .await
    }

    /// List notifications for a user, newest first.
    ///
    /// When `unread_only` is `true`, only notifications with `is_read = false`
    /// are returned.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
        unread_only: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Notification>, sqlx::Error> {
        let filter = if unread_only {
            "AND is_read = false"
        } else {
            ""
        };
        let query = format!(
            "SELECT {COLUMNS} FROM notifications \
             WHERE user_id = $1 {filter} \
             ORDER BY created_at DESC, id DESC \
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, Notification>(&query)
            .bind(user_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Get the number of unread notifications for a user.
    pub async fn unread_count(pool: &PgPool, user_id: DbId) -> Result<i64, sqlx::Error> {
        let count: Option<i64> = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND is_read = false",
        )
        .bind(user_id)
        .fetch_one(pool)
        .await?;
        Ok(count.unwrap_or(0))
    }
}
