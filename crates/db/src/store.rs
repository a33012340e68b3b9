//! Datastore seams used by the reconciler and the notification components.
//!
//! The components only need a handful of row operations, so they depend on
//! these traits rather than on a pool. [`PgStore`](crate::PgStore) is the
//! production implementation; [`MemoryStore`](crate::MemoryStore) backs tests
//! and local tooling.

use async_trait::async_trait;
use atrium_core::entitlement::Tier;
use atrium_core::types::{DbId, Timestamp};

use crate::models::entitlement::Entitlement;
use crate::models::milestone::Milestone;
use crate::models::notification::{NewNotification, Notification};
use crate::models::project::Project;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for datastore operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The underlying database query failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The store refused the operation without reaching a database.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Result of a notification insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// A new row was written with this ID.
    Inserted(DbId),
    /// The `(user_id, dedupe_key)` pair already exists; nothing was written.
    Duplicate,
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Entitlement reads and target-state writes.
#[async_trait]
pub trait EntitlementStore: Send + Sync {
    /// Fetch a user's entitlement, creating a `free` row on first read.
    async fn get_or_create(&self, user_id: DbId) -> Result<Entitlement, StoreError>;

    /// Assign `tier`, optionally recording the billing customer reference.
    ///
    /// A `None` customer keeps the reference already stored.
    async fn set_tier(
        &self,
        user_id: DbId,
        tier: Tier,
        customer_ref: Option<&str>,
    ) -> Result<Entitlement, StoreError>;

    /// Record the billing customer reference without touching the tier.
    async fn set_customer_ref(
        &self,
        user_id: DbId,
        customer_ref: &str,
    ) -> Result<Entitlement, StoreError>;

    /// Find the entitlement that owns `customer_ref`.
    async fn find_by_customer_ref(
        &self,
        customer_ref: &str,
    ) -> Result<Option<Entitlement>, StoreError>;
}

/// Read-only access to projects and their milestones.
#[async_trait]
pub trait ScheduleStore: Send + Sync {
    /// All projects owned by `user_id`.
    async fn list_projects_for_owner(&self, user_id: DbId) -> Result<Vec<Project>, StoreError>;

    /// Pending milestones belonging to any of `project_ids`.
    async fn list_pending_milestones(
        &self,
        project_ids: &[DbId],
    ) -> Result<Vec<Milestone>, StoreError>;
}

/// Per-user notification feed.
#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Insert a notification, honouring its dedupe key.
    async fn insert(&self, input: &NewNotification) -> Result<InsertOutcome, StoreError>;

    /// Whether the user has a notification with this title and link created
    /// at or after `since`.
    async fn exists_since(
        &self,
        user_id: DbId,
        title: &str,
        link: &str,
        since: Timestamp,
    ) -> Result<bool, StoreError>;

    /// List a user's notifications, newest first.
    async fn list_for_user(
        &self,
        user_id: DbId,
        unread_only: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Notification>, StoreError>;

    /// Number of unread notifications for a user.
    async fn unread_count(&self, user_id: DbId) -> Result<i64, StoreError>;
}
