//! PostgreSQL implementation of the [`store`](crate::store) traits.

use async_trait::async_trait;
use atrium_core::entitlement::Tier;
use atrium_core::types::{DbId, Timestamp};

use crate::models::entitlement::Entitlement;
use crate::models::milestone::Milestone;
use crate::models::notification::{NewNotification, Notification};
use crate::models::project::Project;
use crate::repositories::{EntitlementRepo, MilestoneRepo, NotificationRepo, ProjectRepo};
use crate::store::{EntitlementStore, InsertOutcome, NotificationStore, ScheduleStore, StoreError};
use crate::DbPool;

/// Store backed by a PostgreSQL pool. Cheap to clone.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl EntitlementStore for PgStore {
    async fn get_or_create(&self, user_id: DbId) -> Result<Entitlement, StoreError> {
        Ok(EntitlementRepo::get_or_create(&self.pool, user_id).await?)
    }

    async fn set_tier(
        &self,
        user_id: DbId,
        tier: Tier,
        customer_ref: Option<&str>,
    ) -> Result<Entitlement, StoreError> {
        Ok(EntitlementRepo::set_tier(&self.pool, user_id, tier, customer_ref).await?)
    }

    async fn set_customer_ref(
        &self,
        user_id: DbId,
        customer_ref: &str,
    ) -> Result<Entitlement, StoreError> {
        Ok(EntitlementRepo::set_customer_ref(&self.pool, user_id, customer_ref).await?)
    }

    async fn find_by_customer_ref(
        &self,
        customer_ref: &str,
    ) -> Result<Option<Entitlement>, StoreError> {
        Ok(EntitlementRepo::find_by_customer_ref(&self.pool, customer_ref).await?)
    }
}

#[async_trait]
impl ScheduleStore for PgStore {
    async fn list_projects_for_owner(&self, user_id: DbId) -> Result<Vec<Project>, StoreError> {
        Ok(ProjectRepo::list_for_owner(&self.pool, user_id).await?)
    }

    async fn list_pending_milestones(
        &self,
        project_ids: &[DbId],
    ) -> Result<Vec<Milestone>, StoreError> {
        Ok(MilestoneRepo::list_pending_for_projects(&self.pool, project_ids).await?)
    }
}

#[async_trait]
impl NotificationStore for PgStore {
    async fn insert(&self, input: &NewNotification) -> Result<InsertOutcome, StoreError> {
        let outcome = match NotificationRepo::create(&self.pool, input).await? {
            Some(id) => InsertOutcome::Inserted(id),
            None => InsertOutcome::Duplicate,
        };
        Ok(outcome)
    }

    async fn exists_since(
        &self,
        user_id: DbId,
        title: &str,
        link: &str,
        since: Timestamp,
    ) -> Result<bool, StoreError> {
        Ok(NotificationRepo::exists_since(&self.pool, user_id, title, link, since).await?)
    }

    async fn list_for_user(
        &self,
        user_id: DbId,
        unread_only: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Notification>, StoreError> {
        Ok(NotificationRepo::list_for_user(&self.pool, user_id, unread_only, limit, offset).await?)
    }

    async fn unread_count(&self, user_id: DbId) -> Result<i64, StoreError> {
        Ok(NotificationRepo::unread_count(&self.pool, user_id).await?)
    }
}
