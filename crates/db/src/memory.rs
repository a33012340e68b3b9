//! In-process implementation of the [`store`](crate::store) traits.
//!
//! Mirrors the PostgreSQL semantics the components rely on: lazily created
//! entitlements, upserts that keep an existing customer reference, and the
//! `(user_id, dedupe_key)` uniqueness of notifications. It also exposes
//! seeding helpers, a settable clock for `created_at`, and switches that make
//! selected operations fail.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use atrium_core::entitlement::Tier;
use atrium_core::types::{DbId, Timestamp};
use chrono::{NaiveDate, Utc};

use crate::models::entitlement::Entitlement;
use crate::models::milestone::Milestone;
use crate::models::notification::{NewNotification, Notification};
use crate::models::project::Project;
use crate::store::{EntitlementStore, InsertOutcome, NotificationStore, ScheduleStore, StoreError};

#[derive(Default)]
struct Tables {
    next_id: DbId,
    entitlements: HashMap<DbId, Entitlement>,
    projects: Vec<Project>,
    milestones: Vec<Milestone>,
    notifications: Vec<(Notification, Option<String>)>,
}

impl Tables {
    fn next_id(&mut self) -> DbId {
        self.next_id += 1;
        self.next_id
    }
}

/// Store holding every table in memory behind a mutex.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    clock: Mutex<Option<Timestamp>>,
    entitlement_writes: AtomicUsize,
    fail_entitlement_writes: AtomicBool,
    fail_schedule_reads: AtomicBool,
    failing_links: Mutex<HashSet<String>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // -- Clock -------------------------------------------------------------

    /// Freeze the time used for `created_at` / `updated_at`.
    pub fn set_now(&self, now: Timestamp) {
        *lock(&self.clock) = Some(now);
    }

    fn now(&self) -> Timestamp {
        (*lock(&self.clock)).unwrap_or_else(Utc::now)
    }

    // -- Failure switches --------------------------------------------------

    /// Make every entitlement write fail until switched off.
    pub fn fail_entitlement_writes(&self, fail: bool) {
        self.fail_entitlement_writes.store(fail, Ordering::SeqCst);
    }

    /// Make project and milestone reads fail until switched off.
    pub fn fail_schedule_reads(&self, fail: bool) {
        self.fail_schedule_reads.store(fail, Ordering::SeqCst);
    }

    /// Make notification inserts with this link fail.
    pub fn fail_notifications_for_link(&self, link: impl Into<String>) {
        lock(&self.failing_links).insert(link.into());
    }

    // -- Seeding and inspection --------------------------------------------

    /// Insert a project owned by `owner_user_id`.
    pub fn add_project(&self, owner_user_id: DbId, name: &str) -> Project {
        let now = self.now();
        let mut tables = lock(&self.tables);
        let project = Project {
            id: tables.next_id(),
            owner_user_id,
            name: name.to_string(),
            created_at: now,
            updated_at: now,
        };
        tables.projects.push(project.clone());
        project
    }

    /// Insert a milestone under `project_id`.
    pub fn add_milestone(
        &self,
        project_id: DbId,
        title: &str,
        due_date: Option<NaiveDate>,
        status: &str,
    ) -> Milestone {
        let now = self.now();
        let mut tables = lock(&self.tables);
        let milestone = Milestone {
            id: tables.next_id(),
            project_id,
            title: title.to_string(),
            due_date,
            status: status.to_string(),
            created_at: now,
            updated_at: now,
        };
        tables.milestones.push(milestone.clone());
        milestone
    }

    /// The stored entitlement, without creating one.
    pub fn entitlement(&self, user_id: DbId) -> Option<Entitlement> {
        lock(&self.tables).entitlements.get(&user_id).cloned()
    }

    /// Every notification for `user_id`, oldest first.
    pub fn notifications_for(&self, user_id: DbId) -> Vec<Notification> {
        lock(&self.tables)
            .notifications
            .iter()
            .filter(|(n, _)| n.user_id == user_id)
            .map(|(n, _)| n.clone())
            .collect()
    }

    /// Number of successful entitlement writes (tier or customer changes).
    pub fn entitlement_writes(&self) -> usize {
        self.entitlement_writes.load(Ordering::SeqCst)
    }

    fn check_entitlement_write(&self) -> Result<(), StoreError> {
        if self.fail_entitlement_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("entitlement writes disabled".into()));
        }
        Ok(())
    }

    fn upsert_entitlement(
        &self,
        user_id: DbId,
        apply: impl FnOnce(&mut Entitlement),
    ) -> Result<Entitlement, StoreError> {
        self.check_entitlement_write()?;
        let now = self.now();
        let mut tables = lock(&self.tables);
        let row = tables
            .entitlements
            .entry(user_id)
            .or_insert_with(|| new_entitlement(user_id, now));
        apply(row);
        row.updated_at = now;
        let row = row.clone();
        self.entitlement_writes.fetch_add(1, Ordering::SeqCst);
        Ok(row)
    }
}

fn new_entitlement(user_id: DbId, now: Timestamp) -> Entitlement {
    Entitlement {
        user_id,
        tier: Tier::Free.as_str().to_string(),
        billing_customer_ref: None,
        created_at: now,
        updated_at: now,
    }
}

#[async_trait]
impl EntitlementStore for MemoryStore {
    async fn get_or_create(&self, user_id: DbId) -> Result<Entitlement, StoreError> {
        let now = self.now();
        let mut tables = lock(&self.tables);
        Ok(tables
            .entitlements
            .entry(user_id)
            .or_insert_with(|| new_entitlement(user_id, now))
            .clone())
    }

    async fn set_tier(
        &self,
        user_id: DbId,
        tier: Tier,
        customer_ref: Option<&str>,
    ) -> Result<Entitlement, StoreError> {
        self.upsert_entitlement(user_id, |row| {
            row.tier = tier.as_str().to_string();
            if let Some(customer_ref) = customer_ref {
                row.billing_customer_ref = Some(customer_ref.to_string());
            }
        })
    }

    async fn set_customer_ref(
        &self,
        user_id: DbId,
        customer_ref: &str,
    ) -> Result<Entitlement, StoreError> {
        self.upsert_entitlement(user_id, |row| {
            row.billing_customer_ref = Some(customer_ref.to_string());
        })
    }

    async fn find_by_customer_ref(
        &self,
        customer_ref: &str,
    ) -> Result<Option<Entitlement>, StoreError> {
        Ok(lock(&self.tables)
            .entitlements
            .values()
            .find(|e| e.billing_customer_ref.as_deref() == Some(customer_ref))
            .cloned())
    }
}

#[async_trait]
impl ScheduleStore for MemoryStore {
    async fn list_projects_for_owner(&self, user_id: DbId) -> Result<Vec<Project>, StoreError> {
        if self.fail_schedule_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("schedule reads disabled".into()));
        }
        Ok(lock(&self.tables)
            .projects
            .iter()
            .filter(|p| p.owner_user_id == user_id)
            .cloned()
            .collect())
    }

    async fn list_pending_milestones(
        &self,
        project_ids: &[DbId],
    ) -> Result<Vec<Milestone>, StoreError> {
        if self.fail_schedule_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("schedule reads disabled".into()));
        }
        Ok(lock(&self.tables)
            .milestones
            .iter()
            .filter(|m| m.is_pending() && project_ids.contains(&m.project_id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn insert(&self, input: &NewNotification) -> Result<InsertOutcome, StoreError> {
        if let Some(link) = &input.link {
            if lock(&self.failing_links).contains(link) {
                return Err(StoreError::Unavailable(format!("inserts for {link} disabled")));
            }
        }

        let now = self.now();
        let mut tables = lock(&self.tables);
        if let Some(key) = &input.dedupe_key {
            let taken = tables
                .notifications
                .iter()
                .any(|(n, k)| n.user_id == input.user_id && k.as_ref() == Some(key));
            if taken {
                return Ok(InsertOutcome::Duplicate);
            }
        }

        let id = tables.next_id();
        let row = Notification {
            id,
            user_id: input.user_id,
            kind: input.kind.as_str().to_string(),
            title: input.title.clone(),
            message: input.message.clone(),
            link: input.link.clone(),
            is_read: false,
            created_at: now,
        };
        tables.notifications.push((row, input.dedupe_key.clone()));
        Ok(InsertOutcome::Inserted(id))
    }

    async fn exists_since(
        &self,
        user_id: DbId,
        title: &str,
        link: &str,
        since: Timestamp,
    ) -> Result<bool, StoreError> {
        Ok(lock(&self.tables).notifications.iter().any(|(n, _)| {
            n.user_id == user_id
                && n.title == title
                && n.link.as_deref() == Some(link)
                && n.created_at >= since
        }))
    }

    async fn list_for_user(
        &self,
        user_id: DbId,
        unread_only: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Notification>, StoreError> {
        let mut rows: Vec<Notification> = lock(&self.tables)
            .notifications
            .iter()
            .map(|(n, _)| n)
            .filter(|n| n.user_id == user_id && (!unread_only || !n.is_read))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(rows
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(0))
            .take(usize::try_from(limit).unwrap_or(0))
            .collect())
    }

    async fn unread_count(&self, user_id: DbId) -> Result<i64, StoreError> {
        let count = lock(&self.tables)
            .notifications
            .iter()
            .filter(|(n, _)| n.user_id == user_id && !n.is_read)
            .count();
        Ok(count as i64)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
