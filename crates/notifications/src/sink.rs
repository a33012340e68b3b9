//! The write path into a user's notification feed.

use std::sync::Arc;

use atrium_core::deadlines::ReferenceZone;
use atrium_core::notification::{dedupe_key, NotificationKind};
use atrium_core::types::{DbId, Timestamp};
use atrium_db::models::notification::NewNotification;
use atrium_db::{InsertOutcome, NotificationStore, StoreError};

/// What happened to a notification handed to the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// A new notification row was written.
    Created(DbId),
    /// An identical notification was already issued today; nothing written.
    AlreadyNotified,
}

/// A notification that must reach a user at most once per calendar day.
///
/// Identity is `(user_id, title, link, day)`.
#[derive(Debug, Clone)]
pub struct DailyAlert {
    pub user_id: DbId,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub link: String,
}

/// Shared handle used by every component that writes notifications.
#[derive(Clone)]
pub struct NotificationSink {
    store: Arc<dyn NotificationStore>,
}

impl NotificationSink {
    pub fn new(store: Arc<dyn NotificationStore>) -> Self {
        Self { store }
    }

    /// The underlying store, for feed reads.
    pub fn store(&self) -> &Arc<dyn NotificationStore> {
        &self.store
    }

    /// Write a notification unconditionally.
    ///
    /// Callers that need idempotency guard the call themselves.
    pub async fn notify(&self, input: NewNotification) -> Result<Delivery, StoreError> {
        let outcome = self.store.insert(&input).await?;
        tracing::debug!(
            user_id = input.user_id,
            kind = %input.kind,
            title = %input.title,
            "Notification written",
        );
        Ok(delivery(outcome))
    }

    /// Write `alert` unless the user already received it today.
    ///
    /// "Today" is the calendar date of `now` in `zone`. The existing-row check
    /// is backed by a unique `(user_id, dedupe_key)` constraint, so two
    /// concurrent callers that both pass the check still produce one row.
    pub async fn notify_once_per_day(
        &self,
        alert: DailyAlert,
        zone: ReferenceZone,
        now: Timestamp,
    ) -> Result<Delivery, StoreError> {
        let today = zone.today(now);
        let start_of_today = zone.start_of_day(today);

        let already = self
            .store
            .exists_since(alert.user_id, &alert.title, &alert.link, start_of_today)
            .await?;
        if already {
            return Ok(Delivery::AlreadyNotified);
        }

        let key = dedupe_key(&alert.title, &alert.link, today);
        let input = NewNotification {
            user_id: alert.user_id,
            kind: alert.kind,
            title: alert.title,
            message: alert.message,
            link: Some(alert.link),
            dedupe_key: Some(key),
        };
        let outcome = self.store.insert(&input).await?;
        if outcome == InsertOutcome::Duplicate {
            tracing::debug!(
                user_id = input.user_id,
                title = %input.title,
                "Concurrent insert already issued this alert today",
            );
        }
        Ok(delivery(outcome))
    }
}

fn delivery(outcome: InsertOutcome) -> Delivery {
    match outcome {
        InsertOutcome::Inserted(id) => Delivery::Created(id),
        InsertOutcome::Duplicate => Delivery::AlreadyNotified,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use atrium_db::MemoryStore;
    use chrono::{Duration, TimeZone, Utc};

    use super::*;

    fn alert(user_id: DbId) -> DailyAlert {
        DailyAlert {
            user_id,
            kind: NotificationKind::Warning,
            title: "Milestone Due 1 Week".into(),
            message: "\"Launch\" in project \"Apollo\" is due soon.".into(),
            link: "/dashboard/projects/3".into(),
        }
    }

    fn setup() -> (Arc<MemoryStore>, NotificationSink) {
        let store = Arc::new(MemoryStore::new());
        let sink = NotificationSink::new(store.clone());
        (store, sink)
    }

    #[tokio::test]
    async fn second_alert_on_same_day_is_suppressed() {
        let (store, sink) = setup();
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
        store.set_now(now);

        let first = sink.notify_once_per_day(alert(1), ReferenceZone::utc(), now).await;
        assert_matches!(first, Ok(Delivery::Created(_)));

        let later = now + Duration::hours(5);
        store.set_now(later);
        let second = sink.notify_once_per_day(alert(1), ReferenceZone::utc(), later).await;
        assert_matches!(second, Ok(Delivery::AlreadyNotified));

        assert_eq!(store.notifications_for(1).len(), 1);
    }

    #[tokio::test]
    async fn same_alert_next_day_is_written_again() {
        let (store, sink) = setup();
        let day1 = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
        store.set_now(day1);
        sink.notify_once_per_day(alert(1), ReferenceZone::utc(), day1)
            .await
            .unwrap();

        let day2 = day1 + Duration::days(1);
        store.set_now(day2);
        let next = sink.notify_once_per_day(alert(1), ReferenceZone::utc(), day2).await;
        assert_matches!(next, Ok(Delivery::Created(_)));
        assert_eq!(store.notifications_for(1).len(), 2);
    }

    #[tokio::test]
    async fn unique_key_catches_a_row_the_read_missed() {
        let (store, sink) = setup();
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();

        // A row stamped before the start of today is invisible to the read
        // check but still holds today's key.
        store.set_now(now - Duration::days(3));
        let today = ReferenceZone::utc().today(now);
        let a = alert(1);
        store
            .insert(&NewNotification {
                user_id: 1,
                kind: a.kind,
                title: a.title.clone(),
                message: a.message.clone(),
                link: Some(a.link.clone()),
                dedupe_key: Some(dedupe_key(&a.title, &a.link, today)),
            })
            .await
            .unwrap();

        let result = sink.notify_once_per_day(a, ReferenceZone::utc(), now).await;
        assert_matches!(result, Ok(Delivery::AlreadyNotified));
    }

    #[tokio::test]
    async fn notify_writes_unconditionally() {
        let (store, sink) = setup();
        let input = NewNotification {
            user_id: 4,
            kind: NotificationKind::Success,
            title: "Welcome to Pro!".into(),
            message: "hi".into(),
            link: None,
            dedupe_key: None,
        };
        sink.notify(input.clone()).await.unwrap();
        sink.notify(input).await.unwrap();
        assert_eq!(store.notifications_for(4).len(), 2);
    }

    #[tokio::test]
    async fn store_failure_is_returned() {
        let (store, sink) = setup();
        store.fail_notifications_for_link("/dashboard/projects/3");
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
        let result = sink.notify_once_per_day(alert(1), ReferenceZone::utc(), now).await;
        assert_matches!(result, Err(StoreError::Unavailable(_)));
    }
}
