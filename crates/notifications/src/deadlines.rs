//! Deadline notification generator.
//!
//! Recomputes every run from the current schedule; there is no "last seen"
//! cursor. Idempotency within a calendar day comes from the sink's daily
//! check and the `(user_id, dedupe_key)` unique constraint behind it.

use std::collections::HashMap;
use std::sync::Arc;

use atrium_core::deadlines::{Checkpoint, ReferenceZone};
use atrium_core::notification::project_link;
use atrium_core::types::{DbId, Timestamp};
use atrium_db::{ScheduleStore, StoreError};
use chrono::Utc;
use serde::Serialize;

use crate::sink::{DailyAlert, Delivery, NotificationSink};

/// Per-run tally of the generator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeadlineReport {
    /// Milestones whose lead time landed on a checkpoint today.
    pub matched: usize,
    /// Notifications written by this run.
    pub created: usize,
    /// Matches already notified earlier today.
    pub skipped: usize,
    /// Matches whose write failed.
    pub failed: usize,
}

/// Scans a user's pending milestones and raises checkpoint alerts.
#[derive(Clone)]
pub struct DeadlineNotifier {
    schedule: Arc<dyn ScheduleStore>,
    sink: NotificationSink,
    zone: ReferenceZone,
}

impl DeadlineNotifier {
    pub fn new(schedule: Arc<dyn ScheduleStore>, sink: NotificationSink, zone: ReferenceZone) -> Self {
        Self {
            schedule,
            sink,
            zone,
        }
    }

    pub fn zone(&self) -> ReferenceZone {
        self.zone
    }

    /// Run against the wall clock.
    pub async fn run_now(&self, user_id: DbId) -> Result<DeadlineReport, StoreError> {
        self.run(user_id, Utc::now()).await
    }

    /// Raise alerts for every pending milestone of `user_id` that hits a
    /// checkpoint on the calendar day of `now`.
    ///
    /// Failing to load the schedule is an error. A failed write for one
    /// milestone is logged and counted; the remaining milestones still run.
    pub async fn run(&self, user_id: DbId, now: Timestamp) -> Result<DeadlineReport, StoreError> {
        let mut report = DeadlineReport::default();

        let projects = self.schedule.list_projects_for_owner(user_id).await?;
        if projects.is_empty() {
            return Ok(report);
        }

        let project_ids: Vec<DbId> = projects.iter().map(|p| p.id).collect();
        let milestones = self.schedule.list_pending_milestones(&project_ids).await?;
        let names: HashMap<DbId, &str> = projects.iter().map(|p| (p.id, p.name.as_str())).collect();

        let today = self.zone.today(now);

        for milestone in &milestones {
            let Some(due) = milestone.due_date else {
                continue;
            };
            let Some(checkpoint) = Checkpoint::matching(self.zone.days_until_due(today, due)) else {
                continue;
            };
            // Projects were loaded for this owner; a milestone outside them is a store bug.
            let Some(project_name) = names.get(&milestone.project_id) else {
                tracing::error!(
                    user_id,
                    milestone_id = milestone.id,
                    project_id = milestone.project_id,
                    "Milestone returned for a project the user does not own",
                );
                continue;
            };
            report.matched += 1;

            let alert = DailyAlert {
                user_id,
                kind: checkpoint.kind(),
                title: checkpoint.title(),
                message: checkpoint.message(&milestone.title, project_name, due),
                link: project_link(milestone.project_id),
            };

            match self.sink.notify_once_per_day(alert, self.zone, now).await {
                Ok(Delivery::Created(notification_id)) => {
                    report.created += 1;
                    tracing::debug!(
                        user_id,
                        milestone_id = milestone.id,
                        notification_id,
                        checkpoint = checkpoint.label(),
                        "Deadline alert created",
                    );
                }
                Ok(Delivery::AlreadyNotified) => report.skipped += 1,
                Err(e) => {
                    report.failed += 1;
                    tracing::error!(
                        user_id,
                        milestone_id = milestone.id,
                        project_id = milestone.project_id,
                        error = %e,
                        "Failed to write deadline alert",
                    );
                }
            }
        }

        tracing::info!(
            user_id,
            %today,
            matched = report.matched,
            created = report.created,
            skipped = report.skipped,
            failed = report.failed,
            "Deadline scan complete",
        );

        Ok(report)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
