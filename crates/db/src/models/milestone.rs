//! Milestone (schedule item) entity model.

use atrium_core::types::{DbId, Timestamp};
use chrono::NaiveDate;
use serde::Serialize;
use sqlx::FromRow;

/// `milestones.status` value for milestones still open.
pub const MILESTONE_PENDING: &str = "pending";

/// `milestones.status` value for completed milestones.
pub const MILESTONE_DONE: &str = "done";

/// A row from the `milestones` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Milestone {
    pub id: DbId,
    pub project_id: DbId,
    pub title: String,
    pub due_date: Option<NaiveDate>,
    pub status: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Milestone {
    pub fn is_pending(&self) -> bool {
        self.status == MILESTONE_PENDING
    }
}
