//! Repository for the `milestones` table.

use atrium_core::types::DbId;
use sqlx::PgPool;

use crate::models::milestone::{Milestone, MILESTONE_PENDING};

/// Column list for `milestones` queries.
const COLUMNS: &str = "id, project_id, title, due_date, status, created_at, updated_at";

/// Provides read access to milestones.
pub struct MilestoneRepo;

impl MilestoneRepo {
    /// List pending milestones belonging to any of `project_ids`.
    ///
    /// Milestones without a due date are included; callers decide whether
    /// they participate.
    pub async fn list_pending_for_projects(
        pool: &PgPool,
        project_ids: &[DbId],
    ) -> Result<Vec<Milestone>, sqlx::Error> {
        if project_ids.is_empty() {
            return Ok(Vec::new());
        }
        let query = format!(
            "SELECT {COLUMNS} FROM milestones \
             WHERE project_id = ANY($1) AND status = $2 \
             ORDER BY due_date NULLS LAST, id"
        );
        sqlx::query_as::<_, Milestone>(&query)
            .bind(project_ids)
            .bind(MILESTONE_PENDING)
            .fetch_all(pool)
            .await
    }
}
