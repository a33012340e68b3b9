//! Repository for the `projects` table.

use atrium_core::types::DbId;
use sqlx::PgPool;

use crate::models::project::Project;

/// Column list for `projects` queries.
const COLUMNS: &str = "id, owner_user_id, name, created_at, updated_at";

/// Provides read access to projects.
pub struct ProjectRepo;

impl ProjectRepo {
    /// List every project owned by a user.
    pub async fn list_for_owner(pool: &PgPool, user_id: DbId) -> Result<Vec<Project>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM projects \
             WHERE owner_user_id = $1 \
             ORDER BY id"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }
}
