//! Repository for the `entitlements` table.
//!
//! Every write is an upsert to a fixed target value, so replaying the same
//! provider signal any number of times leaves the row in the same state.

use atrium_core::entitlement::Tier;
use atrium_core::types::DbId;
use sqlx::PgPool;

use crate::models::entitlement::Entitlement;

/// Column list for `entitlements` queries.
const COLUMNS: &str = "user_id, tier, billing_customer_ref, created_at, updated_at";

/// Provides read and upsert operations for entitlements.
pub struct EntitlementRepo;

impl EntitlementRepo {
    /// Fetch a user's entitlement, creating a `free` row on first read.
    pub async fn get_or_create(pool: &PgPool, user_id: DbId) -> Result<Entitlement, sqlx::Error> {
        // The no-op update makes RETURNING yield the row even when a
        // concurrent first read inserted it after this statement began.
        let query = format!(
            "INSERT INTO entitlements (user_id) VALUES ($1) \
             ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Entitlement>(&query)
            .bind(user_id)
            .fetch_one(pool)
            .await
    }

    /// Set the user's tier, optionally recording the billing customer.
    ///
    /// A `None` customer keeps whatever reference is already stored.
    pub async fn set_tier(
        pool: &PgPool,
        user_id: DbId,
        tier: Tier,
        customer_ref: Option<&str>,
    ) -> Result<Entitlement, sqlx::Error> {
        let query = format!(
            "INSERT INTO entitlements (user_id, tier, billing_customer_ref) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (user_id) DO UPDATE SET \
                tier = EXCLUDED.tier, \
                billing_customer_ref = COALESCE(EXCLUDED.billing_customer_ref, entitlements.billing_customer_ref), \
                updated_at = NOW() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Entitlement>(&query)
            .bind(user_id)
            .bind(tier.as_str())
            .bind(customer_ref)
            .fetch_one(pool)
            .await
    }

    /// Record the billing customer for a user without touching the tier.
    pub async fn set_customer_ref(
        pool: &PgPool,
        user_id: DbId,
        customer_ref: &str,
    ) -> Result<Entitlement, sqlx::Error> {
        let query = format!(
            "INSERT INTO entitlements (user_id, billing_customer_ref) \
             VALUES ($1, $2) \
             ON CONFLICT (user_id) DO UPDATE SET \
                billing_customer_ref = EXCLUDED.billing_customer_ref, \
                updated_at = NOW() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Entitlement>(&query)
            .bind(user_id)
            .bind(customer_ref)
            .fetch_one(pool)
            .await
    }

    /// Find the entitlement that owns a billing customer reference.
    pub async fn find_by_customer_ref(
        pool: &PgPool,
        customer_ref: &str,
    ) -> Result<Option<Entitlement>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM entitlements WHERE billing_customer_ref = $1");
        sqlx::query_as::<_, Entitlement>(&query)
            .bind(customer_ref)
            .fetch_optional(pool)
            .await
    }
}
