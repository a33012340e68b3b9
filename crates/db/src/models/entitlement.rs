//! Entitlement entity model.

use atrium_core::entitlement::Tier;
use atrium_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `entitlements` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Entitlement {
    pub user_id: DbId,
    pub tier: String,
    pub billing_customer_ref: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Entitlement {
    /// The typed tier. The column is constrained to known values, so an
    /// unparseable value can only come from a hand-edited row and reads as free.
    pub fn tier(&self) -> Tier {
        Tier::parse(&self.tier).unwrap_or_default()
    }

    pub fn is_paid(&self) -> bool {
        self.tier().is_paid()
    }
}
