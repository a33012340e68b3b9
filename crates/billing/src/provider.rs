//! The billing provider seam.
//!
//! Components receive an `Arc<dyn BillingProvider>` at construction; the
//! server wires in a [`StripeClient`](crate::StripeClient), tests a scripted
//! fake.

use async_trait::async_trait;
use atrium_core::entitlement::is_active_status;
use atrium_core::types::DbId;
use serde::Deserialize;

/// Errors from the billing provider.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider returned a non-2xx status code.
    #[error("Billing provider error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// A success response lacked a field the caller needs.
    #[error("Billing provider response missing `{0}`")]
    MissingField(&'static str),
}

/// A subscription as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Subscription {
    pub id: String,
    pub status: String,
    /// Unix seconds.
    #[serde(default)]
    pub created: i64,
}

impl Subscription {
    pub fn is_active(&self) -> bool {
        is_active_status(&self.status)
    }
}

#[async_trait]
pub trait BillingProvider: Send + Sync {
    /// Subscriptions for `customer_ref` that count as paid (`active` or
    /// `trialing`), most recent first.
    async fn list_active_subscriptions(
        &self,
        customer_ref: &str,
        limit: u32,
    ) -> Result<Vec<Subscription>, ProviderError>;

    /// Create a customer for `user_id` and return its reference.
    async fn create_customer(
        &self,
        user_id: DbId,
        email: Option<&str>,
    ) -> Result<String, ProviderError>;

    /// Start a hosted subscription checkout and return its URL.
    async fn create_checkout_session(
        &self,
        customer_ref: &str,
        user_id: DbId,
    ) -> Result<String, ProviderError>;

    /// Open the hosted billing portal and return its URL.
    async fn create_portal_session(&self, customer_ref: &str) -> Result<String, ProviderError>;
}
