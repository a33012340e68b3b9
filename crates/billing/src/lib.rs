//! Billing provider integration and entitlement reconciliation.
//!
//! - [`provider`] -- the [`BillingProvider`] seam and its data types.
//! - [`stripe`] -- the HTTP implementation of that seam.
//! - [`event`] -- parsing verified webhook payloads into [`BillingEvent`]s.
//! - [`reconciler`] -- the push and pull paths that keep a user's tier in
//!   step with the provider.

pub mod error;
pub mod event;
pub mod provider;
pub mod reconciler;
pub mod stripe;

pub use error::BillingError;
pub use event::BillingEvent;
pub use provider::{BillingProvider, ProviderError, Subscription};
pub use reconciler::{EntitlementReconciler, PullOutcome, PushOutcome};
pub use stripe::{StripeClient, StripeConfig};
