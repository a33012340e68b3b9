use atrium_core::error::CoreError;
use atrium_core::signing::SignatureError;
use atrium_db::StoreError;

use crate::provider::ProviderError;

/// Error type for reconciler and checkout operations.
#[derive(Debug, thiserror::Error)]
pub enum BillingError {
    /// No webhook secret is configured, so no event can be trusted.
    #[error("Webhook secret is not configured")]
    WebhookSecretMissing,

    /// The request carried no signature header.
    #[error("Missing webhook signature header")]
    SignatureHeaderMissing,

    #[error("Invalid webhook signature: {0}")]
    Signature(#[from] SignatureError),

    /// The payload verified but is not a well-formed event.
    #[error("Invalid webhook payload: {0}")]
    InvalidPayload(String),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl BillingError {
    /// Whether the error rejects the caller's credentials rather than the
    /// content of the request.
    pub fn is_authentication(&self) -> bool {
        matches!(
            self,
            BillingError::WebhookSecretMissing
                | BillingError::SignatureHeaderMissing
                | BillingError::Signature(_)
        )
    }
}
