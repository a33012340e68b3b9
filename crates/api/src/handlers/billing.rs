//! Handlers for the `/billing` resource.
//!
//! The webhook endpoint is authenticated by its signature, not a JWT. The
//! remaining endpoints require [`AuthUser`].

use atrium_billing::{PullOutcome, PushOutcome};
use atrium_core::error::CoreError;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Header carrying the provider's webhook signature.
pub const SIGNATURE_HEADER: &str = "stripe-signature";

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Acknowledgement returned to the provider.
#[derive(Debug, Serialize)]
pub struct WebhookAck {
    /// `processed` when the event changed an entitlement, `ignored` otherwise.
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ReturnResponse {
    pub outcome: PullOutcome,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct CheckoutRequest {
    /// Email to attach to a newly created billing customer.
    #[validate(email)]
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SessionUrl {
    pub url: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/billing/webhook
///
/// Push path. Answers 401 on a missing secret or bad signature, 400 on a
/// malformed verified body, 500 when the entitlement write fails (so the
/// provider retries), and 200 otherwise.
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<DataResponse<WebhookAck>>> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());

    let outcome = state.reconciler.handle_push(&body, signature).await?;

    let status = match outcome {
        PushOutcome::Upgraded { .. } | PushOutcome::Downgraded { .. } => "processed",
        PushOutcome::NoEvidence { .. } | PushOutcome::Unresolved | PushOutcome::Ignored { .. } => {
            "ignored"
        }
    };

    Ok(Json(DataResponse {
        data: WebhookAck { status },
    }))
}

/// GET /api/v1/billing/return
///
/// Pull path, called when the user lands back from checkout. Always 200;
/// failures are logged by the reconciler and reported in `outcome`.
pub async fn checkout_return(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Json<DataResponse<ReturnResponse>> {
    let outcome = state.reconciler.sync_on_return(auth.user_id).await;
    Json(DataResponse {
        data: ReturnResponse { outcome },
    })
}

/// POST /api/v1/billing/checkout
///
/// Start a subscription checkout. 409 if the user is already paid.
pub async fn start_checkout(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CheckoutRequest>,
) -> AppResult<Json<DataResponse<SessionUrl>>> {
    input
        .validate()
        .map_err(|e| AppError::Core(CoreError::Validation(e.to_string())))?;

    let url = state
        .reconciler
        .start_checkout(auth.user_id, input.email.as_deref())
        .await?;

    Ok(Json(DataResponse {
        data: SessionUrl { url },
    }))
}

/// POST /api/v1/billing/portal
///
/// Open the billing portal. 400 if the user has never started a checkout.
pub async fn open_portal(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<SessionUrl>>> {
    let url = state.reconciler.open_portal(auth.user_id).await?;
    Ok(Json(DataResponse {
        data: SessionUrl { url },
    }))
}
