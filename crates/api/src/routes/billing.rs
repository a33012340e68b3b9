//! Route definitions for the `/billing` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::billing;
use crate::state::AppState;

/// Routes mounted at `/billing`.
///
/// ```text
/// POST   /webhook                   -> webhook (no JWT)
/// GET    /return                    -> checkout_return
/// POST   /checkout                  -> start_checkout
/// POST   /portal                    -> open_portal
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/webhook", post(billing::webhook))
        .route("/return", get(billing::checkout_return))
        .route("/checkout", post(billing::start_checkout))
        .route("/portal", post(billing::open_portal))
}
