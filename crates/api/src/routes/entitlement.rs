//! Route definitions for the `/entitlement` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::entitlement;
use crate::state::AppState;

/// Routes mounted at `/entitlement`.
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(entitlement::get_entitlement))
}
