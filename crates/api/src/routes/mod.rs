pub mod billing;
pub mod entitlement;
pub mod health;
pub mod notification;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /billing/webhook                                 provider push (signature auth)
/// /billing/return                                  pull sync after checkout
/// /billing/checkout                                start checkout (POST)
/// /billing/portal                                  open billing portal (POST)
///
/// /entitlement                                     current entitlement
///
/// /notifications                                   list feed
/// /notifications/unread-count                      unread count
/// /notifications/deadlines                         raise deadline alerts (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/billing", billing::router())
        .nest("/entitlement", entitlement::router())
        .nest("/notifications", notification::router())
}
