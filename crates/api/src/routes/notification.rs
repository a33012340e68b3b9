//! Route definitions for the `/notifications` resource.
//!
//! All endpoints require authentication.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::notification;
use crate::state::AppState;

/// Routes mounted at `/notifications`.
///
/// ```text
/// GET    /                          -> list_notifications
/// GET    /unread-count              -> unread_count
/// POST   /deadlines                 -> run_deadlines
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(notification::list_notifications))
        .route("/unread-count", get(notification::unread_count))
        .route("/deadlines", post(notification::run_deadlines))
}
