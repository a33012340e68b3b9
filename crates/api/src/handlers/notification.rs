//! Handlers for the `/notifications` resource.
//!
//! All endpoints require authentication via [`AuthUser`].

use atrium_db::models::notification::Notification;
use atrium_notifications::DeadlineReport;
use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Query / response types
// ---------------------------------------------------------------------------

/// Query parameters for `GET /notifications`.
#[derive(Debug, Deserialize)]
pub struct NotificationQuery {
    /// If `true`, return only unread notifications. Defaults to `false`.
    pub unread_only: Option<bool>,
    /// Maximum number of results. Defaults to 50, capped at 100.
    pub limit: Option<i64>,
    /// Number of results to skip. Defaults to 0.
    pub offset: Option<i64>,
}

/// Maximum page size for notification listing.
const MAX_LIMIT: i64 = 100;

/// Default page size for notification listing.
const DEFAULT_LIMIT: i64 = 50;

#[derive(Debug, Serialize)]
pub struct UnreadCount {
    pub unread_count: i64,
}

// ---------------------------------------------------------------------------
// Feed
// ---------------------------------------------------------------------------

/// GET /api/v1/notifications
///
/// List the authenticated user's notifications, newest first.
pub async fn list_notifications(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<NotificationQuery>,
) -> AppResult<Json<DataResponse<Vec<Notification>>>> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let offset = params.offset.unwrap_or(0).max(0);
    let unread_only = params.unread_only.unwrap_or(false);

    let notifications = state
        .notifications
        .store()
        .list_for_user(auth.user_id, unread_only, limit, offset)
        .await?;

    Ok(Json(DataResponse {
        data: notifications,
    }))
}

/// GET /api/v1/notifications/unread-count
pub async fn unread_count(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<UnreadCount>>> {
    let unread_count = state.notifications.store().unread_count(auth.user_id).await?;
    Ok(Json(DataResponse {
        data: UnreadCount { unread_count },
    }))
}

// ---------------------------------------------------------------------------
// Deadline alerts
// ---------------------------------------------------------------------------

/// POST /api/v1/notifications/deadlines
///
/// Raise today's deadline alerts for the authenticated user. Always 200:
/// a schedule that cannot be loaded is logged and reported as zero alerts.
pub async fn run_deadlines(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Json<DataResponse<DeadlineReport>> {
    let report = match state.deadlines.run_now(auth.user_id).await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!(user_id = auth.user_id, error = %e, "Deadline scan failed to load schedule");
            DeadlineReport::default()
        }
    };

    Json(DataResponse { data: report })
}
