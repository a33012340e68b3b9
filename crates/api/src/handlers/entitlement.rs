//! Handlers for the `/entitlement` resource.

use axum::extract::State;
use axum::Json;
use atrium_db::models::entitlement::Entitlement;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/entitlement
///
/// The authenticated user's entitlement, created as `free` on first read.
pub async fn get_entitlement(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Entitlement>>> {
    let entitlement = state.reconciler.entitlement(auth.user_id).await?;
    Ok(Json(DataResponse { data: entitlement }))
}
