use axum::{Json, extract::State};

use gatehouse_core::AppError;

use crate::middleware::auth::AuthUser;
use crate::state::AppState;

use super::model::DashboardStats;
use super::service;

/// Authenticated-only; the dashboard shows aggregate counts, not records,
/// so no resource permission is required beyond a valid session.
#[utoipa::path(
    get,
    path = "/api/dashboard/stats",
    responses(
        (status = 200, description = "Dashboard statistics", body = DashboardStats),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Dashboard",
    security(("bearer_auth" = []))
)]
pub async fn get_stats(
    State(state): State<AppState>,
    _auth_user: AuthUser,
) -> Result<Json<DashboardStats>, AppError> {
    let stats = service::get_stats(&state.db).await?;
    Ok(Json(stats))
}
