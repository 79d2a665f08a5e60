use axum::{
    Json,
    extract::{Query, State},
};

use gatehouse_core::AppError;

use crate::middleware::auth::AuthUser;
use crate::state::AppState;

use super::model::{PaginatedSecurityLogsResponse, SecurityLogFilterParams};
use super::service;

#[utoipa::path(
    get,
    path = "/api/administrations/security-logs",
    params(
        ("status" = Option<String>, Query, description = "Filter by event status (SUCCESS or FAILED)"),
        ("page" = Option<i64>, Query, description = "Page number"),
        ("limit" = Option<i64>, Query, description = "Items per page")
    ),
    responses(
        (status = 200, description = "Security logs, newest first", body = PaginatedSecurityLogsResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    tag = "Security Logs",
    security(("bearer_auth" = []))
)]
pub async fn get_security_logs(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(params): Query<SecurityLogFilterParams>,
) -> Result<Json<PaginatedSecurityLogsResponse>, AppError> {
    auth_user.require("security_log", "view", None)?;

    let logs = service::get_security_logs(&state.db, params).await?;
    Ok(Json(logs))
}
