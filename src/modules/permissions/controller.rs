use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use uuid::Uuid;

use gatehouse_core::AppError;

use crate::middleware::auth::AuthUser;
use crate::state::AppState;
use crate::validator::ValidatedJson;

use super::model::{
    CreatePermissionDto, PaginatedPermissionsResponse, PermissionFilterParams, PermissionResponse,
    UpdatePermissionDto,
};
use super::service;

#[utoipa::path(
    get,
    path = "/api/administrations/permissions",
    params(
        ("target" = Option<String>, Query, description = "Filter by target kind (USER, ROLE or ORGANIZATION)"),
        ("page" = Option<i64>, Query, description = "Page number"),
        ("limit" = Option<i64>, Query, description = "Items per page")
    ),
    responses(
        (status = 200, description = "List of permission grants", body = PaginatedPermissionsResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    tag = "Permissions",
    security(("bearer_auth" = []))
)]
pub async fn get_permissions(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(params): Query<PermissionFilterParams>,
) -> Result<Json<PaginatedPermissionsResponse>, AppError> {
    auth_user.require("permission", "view", None)?;

    let permissions = service::get_permissions(&state.db, params).await?;
    Ok(Json(permissions))
}

#[utoipa::path(
    get,
    path = "/api/administrations/permissions/{id}",
    params(("id" = Uuid, Path, description = "Permission ID")),
    responses(
        (status = 200, description = "Permission details", body = PermissionResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Permission not found")
    ),
    tag = "Permissions",
    security(("bearer_auth" = []))
)]
pub async fn get_permission_by_id(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<PermissionResponse>, AppError> {
    auth_user.require("permission", "view", None)?;

    let permission = service::get_permission_by_id(&state.db, id).await?;
    Ok(Json(permission))
}

#[utoipa::path(
    post,
    path = "/api/administrations/permissions",
    request_body = CreatePermissionDto,
    responses(
        (status = 201, description = "Permission created", body = PermissionResponse),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    tag = "Permissions",
    security(("bearer_auth" = []))
)]
pub async fn create_permission(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<CreatePermissionDto>,
) -> Result<(StatusCode, Json<PermissionResponse>), AppError> {
    auth_user.require("permission", "create", None)?;

    let permission = service::create_permission(&state.db, dto).await?;
    Ok((StatusCode::CREATED, Json(permission)))
}

#[utoipa::path(
    put,
    path = "/api/administrations/permissions/{id}",
    params(("id" = Uuid, Path, description = "Permission ID")),
    request_body = UpdatePermissionDto,
    responses(
        (status = 200, description = "Permission updated", body = PermissionResponse),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Permission not found")
    ),
    tag = "Permissions",
    security(("bearer_auth" = []))
)]
pub async fn update_permission(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdatePermissionDto>,
) -> Result<Json<PermissionResponse>, AppError> {
    auth_user.require("permission", "edit", None)?;

    let permission = service::update_permission(&state.db, id, dto).await?;
    Ok(Json(permission))
}

#[utoipa::path(
    delete,
    path = "/api/administrations/permissions/{id}",
    params(("id" = Uuid, Path, description = "Permission ID")),
    responses(
        (status = 204, description = "Permission deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Permission not found")
    ),
    tag = "Permissions",
    security(("bearer_auth" = []))
)]
pub async fn delete_permission(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    auth_user.require("permission", "delete", None)?;

    service::delete_permission(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
