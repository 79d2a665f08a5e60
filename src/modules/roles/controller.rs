use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use gatehouse_core::AppError;

use crate::middleware::auth::AuthUser;
use crate::state::AppState;
use crate::validator::ValidatedJson;

use super::model::{CreateRoleDto, Role, RoleDetail, RoleWithGrants, UpdateRoleDto};
use super::service;

#[utoipa::path(
    get,
    path = "/api/administrations/roles",
    responses(
        (status = 200, description = "List of roles with their grants", body = Vec<RoleWithGrants>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    tag = "Roles",
    security(("bearer_auth" = []))
)]
pub async fn get_roles(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<Vec<RoleWithGrants>>, AppError> {
    auth_user.require("role", "view", None)?;

    let roles = service::get_roles(&state.db).await?;
    Ok(Json(roles))
}

#[utoipa::path(
    get,
    path = "/api/administrations/roles/{id}",
    params(("id" = Uuid, Path, description = "Role ID")),
    responses(
        (status = 200, description = "Role details", body = RoleDetail),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Role not found")
    ),
    tag = "Roles",
    security(("bearer_auth" = []))
)]
pub async fn get_role_by_id(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<RoleDetail>, AppError> {
    auth_user.require("role", "view", None)?;

    let role = service::get_role_by_id(&state.db, id).await?;
    Ok(Json(role))
}

#[utoipa::path(
    post,
    path = "/api/administrations/roles",
    request_body = CreateRoleDto,
    responses(
        (status = 201, description = "Role created", body = Role),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    tag = "Roles",
    security(("bearer_auth" = []))
)]
pub async fn create_role(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<CreateRoleDto>,
) -> Result<(StatusCode, Json<Role>), AppError> {
    auth_user.require("role", "create", None)?;

    let role = service::create_role(&state.db, dto).await?;
    Ok((StatusCode::CREATED, Json(role)))
}

#[utoipa::path(
    put,
    path = "/api/administrations/roles/{id}",
    params(("id" = Uuid, Path, description = "Role ID")),
    request_body = UpdateRoleDto,
    responses(
        (status = 200, description = "Role updated", body = Role),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Role not found")
    ),
    tag = "Roles",
    security(("bearer_auth" = []))
)]
pub async fn update_role(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateRoleDto>,
) -> Result<Json<Role>, AppError> {
    auth_user.require("role", "edit", None)?;

    let role = service::update_role(&state.db, id, dto).await?;
    Ok(Json(role))
}

#[utoipa::path(
    delete,
    path = "/api/administrations/roles/{id}",
    params(("id" = Uuid, Path, description = "Role ID")),
    responses(
        (status = 204, description = "Role deleted"),
        (status = 400, description = "The reserved admin role cannot be deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Role not found")
    ),
    tag = "Roles",
    security(("bearer_auth" = []))
)]
pub async fn delete_role(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    auth_user.require("role", "delete", None)?;

    service::delete_role(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
