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
    CreateUserDto, PaginatedUsersResponse, UpdateUserDto, UserFilterParams, UserSummary,
    UserWithRoles,
};
use super::service;

#[utoipa::path(
    get,
    path = "/api/administrations/users",
    params(
        ("search" = Option<String>, Query, description = "Search over email and names"),
        ("status" = Option<String>, Query, description = "Filter by account status"),
        ("page" = Option<i64>, Query, description = "Page number"),
        ("limit" = Option<i64>, Query, description = "Items per page")
    ),
    responses(
        (status = 200, description = "List of users", body = PaginatedUsersResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
pub async fn get_users(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(params): Query<UserFilterParams>,
) -> Result<Json<PaginatedUsersResponse>, AppError> {
    auth_user.require("user", "view", None)?;

    let users = service::get_users(&state.db, params).await?;
    Ok(Json(users))
}

#[utoipa::path(
    get,
    path = "/api/administrations/users/available",
    responses(
        (status = 200, description = "Active users for membership pickers", body = Vec<UserSummary>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
pub async fn get_available_users(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<Vec<UserSummary>>, AppError> {
    auth_user.require("user", "view", None)?;

    let users = service::get_available_users(&state.db).await?;
    Ok(Json(users))
}

#[utoipa::path(
    get,
    path = "/api/administrations/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User details", body = UserWithRoles),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found")
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
pub async fn get_user_by_id(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<UserWithRoles>, AppError> {
    auth_user.require("user", "view", None)?;

    let user = service::get_user_by_id(&state.db, id).await?;
    Ok(Json(user))
}

#[utoipa::path(
    post,
    path = "/api/administrations/users",
    request_body = CreateUserDto,
    responses(
        (status = 201, description = "User created", body = UserWithRoles),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
pub async fn create_user(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<CreateUserDto>,
) -> Result<(StatusCode, Json<UserWithRoles>), AppError> {
    auth_user.require("user", "create", None)?;

    let user = service::create_user(&state.db, dto).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[utoipa::path(
    put,
    path = "/api/administrations/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdateUserDto,
    responses(
        (status = 200, description = "User updated", body = UserWithRoles),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found")
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
pub async fn update_user(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateUserDto>,
) -> Result<Json<UserWithRoles>, AppError> {
    auth_user.require("user", "edit", None)?;

    let user = service::update_user(&state.db, id, dto).await?;
    Ok(Json(user))
}

#[utoipa::path(
    delete,
    path = "/api/administrations/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found")
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
pub async fn delete_user(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    auth_user.require("user", "delete", None)?;

    service::delete_user(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
