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

use super::model::{CreateResourceDto, Resource, ResourceWithUsage, UpdateResourceDto};
use super::service;

#[utoipa::path(
    get,
    path = "/api/administrations/resources",
    responses(
        (status = 200, description = "List of resources", body = Vec<ResourceWithUsage>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    tag = "Resources",
    security(("bearer_auth" = []))
)]
pub async fn get_resources(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<Vec<ResourceWithUsage>>, AppError> {
    auth_user.require("resource", "view", None)?;

    let resources = service::get_resources(&state.db).await?;
    Ok(Json(resources))
}

#[utoipa::path(
    get,
    path = "/api/administrations/resources/{id}",
    params(("id" = Uuid, Path, description = "Resource ID")),
    responses(
        (status = 200, description = "Resource details", body = ResourceWithUsage),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Resource not found")
    ),
    tag = "Resources",
    security(("bearer_auth" = []))
)]
pub async fn get_resource_by_id(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ResourceWithUsage>, AppError> {
    auth_user.require("resource", "view", None)?;

    let resource = service::get_resource_by_id(&state.db, id).await?;
    Ok(Json(resource))
}

#[utoipa::path(
    post,
    path = "/api/administrations/resources",
    request_body = CreateResourceDto,
    responses(
        (status = 201, description = "Resource created", body = Resource),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    tag = "Resources",
    security(("bearer_auth" = []))
)]
pub async fn create_resource(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<CreateResourceDto>,
) -> Result<(StatusCode, Json<Resource>), AppError> {
    auth_user.require("resource", "create", None)?;

    let resource = service::create_resource(&state.db, dto).await?;
    Ok((StatusCode::CREATED, Json(resource)))
}

#[utoipa::path(
    put,
    path = "/api/administrations/resources/{id}",
    params(("id" = Uuid, Path, description = "Resource ID")),
    request_body = UpdateResourceDto,
    responses(
        (status = 200, description = "Resource updated", body = Resource),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Resource not found")
    ),
    tag = "Resources",
    security(("bearer_auth" = []))
)]
pub async fn update_resource(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateResourceDto>,
) -> Result<Json<Resource>, AppError> {
    auth_user.require("resource", "edit", None)?;

    let resource = service::update_resource(&state.db, id, dto).await?;
    Ok(Json(resource))
}

#[utoipa::path(
    delete,
    path = "/api/administrations/resources/{id}",
    params(("id" = Uuid, Path, description = "Resource ID")),
    responses(
        (status = 204, description = "Resource deleted"),
        (status = 400, description = "Resource has associated permissions"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Resource not found")
    ),
    tag = "Resources",
    security(("bearer_auth" = []))
)]
pub async fn delete_resource(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    auth_user.require("resource", "delete", None)?;

    service::delete_resource(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
