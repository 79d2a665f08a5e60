use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use gatehouse_core::AppError;

use crate::middleware::auth::AuthUser;
use crate::state::AppState;
use crate::validator::ValidatedJson;

use super::model::{
    AddUsersDto, AddUsersResponse, CreateOrganizationDto, Organization, OrganizationDetail,
    OrganizationSummary, OrganizationWithCounts, UpdateOrganizationDto,
};
use super::service;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AvailableParentsParams {
    /// Organization whose descendants (and self) are excluded
    pub organization_id: Option<Uuid>,
}

#[utoipa::path(
    get,
    path = "/api/administrations/organizations",
    responses(
        (status = 200, description = "List of organizations", body = Vec<OrganizationWithCounts>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    tag = "Organizations",
    security(("bearer_auth" = []))
)]
pub async fn get_organizations(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<Vec<OrganizationWithCounts>>, AppError> {
    auth_user.require("organization", "view", None)?;

    let organizations = service::get_organizations(&state.db).await?;
    Ok(Json(organizations))
}

#[utoipa::path(
    get,
    path = "/api/administrations/organizations/available-parents",
    params(
        ("organization_id" = Option<Uuid>, Query, description = "Organization whose descendants are excluded")
    ),
    responses(
        (status = 200, description = "Organizations eligible as parent", body = Vec<OrganizationSummary>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    tag = "Organizations",
    security(("bearer_auth" = []))
)]
pub async fn get_available_parents(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(params): Query<AvailableParentsParams>,
) -> Result<Json<Vec<OrganizationSummary>>, AppError> {
    auth_user.require("organization", "view", None)?;

    let parents = service::get_available_parents(&state.db, params.organization_id).await?;
    Ok(Json(parents))
}

#[utoipa::path(
    get,
    path = "/api/administrations/organizations/{id}",
    params(("id" = Uuid, Path, description = "Organization ID")),
    responses(
        (status = 200, description = "Organization details", body = OrganizationDetail),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Organization not found")
    ),
    tag = "Organizations",
    security(("bearer_auth" = []))
)]
pub async fn get_organization_by_id(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<OrganizationDetail>, AppError> {
    auth_user.require("organization", "view", None)?;

    let organization = service::get_organization_by_id(&state.db, id).await?;
    Ok(Json(organization))
}

#[utoipa::path(
    post,
    path = "/api/administrations/organizations",
    request_body = CreateOrganizationDto,
    responses(
        (status = 201, description = "Organization created", body = Organization),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    tag = "Organizations",
    security(("bearer_auth" = []))
)]
pub async fn create_organization(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<CreateOrganizationDto>,
) -> Result<(StatusCode, Json<Organization>), AppError> {
    auth_user.require("organization", "create", None)?;

    let owner_id = auth_user.user_id()?;
    let organization = service::create_organization(&state.db, dto, owner_id).await?;
    Ok((StatusCode::CREATED, Json(organization)))
}

#[utoipa::path(
    put,
    path = "/api/administrations/organizations/{id}",
    params(("id" = Uuid, Path, description = "Organization ID")),
    request_body = UpdateOrganizationDto,
    responses(
        (status = 200, description = "Organization updated", body = Organization),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Organization not found")
    ),
    tag = "Organizations",
    security(("bearer_auth" = []))
)]
pub async fn update_organization(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateOrganizationDto>,
) -> Result<Json<Organization>, AppError> {
    auth_user.require("organization", "edit", None)?;

    let organization = service::update_organization(&state.db, id, dto).await?;
    Ok(Json(organization))
}

#[utoipa::path(
    delete,
    path = "/api/administrations/organizations/{id}",
    params(("id" = Uuid, Path, description = "Organization ID")),
    responses(
        (status = 204, description = "Organization deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Organization not found")
    ),
    tag = "Organizations",
    security(("bearer_auth" = []))
)]
pub async fn delete_organization(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    auth_user.require("organization", "delete", None)?;

    let caller_id = auth_user.user_id()?;
    service::delete_organization(&state.db, id, caller_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/administrations/organizations/{id}/add-users",
    params(("id" = Uuid, Path, description = "Organization ID")),
    request_body = AddUsersDto,
    responses(
        (status = 200, description = "Users added", body = AddUsersResponse),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Organization not found")
    ),
    tag = "Organizations",
    security(("bearer_auth" = []))
)]
pub async fn add_users(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<AddUsersDto>,
) -> Result<Json<AddUsersResponse>, AppError> {
    auth_user.require("organization", "edit", None)?;

    let result = service::add_users(&state.db, id, dto).await?;
    Ok(Json(result))
}
