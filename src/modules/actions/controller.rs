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

use super::model::{Action, ActionWithUsage, CreateActionDto, UpdateActionDto};
use super::service;

#[utoipa::path(
    get,
    path = "/api/administrations/actions",
    responses(
        (status = 200, description = "List of actions", body = Vec<ActionWithUsage>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    tag = "Actions",
    security(("bearer_auth" = []))
)]
pub async fn get_actions(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<Vec<ActionWithUsage>>, AppError> {
    auth_user.require("action", "view", None)?;

    let actions = service::get_actions(&state.db).await?;
    Ok(Json(actions))
}

#[utoipa::path(
    get,
    path = "/api/administrations/actions/{id}",
    params(("id" = Uuid, Path, description = "Action ID")),
    responses(
        (status = 200, description = "Action details", body = ActionWithUsage),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Action not found")
    ),
    tag = "Actions",
    security(("bearer_auth" = []))
)]
pub async fn get_action_by_id(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ActionWithUsage>, AppError> {
    auth_user.require("action", "view", None)?;

    let action = service::get_action_by_id(&state.db, id).await?;
    Ok(Json(action))
}

#[utoipa::path(
    post,
    path = "/api/administrations/actions",
    request_body = CreateActionDto,
    responses(
        (status = 201, description = "Action created", body = Action),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    tag = "Actions",
    security(("bearer_auth" = []))
)]
pub async fn create_action(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<CreateActionDto>,
) -> Result<(StatusCode, Json<Action>), AppError> {
    auth_user.require("action", "create", None)?;

    let action = service::create_action(&state.db, dto).await?;
    Ok((StatusCode::CREATED, Json(action)))
}

#[utoipa::path(
    put,
    path = "/api/administrations/actions/{id}",
    params(("id" = Uuid, Path, description = "Action ID")),
    request_body = UpdateActionDto,
    responses(
        (status = 200, description = "Action updated", body = Action),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Action not found")
    ),
    tag = "Actions",
    security(("bearer_auth" = []))
)]
pub async fn update_action(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateActionDto>,
) -> Result<Json<Action>, AppError> {
    auth_user.require("action", "edit", None)?;

    let action = service::update_action(&state.db, id, dto).await?;
    Ok(Json(action))
}

#[utoipa::path(
    delete,
    path = "/api/administrations/actions/{id}",
    params(("id" = Uuid, Path, description = "Action ID")),
    responses(
        (status = 204, description = "Action deleted"),
        (status = 400, description = "Action has associated permissions"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Action not found")
    ),
    tag = "Actions",
    security(("bearer_auth" = []))
)]
pub async fn delete_action(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    auth_user.require("action", "delete", None)?;

    service::delete_action(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
