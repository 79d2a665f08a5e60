use anyhow::anyhow;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use gatehouse_auth::{create_access_token, create_refresh_token, verify_refresh_token};
use gatehouse_config::JwtConfig;
use gatehouse_core::{AppError, hash_password, verify_password};

use crate::modules::security_logs::model::{LogStatus, LogType};
use crate::modules::security_logs::service as security_logs;
use crate::modules::users::model::UserResponse;

use super::model::{
    ClientInfo, CredentialRow, LoginRequest, LoginResponse, RefreshRequest, RefreshResponse,
    RegisterRequest, RegisterResponse,
};
use super::snapshot::build_snapshot;

const USER_COLUMNS: &str = "id, email, first_name, last_name, phone, avatar, status, \
    email_verified, created_at, updated_at";

/// Registers a new account and assigns the global default role, both inside
/// one transaction so a half-registered user can never exist.
#[instrument(skip(db, dto))]
pub async fn register_user(
    db: &PgPool,
    dto: RegisterRequest,
    client: &ClientInfo,
) -> Result<RegisterResponse, AppError> {
    let email = dto.email.to_lowercase();

    let existing: Option<Uuid> = sqlx::query_scalar("SELECT id FROM users WHERE email = $1")
        .bind(&email)
        .fetch_optional(db)
        .await?;

    if existing.is_some() {
        return Err(AppError::bad_request(anyhow!("Email already exists")));
    }

    let hashed_password = hash_password(&dto.password)?;

    let mut tx = db.begin().await?;

    let user = sqlx::query_as::<_, UserResponse>(&format!(
        r#"INSERT INTO users (email, password, first_name, last_name, phone)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {USER_COLUMNS}"#
    ))
    .bind(&email)
    .bind(&hashed_password)
    .bind(&dto.first_name)
    .bind(&dto.last_name)
    .bind(&dto.phone)
    .fetch_one(&mut *tx)
    .await?;

    let default_role: Option<(Uuid, String)> = sqlx::query_as(
        "SELECT id, name FROM roles WHERE organization_id IS NULL AND is_default LIMIT 1",
    )
    .fetch_optional(&mut *tx)
    .await?;

    if let Some((role_id, _)) = &default_role {
        sqlx::query("INSERT INTO user_roles (user_id, role_id) VALUES ($1, $2)")
            .bind(user.id)
            .bind(role_id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    security_logs::record(
        db,
        Some(user.id),
        &user.email,
        &client.ip_address,
        &client.user_agent,
        LogStatus::Success,
        LogType::Register,
        &format!("Account registered for {}", user.email),
    )
    .await;

    Ok(RegisterResponse {
        user,
        assigned_role: default_role.map(|(_, name)| name),
    })
}

/// Verifies credentials, builds the permission snapshot, and issues the
/// session tokens. Every outcome is written to the security log.
#[instrument(skip(db, dto, jwt_config))]
pub async fn login_user(
    db: &PgPool,
    dto: LoginRequest,
    client: &ClientInfo,
    jwt_config: &JwtConfig,
) -> Result<LoginResponse, AppError> {
    let email = dto.email.to_lowercase();

    let credential = sqlx::query_as::<_, CredentialRow>(
        "SELECT id, email, password, status FROM users WHERE email = $1",
    )
    .bind(&email)
    .fetch_optional(db)
    .await?;

    let Some(credential) = credential else {
        security_logs::record(
            db,
            None,
            &email,
            &client.ip_address,
            &client.user_agent,
            LogStatus::Failed,
            LogType::Login,
            "Invalid credentials",
        )
        .await;
        return Err(AppError::unauthorized(anyhow!("Invalid email or password")));
    };

    if !verify_password(&dto.password, &credential.password)? {
        security_logs::record(
            db,
            Some(credential.id),
            &credential.email,
            &client.ip_address,
            &client.user_agent,
            LogStatus::Failed,
            LogType::Login,
            "Invalid credentials",
        )
        .await;
        return Err(AppError::unauthorized(anyhow!("Invalid email or password")));
    }

    if credential.status != "ACTIVE" {
        security_logs::record(
            db,
            Some(credential.id),
            &credential.email,
            &client.ip_address,
            &client.user_agent,
            LogStatus::Failed,
            LogType::Login,
            "Account is not active",
        )
        .await;
        return Err(AppError::unauthorized(anyhow!(
            "Your account is not active. Please contact support."
        )));
    }

    // Authentication done; freeze the principal's authority for the session.
    let snapshot = build_snapshot(db, credential.id).await?;

    let access_token =
        create_access_token(credential.id, &credential.email, snapshot, jwt_config)?;
    let refresh_token = create_refresh_token(credential.id, &credential.email, jwt_config)?;

    let user = sqlx::query_as::<_, UserResponse>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
    ))
    .bind(credential.id)
    .fetch_one(db)
    .await?;

    security_logs::record(
        db,
        Some(credential.id),
        &credential.email,
        &client.ip_address,
        &client.user_agent,
        LogStatus::Success,
        LogType::Login,
        &format!("Successful login for user {}", credential.email),
    )
    .await;

    Ok(LoginResponse {
        access_token,
        refresh_token,
        user,
    })
}

/// Redeems a refresh token: re-checks the account, rebuilds the snapshot
/// from current grants, and rotates both tokens.
#[instrument(skip(db, dto, jwt_config))]
pub async fn refresh_session(
    db: &PgPool,
    dto: RefreshRequest,
    jwt_config: &JwtConfig,
) -> Result<RefreshResponse, AppError> {
    let claims = verify_refresh_token(&dto.refresh_token, jwt_config)?;

    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| AppError::unauthorized(anyhow!("Invalid refresh token")))?;

    let credential = sqlx::query_as::<_, CredentialRow>(
        "SELECT id, email, password, status FROM users WHERE id = $1",
    )
    .bind(user_id)
    .fetch_optional(db)
    .await?
    .ok_or_else(|| AppError::unauthorized(anyhow!("Invalid refresh token")))?;

    if credential.status != "ACTIVE" {
        return Err(AppError::unauthorized(anyhow!(
            "Your account is not active. Please contact support."
        )));
    }

    let snapshot = build_snapshot(db, credential.id).await?;

    let access_token =
        create_access_token(credential.id, &credential.email, snapshot, jwt_config)?;
    let refresh_token = create_refresh_token(credential.id, &credential.email, jwt_config)?;

    Ok(RefreshResponse {
        access_token,
        refresh_token,
    })
}
