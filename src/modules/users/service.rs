use anyhow::anyhow;
use sqlx::PgPool;
use std::collections::HashMap;
use tracing::instrument;
use uuid::Uuid;

use gatehouse_core::pagination::PaginationMeta;
use gatehouse_core::{AppError, hash_password};

use crate::modules::roles::model::RoleSummary;

use super::model::{
    CreateUserDto, PaginatedUsersResponse, UpdateUserDto, UserFilterParams, UserResponse,
    UserSummary, UserWithRoles,
};

const USER_COLUMNS: &str = "id, email, first_name, last_name, phone, avatar, status, \
    email_verified, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct UserRoleRow {
    user_id: Uuid,
    #[sqlx(flatten)]
    role: RoleSummary,
}

/// Loads the global roles for a set of users in one query and groups them by
/// user id.
async fn load_roles_for(
    db: &PgPool,
    user_ids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<RoleSummary>>, AppError> {
    let rows = sqlx::query_as::<_, UserRoleRow>(
        r#"SELECT ur.user_id, r.id, r.name, r.description
        FROM user_roles ur
        JOIN roles r ON r.id = ur.role_id
        WHERE ur.user_id = ANY($1)
        ORDER BY r.name"#,
    )
    .bind(user_ids)
    .fetch_all(db)
    .await?;

    let mut grouped: HashMap<Uuid, Vec<RoleSummary>> = HashMap::new();
    for row in rows {
        grouped.entry(row.user_id).or_default().push(row.role);
    }
    Ok(grouped)
}

#[instrument(skip(db))]
pub async fn get_users(
    db: &PgPool,
    params: UserFilterParams,
) -> Result<PaginatedUsersResponse, AppError> {
    let limit = params.pagination.limit();
    let offset = params.pagination.offset();
    let search = params.search.as_ref().map(|s| format!("%{}%", s));

    let users = sqlx::query_as::<_, UserResponse>(&format!(
        r#"SELECT {USER_COLUMNS} FROM users
        WHERE ($1::text IS NULL
               OR email ILIKE $1
               OR first_name ILIKE $1
               OR last_name ILIKE $1)
          AND ($2::text IS NULL OR status = $2)
        ORDER BY created_at DESC
        LIMIT $3 OFFSET $4"#
    ))
    .bind(&search)
    .bind(&params.status)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;

    let total: i64 = sqlx::query_scalar(
        r#"SELECT COUNT(*) FROM users
        WHERE ($1::text IS NULL
               OR email ILIKE $1
               OR first_name ILIKE $1
               OR last_name ILIKE $1)
          AND ($2::text IS NULL OR status = $2)"#,
    )
    .bind(&search)
    .bind(&params.status)
    .fetch_one(db)
    .await?;

    let user_ids: Vec<Uuid> = users.iter().map(|u| u.id).collect();
    let mut roles_by_user = load_roles_for(db, &user_ids).await?;

    let has_more = offset + (users.len() as i64) < total;
    let data = users
        .into_iter()
        .map(|user| {
            let roles = roles_by_user.remove(&user.id).unwrap_or_default();
            UserWithRoles { user, roles }
        })
        .collect();

    Ok(PaginatedUsersResponse {
        data,
        meta: PaginationMeta {
            total,
            limit,
            offset: Some(offset),
            page: params.pagination.page(),
            has_more,
        },
    })
}

/// Active users, for membership pickers.
#[instrument(skip(db))]
pub async fn get_available_users(db: &PgPool) -> Result<Vec<UserSummary>, AppError> {
    let users = sqlx::query_as::<_, UserSummary>(
        r#"SELECT id, email, first_name, last_name
        FROM users
        WHERE status = 'ACTIVE'
        ORDER BY first_name"#,
    )
    .fetch_all(db)
    .await?;

    Ok(users)
}

#[instrument(skip(db))]
pub async fn get_user_by_id(db: &PgPool, id: Uuid) -> Result<UserWithRoles, AppError> {
    let user = sqlx::query_as::<_, UserResponse>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(db)
    .await?
    .ok_or_else(|| AppError::not_found(anyhow!("User not found")))?;

    let mut roles_by_user = load_roles_for(db, &[id]).await?;
    let roles = roles_by_user.remove(&id).unwrap_or_default();

    Ok(UserWithRoles { user, roles })
}

#[instrument(skip(db, dto))]
pub async fn create_user(db: &PgPool, dto: CreateUserDto) -> Result<UserWithRoles, AppError> {
    let existing: Option<Uuid> = sqlx::query_scalar("SELECT id FROM users WHERE email = $1")
        .bind(&dto.email)
        .fetch_optional(db)
        .await?;

    if existing.is_some() {
        return Err(AppError::bad_request(anyhow!("User already exists")));
    }

    let hashed_password = hash_password(&dto.password)?;
    let status = dto.status.as_deref().unwrap_or("ACTIVE");

    let mut tx = db.begin().await?;

    let user = sqlx::query_as::<_, UserResponse>(&format!(
        r#"INSERT INTO users (email, password, first_name, last_name, phone, status)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING {USER_COLUMNS}"#
    ))
    .bind(&dto.email)
    .bind(&hashed_password)
    .bind(&dto.first_name)
    .bind(&dto.last_name)
    .bind(&dto.phone)
    .bind(status)
    .fetch_one(&mut *tx)
    .await?;

    if let Some(role_ids) = &dto.role_ids {
        for role_id in role_ids {
            sqlx::query(
                "INSERT INTO user_roles (user_id, role_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(user.id)
            .bind(role_id)
            .execute(&mut *tx)
            .await?;
        }
    }

    tx.commit().await?;

    get_user_by_id(db, user.id).await
}

#[instrument(skip(db, dto))]
pub async fn update_user(db: &PgPool, id: Uuid, dto: UpdateUserDto) -> Result<UserWithRoles, AppError> {
    let mut tx = db.begin().await?;

    let updated = sqlx::query_scalar::<_, Uuid>(
        r#"UPDATE users
        SET first_name = COALESCE($2, first_name),
            last_name = COALESCE($3, last_name),
            phone = COALESCE($4, phone),
            avatar = COALESCE($5, avatar),
            status = COALESCE($6, status),
            updated_at = now()
        WHERE id = $1
        RETURNING id"#,
    )
    .bind(id)
    .bind(&dto.first_name)
    .bind(&dto.last_name)
    .bind(&dto.phone)
    .bind(&dto.avatar)
    .bind(&dto.status)
    .fetch_optional(&mut *tx)
    .await?;

    if updated.is_none() {
        return Err(AppError::not_found(anyhow!("User not found")));
    }

    // Replace global role assignments when the caller sends a new set.
    if let Some(role_ids) = &dto.role_ids {
        sqlx::query("DELETE FROM user_roles WHERE user_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        for role_id in role_ids {
            sqlx::query(
                "INSERT INTO user_roles (user_id, role_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(id)
            .bind(role_id)
            .execute(&mut *tx)
            .await?;
        }
    }

    tx.commit().await?;

    get_user_by_id(db, id).await
}

#[instrument(skip(db))]
pub async fn delete_user(db: &PgPool, id: Uuid) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found(anyhow!("User not found")));
    }

    Ok(())
}
