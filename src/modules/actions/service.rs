use anyhow::anyhow;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use gatehouse_core::AppError;

use super::model::{Action, ActionWithUsage, CreateActionDto, UpdateActionDto};

#[instrument(skip(db))]
pub async fn get_actions(db: &PgPool) -> Result<Vec<ActionWithUsage>, AppError> {
    let actions = sqlx::query_as::<_, ActionWithUsage>(
        r#"SELECT a.id, a.name, a.slug, a.description, a.created_at, a.updated_at,
            (SELECT COUNT(*) FROM permission_actions pa WHERE pa.action_id = a.id) AS permission_count
        FROM actions a
        ORDER BY a.slug"#,
    )
    .fetch_all(db)
    .await?;

    Ok(actions)
}

#[instrument(skip(db))]
pub async fn get_action_by_id(db: &PgPool, id: Uuid) -> Result<ActionWithUsage, AppError> {
    sqlx::query_as::<_, ActionWithUsage>(
        r#"SELECT a.id, a.name, a.slug, a.description, a.created_at, a.updated_at,
            (SELECT COUNT(*) FROM permission_actions pa WHERE pa.action_id = a.id) AS permission_count
        FROM actions a
        WHERE a.id = $1"#,
    )
    .bind(id)
    .fetch_optional(db)
    .await?
    .ok_or_else(|| AppError::not_found(anyhow!("Action not found")))
}

#[instrument(skip(db))]
pub async fn create_action(db: &PgPool, dto: CreateActionDto) -> Result<Action, AppError> {
    let existing: Option<Uuid> = sqlx::query_scalar("SELECT id FROM actions WHERE slug = $1")
        .bind(&dto.slug)
        .fetch_optional(db)
        .await?;

    if existing.is_some() {
        return Err(AppError::bad_request(anyhow!(
            "Action with this slug already exists"
        )));
    }

    let action = sqlx::query_as::<_, Action>(
        r#"INSERT INTO actions (name, slug, description)
        VALUES ($1, $2, $3)
        RETURNING id, name, slug, description, created_at, updated_at"#,
    )
    .bind(&dto.name)
    .bind(&dto.slug)
    .bind(&dto.description)
    .fetch_one(db)
    .await?;

    Ok(action)
}

#[instrument(skip(db))]
pub async fn update_action(db: &PgPool, id: Uuid, dto: UpdateActionDto) -> Result<Action, AppError> {
    let existing = sqlx::query_as::<_, Action>(
        "SELECT id, name, slug, description, created_at, updated_at FROM actions WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(db)
    .await?
    .ok_or_else(|| AppError::not_found(anyhow!("Action not found")))?;

    if let Some(ref slug) = dto.slug
        && slug != &existing.slug
    {
        let taken: Option<Uuid> = sqlx::query_scalar("SELECT id FROM actions WHERE slug = $1")
            .bind(slug)
            .fetch_optional(db)
            .await?;
        if taken.is_some() {
            return Err(AppError::bad_request(anyhow!(
                "Action with this slug already exists"
            )));
        }
    }

    let action = sqlx::query_as::<_, Action>(
        r#"UPDATE actions
        SET name = COALESCE($2, name),
            slug = COALESCE($3, slug),
            description = COALESCE($4, description),
            updated_at = now()
        WHERE id = $1
        RETURNING id, name, slug, description, created_at, updated_at"#,
    )
    .bind(id)
    .bind(&dto.name)
    .bind(&dto.slug)
    .bind(&dto.description)
    .fetch_one(db)
    .await?;

    Ok(action)
}

/// Deletion is blocked while any permission includes the action.
#[instrument(skip(db))]
pub async fn delete_action(db: &PgPool, id: Uuid) -> Result<(), AppError> {
    let permission_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM permission_actions WHERE action_id = $1")
            .bind(id)
            .fetch_one(db)
            .await?;

    if permission_count > 0 {
        return Err(AppError::bad_request(anyhow!(
            "Cannot delete action with associated permissions"
        )));
    }

    let result = sqlx::query("DELETE FROM actions WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found(anyhow!("Action not found")));
    }

    Ok(())
}
