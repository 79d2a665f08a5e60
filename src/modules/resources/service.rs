use anyhow::anyhow;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use gatehouse_core::AppError;

use super::model::{CreateResourceDto, Resource, ResourceWithUsage, UpdateResourceDto};

#[instrument(skip(db))]
pub async fn get_resources(db: &PgPool) -> Result<Vec<ResourceWithUsage>, AppError> {
    let resources = sqlx::query_as::<_, ResourceWithUsage>(
        r#"SELECT r.id, r.name, r.slug, r.description, r.created_at, r.updated_at,
            (SELECT COUNT(*) FROM permissions p WHERE p.resource_id = r.id) AS permission_count
        FROM resources r
        ORDER BY r.slug"#,
    )
    .fetch_all(db)
    .await?;

    Ok(resources)
}

#[instrument(skip(db))]
pub async fn get_resource_by_id(db: &PgPool, id: Uuid) -> Result<ResourceWithUsage, AppError> {
    sqlx::query_as::<_, ResourceWithUsage>(
        r#"SELECT r.id, r.name, r.slug, r.description, r.created_at, r.updated_at,
            (SELECT COUNT(*) FROM permissions p WHERE p.resource_id = r.id) AS permission_count
        FROM resources r
        WHERE r.id = $1"#,
    )
    .bind(id)
    .fetch_optional(db)
    .await?
    .ok_or_else(|| AppError::not_found(anyhow!("Resource not found")))
}

#[instrument(skip(db))]
pub async fn create_resource(db: &PgPool, dto: CreateResourceDto) -> Result<Resource, AppError> {
    let existing: Option<Uuid> = sqlx::query_scalar("SELECT id FROM resources WHERE slug = $1")
        .bind(&dto.slug)
        .fetch_optional(db)
        .await?;

    if existing.is_some() {
        return Err(AppError::bad_request(anyhow!(
            "Resource with this slug already exists"
        )));
    }

    let resource = sqlx::query_as::<_, Resource>(
        r#"INSERT INTO resources (name, slug, description)
        VALUES ($1, $2, $3)
        RETURNING id, name, slug, description, created_at, updated_at"#,
    )
    .bind(&dto.name)
    .bind(&dto.slug)
    .bind(&dto.description)
    .fetch_one(db)
    .await?;

    Ok(resource)
}

#[instrument(skip(db))]
pub async fn update_resource(
    db: &PgPool,
    id: Uuid,
    dto: UpdateResourceDto,
) -> Result<Resource, AppError> {
    let existing = sqlx::query_as::<_, Resource>(
        "SELECT id, name, slug, description, created_at, updated_at FROM resources WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(db)
    .await?
    .ok_or_else(|| AppError::not_found(anyhow!("Resource not found")))?;

    if let Some(ref slug) = dto.slug
        && slug != &existing.slug
    {
        let taken: Option<Uuid> = sqlx::query_scalar("SELECT id FROM resources WHERE slug = $1")
            .bind(slug)
            .fetch_optional(db)
            .await?;
        if taken.is_some() {
            return Err(AppError::bad_request(anyhow!(
                "Resource with this slug already exists"
            )));
        }
    }

    let resource = sqlx::query_as::<_, Resource>(
        r#"UPDATE resources
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

    Ok(resource)
}

/// Deletion is blocked while any permission references the resource, so a
/// grant can never point at a vanished slug.
#[instrument(skip(db))]
pub async fn delete_resource(db: &PgPool, id: Uuid) -> Result<(), AppError> {
    let permission_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM permissions WHERE resource_id = $1")
            .bind(id)
            .fetch_one(db)
            .await?;

    if permission_count > 0 {
        return Err(AppError::bad_request(anyhow!(
            "Cannot delete resource that has associated permissions"
        )));
    }

    let result = sqlx::query("DELETE FROM resources WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found(anyhow!("Resource not found")));
    }

    Ok(())
}
