use anyhow::anyhow;
use sqlx::PgPool;
use std::collections::HashMap;
use tracing::instrument;
use uuid::Uuid;

use gatehouse_core::AppError;
use gatehouse_core::pagination::PaginationMeta;

use crate::modules::actions::model::Action;
use crate::modules::organizations::model::OrganizationSummary;
use crate::modules::resources::model::Resource;
use crate::modules::users::model::UserSummary;

use super::model::{
    CreatePermissionDto, GrantTarget, PaginatedPermissionsResponse, PermissionFilterParams,
    PermissionResponse, RoleTargetSummary, UpdatePermissionDto,
};

#[derive(Debug, sqlx::FromRow)]
struct PermissionRow {
    id: Uuid,
    target: String,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
    resource_id: Uuid,
    resource_name: String,
    resource_slug: String,
    resource_description: Option<String>,
    resource_created_at: chrono::DateTime<chrono::Utc>,
    resource_updated_at: chrono::DateTime<chrono::Utc>,
    user_id: Option<Uuid>,
    user_email: Option<String>,
    user_first_name: Option<String>,
    user_last_name: Option<String>,
    role_id: Option<Uuid>,
    role_name: Option<String>,
    role_organization_id: Option<Uuid>,
    organization_id: Option<Uuid>,
    organization_name: Option<String>,
    organization_slug: Option<String>,
}

const PERMISSION_SELECT: &str = r#"SELECT p.id, p.target, p.created_at, p.updated_at,
    res.id AS resource_id, res.name AS resource_name, res.slug AS resource_slug,
    res.description AS resource_description,
    res.created_at AS resource_created_at, res.updated_at AS resource_updated_at,
    u.id AS user_id, u.email AS user_email,
    u.first_name AS user_first_name, u.last_name AS user_last_name,
    r.id AS role_id, r.name AS role_name, r.organization_id AS role_organization_id,
    o.id AS organization_id, o.name AS organization_name, o.slug AS organization_slug
FROM permissions p
JOIN resources res ON res.id = p.resource_id
LEFT JOIN users u ON u.id = p.user_id
LEFT JOIN roles r ON r.id = p.role_id
LEFT JOIN organizations o ON o.id = p.organization_id"#;

#[derive(Debug, sqlx::FromRow)]
struct PermissionActionRow {
    permission_id: Uuid,
    #[sqlx(flatten)]
    action: Action,
}

async fn load_actions_for(
    db: &PgPool,
    permission_ids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<Action>>, AppError> {
    let rows = sqlx::query_as::<_, PermissionActionRow>(
        r#"SELECT pa.permission_id, a.id, a.name, a.slug, a.description,
            a.created_at, a.updated_at
        FROM permission_actions pa
        JOIN actions a ON a.id = pa.action_id
        WHERE pa.permission_id = ANY($1)
        ORDER BY a.slug"#,
    )
    .bind(permission_ids)
    .fetch_all(db)
    .await?;

    let mut grouped: HashMap<Uuid, Vec<Action>> = HashMap::new();
    for row in rows {
        grouped.entry(row.permission_id).or_default().push(row.action);
    }
    Ok(grouped)
}

fn assemble(row: PermissionRow, actions: Vec<Action>) -> PermissionResponse {
    let user = row.user_id.map(|id| UserSummary {
        id,
        email: row.user_email.unwrap_or_default(),
        first_name: row.user_first_name,
        last_name: row.user_last_name,
    });
    let role = row.role_id.map(|id| RoleTargetSummary {
        id,
        name: row.role_name.unwrap_or_default(),
        organization_id: row.role_organization_id,
    });
    let organization = row.organization_id.map(|id| OrganizationSummary {
        id,
        name: row.organization_name.unwrap_or_default(),
        slug: row.organization_slug.unwrap_or_default(),
    });

    PermissionResponse {
        id: row.id,
        target: row.target,
        resource: Resource {
            id: row.resource_id,
            name: row.resource_name,
            slug: row.resource_slug,
            description: row.resource_description,
            created_at: row.resource_created_at,
            updated_at: row.resource_updated_at,
        },
        actions,
        user,
        role,
        organization,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}

#[instrument(skip(db))]
pub async fn get_permissions(
    db: &PgPool,
    params: PermissionFilterParams,
) -> Result<PaginatedPermissionsResponse, AppError> {
    let limit = params.pagination.limit();
    let offset = params.pagination.offset();

    let rows = sqlx::query_as::<_, PermissionRow>(&format!(
        r#"{PERMISSION_SELECT}
        WHERE ($1::text IS NULL OR p.target = $1)
        ORDER BY p.created_at DESC
        LIMIT $2 OFFSET $3"#
    ))
    .bind(&params.target)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;

    let total: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM permissions WHERE ($1::text IS NULL OR target = $1)",
    )
    .bind(&params.target)
    .fetch_one(db)
    .await?;

    let permission_ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
    let mut actions_by_permission = load_actions_for(db, &permission_ids).await?;

    let has_more = offset + (rows.len() as i64) < total;
    let data = rows
        .into_iter()
        .map(|row| {
            let actions = actions_by_permission.remove(&row.id).unwrap_or_default();
            assemble(row, actions)
        })
        .collect();

    Ok(PaginatedPermissionsResponse {
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

#[instrument(skip(db))]
pub async fn get_permission_by_id(db: &PgPool, id: Uuid) -> Result<PermissionResponse, AppError> {
    let row = sqlx::query_as::<_, PermissionRow>(&format!("{PERMISSION_SELECT} WHERE p.id = $1"))
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("Permission not found")))?;

    let mut actions_by_permission = load_actions_for(db, &[id]).await?;
    let actions = actions_by_permission.remove(&id).unwrap_or_default();

    Ok(assemble(row, actions))
}

async fn verify_actions_exist(db: &PgPool, action_ids: &[Uuid]) -> Result<(), AppError> {
    let mut distinct = action_ids.to_vec();
    distinct.sort_unstable();
    distinct.dedup();

    let found: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM actions WHERE id = ANY($1)")
        .bind(&distinct)
        .fetch_one(db)
        .await?;

    if found != distinct.len() as i64 {
        return Err(AppError::bad_request(anyhow!("One or more actions not found")));
    }
    Ok(())
}

async fn verify_target_exists(db: &PgPool, target: GrantTarget) -> Result<(), AppError> {
    let (query, id) = match target {
        GrantTarget::User(id) => ("SELECT id FROM users WHERE id = $1", id),
        GrantTarget::Role(id) => ("SELECT id FROM roles WHERE id = $1", id),
        GrantTarget::Organization(id) => ("SELECT id FROM organizations WHERE id = $1", id),
    };

    let found: Option<Uuid> = sqlx::query_scalar(query).bind(id).fetch_optional(db).await?;
    if found.is_none() {
        return Err(AppError::bad_request(anyhow!("Grant target not found")));
    }
    Ok(())
}

/// Creates a grant: the permission row and its action set in one
/// transaction, so no reader ever observes a permission without actions.
#[instrument(skip(db))]
pub async fn create_permission(
    db: &PgPool,
    dto: CreatePermissionDto,
) -> Result<PermissionResponse, AppError> {
    let target = dto.grant_target()?;

    let resource: Option<Uuid> = sqlx::query_scalar("SELECT id FROM resources WHERE id = $1")
        .bind(dto.resource_id)
        .fetch_optional(db)
        .await?;
    if resource.is_none() {
        return Err(AppError::bad_request(anyhow!("Resource not found")));
    }

    verify_target_exists(db, target).await?;
    verify_actions_exist(db, &dto.action_ids).await?;

    let mut tx = db.begin().await?;

    let permission_id: Uuid = sqlx::query_scalar(
        r#"INSERT INTO permissions (target, user_id, role_id, organization_id, resource_id)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id"#,
    )
    .bind(target.kind())
    .bind(target.user_id())
    .bind(target.role_id())
    .bind(target.organization_id())
    .bind(dto.resource_id)
    .fetch_one(&mut *tx)
    .await?;

    for action_id in &dto.action_ids {
        sqlx::query(
            r#"INSERT INTO permission_actions (permission_id, action_id)
            VALUES ($1, $2) ON CONFLICT DO NOTHING"#,
        )
        .bind(permission_id)
        .bind(action_id)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    get_permission_by_id(db, permission_id).await
}

/// Replaces the grant's action set (and optionally its resource) in one
/// transaction.
#[instrument(skip(db))]
pub async fn update_permission(
    db: &PgPool,
    id: Uuid,
    dto: UpdatePermissionDto,
) -> Result<PermissionResponse, AppError> {
    let existing: Option<Uuid> = sqlx::query_scalar("SELECT id FROM permissions WHERE id = $1")
        .bind(id)
        .fetch_optional(db)
        .await?;
    if existing.is_none() {
        return Err(AppError::not_found(anyhow!("Permission not found")));
    }

    if let Some(resource_id) = dto.resource_id {
        let resource: Option<Uuid> = sqlx::query_scalar("SELECT id FROM resources WHERE id = $1")
            .bind(resource_id)
            .fetch_optional(db)
            .await?;
        if resource.is_none() {
            return Err(AppError::bad_request(anyhow!("Resource not found")));
        }
    }

    verify_actions_exist(db, &dto.action_ids).await?;

    let mut tx = db.begin().await?;

    sqlx::query("DELETE FROM permission_actions WHERE permission_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    sqlx::query(
        r#"UPDATE permissions
        SET resource_id = COALESCE($2, resource_id), updated_at = now()
        WHERE id = $1"#,
    )
    .bind(id)
    .bind(dto.resource_id)
    .execute(&mut *tx)
    .await?;

    for action_id in &dto.action_ids {
        sqlx::query(
            r#"INSERT INTO permission_actions (permission_id, action_id)
            VALUES ($1, $2) ON CONFLICT DO NOTHING"#,
        )
        .bind(id)
        .bind(action_id)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    get_permission_by_id(db, id).await
}

#[instrument(skip(db))]
pub async fn delete_permission(db: &PgPool, id: Uuid) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM permissions WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found(anyhow!("Permission not found")));
    }

    Ok(())
}
