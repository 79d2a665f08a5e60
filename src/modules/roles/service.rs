use anyhow::anyhow;
use sqlx::PgPool;
use std::collections::HashMap;
use tracing::instrument;
use uuid::Uuid;

use gatehouse_core::AppError;
use gatehouse_core::authz::{ADMIN_ROLE_NAME, GrantView};

use crate::modules::organizations::model::OrganizationSummary;
use crate::modules::users::model::UserSummary;

use super::model::{CreateRoleDto, Role, RoleDetail, RoleWithGrants, UpdateRoleDto};

const ROLE_COLUMNS: &str =
    "id, name, description, is_default, organization_id, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct RoleGrantRow {
    role_id: Uuid,
    resource_slug: String,
    action_slugs: Vec<String>,
}

/// Loads the grants of a set of roles in one query, grouped by role id.
/// Action-less rows are kept here — the admin UI should show them so they
/// can be repaired, even though the evaluator ignores them.
async fn load_grants_for(
    db: &PgPool,
    role_ids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<GrantView>>, AppError> {
    let rows = sqlx::query_as::<_, RoleGrantRow>(
        r#"SELECT p.role_id, r.slug AS resource_slug,
            array_remove(array_agg(a.slug), NULL) AS action_slugs
        FROM permissions p
        JOIN resources r ON r.id = p.resource_id
        LEFT JOIN permission_actions pa ON pa.permission_id = p.id
        LEFT JOIN actions a ON a.id = pa.action_id
        WHERE p.target = 'ROLE' AND p.role_id = ANY($1)
        GROUP BY p.id, p.role_id, r.slug"#,
    )
    .bind(role_ids)
    .fetch_all(db)
    .await?;

    let mut grouped: HashMap<Uuid, Vec<GrantView>> = HashMap::new();
    for row in rows {
        grouped.entry(row.role_id).or_default().push(GrantView {
            resource_slug: row.resource_slug,
            action_slugs: row.action_slugs,
        });
    }
    Ok(grouped)
}

async fn load_organization_summary(
    db: &PgPool,
    organization_id: Option<Uuid>,
) -> Result<Option<OrganizationSummary>, AppError> {
    match organization_id {
        Some(id) => {
            let summary = sqlx::query_as::<_, OrganizationSummary>(
                "SELECT id, name, slug FROM organizations WHERE id = $1",
            )
            .bind(id)
            .fetch_optional(db)
            .await?;
            Ok(summary)
        }
        None => Ok(None),
    }
}

#[instrument(skip(db))]
pub async fn get_roles(db: &PgPool) -> Result<Vec<RoleWithGrants>, AppError> {
    let roles = sqlx::query_as::<_, Role>(&format!(
        "SELECT {ROLE_COLUMNS} FROM roles ORDER BY organization_id NULLS FIRST, name"
    ))
    .fetch_all(db)
    .await?;

    let role_ids: Vec<Uuid> = roles.iter().map(|r| r.id).collect();
    let mut grants_by_role = load_grants_for(db, &role_ids).await?;

    #[derive(sqlx::FromRow)]
    struct CountRow {
        role_id: Uuid,
        user_count: i64,
    }
    let counts = sqlx::query_as::<_, CountRow>(
        r#"SELECT role_id, COUNT(*) AS user_count
        FROM user_roles
        WHERE role_id = ANY($1)
        GROUP BY role_id"#,
    )
    .bind(&role_ids)
    .fetch_all(db)
    .await?;
    let counts_by_role: HashMap<Uuid, i64> =
        counts.into_iter().map(|c| (c.role_id, c.user_count)).collect();

    let mut result = Vec::with_capacity(roles.len());
    for role in roles {
        let organization = load_organization_summary(db, role.organization_id).await?;
        let grants = grants_by_role.remove(&role.id).unwrap_or_default();
        let user_count = counts_by_role.get(&role.id).copied().unwrap_or(0);
        result.push(RoleWithGrants {
            role,
            organization,
            grants,
            user_count,
        });
    }

    Ok(result)
}

#[instrument(skip(db))]
pub async fn get_role_by_id(db: &PgPool, id: Uuid) -> Result<RoleDetail, AppError> {
    let role = sqlx::query_as::<_, Role>(&format!("SELECT {ROLE_COLUMNS} FROM roles WHERE id = $1"))
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("Role not found")))?;

    let organization = load_organization_summary(db, role.organization_id).await?;
    let mut grants_by_role = load_grants_for(db, &[id]).await?;
    let grants = grants_by_role.remove(&id).unwrap_or_default();

    let users = sqlx::query_as::<_, UserSummary>(
        r#"SELECT u.id, u.email, u.first_name, u.last_name
        FROM user_roles ur
        JOIN users u ON u.id = ur.user_id
        WHERE ur.role_id = $1
        ORDER BY u.email"#,
    )
    .bind(id)
    .fetch_all(db)
    .await?;

    Ok(RoleDetail {
        role,
        organization,
        grants,
        users,
    })
}

/// Role name uniqueness is per scope: global names among global roles,
/// organization-scoped names within their organization.
async fn name_taken_in_scope(
    db: &PgPool,
    name: &str,
    organization_id: Option<Uuid>,
    exclude: Option<Uuid>,
) -> Result<bool, AppError> {
    let taken: Option<Uuid> = sqlx::query_scalar(
        r#"SELECT id FROM roles
        WHERE name = $1
          AND organization_id IS NOT DISTINCT FROM $2
          AND ($3::uuid IS NULL OR id <> $3)
        LIMIT 1"#,
    )
    .bind(name)
    .bind(organization_id)
    .bind(exclude)
    .fetch_optional(db)
    .await?;

    Ok(taken.is_some())
}

#[instrument(skip(db))]
pub async fn create_role(db: &PgPool, dto: CreateRoleDto) -> Result<Role, AppError> {
    if let Some(org_id) = dto.organization_id {
        let exists: Option<Uuid> = sqlx::query_scalar("SELECT id FROM organizations WHERE id = $1")
            .bind(org_id)
            .fetch_optional(db)
            .await?;
        if exists.is_none() {
            return Err(AppError::bad_request(anyhow!("Organization not found")));
        }
    }

    if name_taken_in_scope(db, &dto.name, dto.organization_id, None).await? {
        return Err(AppError::bad_request(anyhow!(
            "Role with this name already exists in this scope"
        )));
    }

    let is_default = dto.is_default.unwrap_or(false);

    // Clearing the previous default and inserting the new one must be one
    // atomic unit; a concurrent flip in the same scope serializes on the
    // partial unique index.
    let mut tx = db.begin().await?;

    if is_default {
        sqlx::query(
            r#"UPDATE roles SET is_default = FALSE, updated_at = now()
            WHERE is_default AND organization_id IS NOT DISTINCT FROM $1"#,
        )
        .bind(dto.organization_id)
        .execute(&mut *tx)
        .await?;
    }

    let role = sqlx::query_as::<_, Role>(&format!(
        r#"INSERT INTO roles (name, description, is_default, organization_id)
        VALUES ($1, $2, $3, $4)
        RETURNING {ROLE_COLUMNS}"#
    ))
    .bind(&dto.name)
    .bind(&dto.description)
    .bind(is_default)
    .bind(dto.organization_id)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(db_err) = &e
            && db_err.is_unique_violation()
        {
            return AppError::bad_request(anyhow!(
                "Role with this name already exists in this scope"
            ));
        }
        AppError::from(e)
    })?;

    tx.commit().await?;

    Ok(role)
}

#[instrument(skip(db))]
pub async fn update_role(db: &PgPool, id: Uuid, dto: UpdateRoleDto) -> Result<Role, AppError> {
    let existing = sqlx::query_as::<_, Role>(&format!("SELECT {ROLE_COLUMNS} FROM roles WHERE id = $1"))
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("Role not found")))?;

    if let Some(ref name) = dto.name
        && name != &existing.name
        && name_taken_in_scope(db, name, existing.organization_id, Some(id)).await?
    {
        return Err(AppError::bad_request(anyhow!(
            "Role with this name already exists in this scope"
        )));
    }

    let mut tx = db.begin().await?;

    if dto.is_default == Some(true) {
        sqlx::query(
            r#"UPDATE roles SET is_default = FALSE, updated_at = now()
            WHERE is_default AND organization_id IS NOT DISTINCT FROM $1 AND id <> $2"#,
        )
        .bind(existing.organization_id)
        .bind(id)
        .execute(&mut *tx)
        .await?;
    }

    let role = sqlx::query_as::<_, Role>(&format!(
        r#"UPDATE roles
        SET name = COALESCE($2, name),
            description = COALESCE($3, description),
            is_default = COALESCE($4, is_default),
            updated_at = now()
        WHERE id = $1
        RETURNING {ROLE_COLUMNS}"#
    ))
    .bind(id)
    .bind(&dto.name)
    .bind(&dto.description)
    .bind(dto.is_default)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(role)
}

#[instrument(skip(db))]
pub async fn delete_role(db: &PgPool, id: Uuid) -> Result<(), AppError> {
    let role = sqlx::query_as::<_, Role>(&format!("SELECT {ROLE_COLUMNS} FROM roles WHERE id = $1"))
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("Role not found")))?;

    // The reserved admin role is the root of all authority; deleting it
    // would lock every administrator out.
    if role.organization_id.is_none() && role.name == ADMIN_ROLE_NAME {
        return Err(AppError::bad_request(anyhow!(
            "The reserved admin role cannot be deleted"
        )));
    }

    sqlx::query("DELETE FROM roles WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;

    Ok(())
}
