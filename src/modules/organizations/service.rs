use anyhow::anyhow;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use gatehouse_core::AppError;

use crate::modules::roles::model::RoleSummary;
use crate::modules::users::model::UserSummary;

use super::model::{
    AddUsersDto, AddUsersResponse, CreateOrganizationDto, Organization, OrganizationDetail,
    OrganizationMemberView, OrganizationSummary, OrganizationWithCounts, UpdateOrganizationDto,
};

const ORG_COLUMNS: &str =
    "id, name, slug, status, parent_id, owner_id, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct OrganizationListRow {
    #[sqlx(flatten)]
    organization: Organization,
    owner_email: String,
    owner_first_name: Option<String>,
    owner_last_name: Option<String>,
    member_count: i64,
    child_count: i64,
}

#[instrument(skip(db))]
pub async fn get_organizations(db: &PgPool) -> Result<Vec<OrganizationWithCounts>, AppError> {
    let rows = sqlx::query_as::<_, OrganizationListRow>(
        r#"SELECT o.id, o.name, o.slug, o.status, o.parent_id, o.owner_id,
            o.created_at, o.updated_at,
            u.email AS owner_email,
            u.first_name AS owner_first_name,
            u.last_name AS owner_last_name,
            (SELECT COUNT(*) FROM organization_members m WHERE m.organization_id = o.id) AS member_count,
            (SELECT COUNT(*) FROM organizations c WHERE c.parent_id = o.id) AS child_count
        FROM organizations o
        JOIN users u ON u.id = o.owner_id
        ORDER BY o.name"#,
    )
    .fetch_all(db)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| {
            let owner = UserSummary {
                id: row.organization.owner_id,
                email: row.owner_email,
                first_name: row.owner_first_name,
                last_name: row.owner_last_name,
            };
            OrganizationWithCounts {
                organization: row.organization,
                owner,
                member_count: row.member_count,
                child_count: row.child_count,
            }
        })
        .collect())
}

/// Organizations that may become the parent of `organization_id`: everything
/// except the organization itself and its descendants, so reparenting can
/// never close a cycle. With no id, every organization qualifies.
#[instrument(skip(db))]
pub async fn get_available_parents(
    db: &PgPool,
    organization_id: Option<Uuid>,
) -> Result<Vec<OrganizationSummary>, AppError> {
    let parents = match organization_id {
        Some(id) => {
            sqlx::query_as::<_, OrganizationSummary>(
                r#"WITH RECURSIVE descendants AS (
                    SELECT id FROM organizations WHERE id = $1
                    UNION ALL
                    SELECT o.id FROM organizations o
                    JOIN descendants d ON o.parent_id = d.id
                )
                SELECT id, name, slug FROM organizations
                WHERE id NOT IN (SELECT id FROM descendants)
                ORDER BY name"#,
            )
            .bind(id)
            .fetch_all(db)
            .await?
        }
        None => {
            sqlx::query_as::<_, OrganizationSummary>(
                "SELECT id, name, slug FROM organizations ORDER BY name",
            )
            .fetch_all(db)
            .await?
        }
    };

    Ok(parents)
}

#[instrument(skip(db))]
pub async fn get_organization_by_id(db: &PgPool, id: Uuid) -> Result<OrganizationDetail, AppError> {
    let organization = sqlx::query_as::<_, Organization>(&format!(
        "SELECT {ORG_COLUMNS} FROM organizations WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(db)
    .await?
    .ok_or_else(|| AppError::not_found(anyhow!("Organization not found")))?;

    let owner = sqlx::query_as::<_, UserSummary>(
        "SELECT id, email, first_name, last_name FROM users WHERE id = $1",
    )
    .bind(organization.owner_id)
    .fetch_one(db)
    .await?;

    let parent = match organization.parent_id {
        Some(parent_id) => {
            sqlx::query_as::<_, OrganizationSummary>(
                "SELECT id, name, slug FROM organizations WHERE id = $1",
            )
            .bind(parent_id)
            .fetch_optional(db)
            .await?
        }
        None => None,
    };

    let children = sqlx::query_as::<_, OrganizationSummary>(
        "SELECT id, name, slug FROM organizations WHERE parent_id = $1 ORDER BY name",
    )
    .bind(id)
    .fetch_all(db)
    .await?;

    #[derive(sqlx::FromRow)]
    struct MemberRow {
        membership_id: Uuid,
        #[sqlx(flatten)]
        user: UserSummary,
        role_id: Option<Uuid>,
        role_name: Option<String>,
        role_description: Option<String>,
    }
    let member_rows = sqlx::query_as::<_, MemberRow>(
        r#"SELECT m.id AS membership_id, u.id, u.email, u.first_name, u.last_name,
            r.id AS role_id, r.name AS role_name, r.description AS role_description
        FROM organization_members m
        JOIN users u ON u.id = m.user_id
        LEFT JOIN roles r ON r.id = m.role_id
        WHERE m.organization_id = $1
        ORDER BY u.email"#,
    )
    .bind(id)
    .fetch_all(db)
    .await?;

    let members = member_rows
        .into_iter()
        .map(|row| OrganizationMemberView {
            id: row.membership_id,
            user: row.user,
            role: row.role_id.map(|role_id| RoleSummary {
                id: role_id,
                name: row.role_name.unwrap_or_default(),
                description: row.role_description,
            }),
        })
        .collect();

    let roles = sqlx::query_as::<_, RoleSummary>(
        "SELECT id, name, description FROM roles WHERE organization_id = $1 ORDER BY name",
    )
    .bind(id)
    .fetch_all(db)
    .await?;

    Ok(OrganizationDetail {
        organization,
        owner,
        parent,
        children,
        members,
        roles,
    })
}

#[instrument(skip(db))]
pub async fn create_organization(
    db: &PgPool,
    dto: CreateOrganizationDto,
    owner_id: Uuid,
) -> Result<Organization, AppError> {
    let existing: Option<Uuid> = sqlx::query_scalar("SELECT id FROM organizations WHERE slug = $1")
        .bind(&dto.slug)
        .fetch_optional(db)
        .await?;

    if existing.is_some() {
        return Err(AppError::bad_request(anyhow!(
            "Organization with this slug already exists"
        )));
    }

    if let Some(parent_id) = dto.parent_id {
        let parent_exists: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM organizations WHERE id = $1")
                .bind(parent_id)
                .fetch_optional(db)
                .await?;
        if parent_exists.is_none() {
            return Err(AppError::bad_request(anyhow!("Parent organization not found")));
        }
    }

    let organization = sqlx::query_as::<_, Organization>(&format!(
        r#"INSERT INTO organizations (name, slug, status, parent_id, owner_id)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {ORG_COLUMNS}"#
    ))
    .bind(&dto.name)
    .bind(&dto.slug)
    .bind(dto.status.as_deref().unwrap_or("ACTIVE"))
    .bind(dto.parent_id)
    .bind(owner_id)
    .fetch_one(db)
    .await?;

    Ok(organization)
}

/// Whether `candidate` is `organization` itself or one of its descendants.
/// Used to refuse reparenting that would make an organization its own
/// ancestor.
async fn is_self_or_descendant(
    db: &PgPool,
    organization: Uuid,
    candidate: Uuid,
) -> Result<bool, AppError> {
    let found: Option<Uuid> = sqlx::query_scalar(
        r#"WITH RECURSIVE descendants AS (
            SELECT id FROM organizations WHERE id = $1
            UNION ALL
            SELECT o.id FROM organizations o
            JOIN descendants d ON o.parent_id = d.id
        )
        SELECT id FROM descendants WHERE id = $2"#,
    )
    .bind(organization)
    .bind(candidate)
    .fetch_optional(db)
    .await?;

    Ok(found.is_some())
}

#[instrument(skip(db))]
pub async fn update_organization(
    db: &PgPool,
    id: Uuid,
    dto: UpdateOrganizationDto,
) -> Result<Organization, AppError> {
    let existing = sqlx::query_as::<_, Organization>(&format!(
        "SELECT {ORG_COLUMNS} FROM organizations WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(db)
    .await?
    .ok_or_else(|| AppError::not_found(anyhow!("Organization not found")))?;

    if let Some(ref slug) = dto.slug
        && slug != &existing.slug
    {
        let taken: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM organizations WHERE slug = $1")
                .bind(slug)
                .fetch_optional(db)
                .await?;
        if taken.is_some() {
            return Err(AppError::bad_request(anyhow!(
                "Organization with this slug already exists"
            )));
        }
    }

    if let Some(parent_id) = dto.parent_id {
        let parent_exists: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM organizations WHERE id = $1")
                .bind(parent_id)
                .fetch_optional(db)
                .await?;
        if parent_exists.is_none() {
            return Err(AppError::bad_request(anyhow!("Parent organization not found")));
        }
        if is_self_or_descendant(db, id, parent_id).await? {
            return Err(AppError::bad_request(anyhow!(
                "An organization cannot become its own ancestor"
            )));
        }
    }

    let organization = sqlx::query_as::<_, Organization>(&format!(
        r#"UPDATE organizations
        SET name = COALESCE($2, name),
            slug = COALESCE($3, slug),
            status = COALESCE($4, status),
            parent_id = COALESCE($5, parent_id),
            updated_at = now()
        WHERE id = $1
        RETURNING {ORG_COLUMNS}"#
    ))
    .bind(id)
    .bind(&dto.name)
    .bind(&dto.slug)
    .bind(&dto.status)
    .bind(dto.parent_id)
    .fetch_one(db)
    .await?;

    Ok(organization)
}

/// Only the owner may delete an organization. Memberships and scoped roles
/// go with it via cascade.
#[instrument(skip(db))]
pub async fn delete_organization(db: &PgPool, id: Uuid, caller_id: Uuid) -> Result<(), AppError> {
    let organization = sqlx::query_as::<_, Organization>(&format!(
        "SELECT {ORG_COLUMNS} FROM organizations WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(db)
    .await?
    .ok_or_else(|| AppError::not_found(anyhow!("Organization not found")))?;

    if organization.owner_id != caller_id {
        return Err(AppError::forbidden(anyhow!(
            "Only the owner can delete the organization"
        )));
    }

    sqlx::query("DELETE FROM organizations WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;

    Ok(())
}

/// Adds users as members, skipping anyone who already belongs. New members
/// receive the organization's default role when one is configured.
#[instrument(skip(db))]
pub async fn add_users(
    db: &PgPool,
    organization_id: Uuid,
    dto: AddUsersDto,
) -> Result<AddUsersResponse, AppError> {
    let exists: Option<Uuid> = sqlx::query_scalar("SELECT id FROM organizations WHERE id = $1")
        .bind(organization_id)
        .fetch_optional(db)
        .await?;
    if exists.is_none() {
        return Err(AppError::not_found(anyhow!("Organization not found")));
    }

    let existing_user_ids: Vec<Uuid> = sqlx::query_scalar(
        r#"SELECT user_id FROM organization_members
        WHERE organization_id = $1 AND user_id = ANY($2)"#,
    )
    .bind(organization_id)
    .bind(&dto.user_ids)
    .fetch_all(db)
    .await?;

    let new_user_ids: Vec<Uuid> = dto
        .user_ids
        .iter()
        .copied()
        .filter(|id| !existing_user_ids.contains(id))
        .collect();

    let default_role_id: Option<Uuid> = sqlx::query_scalar(
        "SELECT id FROM roles WHERE organization_id = $1 AND is_default LIMIT 1",
    )
    .bind(organization_id)
    .fetch_optional(db)
    .await?;

    let mut added = 0u64;
    let mut tx = db.begin().await?;
    for user_id in &new_user_ids {
        let result = sqlx::query(
            r#"INSERT INTO organization_members (organization_id, user_id, role_id)
            VALUES ($1, $2, $3)
            ON CONFLICT DO NOTHING"#,
        )
        .bind(organization_id)
        .bind(user_id)
        .bind(default_role_id)
        .execute(&mut *tx)
        .await?;
        added += result.rows_affected();
    }
    tx.commit().await?;

    Ok(AddUsersResponse {
        added,
        skipped: existing_user_ids.len(),
    })
}
