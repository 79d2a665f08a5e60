//! Permission snapshot assembly.
//!
//! Runs once at login and once per token refresh. Everything the evaluator
//! will ever be asked about this principal is gathered here and frozen into
//! the access token; later grant changes only take effect when the session
//! refreshes.
//!
//! The builder reads three independent projections:
//!
//! 1. global role names, to derive the admin flag,
//! 2. grants targeting the user directly,
//! 3. memberships in **root** organizations (no parent), each with the
//!    organization's own grants and the grants of the member's role, if any.
//!
//! Memberships in sub-organizations are deliberately not loaded: authority is
//! delegated at the top level of each organization tree only.
//!
//! Grant rows that carry no actions grant nothing anywhere, so they are
//! dropped here with a warning rather than failing the whole login.

use sqlx::PgPool;
use tracing::{instrument, warn};
use uuid::Uuid;

use gatehouse_core::AppError;
use gatehouse_core::authz::{ADMIN_ROLE_NAME, GrantView, MembershipSnapshot, PermissionSnapshot};

#[derive(Debug, sqlx::FromRow)]
struct GrantRow {
    resource_slug: String,
    action_slugs: Vec<String>,
}

#[derive(Debug, sqlx::FromRow)]
struct MembershipRow {
    organization_id: Uuid,
    role_id: Option<Uuid>,
}

/// Builds the permission snapshot for a verified, active principal.
///
/// The caller has already authenticated the user; a missing or suspended
/// principal never reaches this function. A principal with no grants gets an
/// empty snapshot, which is valid and denies everything.
#[instrument(skip(db))]
pub async fn build_snapshot(db: &PgPool, user_id: Uuid) -> Result<PermissionSnapshot, AppError> {
    let is_admin = load_is_admin(db, user_id).await?;
    let direct_grants = load_user_grants(db, user_id).await?;

    let membership_rows = sqlx::query_as::<_, MembershipRow>(
        r#"SELECT m.organization_id, m.role_id
        FROM organization_members m
        JOIN organizations o ON o.id = m.organization_id
        WHERE m.user_id = $1 AND o.parent_id IS NULL"#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;

    let mut memberships = Vec::with_capacity(membership_rows.len());
    for row in membership_rows {
        let organization_grants = load_organization_grants(db, row.organization_id).await?;
        let role_grants = match row.role_id {
            Some(role_id) => load_role_grants(db, role_id).await?,
            None => Vec::new(),
        };
        memberships.push(MembershipSnapshot {
            organization_id: row.organization_id,
            role_grants,
            organization_grants,
        });
    }

    Ok(PermissionSnapshot {
        is_admin,
        direct_grants,
        memberships,
    })
}

async fn load_is_admin(db: &PgPool, user_id: Uuid) -> Result<bool, AppError> {
    let role_names: Vec<String> = sqlx::query_scalar(
        r#"SELECT r.name FROM user_roles ur
        JOIN roles r ON r.id = ur.role_id
        WHERE ur.user_id = $1"#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;

    // Exact, case-sensitive match on the reserved role name.
    Ok(role_names.iter().any(|name| name == ADMIN_ROLE_NAME))
}

async fn load_user_grants(db: &PgPool, user_id: Uuid) -> Result<Vec<GrantView>, AppError> {
    let rows = sqlx::query_as::<_, GrantRow>(
        r#"SELECT r.slug AS resource_slug,
            array_remove(array_agg(a.slug), NULL) AS action_slugs
        FROM permissions p
        JOIN resources r ON r.id = p.resource_id
        LEFT JOIN permission_actions pa ON pa.permission_id = p.id
        LEFT JOIN actions a ON a.id = pa.action_id
        WHERE p.target = 'USER' AND p.user_id = $1
        GROUP BY p.id, r.slug"#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;

    Ok(collect_grants(rows, "user", user_id))
}

async fn load_role_grants(db: &PgPool, role_id: Uuid) -> Result<Vec<GrantView>, AppError> {
    let rows = sqlx::query_as::<_, GrantRow>(
        r#"SELECT r.slug AS resource_slug,
            array_remove(array_agg(a.slug), NULL) AS action_slugs
        FROM permissions p
        JOIN resources r ON r.id = p.resource_id
        LEFT JOIN permission_actions pa ON pa.permission_id = p.id
        LEFT JOIN actions a ON a.id = pa.action_id
        WHERE p.target = 'ROLE' AND p.role_id = $1
        GROUP BY p.id, r.slug"#,
    )
    .bind(role_id)
    .fetch_all(db)
    .await?;

    Ok(collect_grants(rows, "role", role_id))
}

async fn load_organization_grants(
    db: &PgPool,
    organization_id: Uuid,
) -> Result<Vec<GrantView>, AppError> {
    let rows = sqlx::query_as::<_, GrantRow>(
        r#"SELECT r.slug AS resource_slug,
            array_remove(array_agg(a.slug), NULL) AS action_slugs
        FROM permissions p
        JOIN resources r ON r.id = p.resource_id
        LEFT JOIN permission_actions pa ON pa.permission_id = p.id
        LEFT JOIN actions a ON a.id = pa.action_id
        WHERE p.target = 'ORGANIZATION' AND p.organization_id = $1
        GROUP BY p.id, r.slug"#,
    )
    .bind(organization_id)
    .fetch_all(db)
    .await?;

    Ok(collect_grants(rows, "organization", organization_id))
}

/// Drops action-less grant rows (they can never match) so one malformed
/// record does not take the whole login down with it.
fn collect_grants(rows: Vec<GrantRow>, target_kind: &str, target_id: Uuid) -> Vec<GrantView> {
    rows.into_iter()
        .filter_map(|row| {
            if row.action_slugs.is_empty() {
                warn!(
                    target_kind = target_kind,
                    target_id = %target_id,
                    resource_slug = %row.resource_slug,
                    "Skipping grant with no actions while building snapshot"
                );
                return None;
            }
            Some(GrantView {
                resource_slug: row.resource_slug,
                action_slugs: row.action_slugs,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collect_grants_skips_actionless_rows() {
        let rows = vec![
            GrantRow {
                resource_slug: "user".to_string(),
                action_slugs: vec!["view".to_string()],
            },
            GrantRow {
                resource_slug: "broken".to_string(),
                action_slugs: vec![],
            },
        ];

        let grants = collect_grants(rows, "user", Uuid::new_v4());

        assert_eq!(grants.len(), 1);
        assert_eq!(grants[0].resource_slug, "user");
    }

    #[test]
    fn collect_grants_keeps_order_and_contents() {
        let rows = vec![
            GrantRow {
                resource_slug: "*".to_string(),
                action_slugs: vec!["manage".to_string()],
            },
            GrantRow {
                resource_slug: "report".to_string(),
                action_slugs: vec!["view".to_string(), "export".to_string()],
            },
        ];

        let grants = collect_grants(rows, "role", Uuid::new_v4());

        assert_eq!(grants.len(), 2);
        assert_eq!(grants[0].resource_slug, "*");
        assert_eq!(grants[1].action_slugs, vec!["view", "export"]);
    }
}
