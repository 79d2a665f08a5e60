//! Default permission catalog.
//!
//! Upserts are keyed on the unique slugs / scoped names, so re-running the
//! seeder refreshes descriptions without duplicating rows.

use sqlx::PgPool;

use gatehouse_core::authz::ADMIN_ROLE_NAME;

const DEFAULT_RESOURCES: [(&str, &str, &str); 7] = [
    ("ALL", "*", "All resources (wildcard)"),
    ("ORGANIZATION", "organization", "Organization management"),
    ("USER", "user", "User management"),
    ("ROLE", "role", "Role management"),
    ("PERMISSION", "permission", "Permission management"),
    ("RESOURCE", "resource", "Resource catalog management"),
    ("ACTION", "action", "Action catalog management"),
];

const DEFAULT_ACTIONS: [(&str, &str, &str); 5] = [
    ("VIEW", "view", "Permission to view"),
    ("CREATE", "create", "Permission to create"),
    ("EDIT", "edit", "Permission to edit"),
    ("DELETE", "delete", "Permission to delete"),
    ("MANAGE", "manage", "Full management permission"),
];

pub async fn seed_catalog(pool: &PgPool) -> Result<(), sqlx::Error> {
    for (name, slug, description) in DEFAULT_RESOURCES {
        sqlx::query(
            r#"INSERT INTO resources (name, slug, description)
            VALUES ($1, $2, $3)
            ON CONFLICT (slug) DO UPDATE
            SET name = EXCLUDED.name, description = EXCLUDED.description, updated_at = now()"#,
        )
        .bind(name)
        .bind(slug)
        .bind(description)
        .execute(pool)
        .await?;
    }
    println!("Default resources created");

    sqlx::query(
        r#"INSERT INTO resources (name, slug, description)
        VALUES ('SECURITY LOG', 'security_log', 'Security logs management')
        ON CONFLICT (slug) DO UPDATE
        SET name = EXCLUDED.name, description = EXCLUDED.description, updated_at = now()"#,
    )
    .execute(pool)
    .await?;

    for (name, slug, description) in DEFAULT_ACTIONS {
        sqlx::query(
            r#"INSERT INTO actions (name, slug, description)
            VALUES ($1, $2, $3)
            ON CONFLICT (slug) DO UPDATE
            SET name = EXCLUDED.name, description = EXCLUDED.description, updated_at = now()"#,
        )
        .bind(name)
        .bind(slug)
        .bind(description)
        .execute(pool)
        .await?;
    }
    println!("Default actions created");

    let default_roles: [(&str, &str, bool); 3] = [
        (ADMIN_ROLE_NAME, "Full system access", false),
        ("ORGANIZATION ADMIN", "Full organization access", false),
        ("MEMBER", "Basic member access", true),
    ];

    for (name, description, is_default) in default_roles {
        // MEMBER is the global default; clear any other default first so the
        // partial unique index never trips on re-seed.
        if is_default {
            sqlx::query(
                r#"UPDATE roles SET is_default = FALSE
                WHERE is_default AND organization_id IS NULL AND name <> $1"#,
            )
            .bind(name)
            .execute(pool)
            .await?;
        }

        sqlx::query(
            r#"INSERT INTO roles (name, description, is_default)
            VALUES ($1, $2, $3)
            ON CONFLICT (name) WHERE organization_id IS NULL DO UPDATE
            SET description = EXCLUDED.description,
                is_default = EXCLUDED.is_default,
                updated_at = now()"#,
        )
        .bind(name)
        .bind(description)
        .bind(is_default)
        .execute(pool)
        .await?;
    }
    println!("Default roles created");

    Ok(())
}
