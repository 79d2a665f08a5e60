//! Bootstrap administrator account.
//!
//! The admin role is attached by its reserved name; the account is upserted
//! so re-running the seeder rotates the password instead of failing.

use sqlx::PgPool;
use uuid::Uuid;

use gatehouse_core::authz::ADMIN_ROLE_NAME;

pub async fn create_admin(
    pool: &PgPool,
    email: &str,
    first_name: &str,
    last_name: &str,
    password: &str,
) -> Result<(), anyhow::Error> {
    let hashed = bcrypt::hash(password, bcrypt::DEFAULT_COST)?;

    let user_id: Uuid = sqlx::query_scalar(
        r#"INSERT INTO users (email, password, first_name, last_name, status, email_verified)
        VALUES ($1, $2, $3, $4, 'ACTIVE', TRUE)
        ON CONFLICT (email) DO UPDATE
        SET password = EXCLUDED.password, updated_at = now()
        RETURNING id"#,
    )
    .bind(email)
    .bind(&hashed)
    .bind(first_name)
    .bind(last_name)
    .fetch_one(pool)
    .await?;

    let role_id: Option<Uuid> = sqlx::query_scalar(
        "SELECT id FROM roles WHERE organization_id IS NULL AND name = $1",
    )
    .bind(ADMIN_ROLE_NAME)
    .fetch_optional(pool)
    .await?;

    let Some(role_id) = role_id else {
        anyhow::bail!("Admin role not found; run the catalog seeder first");
    };

    sqlx::query(
        "INSERT INTO user_roles (user_id, role_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
    )
    .bind(user_id)
    .bind(role_id)
    .execute(pool)
    .await?;

    println!("Admin account ready: {}", email);

    Ok(())
}
