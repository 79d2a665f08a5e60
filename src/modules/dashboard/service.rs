use sqlx::PgPool;
use tracing::instrument;

use gatehouse_core::AppError;

use super::model::DashboardStats;

#[instrument(skip(db))]
pub async fn get_stats(db: &PgPool) -> Result<DashboardStats, AppError> {
    let total_organizations: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM organizations")
        .fetch_one(db)
        .await?;

    let total_users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(db)
        .await?;

    let active_users: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE status = 'ACTIVE'")
            .fetch_one(db)
            .await?;

    Ok(DashboardStats {
        total_organizations,
        total_users,
        active_users,
    })
}
