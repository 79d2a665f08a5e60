use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use gatehouse_core::AppError;
use gatehouse_core::pagination::PaginationMeta;

use super::model::{
    LogStatus, LogType, PaginatedSecurityLogsResponse, SecurityLog, SecurityLogFilterParams,
};

/// Records an authentication event.
///
/// Best-effort by design: a failing insert is logged and swallowed so an
/// audit-sink outage can never block sign-in or registration.
#[instrument(skip(db))]
pub async fn record(
    db: &PgPool,
    user_id: Option<Uuid>,
    email: &str,
    ip_address: &str,
    user_agent: &str,
    status: LogStatus,
    log_type: LogType,
    message: &str,
) {
    let result = sqlx::query(
        r#"INSERT INTO security_logs (user_id, email, ip_address, user_agent, status, type, message)
        VALUES ($1, $2, $3, $4, $5, $6, $7)"#,
    )
    .bind(user_id)
    .bind(email)
    .bind(ip_address)
    .bind(user_agent)
    .bind(status.as_str())
    .bind(log_type.as_str())
    .bind(message)
    .execute(db)
    .await;

    if let Err(e) = result {
        tracing::error!(error = %e, email = %email, "Failed to create security log");
    }
}

#[instrument(skip(db))]
pub async fn get_security_logs(
    db: &PgPool,
    params: SecurityLogFilterParams,
) -> Result<PaginatedSecurityLogsResponse, AppError> {
    let limit = params.pagination.limit();
    let offset = params.pagination.offset();

    let logs = sqlx::query_as::<_, SecurityLog>(
        r#"SELECT l.id, l.user_id, l.email, l.ip_address, l.user_agent, l.status,
            l.type AS log_type, l.message,
            CASE WHEN u.id IS NULL THEN NULL
                 ELSE TRIM(COALESCE(u.first_name, '') || ' ' || COALESCE(u.last_name, ''))
            END AS user_name,
            l.created_at
        FROM security_logs l
        LEFT JOIN users u ON u.id = l.user_id
        WHERE ($1::text IS NULL OR l.status = $1)
        ORDER BY l.created_at DESC
        LIMIT $2 OFFSET $3"#,
    )
    .bind(&params.status)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;

    let total: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM security_logs WHERE ($1::text IS NULL OR status = $1)",
    )
    .bind(&params.status)
    .fetch_one(db)
    .await?;

    let has_more = offset + (logs.len() as i64) < total;

    Ok(PaginatedSecurityLogsResponse {
        data: logs,
        meta: PaginationMeta {
            total,
            limit,
            offset: Some(offset),
            page: params.pagination.page(),
            has_more,
        },
    })
}
