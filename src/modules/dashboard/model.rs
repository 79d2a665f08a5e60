use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardStats {
    pub total_organizations: i64,
    pub total_users: i64,
    pub active_users: i64,
}
