use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use gatehouse_core::pagination::{PaginationMeta, PaginationParams};

/// Outcome of the recorded authentication event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogStatus {
    Success,
    Failed,
}

impl LogStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogStatus::Success => "SUCCESS",
            LogStatus::Failed => "FAILED",
        }
    }
}

/// Kind of the recorded authentication event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogType {
    Login,
    Logout,
    Register,
}

impl LogType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogType::Login => "LOGIN",
            LogType::Logout => "LOGOUT",
            LogType::Register => "REGISTER",
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct SecurityLog {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub email: String,
    pub ip_address: String,
    pub user_agent: String,
    pub status: String,
    #[serde(rename = "type")]
    pub log_type: String,
    pub message: String,
    /// Display name of the user at read time, when the account still exists
    pub user_name: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SecurityLogFilterParams {
    /// Filter by event status (SUCCESS or FAILED)
    pub status: Option<String>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedSecurityLogsResponse {
    pub data: Vec<SecurityLog>,
    pub meta: PaginationMeta,
}
