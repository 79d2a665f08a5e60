use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::borrow::Cow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use gatehouse_core::pagination::{PaginationMeta, PaginationParams};

use crate::modules::roles::model::RoleSummary;

pub const USER_STATUSES: [&str; 3] = ["ACTIVE", "INACTIVE", "SUSPENDED"];

fn validate_user_status(status: &str) -> Result<(), ValidationError> {
    if USER_STATUSES.contains(&status) {
        Ok(())
    } else {
        let mut error = ValidationError::new("status");
        error.message = Some(Cow::Borrowed("Status must be ACTIVE, INACTIVE or SUSPENDED"));
        Err(error)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub avatar: Option<String>,
    pub status: String,
    pub email_verified: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Minimal user projection embedded in other responses.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct UserSummary {
    pub id: Uuid,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserWithRoles {
    #[serde(flatten)]
    pub user: UserResponse,
    /// Global roles assigned to the user
    pub roles: Vec<RoleSummary>,
}

// DTOs

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUserDto {
    #[validate(email(message = "A valid email address is required"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[validate(length(max = 100, message = "First name must not exceed 100 characters"))]
    pub first_name: Option<String>,
    #[validate(length(max = 100, message = "Last name must not exceed 100 characters"))]
    pub last_name: Option<String>,
    #[validate(length(max = 30, message = "Phone must not exceed 30 characters"))]
    pub phone: Option<String>,
    #[validate(custom(function = validate_user_status))]
    pub status: Option<String>,
    /// Global role IDs to assign to the new user
    pub role_ids: Option<Vec<Uuid>>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateUserDto {
    #[validate(length(max = 100, message = "First name must not exceed 100 characters"))]
    pub first_name: Option<String>,
    #[validate(length(max = 100, message = "Last name must not exceed 100 characters"))]
    pub last_name: Option<String>,
    #[validate(length(max = 30, message = "Phone must not exceed 30 characters"))]
    pub phone: Option<String>,
    #[validate(length(max = 500, message = "Avatar URL must not exceed 500 characters"))]
    pub avatar: Option<String>,
    #[validate(custom(function = validate_user_status))]
    pub status: Option<String>,
    /// When present, replaces the user's global role assignments
    pub role_ids: Option<Vec<Uuid>>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UserFilterParams {
    /// Case-insensitive search over email and names
    pub search: Option<String>,
    /// Filter by account status
    pub status: Option<String>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedUsersResponse {
    pub data: Vec<UserWithRoles>,
    pub meta: PaginationMeta,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_validation() {
        assert!(validate_user_status("ACTIVE").is_ok());
        assert!(validate_user_status("INACTIVE").is_ok());
        assert!(validate_user_status("SUSPENDED").is_ok());
        assert!(validate_user_status("active").is_err());
        assert!(validate_user_status("BANNED").is_err());
    }
}
