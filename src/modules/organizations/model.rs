use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::borrow::Cow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::modules::roles::model::RoleSummary;
use crate::modules::users::model::UserSummary;

fn validate_org_status(status: &str) -> Result<(), ValidationError> {
    if status == "ACTIVE" || status == "INACTIVE" {
        Ok(())
    } else {
        let mut error = ValidationError::new("status");
        error.message = Some(Cow::Borrowed("Status must be ACTIVE or INACTIVE"));
        Err(error)
    }
}

/// A node in the organization tree. Owned by exactly one user; holds its own
/// grants independent of any role.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Organization {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub status: String,
    pub parent_id: Option<Uuid>,
    pub owner_id: Uuid,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Minimal organization projection embedded in other responses.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct OrganizationSummary {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrganizationWithCounts {
    #[serde(flatten)]
    pub organization: Organization,
    pub owner: UserSummary,
    pub member_count: i64,
    pub child_count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrganizationMemberView {
    /// Membership ID
    pub id: Uuid,
    pub user: UserSummary,
    /// Role held within this organization, if any
    pub role: Option<RoleSummary>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrganizationDetail {
    #[serde(flatten)]
    pub organization: Organization,
    pub owner: UserSummary,
    pub parent: Option<OrganizationSummary>,
    pub children: Vec<OrganizationSummary>,
    pub members: Vec<OrganizationMemberView>,
    pub roles: Vec<RoleSummary>,
}

// DTOs

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateOrganizationDto {
    #[validate(length(
        min = 1,
        max = 100,
        message = "Name must be between 1 and 100 characters"
    ))]
    pub name: String,
    #[validate(custom(function = crate::validator::validate_slug))]
    pub slug: String,
    #[validate(custom(function = validate_org_status))]
    pub status: Option<String>,
    pub parent_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateOrganizationDto {
    #[validate(length(
        min = 1,
        max = 100,
        message = "Name must be between 1 and 100 characters"
    ))]
    pub name: Option<String>,
    #[validate(custom(function = crate::validator::validate_slug))]
    pub slug: Option<String>,
    #[validate(custom(function = validate_org_status))]
    pub status: Option<String>,
    pub parent_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AddUsersDto {
    #[validate(length(min = 1, message = "At least one user ID is required"))]
    pub user_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AddUsersResponse {
    /// Number of users newly added as members
    pub added: u64,
    /// Number of users skipped because they were already members
    pub skipped: usize,
}
