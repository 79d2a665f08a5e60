use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use gatehouse_core::authz::GrantView;

use crate::modules::organizations::model::OrganizationSummary;
use crate::modules::users::model::UserSummary;

/// A named bundle of grants. Global when `organization_id` is absent,
/// organization-scoped otherwise. At most one role per scope is the default
/// assigned to new members of that scope.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Role {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub is_default: bool,
    pub organization_id: Option<Uuid>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Minimal role projection embedded in other responses.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct RoleSummary {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RoleWithGrants {
    #[serde(flatten)]
    pub role: Role,
    pub organization: Option<OrganizationSummary>,
    /// The role's grants, flattened to the shape the evaluator consumes
    pub grants: Vec<GrantView>,
    /// Number of users holding this role globally
    pub user_count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RoleDetail {
    #[serde(flatten)]
    pub role: Role,
    pub organization: Option<OrganizationSummary>,
    pub grants: Vec<GrantView>,
    /// Users holding this role globally
    pub users: Vec<UserSummary>,
}

// DTOs

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateRoleDto {
    #[validate(length(
        min = 1,
        max = 100,
        message = "Name must be between 1 and 100 characters"
    ))]
    pub name: String,
    #[validate(length(max = 500, message = "Description must not exceed 500 characters"))]
    pub description: Option<String>,
    /// Marks this role as the default for its scope; clears any previous
    /// default in the same scope
    pub is_default: Option<bool>,
    /// When present, creates an organization-scoped role
    pub organization_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateRoleDto {
    #[validate(length(
        min = 1,
        max = 100,
        message = "Name must be between 1 and 100 characters"
    ))]
    pub name: Option<String>,
    #[validate(length(max = 500, message = "Description must not exceed 500 characters"))]
    pub description: Option<String>,
    pub is_default: Option<bool>,
}
