use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// An operation in the permission catalog. The slug `manage` is reserved and
/// subsumes every other action on the matched resource during evaluation.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Action {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct ActionWithUsage {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub action: Action,
    /// Number of permission grants that include this action
    pub permission_count: i64,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateActionDto {
    #[validate(length(
        min = 1,
        max = 100,
        message = "Name must be between 1 and 100 characters"
    ))]
    pub name: String,
    #[validate(custom(function = crate::validator::validate_slug))]
    pub slug: String,
    #[validate(length(max = 500, message = "Description must not exceed 500 characters"))]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateActionDto {
    #[validate(length(
        min = 1,
        max = 100,
        message = "Name must be between 1 and 100 characters"
    ))]
    pub name: Option<String>,
    #[validate(custom(function = crate::validator::validate_slug))]
    pub slug: Option<String>,
    #[validate(length(max = 500, message = "Description must not exceed 500 characters"))]
    pub description: Option<String>,
}
