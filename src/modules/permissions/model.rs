use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use gatehouse_core::AppError;
use gatehouse_core::pagination::{PaginationMeta, PaginationParams};

use crate::modules::actions::model::Action;
use crate::modules::organizations::model::OrganizationSummary;
use crate::modules::resources::model::Resource;
use crate::modules::users::model::UserSummary;

/// The one thing a grant attaches to. Constructing this type is what
/// enforces "exactly one target, consistent with its kind" — the write path
/// never handles a permission row with ambiguous ownership.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantTarget {
    User(Uuid),
    Role(Uuid),
    Organization(Uuid),
}

impl GrantTarget {
    /// Discriminator string stored in the `target` column.
    pub fn kind(&self) -> &'static str {
        match self {
            GrantTarget::User(_) => "USER",
            GrantTarget::Role(_) => "ROLE",
            GrantTarget::Organization(_) => "ORGANIZATION",
        }
    }

    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            GrantTarget::User(id) => Some(*id),
            _ => None,
        }
    }

    pub fn role_id(&self) -> Option<Uuid> {
        match self {
            GrantTarget::Role(id) => Some(*id),
            _ => None,
        }
    }

    pub fn organization_id(&self) -> Option<Uuid> {
        match self {
            GrantTarget::Organization(id) => Some(*id),
            _ => None,
        }
    }

    /// Builds the target from the loose wire fields, rejecting any payload
    /// that does not name exactly one target id matching the declared kind.
    pub fn from_parts(
        target: &str,
        user_id: Option<Uuid>,
        role_id: Option<Uuid>,
        organization_id: Option<Uuid>,
    ) -> Result<Self, AppError> {
        let provided =
            user_id.is_some() as u8 + role_id.is_some() as u8 + organization_id.is_some() as u8;
        if provided != 1 {
            return Err(AppError::bad_request(anyhow!(
                "Exactly one target ID must be provided"
            )));
        }

        match (target, user_id, role_id, organization_id) {
            ("USER", Some(id), None, None) => Ok(GrantTarget::User(id)),
            ("ROLE", None, Some(id), None) => Ok(GrantTarget::Role(id)),
            ("ORGANIZATION", None, None, Some(id)) => Ok(GrantTarget::Organization(id)),
            ("USER" | "ROLE" | "ORGANIZATION", _, _, _) => Err(AppError::bad_request(anyhow!(
                "Target ID does not match the target type"
            ))),
            _ => Err(AppError::bad_request(anyhow!("Invalid target type"))),
        }
    }
}

/// Role summary as shown on a permission, scope included.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct RoleTargetSummary {
    pub id: Uuid,
    pub name: String,
    pub organization_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PermissionResponse {
    pub id: Uuid,
    pub target: String,
    pub resource: Resource,
    pub actions: Vec<Action>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<RoleTargetSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<OrganizationSummary>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

// DTOs

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreatePermissionDto {
    pub resource_id: Uuid,
    /// Target kind: USER, ROLE or ORGANIZATION
    #[validate(length(min = 1, message = "Target is required"))]
    pub target: String,
    pub user_id: Option<Uuid>,
    pub role_id: Option<Uuid>,
    pub organization_id: Option<Uuid>,
    #[validate(length(min = 1, message = "At least one action is required"))]
    pub action_ids: Vec<Uuid>,
}

impl CreatePermissionDto {
    pub fn grant_target(&self) -> Result<GrantTarget, AppError> {
        GrantTarget::from_parts(
            &self.target,
            self.user_id,
            self.role_id,
            self.organization_id,
        )
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdatePermissionDto {
    /// New resource for the grant; unchanged when omitted
    pub resource_id: Option<Uuid>,
    /// Replaces the grant's action set
    #[validate(length(min = 1, message = "At least one action is required"))]
    pub action_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PermissionFilterParams {
    /// Filter by target kind (USER, ROLE or ORGANIZATION)
    pub target: Option<String>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedPermissionsResponse {
    pub data: Vec<PermissionResponse>,
    pub meta: PaginationMeta,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_accepts_exactly_one_matching_id() {
        let id = Uuid::new_v4();

        let target = GrantTarget::from_parts("USER", Some(id), None, None).unwrap();
        assert_eq!(target, GrantTarget::User(id));
        assert_eq!(target.kind(), "USER");
        assert_eq!(target.user_id(), Some(id));
        assert_eq!(target.role_id(), None);

        let target = GrantTarget::from_parts("ROLE", None, Some(id), None).unwrap();
        assert_eq!(target, GrantTarget::Role(id));

        let target = GrantTarget::from_parts("ORGANIZATION", None, None, Some(id)).unwrap();
        assert_eq!(target, GrantTarget::Organization(id));
    }

    #[test]
    fn test_target_rejects_zero_or_multiple_ids() {
        let id = Uuid::new_v4();
        assert!(GrantTarget::from_parts("USER", None, None, None).is_err());
        assert!(GrantTarget::from_parts("USER", Some(id), Some(id), None).is_err());
        assert!(GrantTarget::from_parts("ROLE", Some(id), Some(id), Some(id)).is_err());
    }

    #[test]
    fn test_target_rejects_kind_mismatch() {
        let id = Uuid::new_v4();
        assert!(GrantTarget::from_parts("USER", None, Some(id), None).is_err());
        assert!(GrantTarget::from_parts("ROLE", Some(id), None, None).is_err());
        assert!(GrantTarget::from_parts("ORGANIZATION", None, Some(id), None).is_err());
    }

    #[test]
    fn test_target_rejects_unknown_kind() {
        let id = Uuid::new_v4();
        assert!(GrantTarget::from_parts("GROUP", Some(id), None, None).is_err());
        assert!(GrantTarget::from_parts("user", Some(id), None, None).is_err());
    }
}
