use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use uuid::Uuid;

use gatehouse_auth::{Claims, verify_token};
use gatehouse_core::AppError;

use crate::state::AppState;

/// Extractor that validates the JWT and provides the authenticated user's
/// claims, including the permission snapshot built at sign-in.
///
/// Extraction failing means the request is unauthenticated (401) — it never
/// reaches the authorization guard. Authorization itself happens in the
/// handler via [`AuthUser::require`].
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    /// Whether the principal may perform `action_slug` on `resource_slug`,
    /// optionally scoped to one organization. Pure snapshot lookup.
    pub fn can(&self, resource_slug: &str, action_slug: &str, organization_id: Option<Uuid>) -> bool {
        self.0.snapshot.allows(resource_slug, action_slug, organization_id)
    }

    /// Authorization guard. Call before any store access; a denial must end
    /// the request. The response body stays opaque — the denied query is
    /// only traced server-side.
    pub fn require(
        &self,
        resource_slug: &str,
        action_slug: &str,
        organization_id: Option<Uuid>,
    ) -> Result<(), AppError> {
        self.0
            .snapshot
            .require(resource_slug, action_slug, organization_id)
            .map_err(|denied| {
                tracing::debug!(
                    user_id = %self.0.sub,
                    resource = %denied.resource_slug,
                    action = %denied.action_slug,
                    organization_id = ?denied.organization_id,
                    "Permission denied"
                );
                AppError::forbidden(denied)
            })
    }

    /// Whether the principal holds the global admin role.
    pub fn is_admin(&self) -> bool {
        self.0.snapshot.is_admin
    }

    /// Get the user ID as UUID
    pub fn user_id(&self) -> Result<Uuid, AppError> {
        Uuid::parse_str(&self.0.sub)
            .map_err(|_| AppError::unauthorized(anyhow::anyhow!("Invalid user ID in token")))
    }

    /// Get the user's email
    pub fn email(&self) -> &str {
        &self.0.email
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| {
                AppError::unauthorized(anyhow::anyhow!("Missing authorization header"))
            })?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::unauthorized(anyhow::anyhow!("Invalid authorization header format"))
        })?;

        let claims = verify_token(token, &state.jwt_config)?;

        Ok(AuthUser(claims))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use gatehouse_core::authz::{GrantView, MembershipSnapshot, PermissionSnapshot};

    fn auth_user_with(snapshot: PermissionSnapshot) -> AuthUser {
        AuthUser(Claims {
            sub: Uuid::new_v4().to_string(),
            email: "test@example.com".to_string(),
            snapshot,
            exp: 9999999999,
            iat: 1234567890,
        })
    }

    fn grant(resource: &str, actions: &[&str]) -> GrantView {
        GrantView {
            resource_slug: resource.to_string(),
            action_slugs: actions.iter().map(|a| a.to_string()).collect(),
        }
    }

    #[test]
    fn test_can_delegates_to_snapshot() {
        let auth_user = auth_user_with(PermissionSnapshot {
            is_admin: false,
            direct_grants: vec![grant("user", &["view", "create"])],
            memberships: vec![],
        });

        assert!(auth_user.can("user", "view", None));
        assert!(auth_user.can("user", "create", None));
        assert!(!auth_user.can("user", "delete", None));
    }

    #[test]
    fn test_require_denial_is_forbidden_and_opaque() {
        let auth_user = auth_user_with(PermissionSnapshot::empty());

        let err = auth_user.require("user", "delete", None).unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
        assert_eq!(err.error.to_string(), "Access denied");
    }

    #[test]
    fn test_require_passes_for_admin_on_anything() {
        let auth_user = auth_user_with(PermissionSnapshot {
            is_admin: true,
            direct_grants: vec![],
            memberships: vec![],
        });

        assert!(auth_user.require("anything", "anything", None).is_ok());
        assert!(
            auth_user
                .require("user", "delete", Some(Uuid::new_v4()))
                .is_ok()
        );
    }

    #[test]
    fn test_org_scoped_require() {
        let org = Uuid::new_v4();
        let auth_user = auth_user_with(PermissionSnapshot {
            is_admin: false,
            direct_grants: vec![],
            memberships: vec![MembershipSnapshot {
                organization_id: org,
                role_grants: vec![grant("report", &["view"])],
                organization_grants: vec![],
            }],
        });

        assert!(auth_user.require("report", "view", Some(org)).is_ok());
        assert!(
            auth_user
                .require("report", "view", Some(Uuid::new_v4()))
                .is_err()
        );
    }

    #[test]
    fn test_user_id_parses_subject() {
        let user_id = Uuid::new_v4();
        let auth_user = AuthUser(Claims {
            sub: user_id.to_string(),
            email: "test@example.com".to_string(),
            snapshot: PermissionSnapshot::empty(),
            exp: 9999999999,
            iat: 1234567890,
        });

        assert_eq!(auth_user.user_id().unwrap(), user_id);
    }
}
