//! JWT claim structures for authentication tokens.
//!
//! - [`Claims`]: access token claims carrying the permission snapshot
//! - [`RefreshTokenClaims`]: refresh token claims for token renewal
//!
//! The snapshot travels inside the signed access token, so the claims type is
//! one side of the wire contract described in
//! [`gatehouse_core::authz`]: whatever the snapshot builder embeds here is
//! exactly what every evaluation site sees until the session refreshes.

use gatehouse_core::authz::PermissionSnapshot;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// JWT claims for access tokens.
///
/// Embedded at login and refresh; provides everything needed for
/// authentication and authorization without database lookups.
///
/// # Fields
///
/// - `sub`: User ID (subject)
/// - `email`: User's email address
/// - `snapshot`: The principal's permission snapshot, evaluated as-is for
///   every authorization decision during the session
/// - `exp`: Token expiration timestamp
/// - `iat`: Token issued-at timestamp
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Claims {
    /// User ID (subject claim)
    pub sub: String,
    /// User's email address
    pub email: String,
    /// Permission snapshot built at sign-in / refresh
    pub snapshot: PermissionSnapshot,
    /// Token expiration timestamp (Unix timestamp)
    pub exp: usize,
    /// Token issued-at timestamp (Unix timestamp)
    pub iat: usize,
}

/// JWT claims for refresh tokens.
///
/// Refresh tokens are long-lived and deliberately carry no snapshot: the
/// snapshot is rebuilt from the store when the refresh is redeemed, which is
/// how grant changes eventually reach a running session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshTokenClaims {
    /// User ID (subject claim)
    pub sub: String,
    /// User's email address
    pub email: String,
    /// Token expiration timestamp (Unix timestamp)
    pub exp: usize,
    /// Token issued-at timestamp (Unix timestamp)
    pub iat: usize,
    /// Unique token identifier (JWT ID) to ensure token uniqueness
    pub jti: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatehouse_core::authz::{GrantView, MembershipSnapshot};
    use uuid::Uuid;

    fn sample_snapshot() -> PermissionSnapshot {
        PermissionSnapshot {
            is_admin: false,
            direct_grants: vec![GrantView {
                resource_slug: "user".to_string(),
                action_slugs: vec!["view".to_string()],
            }],
            memberships: vec![MembershipSnapshot {
                organization_id: Uuid::new_v4(),
                role_grants: vec![GrantView {
                    resource_slug: "report".to_string(),
                    action_slugs: vec!["manage".to_string()],
                }],
                organization_grants: vec![],
            }],
        }
    }

    #[test]
    fn test_claims_serialize() {
        let claims = Claims {
            sub: "user-id-123".to_string(),
            email: "test@example.com".to_string(),
            snapshot: sample_snapshot(),
            exp: 1234567890,
            iat: 1234567800,
        };
        let serialized = serde_json::to_string(&claims).unwrap();
        assert!(serialized.contains(r#""sub":"user-id-123""#));
        assert!(serialized.contains(r#""is_admin":false"#));
        assert!(serialized.contains(r#""resource_slug":"user""#));
    }

    #[test]
    fn test_claims_deserialize_preserves_snapshot() {
        let claims = Claims {
            sub: "user-id-456".to_string(),
            email: "user@test.com".to_string(),
            snapshot: sample_snapshot(),
            exp: 9999999999,
            iat: 9999999900,
        };
        let json = serde_json::to_string(&claims).unwrap();
        let decoded: Claims = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.sub, "user-id-456");
        assert_eq!(decoded.snapshot, claims.snapshot);
        // The decoded snapshot still evaluates identically.
        assert!(decoded.snapshot.allows("user", "view", None));
        assert!(!decoded.snapshot.allows("user", "delete", None));
    }

    #[test]
    fn test_refresh_token_claims_serialize() {
        let claims = RefreshTokenClaims {
            sub: "user-123".to_string(),
            email: "refresh@test.com".to_string(),
            exp: 1234567890,
            iat: 1234567800,
            jti: "test-jti-123".to_string(),
        };
        let serialized = serde_json::to_string(&claims).unwrap();
        assert!(serialized.contains(r#""sub":"user-123""#));
        assert!(serialized.contains(r#""jti":"test-jti-123""#));
    }

    #[test]
    fn test_claims_clone() {
        let claims = Claims {
            sub: "user-id-789".to_string(),
            email: "clone@example.com".to_string(),
            snapshot: PermissionSnapshot::empty(),
            exp: 1234567890,
            iat: 1234567800,
        };
        let cloned = claims.clone();
        assert_eq!(claims.sub, cloned.sub);
        assert_eq!(claims.snapshot, cloned.snapshot);
    }
}
