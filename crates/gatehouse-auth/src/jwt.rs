//! JWT (JSON Web Token) utilities for authentication.
//!
//! Creation and verification of the two token kinds the Gatehouse API
//! issues:
//!
//! - **Access tokens**: short-lived, carry the permission snapshot
//! - **Refresh tokens**: long-lived, used to obtain new access tokens
//!
//! The access token is the vehicle for the snapshot: once issued, no
//! authorization check touches the database until the token is refreshed or
//! the session ends.
//!
//! # Example
//!
//! ```ignore
//! use gatehouse_auth::{create_access_token, verify_token};
//! use gatehouse_config::JwtConfig;
//!
//! let config = JwtConfig::from_env();
//! let token = create_access_token(user_id, "user@example.com", snapshot, &config)?;
//! let claims = verify_token(&token, &config)?;
//! ```

use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use gatehouse_config::JwtConfig;
use gatehouse_core::AppError;
use gatehouse_core::authz::PermissionSnapshot;

use crate::claims::{Claims, RefreshTokenClaims};

/// Creates an access token with the principal's permission snapshot embedded.
///
/// # Arguments
///
/// * `user_id` - The user's UUID
/// * `email` - The user's email address
/// * `snapshot` - The permission snapshot built at credential verification
/// * `jwt_config` - JWT configuration containing the secret and expiry settings
///
/// # Errors
///
/// Returns an error if token encoding fails (e.g. invalid secret key).
pub fn create_access_token(
    user_id: Uuid,
    email: &str,
    snapshot: PermissionSnapshot,
    jwt_config: &JwtConfig,
) -> Result<String, AppError> {
    let now = Utc::now().timestamp() as usize;
    let exp = now + jwt_config.access_token_expiry as usize;

    let claims = Claims {
        sub: user_id.to_string(),
        email: email.to_string(),
        snapshot,
        exp,
        iat: now,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_config.secret.as_bytes()),
    )
    .map_err(|e| AppError::internal(anyhow::anyhow!("Failed to create token: {}", e)))
}

/// Verifies an access token and returns the embedded claims.
///
/// Validates the signature and expiration. The returned claims include the
/// permission snapshot exactly as it was embedded at issuance.
///
/// # Errors
///
/// Returns an unauthorized error if the token signature is invalid, the
/// token has expired, or the token is malformed.
pub fn verify_token(token: &str, jwt_config: &JwtConfig) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_config.secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::unauthorized(anyhow::anyhow!("Invalid or expired token")))
}

/// Creates a refresh token for obtaining new access tokens.
///
/// Refresh tokens carry no snapshot; redeeming one rebuilds the snapshot
/// from the store, which is how grant changes reach long-running sessions.
pub fn create_refresh_token(
    user_id: Uuid,
    email: &str,
    jwt_config: &JwtConfig,
) -> Result<String, AppError> {
    let now = Utc::now().timestamp() as usize;
    let exp = now + jwt_config.refresh_token_expiry as usize;

    let claims = RefreshTokenClaims {
        sub: user_id.to_string(),
        email: email.to_string(),
        exp,
        iat: now,
        jti: Uuid::new_v4().to_string(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_config.secret.as_bytes()),
    )
    .map_err(|e| AppError::internal(anyhow::anyhow!("Failed to create refresh token: {}", e)))
}

/// Verifies a refresh token and returns the claims.
///
/// # Errors
///
/// Returns an unauthorized error if the token is invalid or expired.
pub fn verify_refresh_token(
    token: &str,
    jwt_config: &JwtConfig,
) -> Result<RefreshTokenClaims, AppError> {
    decode::<RefreshTokenClaims>(
        token,
        &DecodingKey::from_secret(jwt_config.secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::unauthorized(anyhow::anyhow!("Invalid or expired refresh token")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatehouse_core::authz::{GrantView, MembershipSnapshot};

    fn get_test_jwt_config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret-key-at-least-32-characters-long".to_string(),
            access_token_expiry: 3600,
            refresh_token_expiry: 604800,
        }
    }

    fn snapshot_with_membership(org_id: Uuid) -> PermissionSnapshot {
        PermissionSnapshot {
            is_admin: false,
            direct_grants: vec![GrantView {
                resource_slug: "organization".to_string(),
                action_slugs: vec!["view".to_string()],
            }],
            memberships: vec![MembershipSnapshot {
                organization_id: org_id,
                role_grants: vec![GrantView {
                    resource_slug: "user".to_string(),
                    action_slugs: vec!["manage".to_string()],
                }],
                organization_grants: vec![],
            }],
        }
    }

    #[test]
    fn test_create_access_token_success() {
        let config = get_test_jwt_config();
        let token = create_access_token(
            Uuid::new_v4(),
            "test@example.com",
            PermissionSnapshot::empty(),
            &config,
        );

        assert!(token.is_ok());
        assert!(!token.unwrap().is_empty());
    }

    #[test]
    fn test_snapshot_survives_token_roundtrip() {
        let config = get_test_jwt_config();
        let user_id = Uuid::new_v4();
        let org_id = Uuid::new_v4();
        let snapshot = snapshot_with_membership(org_id);

        let token =
            create_access_token(user_id, "test@example.com", snapshot.clone(), &config).unwrap();
        let claims = verify_token(&token, &config).unwrap();

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.email, "test@example.com");
        assert_eq!(claims.snapshot, snapshot);
        // Decisions made against the decoded snapshot match the original.
        assert!(claims.snapshot.allows("user", "delete", Some(org_id)));
        assert!(!claims.snapshot.allows("user", "delete", Some(Uuid::new_v4())));
    }

    #[test]
    fn test_verify_token_invalid() {
        let config = get_test_jwt_config();
        assert!(verify_token("invalid-token", &config).is_err());
    }

    #[test]
    fn test_verify_token_wrong_secret() {
        let config = get_test_jwt_config();
        let token = create_access_token(
            Uuid::new_v4(),
            "test@example.com",
            PermissionSnapshot::empty(),
            &config,
        )
        .unwrap();

        let wrong_config = JwtConfig {
            secret: "different-secret-key-at-least-32-characters".to_string(),
            access_token_expiry: 3600,
            refresh_token_expiry: 604800,
        };

        assert!(verify_token(&token, &wrong_config).is_err());
    }

    #[test]
    fn test_refresh_token_roundtrip() {
        let config = get_test_jwt_config();
        let user_id = Uuid::new_v4();

        let token = create_refresh_token(user_id, "test@example.com", &config).unwrap();
        let claims = verify_refresh_token(&token, &config).unwrap();

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.email, "test@example.com");
        assert!(!claims.jti.is_empty());
    }

    #[test]
    fn test_refresh_token_expiry_longer_than_access() {
        let config = get_test_jwt_config();
        let user_id = Uuid::new_v4();

        let access = create_access_token(
            user_id,
            "test@example.com",
            PermissionSnapshot::empty(),
            &config,
        )
        .unwrap();
        let refresh = create_refresh_token(user_id, "test@example.com", &config).unwrap();

        let access_claims = verify_token(&access, &config).unwrap();
        let refresh_claims = verify_refresh_token(&refresh, &config).unwrap();

        assert!(refresh_claims.exp > access_claims.exp);
    }

    #[test]
    fn test_admin_snapshot_roundtrip() {
        let config = get_test_jwt_config();
        let snapshot = PermissionSnapshot {
            is_admin: true,
            direct_grants: vec![],
            memberships: vec![],
        };

        let token =
            create_access_token(Uuid::new_v4(), "admin@example.com", snapshot, &config).unwrap();
        let claims = verify_token(&token, &config).unwrap();

        assert!(claims.snapshot.is_admin);
        assert!(claims.snapshot.allows("anything", "anything", None));
    }
}
