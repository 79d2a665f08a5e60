use uuid::Uuid;

use gatehouse::gatehouse_auth::{
    create_access_token, create_refresh_token, verify_refresh_token, verify_token,
};
use gatehouse::gatehouse_config::JwtConfig;
use gatehouse::gatehouse_core::authz::{GrantView, MembershipSnapshot, PermissionSnapshot};

fn get_test_jwt_config() -> JwtConfig {
    JwtConfig {
        secret: "test_secret_key_for_testing_purposes".to_string(),
        access_token_expiry: 3600,
        refresh_token_expiry: 604800,
    }
}

fn sample_snapshot(org_id: Uuid) -> PermissionSnapshot {
    PermissionSnapshot {
        is_admin: false,
        direct_grants: vec![GrantView {
            resource_slug: "user".to_string(),
            action_slugs: vec!["view".to_string(), "create".to_string()],
        }],
        memberships: vec![MembershipSnapshot {
            organization_id: org_id,
            role_grants: vec![GrantView {
                resource_slug: "*".to_string(),
                action_slugs: vec!["manage".to_string()],
            }],
            organization_grants: vec![GrantView {
                resource_slug: "report".to_string(),
                action_slugs: vec!["view".to_string()],
            }],
        }],
    }
}

#[test]
fn test_create_access_token_success() {
    let jwt_config = get_test_jwt_config();

    let result = create_access_token(
        Uuid::new_v4(),
        "test@example.com",
        PermissionSnapshot::empty(),
        &jwt_config,
    );

    assert!(result.is_ok());
    assert!(!result.unwrap().is_empty());
}

#[test]
fn test_verify_token_success() {
    let jwt_config = get_test_jwt_config();
    let user_id = Uuid::new_v4();
    let org_id = Uuid::new_v4();

    let token = create_access_token(
        user_id,
        "test@example.com",
        sample_snapshot(org_id),
        &jwt_config,
    )
    .unwrap();
    let claims = verify_token(&token, &jwt_config).unwrap();

    assert_eq!(claims.sub, user_id.to_string());
    assert_eq!(claims.email, "test@example.com");
    assert_eq!(claims.snapshot, sample_snapshot(org_id));
}

#[test]
fn test_verify_token_invalid_token() {
    let jwt_config = get_test_jwt_config();
    assert!(verify_token("not-a-token", &jwt_config).is_err());
}

#[test]
fn test_verify_token_wrong_secret() {
    let jwt_config = get_test_jwt_config();
    let token = create_access_token(
        Uuid::new_v4(),
        "test@example.com",
        PermissionSnapshot::empty(),
        &jwt_config,
    )
    .unwrap();

    let other_config = JwtConfig {
        secret: "a_completely_different_secret_key".to_string(),
        ..get_test_jwt_config()
    };

    assert!(verify_token(&token, &other_config).is_err());
}

#[test]
fn test_tampered_token_is_rejected() {
    let jwt_config = get_test_jwt_config();
    let org_id = Uuid::new_v4();
    let token = create_access_token(
        Uuid::new_v4(),
        "test@example.com",
        sample_snapshot(org_id),
        &jwt_config,
    )
    .unwrap();

    // Flip a character inside the payload segment.
    let mut parts: Vec<String> = token.split('.').map(|s| s.to_string()).collect();
    let payload = &mut parts[1];
    let flipped = if payload.ends_with('A') { "B" } else { "A" };
    payload.truncate(payload.len() - 1);
    payload.push_str(flipped);
    let tampered = parts.join(".");

    assert!(verify_token(&tampered, &jwt_config).is_err());
}

#[test]
fn test_refresh_token_roundtrip() {
    let jwt_config = get_test_jwt_config();
    let user_id = Uuid::new_v4();

    let token = create_refresh_token(user_id, "test@example.com", &jwt_config).unwrap();
    let claims = verify_refresh_token(&token, &jwt_config).unwrap();

    assert_eq!(claims.sub, user_id.to_string());
    assert_eq!(claims.email, "test@example.com");
}

#[test]
fn test_refresh_tokens_have_unique_ids() {
    let jwt_config = get_test_jwt_config();
    let user_id = Uuid::new_v4();

    let a = create_refresh_token(user_id, "test@example.com", &jwt_config).unwrap();
    let b = create_refresh_token(user_id, "test@example.com", &jwt_config).unwrap();

    let claims_a = verify_refresh_token(&a, &jwt_config).unwrap();
    let claims_b = verify_refresh_token(&b, &jwt_config).unwrap();

    assert_ne!(claims_a.jti, claims_b.jti);
}
