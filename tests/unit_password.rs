use gatehouse::gatehouse_core::{hash_password, verify_password};

#[test]
fn test_hash_password_success() {
    let password = "testpassword123";
    let result = hash_password(password);

    assert!(result.is_ok());
    let hash = result.unwrap();
    assert!(!hash.is_empty());
    assert_ne!(hash, password);
}

#[test]
fn test_hash_password_empty() {
    assert!(hash_password("").is_ok());
}

#[test]
fn test_verify_password_correct() {
    let password = "correctpassword";
    let hash = hash_password(password).unwrap();

    assert!(verify_password(password, &hash).unwrap());
}

#[test]
fn test_verify_password_incorrect() {
    let hash = hash_password("correctpassword").unwrap();

    assert!(!verify_password("wrongpassword", &hash).unwrap());
}

#[test]
fn test_verify_password_invalid_hash() {
    assert!(verify_password("anything", "not-a-valid-hash").is_err());
}

#[test]
fn test_same_password_different_hashes() {
    let a = hash_password("same password").unwrap();
    let b = hash_password("same password").unwrap();

    assert_ne!(a, b);
    assert!(verify_password("same password", &a).unwrap());
    assert!(verify_password("same password", &b).unwrap());
}
