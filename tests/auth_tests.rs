//! Token issuance, verification and password hashing tests

use chrono::Duration;
use idcdetect::auth::jwt::{resolve_secret, DEV_FALLBACK_SECRET};
use idcdetect::auth::{hash_password, verify_password, Role, SecretSource, TokenIssuer};
use idcdetect::config::Environment;

const SECRET: &str = "integration-test-secret-0123456789";

#[test]
fn test_token_round_trip_carries_subject_and_role() {
    let issuer = TokenIssuer::new(SECRET, Duration::minutes(60));
    let token = issuer
        .issue("alice", Role::Pathologist)
        .expect("Failed to issue token");

    assert_eq!(token.split('.').count(), 3);

    let claims = issuer.verify(&token).expect("Token should verify");
    assert_eq!(claims.sub, "alice");
    assert_eq!(claims.role, Role::Pathologist);
    assert_eq!(claims.exp - claims.iat, 60 * 60);
}

#[test]
fn test_token_with_one_second_ttl_fails_after_two_seconds() {
    let issuer = TokenIssuer::new(SECRET, Duration::minutes(60));
    let token = issuer
        .issue_with_ttl("alice", Role::Patient, Duration::seconds(1))
        .expect("Failed to issue token");

    std::thread::sleep(std::time::Duration::from_secs(2));

    assert!(issuer.verify(&token).is_err());
}

#[test]
fn test_token_from_other_secret_is_rejected() {
    let ours = TokenIssuer::new(SECRET, Duration::minutes(60));
    let theirs = TokenIssuer::new("some-other-secret-abcdefghijkl", Duration::minutes(60));

    let token = theirs.issue("mallory", Role::Pathologist).unwrap();
    assert!(ours.verify(&token).is_err());
}

#[test]
fn test_garbage_token_is_rejected() {
    let issuer = TokenIssuer::new(SECRET, Duration::minutes(60));
    assert!(issuer.verify("invalid.token.here").is_err());
    assert!(issuer.verify("").is_err());
}

#[test]
fn test_secret_precedence() {
    let from_config = resolve_secret(
        Some("configured-secret"),
        Some("env-secret".to_string()),
        Environment::Development,
    );
    assert_eq!(from_config.source, SecretSource::Config);

    let from_env = resolve_secret(None, Some("env-secret".to_string()), Environment::Development);
    assert_eq!(from_env.source, SecretSource::Environment);

    // Blank values count as unset
    let fallback = resolve_secret(Some("  "), Some(String::new()), Environment::Production);
    assert_eq!(fallback.source, SecretSource::Fallback);
    assert!(!DEV_FALLBACK_SECRET.is_empty());
}

#[test]
fn test_password_hash_verifies_only_the_original() {
    let hashed = hash_password("correct horse", 4).expect("Failed to hash");

    assert_ne!(hashed, "correct horse");
    assert!(verify_password("correct horse", &hashed));
    assert!(!verify_password("Correct horse", &hashed));
    assert!(!verify_password("", &hashed));
}
