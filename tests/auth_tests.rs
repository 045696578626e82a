mod common;

use common::create_test_app_state;
use hso_store::config::security_config::{create_token, require_cron_secret, Claims};
use http::{header::AUTHORIZATION, HeaderMap, HeaderValue};
use jsonwebtoken::{decode, DecodingKey, Validation};

#[tokio::test]
async fn test_create_token_carries_admin_identity() {
    let state = create_test_app_state();
    let email = "admin@example.com";

    let token = create_token(&state, email).expect("Failed to create token");
    assert!(!token.is_empty());

    let claims = decode::<Claims>(
        &token,
        &DecodingKey::from_secret(state.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .expect("Failed to decode token")
    .claims;

    assert_eq!(claims.sub, email);
    assert!(claims.exp > claims.iat);
}

#[tokio::test]
async fn test_token_with_wrong_secret_rejected() {
    let state = create_test_app_state();
    let token = create_token(&state, "admin@example.com").expect("Failed to create token");

    let result = decode::<Claims>(
        &token,
        &DecodingKey::from_secret(b"different_secret_key_minimum_32_characters_long"),
        &Validation::default(),
    );

    assert!(result.is_err());
}

#[test]
fn test_password_hashing() {
    let password = "SecurePassword123!";
    let hash = bcrypt::hash(password, 4).unwrap();

    // Correct password should verify
    assert!(bcrypt::verify(password, &hash).unwrap());

    // Wrong password should not verify
    assert!(!bcrypt::verify("WrongPassword", &hash).unwrap());
}

fn bearer(value: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", value)).unwrap(),
    );
    headers
}

#[test]
fn test_cron_secret_accepted() {
    let state = create_test_app_state();
    assert!(require_cron_secret(&state, &bearer("cron-secret-for-tests")).is_ok());
}

#[test]
fn test_cron_secret_rejected_when_wrong_or_missing() {
    let state = create_test_app_state();

    assert!(require_cron_secret(&state, &bearer("wrong-secret")).is_err());
    assert!(require_cron_secret(&state, &HeaderMap::new()).is_err());
}

#[test]
fn test_cron_rejected_when_unconfigured() {
    // An empty CRON_SECRET must fail closed, even for an empty bearer
    let state = create_test_app_state();
    let mut state = (*state).clone();
    state.cron_secret = String::new();

    assert!(require_cron_secret(&state, &bearer("")).is_err());
    assert!(require_cron_secret(&state, &HeaderMap::new()).is_err());
}
