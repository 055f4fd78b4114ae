//! Integration test for session JWT issuing and validation.
//!
//! Tokens are minted locally with a test secret and validated through
//! `validate_token`. No running server or database is needed.
//!
//! Run with: `cargo test --test auth_test`
use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use std::time::Duration;
use uuid::Uuid;

use gigmarket_backend::auth::jwt::{Claims, issue_token, validate_token};
use gigmarket_backend::auth::{AuthConfig, TOKEN_COOKIE};
use gigmarket_backend::config::token_ttl_from_days;
use gigmarket_backend::error::ConfigError;

/// A fake secret for testing. Never commit the real one.
const TEST_SECRET: &str = "test-secret-at-least-256-bits-long-for-hs256-xxxxxxx";

const WEEK: Duration = Duration::from_secs(7 * 24 * 60 * 60);

#[test]
fn test_issued_token_round_trips_user_id() {
    let user_id = Uuid::new_v4();
    let token = issue_token(user_id, TEST_SECRET, WEEK).expect("Failed to issue token");

    let claims = validate_token(&token, TEST_SECRET).expect("Token should be valid");

    assert_eq!(claims.sub, user_id.to_string());
    assert_eq!(claims.user_id().unwrap(), user_id);
    let iat = claims.iat.expect("iat should be set");
    assert_eq!(claims.exp - iat, WEEK.as_secs() as usize);
}

#[test]
fn test_expired_token_is_rejected() {
    let now = Utc::now().timestamp() as usize;

    let claims = Claims {
        sub: Uuid::new_v4().to_string(),
        exp: now - 300, // expired 5 minutes ago (well past the 60s default leeway)
        iat: Some(now - 3600),
    };

    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .unwrap();

    let result = validate_token(&token, TEST_SECRET);
    assert!(result.is_err());
    assert!(result.unwrap_err().contains("ExpiredSignature"));
}

#[test]
fn test_wrong_secret_is_rejected() {
    let token = issue_token(Uuid::new_v4(), TEST_SECRET, WEEK).unwrap();

    let result = validate_token(&token, "completely-wrong-secret-xxxxxxxxxxxxxxxxxxx");
    assert!(result.is_err());
    assert!(result.unwrap_err().contains("InvalidSignature"));
}

#[test]
fn test_garbage_token_is_rejected() {
    let result = validate_token("not.a.valid.jwt", TEST_SECRET);
    assert!(result.is_err());
}

#[test]
fn test_non_uuid_subject_is_rejected() {
    let claims = Claims {
        sub: "not-a-uuid".to_string(),
        exp: Utc::now().timestamp() as usize + 3600,
        iat: None,
    };

    assert!(claims.user_id().is_err());
}

#[test]
fn test_session_cookie_settings() {
    let auth = AuthConfig {
        jwt_secret: TEST_SECRET.to_string(),
        token_ttl: WEEK,
        secure_cookies: true,
    };

    let cookie = auth.session_cookie("abc".to_string());
    assert_eq!(cookie.name(), TOKEN_COOKIE);
    assert_eq!(cookie.value(), "abc");
    assert_eq!(cookie.http_only(), Some(true));
    assert_eq!(cookie.secure(), Some(true));

    let cleared = auth.cleared_cookie();
    assert_eq!(cleared.value(), "");
    assert_eq!(
        cleared.max_age(),
        Some(actix_web::cookie::time::Duration::ZERO)
    );
}

#[test]
fn test_token_ttl_from_days() {
    assert_eq!(token_ttl_from_days(7).unwrap(), WEEK);
    assert_eq!(token_ttl_from_days(0).unwrap(), Duration::ZERO);
}

#[test]
fn test_token_ttl_overflow_is_a_config_error() {
    let err = token_ttl_from_days(u64::MAX / 1000).expect_err("should overflow");
    assert!(matches!(
        err,
        ConfigError::Invalid {
            name: "TOKEN_TTL_DAYS",
            ..
        }
    ));
}

#[test]
fn test_huge_ttl_saturates_expiry() {
    let user_id = Uuid::new_v4();
    let token = issue_token(user_id, TEST_SECRET, Duration::from_secs(u64::MAX))
        .expect("Failed to issue token");

    let claims = validate_token(&token, TEST_SECRET).expect("Token should be valid");
    assert_eq!(claims.exp, usize::MAX);

    let config = AuthConfig {
        jwt_secret: TEST_SECRET.to_string(),
        token_ttl: Duration::from_secs(u64::MAX),
        secure_cookies: false,
    };
    let cookie = config.session_cookie(token);
    assert!(cookie.max_age().is_some_and(|age| age.whole_seconds() == i64::MAX));
}
