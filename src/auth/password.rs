use actix_web::web;
use password_auth::{generate_hash, verify_password};

/// Hash a password on the blocking pool (argon2 is deliberately slow).
pub async fn hash(password: String) -> Result<String, actix_web::error::BlockingError> {
    web::block(move || generate_hash(password)).await
}

/// Check `password` against a stored PHC hash.
pub async fn verify(password: String, stored_hash: String) -> bool {
    web::block(move || verify_password(password, &stored_hash).is_ok())
        .await
        .unwrap_or(false)
}
