pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;

use actix_web::cookie::{Cookie, SameSite, time};
use std::time::Duration;

/// Name of the session cookie carrying the JWT.
pub const TOKEN_COOKIE: &str = "token";

/// Token and cookie settings, stored in Actix app data.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl: Duration,
    pub secure_cookies: bool,
}

impl AuthConfig {
    /// Session cookie holding `token`, expiring with it.
    pub fn session_cookie(&self, token: String) -> Cookie<'static> {
        Cookie::build(TOKEN_COOKIE, token)
            .path("/")
            .http_only(true)
            .secure(self.secure_cookies)
            .same_site(SameSite::Lax)
            .max_age(time::Duration::seconds(
                i64::try_from(self.token_ttl.as_secs()).unwrap_or(i64::MAX),
            ))
            .finish()
    }

    /// An already-expired session cookie, used to log out.
    pub fn cleared_cookie(&self) -> Cookie<'static> {
        Cookie::build(TOKEN_COOKIE, "")
            .path("/")
            .http_only(true)
            .secure(self.secure_cookies)
            .same_site(SameSite::Lax)
            .max_age(time::Duration::ZERO)
            .finish()
    }
}
