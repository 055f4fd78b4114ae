use std::env;
use std::time::Duration;

use crate::error::ConfigError;

/// Process configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub redis_url: String,
    pub jwt_secret: String,
    /// Allowed CORS origin. Any origin is allowed when unset.
    pub client_url: Option<String>,
    pub port: u16,
    pub token_ttl: Duration,
    /// Mark the session cookie `Secure`.
    pub secure_cookies: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = match env::var("PORT") {
            Ok(v) => v.parse().map_err(|e| ConfigError::Invalid {
                name: "PORT",
                reason: format!("{e}"),
            })?,
            Err(_) => 8080,
        };

        let token_ttl_days: u64 = match env::var("TOKEN_TTL_DAYS") {
            Ok(v) => v.parse().map_err(|e| ConfigError::Invalid {
                name: "TOKEN_TTL_DAYS",
                reason: format!("{e}"),
            })?,
            Err(_) => 7,
        };

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            redis_url: required("REDIS_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            client_url: env::var("CLIENT_URL").ok().filter(|v| !v.is_empty()),
            port,
            token_ttl: token_ttl_from_days(token_ttl_days)?,
            secure_cookies: env::var("APP_ENV").is_ok_and(|v| v == "production"),
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}

/// Session lifetime for `days`, refusing values whose seconds overflow.
pub fn token_ttl_from_days(days: u64) -> Result<Duration, ConfigError> {
    days.checked_mul(24 * 60 * 60)
        .map(Duration::from_secs)
        .ok_or_else(|| ConfigError::Invalid {
            name: "TOKEN_TTL_DAYS",
            reason: format!("{days} days is out of range"),
        })
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(name))
}
