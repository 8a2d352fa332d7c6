//! Application configuration loaded from environment variables.

use std::str::FromStr;

use application::services::{HmacPasswordHasher, MockPaymentGateway};

/// Signing secret used when `JWT_SECRET` is unset. Only fit for development.
pub const DEVELOPMENT_SECRET: &str = "storefront-development-secret";

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default `"0.0.0.0"`)
/// - `PORT`: listen port (default `3000`)
/// - `RUST_LOG`: tracing filter directive (default `"info"`)
/// - `DATABASE_URL`: Postgres connection string; the in-memory store is used when unset
/// - `JWT_SECRET`: master secret; the token signing key and the password
///   pepper are derived from it
/// - `PASSWORD_ITERATIONS`: PBKDF2 rounds for new password hashes
/// - `JWT_ISSUER`: token issuer (default `"storefront"`)
/// - `TOKEN_TTL_MINUTES`: access token lifetime (default `60`)
/// - `PAYMENT_APPROVAL_LIMIT_CENTS`: largest amount the mock gateway approves
/// - `ADMIN_EMAIL` / `ADMIN_PASSWORD`: administrator seeded at startup
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub password_iterations: u32,
    pub jwt_issuer: String,
    pub token_ttl_minutes: i64,
    pub payment_approval_limit_cents: i64,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("HOST").unwrap_or(defaults.host),
            port: parsed("PORT").unwrap_or(defaults.port),
            log_level: std::env::var("RUST_LOG").unwrap_or(defaults.log_level),
            database_url: non_empty("DATABASE_URL"),
            jwt_secret: non_empty("JWT_SECRET").unwrap_or(defaults.jwt_secret),
            password_iterations: parsed("PASSWORD_ITERATIONS")
                .filter(|rounds| *rounds > 0)
                .unwrap_or(defaults.password_iterations),
            jwt_issuer: non_empty("JWT_ISSUER").unwrap_or(defaults.jwt_issuer),
            token_ttl_minutes: parsed("TOKEN_TTL_MINUTES")
                .filter(|minutes| *minutes > 0)
                .unwrap_or(defaults.token_ttl_minutes),
            payment_approval_limit_cents: parsed("PAYMENT_APPROVAL_LIMIT_CENTS")
                .unwrap_or(defaults.payment_approval_limit_cents),
            admin_email: non_empty("ADMIN_EMAIL"),
            admin_password: non_empty("ADMIN_PASSWORD"),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// True while tokens are signed with the built-in development secret.
    pub fn uses_development_secret(&self) -> bool {
        self.jwt_secret == DEVELOPMENT_SECRET
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            database_url: None,
            jwt_secret: DEVELOPMENT_SECRET.to_string(),
            password_iterations: HmacPasswordHasher::DEFAULT_ITERATIONS,
            jwt_issuer: "storefront".to_string(),
            token_ttl_minutes: 60,
            payment_approval_limit_cents: MockPaymentGateway::DEFAULT_APPROVAL_LIMIT_CENTS,
            admin_email: None,
            admin_password: None,
        }
    }
}

fn non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parsed<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|value| value.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.database_url, None);
        assert_eq!(config.jwt_issuer, "storefront");
        assert_eq!(config.token_ttl_minutes, 60);
        assert_eq!(config.payment_approval_limit_cents, 1_000_000);
        assert_eq!(config.password_iterations, 100_000);
        assert!(config.uses_development_secret());
    }

    #[test]
    fn test_addr_formatting() {
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
            ..Config::default()
        };
        assert_eq!(config.addr(), "127.0.0.1:8080");
    }

    #[test]
    fn test_addr_default() {
        let config = Config::default();
        assert_eq!(config.addr(), "0.0.0.0:3000");
    }

    #[test]
    fn custom_secret_is_not_the_development_one() {
        let config = Config {
            jwt_secret: "production".to_string(),
            ..Config::default()
        };
        assert!(!config.uses_development_secret());
    }
}
