//! Identity service configuration.

use std::env;

use common::{CredentialConfig, DatabaseConfig};

/// Identity service configuration.
#[derive(Debug, Clone, Default)]
pub struct IdentityServiceConfig {
    pub database: DatabaseConfig,
    pub credentials: CredentialConfig,
}

impl IdentityServiceConfig {
    /// Load configuration from environment variables.
    ///
    /// Unset or unparsable values fall back to their defaults.
    pub fn from_env() -> Self {
        let database_defaults = DatabaseConfig::default();
        let credential_defaults = CredentialConfig::default();

        Self {
            database: DatabaseConfig {
                url: env::var("IDENTITY_SERVICE_DATABASE_URL")
                    .or_else(|_| env::var("DATABASE_URL"))
                    .unwrap_or(database_defaults.url),
                max_connections: parse_var("IDENTITY_SERVICE_DB_MAX_CONNECTIONS")
                    .unwrap_or(database_defaults.max_connections),
                min_connections: parse_var("IDENTITY_SERVICE_DB_MIN_CONNECTIONS")
                    .unwrap_or(database_defaults.min_connections),
            },
            credentials: CredentialConfig {
                password_reset_token_expire_seconds: parse_var("PASSWORD_RESET_TOKEN_EXPIRE")
                    .unwrap_or(credential_defaults.password_reset_token_expire_seconds),
                min_password_length: parse_var("MIN_PASSWORD_LENGTH")
                    .unwrap_or(credential_defaults.min_password_length),
            },
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}
