use config::{builder::DefaultState, Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use tracing::warn;

use crate::auth::{PasswordConfig, SigningSecret};
use crate::error::AppError;

/// Upper bound on `auth.token_expiry_secs`: 30 days.
pub const MAX_TOKEN_TTL_SECS: i64 = 30 * 24 * 60 * 60;

/// `APP_` variables, sections split by `__`.
/// E.g., `APP_SERVER__PORT=5001` would set `Settings.server.port`
fn env_source() -> Environment {
    Environment::with_prefix("app")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL URL. Users are kept in memory when unset.
    pub url: Option<String>,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: Option<String>,
    pub token_expiry_secs: i64,
    pub hash_memory_kib: u32,
    pub hash_iterations: u32,
    pub hash_parallelism: u32,
}

impl AuthConfig {
    pub fn password_config(&self) -> PasswordConfig {
        PasswordConfig {
            memory_cost: self.hash_memory_kib,
            time_cost: self.hash_iterations,
            parallelism: self.hash_parallelism,
            output_len: Some(32),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub enabled: bool,
    pub allow_any_origin: bool,
    #[serde(default)]
    pub allowed_origins: Vec<String>,
    pub max_age: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub environment: String,
    pub app_name: String,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub cors: CorsConfig,
}

impl Settings {
    /// Defaults shared by every way of loading settings.
    pub fn builder() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("environment", "development")?
            .set_default("app_name", "backend-api")?
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("server.workers", num_cpus::get() as i64)?
            .set_default("database.max_connections", 5)?
            .set_default("auth.token_expiry_secs", 1800)?
            // OWASP minimum for Argon2id: 19 MiB, 2 passes, 1 lane
            .set_default("auth.hash_memory_kib", 19456)?
            .set_default("auth.hash_iterations", 2)?
            .set_default("auth.hash_parallelism", 1)?
            .set_default("cors.enabled", true)?
            .set_default("cors.allow_any_origin", true)?
            .set_default("cors.max_age", 3600)
    }

    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        Self::builder()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            .add_source(env_source())
            .build()?
            .try_deserialize()
    }

    /// Settings for tests: fixed secret and cheap password hashing.
    pub fn new_for_test() -> Result<Self, ConfigError> {
        Self::builder()?
            .set_override("environment", "test")?
            .set_override("server.workers", 1)?
            .set_override("auth.jwt_secret", "test_secret")?
            .set_override("auth.hash_memory_kib", 1024)?
            .set_override("auth.hash_iterations", 1)?
            .build()?
            .try_deserialize()
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    /// Token lifetime, rejected unless it lies in `1..=MAX_TOKEN_TTL_SECS`.
    pub fn token_ttl(&self) -> Result<chrono::Duration, AppError> {
        let secs = self.auth.token_expiry_secs;
        if secs <= 0 || secs > MAX_TOKEN_TTL_SECS {
            return Err(AppError::ConfigError(format!(
                "auth.token_expiry_secs must be between 1 and {}, got {}",
                MAX_TOKEN_TTL_SECS, secs
            )));
        }
        Ok(chrono::Duration::seconds(secs))
    }

    /// Resolves the process signing secret. A configured secret wins; without
    /// one, a random secret is generated except in production, where a
    /// missing secret aborts startup.
    pub fn signing_secret(&self) -> Result<SigningSecret, AppError> {
        match self.auth.jwt_secret.as_deref().map(str::trim) {
            Some(secret) if !secret.is_empty() => Ok(SigningSecret::new(secret)),
            _ if self.is_production() => Err(AppError::ConfigError(
                "auth.jwt_secret must be set in production".to_string(),
            )),
            _ => {
                warn!("No auth.jwt_secret configured; generated an ephemeral secret. Tokens will not survive a restart.");
                Ok(SigningSecret::generate())
            }
        }
    }
}
