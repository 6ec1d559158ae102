//! Environment-driven configuration.
//!
//! All lookups go through [`mockable::Env`] so tests can substitute an
//! in-memory environment. Secrets are required; tuning knobs fall back to
//! documented defaults.

use std::str::FromStr;
use std::time::Duration;

use jsonwebtoken::Algorithm;
use mockable::Env;

use crate::domain::password::{
    HasherParams, PasswordHashError, MIN_MEMORY_COST_KIB, MIN_PARALLELISM, MIN_TIME_COST,
};
use crate::domain::tokens::{TokenConfig, TokenConfigError};
use crate::outbound::persistence::PoolConfig;

/// Database connection string.
pub const DB_CONNECTION_STRING: &str = "DB_CONNECTION_STRING";
/// Secret for signing access tokens.
pub const JWT_SECRET_KEY: &str = "JWT_SECRET_KEY";
/// Secret for signing refresh tokens; must differ from the access secret.
pub const JWT_REFRESH_SECRET: &str = "JWT_REFRESH_SECRET";
/// Signing algorithm name, for example `HS256`.
pub const JWT_ALGORITHM: &str = "JWT_ALGORITHM";
/// Access token lifetime in minutes.
pub const JWT_EXP: &str = "JWT_EXP";
/// Refresh token lifetime in days.
pub const JWT_REFRESH_EXP: &str = "JWT_REFRESH_EXP";
/// Argon2id iteration count; floored at the domain minimum.
pub const ARGON2_TIME_COST: &str = "ARGON2_TIME_COST";
/// Argon2id memory cost in KiB; floored at the domain minimum.
pub const ARGON2_MEMORY_COST_KIB: &str = "ARGON2_MEMORY_COST_KIB";
/// Argon2id lane count; floored at the domain minimum.
pub const ARGON2_PARALLELISM: &str = "ARGON2_PARALLELISM";
/// Maximum number of pooled database connections.
pub const DB_POOL_MAX_SIZE: &str = "DB_POOL_MAX_SIZE";
/// Pool checkout timeout in seconds.
pub const DB_POOL_CONNECT_TIMEOUT_SECS: &str = "DB_POOL_CONNECT_TIMEOUT_SECS";

const DEFAULT_ALGORITHM: Algorithm = Algorithm::HS256;
const DEFAULT_ACCESS_EXPIRY_MINUTES: i64 = 15;
const DEFAULT_REFRESH_EXPIRY_DAYS: i64 = 7;

/// Errors raised while reading configuration from the environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {name}")]
    MissingEnv { name: &'static str },
    #[error("environment variable {name} has invalid value {value:?}: expected {expected}")]
    InvalidEnv {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
    #[error(transparent)]
    Token(#[from] TokenConfigError),
    #[error(transparent)]
    Password(#[from] PasswordHashError),
}

/// Everything the authentication stack needs at startup.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub tokens: TokenConfig,
    pub hasher: HasherParams,
}

impl AuthConfig {
    pub fn from_env(env: &dyn Env) -> Result<Self, ConfigError> {
        Ok(Self {
            tokens: load_token_config(env)?,
            hasher: load_hasher_params(env)?,
        })
    }
}

/// Read and validate the token signing configuration.
pub fn load_token_config(env: &dyn Env) -> Result<TokenConfig, ConfigError> {
    let access_secret = required(env, JWT_SECRET_KEY)?;
    let refresh_secret = required(env, JWT_REFRESH_SECRET)?;
    let algorithm = match env.string(JWT_ALGORITHM) {
        None => DEFAULT_ALGORITHM,
        Some(value) => Algorithm::from_str(&value).map_err(|_| ConfigError::InvalidEnv {
            name: JWT_ALGORITHM,
            value,
            expected: "a JWT signing algorithm name",
        })?,
    };
    let access_expiry_minutes =
        optional_number(env, JWT_EXP)?.unwrap_or(DEFAULT_ACCESS_EXPIRY_MINUTES);
    let refresh_expiry_days =
        optional_number(env, JWT_REFRESH_EXP)?.unwrap_or(DEFAULT_REFRESH_EXPIRY_DAYS);

    Ok(TokenConfig::new(
        access_secret,
        refresh_secret,
        algorithm,
        access_expiry_minutes,
        refresh_expiry_days,
    )?)
}

/// Read the Argon2id parameters, defaulting each knob to its floor.
pub fn load_hasher_params(env: &dyn Env) -> Result<HasherParams, ConfigError> {
    let time_cost = optional_number(env, ARGON2_TIME_COST)?.unwrap_or(MIN_TIME_COST);
    let memory_cost_kib =
        optional_number(env, ARGON2_MEMORY_COST_KIB)?.unwrap_or(MIN_MEMORY_COST_KIB);
    let parallelism = optional_number(env, ARGON2_PARALLELISM)?.unwrap_or(MIN_PARALLELISM);
    Ok(HasherParams::new(time_cost, memory_cost_kib, parallelism)?)
}

/// Read the database connection string.
pub fn database_url(env: &dyn Env) -> Result<String, ConfigError> {
    required(env, DB_CONNECTION_STRING)
}

/// Read the connection pool configuration, applying overrides when set.
pub fn load_pool_config(env: &dyn Env) -> Result<PoolConfig, ConfigError> {
    let mut config = PoolConfig::new(database_url(env)?);
    if let Some(max_size) = optional_number(env, DB_POOL_MAX_SIZE)? {
        config = config.with_max_size(max_size);
    }
    if let Some(seconds) = optional_number(env, DB_POOL_CONNECT_TIMEOUT_SECS)? {
        config = config.with_connection_timeout(Duration::from_secs(seconds));
    }
    Ok(config)
}

fn required(env: &dyn Env, name: &'static str) -> Result<String, ConfigError> {
    env.string(name)
        .filter(|value| !value.is_empty())
        .ok_or(ConfigError::MissingEnv { name })
}

fn optional_number<T: FromStr>(env: &dyn Env, name: &'static str) -> Result<Option<T>, ConfigError> {
    match env.string(name) {
        None => Ok(None),
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnv {
                name,
                value,
                expected: "a number",
            }),
    }
}
