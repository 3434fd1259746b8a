//! Account service configuration.

use std::env;
use std::str::FromStr;

use common::{CacheConfig, DatabaseConfig};
use domain::DEFAULT_TOKEN_TTL_SECONDS;

/// Where recovery tokens are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenCacheBackend {
    /// Process-local map, lost on restart
    Memory,
    /// Shared Redis instance
    Redis,
}

impl FromStr for TokenCacheBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(TokenCacheBackend::Memory),
            "redis" => Ok(TokenCacheBackend::Redis),
            other => Err(format!("unknown token cache backend: {}", other)),
        }
    }
}

/// Account service configuration.
#[derive(Debug, Clone)]
pub struct AccountServiceConfig {
    pub database: DatabaseConfig,
    /// Redis settings; the TTL also applies to the memory backend
    pub cache: CacheConfig,
    pub token_cache: TokenCacheBackend,
    /// Appended to plain text passwords before digesting
    pub password_salt: String,
}

impl AccountServiceConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let token_cache = match env::var("ACCOUNT_SERVICE_TOKEN_CACHE") {
            Ok(raw) => raw.parse().unwrap_or_else(|e: String| {
                tracing::warn!("{}, falling back to in-memory token cache", e);
                TokenCacheBackend::Memory
            }),
            Err(_) => defaults.token_cache,
        };

        Self {
            database: DatabaseConfig {
                url: env::var("ACCOUNT_SERVICE_DATABASE_URL")
                    .or_else(|_| env::var("DATABASE_URL"))
                    .unwrap_or(defaults.database.url),
                max_connections: env::var("ACCOUNT_SERVICE_DB_MAX_CONNECTIONS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.database.max_connections),
                min_connections: env::var("ACCOUNT_SERVICE_DB_MIN_CONNECTIONS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.database.min_connections),
            },
            cache: CacheConfig {
                url: env::var("ACCOUNT_SERVICE_REDIS_URL")
                    .or_else(|_| env::var("REDIS_URL"))
                    .unwrap_or(defaults.cache.url),
                default_ttl_seconds: parse_token_ttl(
                    env::var("ACCOUNT_SERVICE_TOKEN_TTL_SECONDS").ok().as_deref(),
                ),
            },
            token_cache,
            password_salt: env::var("ACCOUNT_SERVICE_PASSWORD_SALT")
                .unwrap_or(defaults.password_salt),
        }
    }

    /// Recovery token lifetime in seconds
    pub fn token_ttl_seconds(&self) -> u64 {
        self.cache.default_ttl_seconds
    }
}

/// Token TTL from its raw setting. Missing, malformed and zero values fall
/// back to the default, since a zero TTL would expire every token on issue.
fn parse_token_ttl(raw: Option<&str>) -> u64 {
    let Some(raw) = raw else {
        return DEFAULT_TOKEN_TTL_SECONDS;
    };

    match raw.trim().parse::<u64>() {
        Ok(ttl) if ttl > 0 => ttl,
        _ => {
            tracing::warn!(
                value = %raw,
                default = DEFAULT_TOKEN_TTL_SECONDS,
                "Invalid token TTL, using default"
            );
            DEFAULT_TOKEN_TTL_SECONDS
        }
    }
}

impl Default for AccountServiceConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            cache: CacheConfig::default(),
            token_cache: TokenCacheBackend::Memory,
            password_salt: String::new(),
        }
    }
}
