//! Account Service Library
//!
//! User accounts for the storefront backend: login, registration, field
//! uniqueness checks, password recovery through a security question, password
//! changes and profile maintenance. Transport layers embed [`AccountManager`]
//! through the [`AccountService`] trait.

pub mod config;
pub mod infra;
pub mod repository;
pub mod service;

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use common::AppResult;

pub use crate::config::{AccountServiceConfig, TokenCacheBackend};
use crate::infra::{Database, MemoryTokenCache, RecoveryTokenCache, RedisTokenCache};
use crate::repository::UserStore;
pub use crate::service::{AccountManager, AccountService};

/// Build the recovery token cache selected by configuration.
pub async fn build_token_cache(
    config: &AccountServiceConfig,
) -> AppResult<Arc<dyn RecoveryTokenCache>> {
    let cache: Arc<dyn RecoveryTokenCache> = match config.token_cache {
        TokenCacheBackend::Memory => {
            Arc::new(MemoryTokenCache::new(config.token_ttl_seconds()))
        }
        TokenCacheBackend::Redis => Arc::new(RedisTokenCache::connect(&config.cache).await?),
    };

    info!(
        backend = cache.backend(),
        ttl_seconds = config.token_ttl_seconds(),
        "Recovery token cache ready"
    );
    Ok(cache)
}

/// Connect to the database (applying migrations) and the token cache, and
/// wire up the account service.
pub async fn build_account_service(
    config: &AccountServiceConfig,
) -> Result<AccountManager, Box<dyn std::error::Error>> {
    let db = Database::connect(&config.database).await?;
    let tokens = build_token_cache(config).await?;

    let user_repo = Arc::new(UserStore::new(db.get_connection()));
    Ok(AccountManager::new(
        user_repo,
        tokens,
        config.password_salt.clone(),
    ))
}

/// Run migrations (for CLI commands).
pub async fn run_migrations(
    config: &AccountServiceConfig,
    action: MigrateAction,
) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::connect_without_migrations(&config.database).await?;

    match action {
        MigrateAction::Up => {
            db.run_migrations().await?;
            info!("Migrations applied successfully");
        }
        MigrateAction::Down => {
            db.rollback_migration().await?;
            info!("Rolled back last migration");
        }
        MigrateAction::Status => {
            let status = db.migration_status().await?;
            for (name, applied) in status {
                let marker = if applied { "[x]" } else { "[ ]" };
                println!("{} {}", marker, name);
            }
        }
        MigrateAction::Fresh => {
            db.fresh_migrations().await?;
            info!("Database reset and migrations applied");
        }
    }

    Ok(())
}

/// Migration action type.
#[derive(Debug, Clone, Copy)]
pub enum MigrateAction {
    Up,
    Down,
    Status,
    Fresh,
}

/// Health report for the service's backing stores.
#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: String,
    pub database: ComponentHealth,
    pub token_cache: ComponentHealth,
}

/// Component health with optional error message.
#[derive(Debug, Serialize)]
pub struct ComponentHealth {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ComponentHealth {
    fn from_result<E: std::fmt::Display>(result: Result<(), E>) -> Self {
        match result {
            Ok(()) => Self {
                status: "healthy".to_string(),
                error: None,
            },
            Err(e) => Self {
                status: "unhealthy".to_string(),
                error: Some(e.to_string()),
            },
        }
    }

    fn is_healthy(&self) -> bool {
        self.error.is_none()
    }
}

impl HealthReport {
    pub fn new(database: ComponentHealth, token_cache: ComponentHealth) -> Self {
        let healthy = database.is_healthy() && token_cache.is_healthy();
        Self {
            status: if healthy { "healthy" } else { "degraded" }.to_string(),
            database,
            token_cache,
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// Ping the database and the configured token cache.
pub async fn health_check(config: &AccountServiceConfig) -> HealthReport {
    let database = match Database::connect_without_migrations(&config.database).await {
        Ok(db) => ComponentHealth::from_result(db.ping().await),
        Err(e) => ComponentHealth::from_result(Err(e)),
    };

    let token_cache = match build_token_cache(config).await {
        Ok(cache) => ComponentHealth::from_result(cache.ping().await),
        Err(e) => ComponentHealth::from_result(Err(e)),
    };

    HealthReport::new(database, token_cache)
}
