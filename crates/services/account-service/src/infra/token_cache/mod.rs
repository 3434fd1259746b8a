//! Recovery token cache.
//!
//! Holds the short-lived tokens issued after a correct recovery answer,
//! keyed by `token_<username>`. The lifetime is fixed when a cache is built;
//! expired entries read back as absent.

use async_trait::async_trait;

use common::AppResult;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

mod memory;
mod redis_cache;

pub use memory::MemoryTokenCache;
pub use redis_cache::RedisTokenCache;

/// Key/value store with a fixed time-to-live applied on every `set`.
///
/// Writers race last-write-wins; the cache gives no other coordination.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait RecoveryTokenCache: Send + Sync {
    /// Store `value` under `key`, replacing any previous value and
    /// restarting its lifetime
    async fn set(&self, key: &str, value: &str) -> AppResult<()>;

    /// Fetch the live value for `key`, `None` when absent or expired
    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    /// Verify the backing store is reachable
    async fn ping(&self) -> AppResult<()>;

    /// Short backend name for logs and health reports
    fn backend(&self) -> &'static str;
}
