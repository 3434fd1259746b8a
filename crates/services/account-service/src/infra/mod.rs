//! Infrastructure layer - database, cache and time.

pub mod clock;
mod db;
pub mod migrations;
pub mod token_cache;

#[cfg(any(test, feature = "test-utils"))]
pub use clock::ManualClock;
pub use clock::{Clock, SystemClock};
pub use db::Database;
pub use migrations::Migrator;
pub use token_cache::{MemoryTokenCache, RecoveryTokenCache, RedisTokenCache};

#[cfg(any(test, feature = "test-utils"))]
pub use token_cache::MockRecoveryTokenCache;
