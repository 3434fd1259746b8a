//! Domain-level constants.
//!
//! These constants define business rules and validation requirements.

// =============================================================================
// User Roles
// =============================================================================

/// Default role assigned to new users
pub const ROLE_CUSTOMER: i32 = 0;

/// Administrator role with elevated privileges
pub const ROLE_ADMIN: i32 = 1;

// =============================================================================
// Validation
// =============================================================================

/// Field type name accepted by uniqueness validation for usernames
pub const FIELD_USERNAME: &str = "username";

/// Field type name accepted by uniqueness validation for emails
pub const FIELD_EMAIL: &str = "email";

// =============================================================================
// Password Recovery
// =============================================================================

/// Cache key prefix for recovery tokens (`token_<username>`)
pub const TOKEN_PREFIX: &str = "token_";

/// Default recovery token lifetime (12 hours)
pub const DEFAULT_TOKEN_TTL_SECONDS: u64 = 12 * 60 * 60;

/// Upper bound on recovery tokens held by the in-memory cache
pub const TOKEN_CACHE_MAX_ENTRIES: usize = 10_000;

/// Build the cache key under which a user's recovery token is stored.
pub fn recovery_token_key(username: &str) -> String {
    format!("{}{}", TOKEN_PREFIX, username)
}
