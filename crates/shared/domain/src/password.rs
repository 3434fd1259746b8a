//! Password digest value object.
//!
//! Stored passwords are a deterministic SHA-256 digest of the plain text
//! followed by a configured salt, so the store can match on
//! `(username, digest)` directly.

use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 digest of a password.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordDigest {
    hash: String,
}

// Don't expose hash in debug output (security)
impl std::fmt::Debug for PasswordDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordDigest")
            .field("hash", &"[REDACTED]")
            .finish()
    }
}

impl PasswordDigest {
    /// Digest a plain text password with the given salt.
    pub fn compute(plain_text: &str, salt: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(plain_text.as_bytes());
        hasher.update(salt.as_bytes());
        Self {
            hash: hex::encode(hasher.finalize()),
        }
    }

    /// Get the hash string for storage or comparison.
    pub fn as_str(&self) -> &str {
        &self.hash
    }

    /// Consume and return the hash string.
    pub fn into_string(self) -> String {
        self.hash
    }
}
