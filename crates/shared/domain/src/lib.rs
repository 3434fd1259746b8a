//! Domain layer - Core business entities and value objects.
//!
//! This crate contains pure domain logic with no infrastructure dependencies.

pub mod constants;
pub mod error;
pub mod field;
pub mod password;
pub mod user;

pub use constants::*;
pub use error::{DomainError, DomainResult};
pub use field::FieldKind;
pub use password::PasswordDigest;
pub use user::{NewUser, ProfilePatch, User, UserRole};
