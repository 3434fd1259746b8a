//! User domain entity and related types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{ROLE_ADMIN, ROLE_CUSTOMER};
use crate::error::DomainError;

/// User roles enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Customer,
    Admin,
}

impl TryFrom<i32> for UserRole {
    type Error = DomainError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            ROLE_CUSTOMER => Ok(UserRole::Customer),
            ROLE_ADMIN => Ok(UserRole::Admin),
            other => Err(DomainError::InvalidRole(other)),
        }
    }
}

impl From<UserRole> for i32 {
    fn from(role: UserRole) -> Self {
        match role {
            UserRole::Customer => ROLE_CUSTOMER,
            UserRole::Admin => ROLE_ADMIN,
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserRole::Customer => write!(f, "customer"),
            UserRole::Admin => write!(f, "admin"),
        }
    }
}

/// User domain entity.
///
/// `password` holds the stored digest. Anything handed back to a caller goes
/// through [`User::without_password`] first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub password: String,
    pub email: String,
    pub phone: Option<String>,
    pub question: Option<String>,
    pub answer: Option<String>,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Build a customer account from a registration candidate and its digest
    pub fn register(candidate: NewUser, password_digest: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            username: candidate.username,
            password: password_digest,
            email: candidate.email,
            phone: candidate.phone,
            question: candidate.question,
            answer: candidate.answer,
            role: UserRole::Customer,
            created_at: now,
            updated_at: now,
        }
    }

    /// Clear the password digest before the record leaves the service.
    pub fn without_password(mut self) -> Self {
        self.password.clear();
        self
    }
}

/// Registration candidate
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub username: String,
    /// Plain text password, digested before storage
    pub password: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub answer: Option<String>,
}

/// Profile update limited to the fields a user may change themselves.
///
/// Username, password and role have no slot here, so a patch can never
/// overwrite them. A `None` optional field leaves the stored value as it is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfilePatch {
    pub id: Uuid,
    pub email: String,
    pub phone: Option<String>,
    pub question: Option<String>,
    pub answer: Option<String>,
}
