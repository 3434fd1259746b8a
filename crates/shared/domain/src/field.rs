//! Field kinds accepted by uniqueness validation.

use std::str::FromStr;

use crate::constants::{FIELD_EMAIL, FIELD_USERNAME};
use crate::error::{DomainError, DomainResult};

/// Which unique user column a value is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Username,
    Email,
}

impl FromStr for FieldKind {
    type Err = DomainError;

    fn from_str(s: &str) -> DomainResult<Self> {
        match s.trim() {
            FIELD_USERNAME => Ok(FieldKind::Username),
            FIELD_EMAIL => Ok(FieldKind::Email),
            _ => Err(DomainError::validation("parameter error")),
        }
    }
}
