//! Common utilities shared across services.
//!
//! This crate provides:
//! - Unified error handling
//! - The result wrapper returned by service operations
//! - Configuration structures

pub mod config;
pub mod error;
pub mod response;

pub use config::*;
pub use error::{AppError, AppResult, OptionExt};
pub use response::{ApiResponse, Reply, ServiceResult};
