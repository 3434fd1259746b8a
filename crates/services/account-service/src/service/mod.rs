//! Application services - account use cases.

mod account_service;

pub use account_service::{AccountManager, AccountService};
