//! Uniform result wrapper returned by every account operation.

use serde::Serialize;

use crate::error::{AppError, AppResult};

/// Successful outcome: an optional value and an optional message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reply<T> {
    pub data: Option<T>,
    pub message: Option<String>,
}

impl<T> Reply<T> {
    pub fn data(data: T) -> Self {
        Self {
            data: Some(data),
            message: None,
        }
    }

    pub fn with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            data: Some(data),
            message: Some(message.into()),
        }
    }

    /// Success carrying only a message
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            data: None,
            message: Some(message.into()),
        }
    }

    pub fn into_data(self) -> Option<T> {
        self.data
    }
}

/// Either a [`Reply`] or the error explaining why the operation failed
pub type ServiceResult<T> = AppResult<Reply<T>>;

/// Envelope handed to clients (DRY - consistent response format)
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(reply: Reply<T>) -> Self {
        Self {
            success: true,
            code: None,
            message: reply.message,
            data: reply.data,
        }
    }

    pub fn error(err: &AppError) -> Self {
        Self {
            success: false,
            code: Some(err.code()),
            message: Some(err.user_message()),
            data: None,
        }
    }
}

impl<T: Serialize> From<ServiceResult<T>> for ApiResponse<T> {
    fn from(result: ServiceResult<T>) -> Self {
        match result {
            Ok(reply) => ApiResponse::success(reply),
            Err(err) => ApiResponse::error(&err),
        }
    }
}
