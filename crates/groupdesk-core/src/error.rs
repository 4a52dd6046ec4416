//! Error types for groupdesk-core.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Core error types.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid commission rate: {0}")]
    InvalidCommissionRate(String),

    #[error("Invalid advisor code: {0}")]
    InvalidAdvisorCode(String),

    #[error("Invalid period: {0}")]
    InvalidPeriod(String),

    #[error("Invalid identifier: {0}")]
    InvalidId(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Caller-facing classification shared by every domain error.
///
/// The HTTP layer maps these to status codes; batch code uses them to
/// decide whether a failure stays local to one client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    /// Caller-correctable precondition failure.
    Validation,
    /// Referenced entity does not exist.
    NotFound,
    /// No usable caller identity.
    Unauthorized,
    /// Caller identity lacks the required role.
    Forbidden,
    /// Uniqueness violated at write time.
    Conflict,
    /// Anything else.
    Internal,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Validation => "validation",
            Self::NotFound => "not_found",
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::Conflict => "conflict",
            Self::Internal => "internal",
        };
        f.write_str(s)
    }
}

impl CoreError {
    /// Every core error is a malformed input.
    pub fn class(&self) -> ErrorClass {
        ErrorClass::Validation
    }
}
