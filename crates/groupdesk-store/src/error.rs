//! Store error types.

use groupdesk_core::{CommissionStatus, ErrorClass};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid commission transition: {from} -> {to}")]
    InvalidTransition {
        from: CommissionStatus,
        to: CommissionStatus,
    },

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::NotFound(_) => ErrorClass::NotFound,
            Self::Conflict(_) => ErrorClass::Conflict,
            Self::InvalidTransition { .. } => ErrorClass::Validation,
            Self::Unavailable(_) => ErrorClass::Internal,
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
