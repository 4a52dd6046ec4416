//! Executor error types.

use groupdesk_core::ErrorClass;
use groupdesk_registry::RegistryError;
use groupdesk_store::StoreError;
use thiserror::Error;

/// Failure of a whole group trade, before any order is placed.
#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("Advisor not found")]
    AdvisorNotFound,

    #[error("Advisor is inactive")]
    AdvisorInactive,

    #[error("No active clients found")]
    NoActiveClients,

    #[error("Invalid trade: {0}")]
    InvalidIntent(String),

    #[error(transparent)]
    Registry(RegistryError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl From<RegistryError> for ExecutorError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::AdvisorNotFound => Self::AdvisorNotFound,
            other => Self::Registry(other),
        }
    }
}

impl ExecutorError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::AdvisorNotFound => ErrorClass::NotFound,
            Self::AdvisorInactive | Self::NoActiveClients | Self::InvalidIntent(_) => {
                ErrorClass::Validation
            }
            Self::Registry(e) => e.class(),
            Self::Store(e) => e.class(),
        }
    }
}

pub type ExecutorResult<T> = Result<T, ExecutorError>;

/// Failure of one client's order. Never escapes the fan-out.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PlacementError {
    #[error("Order rejected: {0}")]
    Rejected(String),

    #[error("Order placement unavailable: {0}")]
    Unavailable(String),

    #[error("Order placement timed out after {0}ms")]
    Timeout(u64),
}

pub type PlacementResult<T> = Result<T, PlacementError>;
