//! Ledger error types.

use groupdesk_core::{CommissionStatus, CoreError, ErrorClass};
use groupdesk_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Advisor not found")]
    AdvisorNotFound,

    #[error("Commission not found")]
    CommissionNotFound,

    #[error("Commission cannot move from {from} to {to}")]
    InvalidTransition {
        from: CommissionStatus,
        to: CommissionStatus,
    },

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Store error: {0}")]
    Store(StoreError),

    #[error("Commission queue full")]
    QueueFull,

    #[error("Commission worker stopped")]
    Closed,
}

impl From<StoreError> for LedgerError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::InvalidTransition { from, to } => Self::InvalidTransition { from, to },
            other => Self::Store(other),
        }
    }
}

impl LedgerError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::AdvisorNotFound | Self::CommissionNotFound => ErrorClass::NotFound,
            Self::InvalidTransition { .. } | Self::Core(_) => ErrorClass::Validation,
            Self::Store(e) => e.class(),
            Self::QueueFull | Self::Closed => ErrorClass::Internal,
        }
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;
