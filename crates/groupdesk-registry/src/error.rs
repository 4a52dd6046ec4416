//! Registry error types.

use groupdesk_core::{CoreError, ErrorClass};
use groupdesk_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("User not found")]
    UserNotFound,

    #[error("User is already an advisor")]
    AlreadyAdvisor,

    #[error("Advisor not found")]
    AdvisorNotFound,

    #[error("Invalid advisor code")]
    InvalidAdvisorCode,

    #[error("Client not found")]
    ClientNotFound,

    #[error("Advisors cannot link to themselves")]
    SelfLink,

    #[error("Client already linked to an advisor")]
    AlreadyLinked,

    #[error("Client not linked to this advisor")]
    NotLinked,

    #[error(
        "Commission rate must be between {}% and {}%, got {}%",
        percent(.min_bps),
        percent(.max_bps),
        percent(.bps)
    )]
    CommissionOutOfRange { bps: u32, min_bps: u32, max_bps: u32 },

    #[error("Description exceeds {max} characters")]
    DescriptionTooLong { max: usize },

    #[error("Could not generate a unique advisor code after {0} attempts")]
    CodeSpaceExhausted(u32),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// `3050` -> `30.50`.
fn percent(bps: &u32) -> String {
    format!("{}.{:02}", bps / 100, bps % 100)
}

impl RegistryError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::AdvisorNotFound => ErrorClass::NotFound,
            Self::CodeSpaceExhausted(_) => ErrorClass::Internal,
            Self::Core(e) => e.class(),
            Self::Store(e) => e.class(),
            _ => ErrorClass::Validation,
        }
    }
}

pub type RegistryResult<T> = Result<T, RegistryError>;
