//! API error type and its HTTP rendering.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use groupdesk_core::{CoreError, ErrorClass};
use groupdesk_executor::ExecutorError;
use groupdesk_ledger::LedgerError;
use groupdesk_registry::RegistryError;
use groupdesk_store::StoreError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Missing or invalid x-user-id header")]
    MissingIdentity,

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Executor(#[from] ExecutorError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ApiError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::MissingIdentity | Self::Unauthorized(_) => ErrorClass::Unauthorized,
            Self::Forbidden(_) => ErrorClass::Forbidden,
            Self::BadRequest(_) => ErrorClass::Validation,
            Self::Registry(e) => e.class(),
            Self::Executor(e) => e.class(),
            Self::Ledger(e) => e.class(),
            Self::Core(e) => e.class(),
            Self::Store(e) => e.class(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self.class() {
            ErrorClass::Validation => StatusCode::BAD_REQUEST,
            ErrorClass::NotFound => StatusCode::NOT_FOUND,
            ErrorClass::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorClass::Forbidden => StatusCode::FORBIDDEN,
            ErrorClass::Conflict => StatusCode::CONFLICT,
            ErrorClass::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Renders `{ "success": false, "error": message }`.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(error = ?self, "Request failed");
            "Internal server error".to_string()
        } else {
            warn!(status = status.as_u16(), error = %self, "Request rejected");
            self.to_string()
        };

        let body = Json(json!({ "success": false, "error": message }));
        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_follows_error_class() {
        assert_eq!(ApiError::MissingIdentity.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::Forbidden("Advisor role required".to_string()).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::from(RegistryError::AlreadyLinked).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(ExecutorError::AdvisorNotFound).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(StoreError::Conflict("code".to_string())).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(RegistryError::CodeSpaceExhausted(5)).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_message_passes_through() {
        let err = ApiError::from(ExecutorError::NoActiveClients);
        assert_eq!(err.to_string(), "No active clients found");
    }
}
