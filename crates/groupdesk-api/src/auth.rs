//! Caller identity.
//!
//! Authentication happens upstream; requests arrive with the caller's user
//! id in the `x-user-id` header.

use std::str::FromStr;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use groupdesk_core::UserId;

use crate::error::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated caller. Rejects with 401 when the header is missing
/// or is not a UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller(pub UserId);

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::MissingIdentity)?;
        UserId::from_str(raw.trim())
            .map(Caller)
            .map_err(|_| ApiError::MissingIdentity)
    }
}
