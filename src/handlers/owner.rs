//! Caller identity extractor.
//!
//! Tokens are validated by the upstream auth gateway, which forwards the
//! authenticated user id in `x-owner-id`. Requests without it are rejected.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::errors::AppError;

pub const OWNER_HEADER: &str = "x-owner-id";

/// Authenticated owner of the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Owner(pub String);

impl<S> FromRequestParts<S> for Owner
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let owner = parts
            .headers
            .get(OWNER_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AppError::unauthenticated("Unauthorized"))?;
        Ok(Owner(owner.to_string()))
    }
}
