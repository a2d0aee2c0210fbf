//! Caller identity.
//!
//! Authentication happens upstream; the proxy in front of this service
//! forwards the signed-in user's primary email in [`USER_EMAIL_HEADER`].

use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};

use crate::errors::AppError;

pub const USER_EMAIL_HEADER: &str = "x-user-email";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub email: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_EMAIL_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|email| !email.is_empty())
            .map(|email| CurrentUser {
                email: email.to_string(),
            })
            .ok_or(AppError::Unauthorized)
    }
}
