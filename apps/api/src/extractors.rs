use axum::extract::FromRequest;

use crate::errors::AppError;

/// `axum::Json` whose rejections (bad JSON, wrong field types, missing
/// content type) are reported as [`AppError::Validation`].
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);
