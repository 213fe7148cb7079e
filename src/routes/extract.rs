// Extractors whose rejections go through `AppError`

use axum::extract::{FromRequest, FromRequestParts};

use crate::types::AppError;

/// `axum::Json` that rejects with a 400 `{"error": ...}` body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// `axum::extract::Path` that rejects with a 400 `{"error": ...}` body.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);
