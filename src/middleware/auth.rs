// Bearer token authentication

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::models::{AppState, Caller};
use crate::types::AppError;

/// Verified caller of the current request.
///
/// Handlers that take this extractor reject requests with 401 unless they
/// carry a valid `Authorization: Bearer <token>` header for a user that
/// still exists.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Caller);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or_else(|| AppError::Unauthorized("Missing authorization token".to_string()))?;

        let token = header
            .to_str()
            .ok()
            .and_then(bearer_token)
            .ok_or_else(|| AppError::Unauthorized("Invalid authorization header".to_string()))?;

        let caller = state.auth.authenticate(token).await?;
        Ok(AuthUser(caller))
    }
}

fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
