//! # V1 API Key Authentication Middleware
//!
//! Protects the relationship routes with Bearer token authentication against
//! `RAPPORT_API_KEYS`. Failures use the v1 `ApiResponse` envelope.

use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::api::state::AppState;

use super::response::{ApiResponse, ErrorCode};

/// Returned on every protected request, and logged at startup, when no API
/// keys are configured.
pub const MISSING_KEYS_MESSAGE: &str =
    "API keys not configured. Protected routes are locked until RAPPORT_API_KEYS is set.";

/// Why a request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    NoKeysConfigured,
    MissingHeader,
    BadScheme,
    UnknownKey,
}

impl AuthFailure {
    pub fn message(self) -> &'static str {
        match self {
            AuthFailure::NoKeysConfigured => MISSING_KEYS_MESSAGE,
            AuthFailure::MissingHeader => "Missing authorization header",
            AuthFailure::BadScheme => {
                "Invalid authorization header format. Expected: Bearer <token>"
            }
            AuthFailure::UnknownKey => "Invalid API key",
        }
    }
}

/// Check an `Authorization` header value against the configured keys.
pub fn authorize(api_keys: &[String], header: Option<&str>) -> Result<(), AuthFailure> {
    if api_keys.is_empty() {
        return Err(AuthFailure::NoKeysConfigured);
    }
    let header = header.ok_or(AuthFailure::MissingHeader)?;
    let token = header
        .strip_prefix("Bearer ")
        .ok_or(AuthFailure::BadScheme)?;
    if api_keys.iter().any(|key| key == token) {
        Ok(())
    } else {
        Err(AuthFailure::UnknownKey)
    }
}

/// Bearer-key gate for the protected v1 routes. Every refusal is a 401 in
/// the v1 envelope; with no keys configured nothing gets through.
pub async fn v1_auth_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    match authorize(&state.config.server.api_keys, header) {
        Ok(()) => next.run(request).await,
        Err(failure) => {
            tracing::debug!(?failure, path = %request.uri().path(), "Rejected request");
            ApiResponse::<()>::error(ErrorCode::Unauthorized, failure.message()).into_response()
        }
    }
}
