//! Authentication middleware
//!
//! Bearer API key check for the `/api/*` routes.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::error::ApiError;
use crate::server::AppState;

/// Reject requests whose bearer token does not match `api.key`
pub async fn auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let provided = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    if !validate_api_key(provided, state.config.api.key.as_deref()) {
        warn!("Rejected {} {}: bad or missing API key", request.method(), request.uri().path());
        return Err(ApiError::AuthFailed);
    }

    Ok(next.run(request).await)
}

/// With no key configured every request passes
pub fn validate_api_key(provided: Option<&str>, expected: Option<&str>) -> bool {
    match (provided, expected) {
        (Some(p), Some(e)) => p == e,
        (_, None) => true,
        (None, Some(_)) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_api_key_no_key_configured() {
        assert!(validate_api_key(None, None));
        assert!(validate_api_key(Some("any"), None));
    }

    #[test]
    fn test_validate_api_key_with_key_configured() {
        assert!(!validate_api_key(None, Some("secret")));
        assert!(!validate_api_key(Some("wrong"), Some("secret")));
        assert!(validate_api_key(Some("secret"), Some("secret")));
    }
}
