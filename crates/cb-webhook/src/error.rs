//! Error types for cb-webhook

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// cb-webhook error type
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Authentication failed")]
    AuthFailed,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// The calendar provider failed; surfaced as a bad gateway
    #[error("Calendar provider error: {0}")]
    Provider(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, ApiError>;

/// JSON body of every error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::AuthFailed => StatusCode::UNAUTHORIZED,
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Provider(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<cb_core::Error> for ApiError {
    fn from(err: cb_core::Error) -> Self {
        match err {
            cb_core::Error::NotFound(id) => Self::NotFound(id),
            cb_core::Error::Provider(detail) => Self::Provider(detail),
            cb_core::Error::Usage(usage) => Self::InvalidRequest(usage),
            e @ (cb_core::Error::Parse(_) | cb_core::Error::InvalidInterval { .. }) => {
                Self::InvalidRequest(e.to_string())
            }
            other => Self::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            success: false,
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_errors_keep_their_status() {
        let not_found: ApiError = cb_core::Error::NotFound("x".to_string()).into();
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let provider: ApiError = cb_core::Error::Provider("down".to_string()).into();
        assert_eq!(provider.status(), StatusCode::BAD_GATEWAY);

        let usage: ApiError = cb_core::Error::Usage("❌ 사용법".to_string()).into();
        assert_eq!(usage.status(), StatusCode::BAD_REQUEST);

        let config: ApiError = cb_core::Error::Config("bad".to_string()).into();
        assert_eq!(config.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
