//! Proxy error handling.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use keel_core::error::KeelError;

/// Proxy error type.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    code: String,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(status: StatusCode, message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            code: code.into(),
        }
    }

    /// Bad request error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message, "BAD_REQUEST")
    }

    /// Upstream could not be reached and nothing was cached.
    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, message, "BAD_GATEWAY")
    }

    /// Upstream did not answer in time and nothing was cached.
    pub fn gateway_timeout(message: impl Into<String>) -> Self {
        Self::new(StatusCode::GATEWAY_TIMEOUT, message, "GATEWAY_TIMEOUT")
    }

    /// Internal server error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message, "INTERNAL_ERROR")
    }

    /// HTTP status of this error.
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

/// Error response body.
#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Serialize)]
struct ErrorBody {
    code: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.code,
                message: self.message,
            },
        };

        (self.status, Json(body)).into_response()
    }
}

impl From<KeelError> for ApiError {
    fn from(err: KeelError) -> Self {
        match &err {
            KeelError::Timeout { .. } => ApiError::gateway_timeout(err.to_string()),
            KeelError::Network { .. }
            | KeelError::NoResponse(_)
            | KeelError::BadResponse { .. } => ApiError::bad_gateway(err.to_string()),
            KeelError::InvalidUrl { .. }
            | KeelError::InvalidMethod(_)
            | KeelError::InvalidHeader(_)
            | KeelError::JsonError(_) => ApiError::bad_request(err.to_string()),
            _ => {
                tracing::error!(error = %err, "Internal error");
                ApiError::internal("An internal error occurred")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_errors_map_to_gateway_statuses() {
        let timeout = ApiError::from(KeelError::Timeout {
            url: "https://site.test/".into(),
            millis: 2500,
        });
        assert_eq!(timeout.status(), StatusCode::GATEWAY_TIMEOUT);

        let offline = ApiError::from(KeelError::network("https://site.test/", "refused"));
        assert_eq!(offline.status(), StatusCode::BAD_GATEWAY);

        let missing = ApiError::from(KeelError::NoResponse("https://site.test/a.js".into()));
        assert_eq!(missing.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_storage_errors_are_internal() {
        let err = ApiError::from(KeelError::StorageError("disk full".into()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, "An internal error occurred");
    }
}
