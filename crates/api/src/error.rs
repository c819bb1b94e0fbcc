//! API Errors

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use feature_engine::InputError;
use inference_engine::InferenceError;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Body returned with every error status
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Request-level failures
#[derive(Debug, Error)]
pub enum ApiError {
    /// Caller error, message is returned verbatim
    #[error("{0}")]
    BadRequest(String),
    /// Server fault, message is only logged
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<InferenceError> for ApiError {
    fn from(err: InferenceError) -> Self {
        if err.is_input_error() {
            ApiError::BadRequest(err.to_string())
        } else {
            ApiError::Internal(err.to_string())
        }
    }
}

impl From<InputError> for ApiError {
    fn from(err: InputError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Label used for the error counter
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = match &self {
            ApiError::BadRequest(msg) => msg.clone(),
            ApiError::Internal(detail) => {
                error!("Prediction failed: {}", detail);
                "Internal server error".to_string()
            }
        };
        (self.status(), Json(ErrorBody { error: message })).into_response()
    }
}

/// Startup failures of the server binary
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("model initialization failed: {0}")]
    Model(#[from] InferenceError),

    #[error("model initialization task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("invalid rate limit (per_second={per_second}, burst_size={burst_size})")]
    RateLimit { per_second: u64, burst_size: u32 },

    #[error("failed to initialize logging: {0}")]
    Logging(String),

    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_errors_are_bad_requests() {
        let err = ApiError::from(InferenceError::Input(InputError::MissingField("age")));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(err.to_string().contains("age"));
    }

    #[test]
    fn test_other_errors_are_internal() {
        let err = ApiError::from(InferenceError::Training("diverged".into()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.kind(), "internal");
    }
}
