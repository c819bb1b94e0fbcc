//! Rate Limiting Middleware using GCRA Algorithm
//!
//! Per-client-IP limiting of `/predict` using tower_governor. Requires the
//! service to be served with
//! `into_make_service_with_connect_info::<SocketAddr>()`.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use governor::middleware::StateInformationMiddleware;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::key_extractor::PeerIpKeyExtractor;

use crate::error::{ErrorBody, ServerError};

const RETRY_AFTER_HEADER: &str = "x-ratelimit-after";

/// Governor config with X-RateLimit-* headers enabled
pub type PredictGovernorConfig =
    tower_governor::governor::GovernorConfig<PeerIpKeyExtractor, StateInformationMiddleware>;

/// Rate limiting configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Off unless explicitly enabled
    pub enabled: bool,
    /// Seconds to replenish one request
    pub per_second: u64,
    /// Requests that can be made immediately
    pub burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            per_second: 1,
            burst_size: 20,
        }
    }
}

/// Build the governor config for the prediction route
pub fn create_governor_config(
    config: &RateLimitConfig,
) -> Result<Arc<PredictGovernorConfig>, ServerError> {
    GovernorConfigBuilder::default()
        .per_second(config.per_second)
        .burst_size(config.burst_size)
        .use_headers()
        .finish()
        .map(Arc::new)
        .ok_or(ServerError::RateLimit {
            per_second: config.per_second,
            burst_size: config.burst_size,
        })
}

/// Rewrite the limiter's plain-text 429 into the JSON error body, keeping
/// its rate limit headers
pub async fn json_rejection(response: Response) -> Response {
    if response.status() != StatusCode::TOO_MANY_REQUESTS {
        return response;
    }

    let error = match response
        .headers()
        .get(RETRY_AFTER_HEADER)
        .and_then(|v| v.to_str().ok())
    {
        Some(secs) => format!("Too many requests, retry after {secs}s"),
        None => "Too many requests".to_string(),
    };

    let mut json = (StatusCode::TOO_MANY_REQUESTS, Json(ErrorBody { error })).into_response();
    for (name, value) in response.headers() {
        if name != header::CONTENT_TYPE && name != header::CONTENT_LENGTH {
            json.headers_mut().insert(name.clone(), value.clone());
        }
    }
    json
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_disabled() {
        let config = RateLimitConfig::default();
        assert!(!config.enabled);
        assert_eq!(config.burst_size, 20);
    }

    #[test]
    fn test_create_governor_config() {
        assert!(create_governor_config(&RateLimitConfig::default()).is_ok());
    }

    #[tokio::test]
    async fn test_json_rejection_keeps_headers() {
        let limited = Response::builder()
            .status(StatusCode::TOO_MANY_REQUESTS)
            .header(header::CONTENT_TYPE, "text/plain")
            .header(RETRY_AFTER_HEADER, "3")
            .body(axum::body::Body::from("Too Many Requests! Wait for 3s"))
            .unwrap();

        let out = json_rejection(limited).await;
        assert_eq!(out.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(out.headers()[header::CONTENT_TYPE], "application/json");
        assert_eq!(out.headers()[RETRY_AFTER_HEADER], "3");

        let bytes = axum::body::to_bytes(out.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "Too many requests, retry after 3s");
    }

    #[tokio::test]
    async fn test_json_rejection_passes_other_statuses() {
        let ok = StatusCode::OK.into_response();
        assert_eq!(json_rejection(ok).await.status(), StatusCode::OK);
    }

    #[test]
    fn test_zero_burst_is_rejected() {
        let config = RateLimitConfig {
            enabled: true,
            per_second: 1,
            burst_size: 0,
        };
        assert!(matches!(
            create_governor_config(&config),
            Err(ServerError::RateLimit { burst_size: 0, .. })
        ));
    }
}
