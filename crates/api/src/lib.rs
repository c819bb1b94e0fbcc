//! Coffee Health Risk API Server
//!
//! HTTP front end for the health risk classifier: `POST /predict`,
//! `GET /health` and `GET /metrics`, with optional static file serving.

use axum::{
    routing::{get, post},
    Router,
};
use inference_engine::{ArtifactOrigin, ModelLifecycle, PredictionService};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_governor::GovernorLayer;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

pub mod config;
pub mod error;
pub mod rate_limit;
mod routes;

pub use crate::config::{LoggingSettings, ServerSettings, Settings};
pub use crate::error::{ApiError, ServerError};
pub use routes::health::HealthResponse;

use rate_limit::create_governor_config;

/// Application state shared across handlers
///
/// Built once the model is ready and never mutated afterwards.
pub struct AppState {
    pub service: Arc<PredictionService>,
    /// Present when a Prometheus recorder is installed
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(service: PredictionService, metrics: Option<PrometheusHandle>) -> Self {
        Self {
            service: Arc::new(service),
            metrics,
        }
    }
}

/// Create the application router
pub fn create_router(state: Arc<AppState>, server: &ServerSettings) -> Result<Router, ServerError> {
    let mut predict_route = post(routes::predict::predict);
    if server.rate_limit.enabled {
        let config = create_governor_config(&server.rate_limit)?;
        predict_route = predict_route
            .layer(GovernorLayer { config })
            .layer(axum::middleware::map_response(rate_limit::json_rejection));
        info!(
            "Rate limiting /predict: burst {}, one request per {}s",
            server.rate_limit.burst_size, server.rate_limit.per_second
        );
    }

    let mut router = Router::new()
        .route("/predict", predict_route)
        .route("/health", get(routes::health::health))
        .route("/metrics", get(routes::metrics::metrics));

    if let Some(dir) = &server.static_dir {
        info!("Serving static files from {}", dir.display());
        router = router.fallback_service(ServeDir::new(dir));
    }

    Ok(router
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state))
}

/// Initialize logging
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init_logging(settings: &LoggingSettings) -> Result<(), ServerError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.level));
    let builder = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true);

    let result = if settings.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    result.map_err(|e| ServerError::Logging(e.to_string()))
}

/// Initialize the model, then serve until the listener fails
pub async fn run_server(settings: Settings) -> Result<(), ServerError> {
    let metrics = match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => Some(handle),
        Err(e) => {
            warn!("Metrics recorder not installed: {}", e);
            None
        }
    };

    info!("Initializing model from {}", settings.model.dataset_path.display());
    let lifecycle = ModelLifecycle::new(settings.model.clone());
    let ready = tokio::task::spawn_blocking(move || lifecycle.initialize()).await??;
    match ready.origin {
        ArtifactOrigin::Loaded => info!("Model loaded from persisted artifacts"),
        ArtifactOrigin::Trained {
            validation_accuracy: Some(acc),
        } => info!("Model trained, validation accuracy {:.4}", acc),
        ArtifactOrigin::Trained { validation_accuracy: None } => info!("Model trained"),
    }

    let state = Arc::new(AppState::new(ready.service, metrics));
    let app = create_router(state, &settings.server)?;

    let addr = settings.bind_addr();
    info!("Starting API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
