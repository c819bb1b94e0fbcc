//! Prediction Route

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use feature_engine::RawRequest;
use inference_engine::PredictionResult;
use metrics::{counter, histogram};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;

use crate::error::ApiError;
use crate::AppState;

const NO_DATA: &str = "No data provided";

/// `POST /predict`
pub async fn predict(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<PredictionResult>, ApiError> {
    let start = Instant::now();
    let result = run(&state, body);
    histogram!("prediction_latency_seconds").record(start.elapsed().as_secs_f64());

    match &result {
        Ok(out) => {
            counter!("predictions_total", "prediction" => out.prediction.as_str()).increment(1)
        }
        Err(err) => counter!("prediction_errors_total", "kind" => err.kind()).increment(1),
    }
    result.map(Json)
}

fn run(
    state: &AppState,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<PredictionResult, ApiError> {
    let Json(value) = body.map_err(|rejection| match rejection {
        JsonRejection::MissingJsonContentType(_) => ApiError::BadRequest(NO_DATA.to_string()),
        other => ApiError::BadRequest(format!("Invalid JSON body: {}", other.body_text())),
    })?;
    if value.is_null() || value.as_object().is_some_and(|map| map.is_empty()) {
        return Err(ApiError::BadRequest(NO_DATA.to_string()));
    }

    let request = RawRequest::from_json(value)?;
    Ok(state.service.predict(&request)?)
}
