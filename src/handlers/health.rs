use axum::{extract::State, http::StatusCode, response::Json};
use once_cell::sync::Lazy;
use serde_json::{json, Value};
use std::time::Instant;
use tracing::info;

use crate::handlers::AppState;

static STARTED_AT: Lazy<Instant> = Lazy::new(Instant::now);

/// Pins the uptime clock; called once at startup.
pub fn mark_started() {
    Lazy::force(&STARTED_AT);
}

/// Health check endpoint
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    info!("Health check requested");

    let timestamp = chrono::Utc::now().to_rfc3339();

    let pdf_extractor = state.extractor.is_available();
    let status = if pdf_extractor { "healthy" } else { "degraded" };

    let response = json!({
        "status": status,
        "timestamp": timestamp,
        "version": env!("CARGO_PKG_VERSION"),
        "services": {
            "pdf_extractor": pdf_extractor,
            "summarizer_model": state.summarizer.settings().model,
        },
        "uptime_seconds": STARTED_AT.elapsed().as_secs(),
    });

    info!(status = status, pdf_available = pdf_extractor, "Health check completed");

    Json(response)
}

/// Readiness check endpoint
pub async fn ready_handler(State(state): State<AppState>) -> StatusCode {
    if state.extractor.is_available() {
        info!("Readiness check passed");
        StatusCode::OK
    } else {
        info!("Readiness check failed - PDF extractor unavailable");
        StatusCode::SERVICE_UNAVAILABLE
    }
}
