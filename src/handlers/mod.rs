pub mod extract;
pub mod function;
pub mod health;
pub mod summarize;

pub use extract::*;
pub use function::{invoke, FunctionEvent, FunctionResponse};
pub use health::*;
pub use summarize::*;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::Config;
use crate::error::AppResult;
use crate::middleware::logging_middleware;
use crate::services::{GroqClient, PdfExtractor, PreviewRenderer, SummaryService};

// Room for multipart framing on top of the file itself.
const BODY_LIMIT_SLACK: usize = 64 * 1024;

/// Shared, read-only handler state. Nothing in here is mutated per request.
#[derive(Clone)]
pub struct AppState {
    pub summarizer: Arc<SummaryService>,
    pub extractor: PdfExtractor,
    pub preview: PreviewRenderer,
    pub max_file_size_bytes: usize,
}

impl AppState {
    pub fn new(summarizer: SummaryService, max_file_size_bytes: usize) -> Self {
        Self {
            summarizer: Arc::new(summarizer),
            extractor: PdfExtractor::new(),
            preview: PreviewRenderer::new(),
            max_file_size_bytes,
        }
    }

    /// Builds the upstream client once for the whole process.
    pub fn from_config(config: &Config) -> AppResult<Self> {
        let client = GroqClient::from_config(config)?;
        let summarizer = SummaryService::new(Arc::new(client), config.generation.clone());
        Ok(Self::new(summarizer, config.max_file_size_bytes()))
    }
}

pub fn router(state: AppState) -> Router {
    let body_limit = state.max_file_size_bytes + BODY_LIMIT_SLACK;

    Router::new()
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler))
        .route(
            "/api/summarize",
            post(summarize_handler).fallback(method_not_allowed),
        )
        .route("/api/summarize/document", post(summarize_document_handler))
        .route("/api/extract", post(extract_handler))
        .route("/api/extract/binary", post(extract_binary_handler))
        .route("/api/preview", post(preview_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(DefaultBodyLimit::max(body_limit))
                .layer(axum::middleware::from_fn(logging_middleware)),
        )
        .with_state(state)
}
