use axum::{
    extract::{rejection::JsonRejection, State},
    response::Json,
};
use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::handlers::AppState;
use crate::models::{SummarizeRequest, SummarizeResponse};

/// `POST /api/summarize`
pub async fn summarize_handler(
    State(state): State<AppState>,
    payload: Result<Json<SummarizeRequest>, JsonRejection>,
) -> AppResult<Json<SummarizeResponse>> {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            warn!(rejection = %rejection, "Unreadable summarize request body");
            return Err(AppError::no_text());
        }
    };

    let text = request.into_text()?;
    info!(text_length = text.len(), "Summarize request received");

    let summary = state.summarizer.summarize(&text).await?;
    Ok(Json(SummarizeResponse { summary }))
}

/// Any method other than POST on `/api/summarize`.
pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}
