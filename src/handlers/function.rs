//! Per-invocation entry point for function-style hosts.
//!
//! The host hands over one event (method plus parsed or raw JSON body) and
//! expects one response back. The contract is identical to the listener's
//! `POST /api/summarize`.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::SummarizeRequest;
use crate::services::SummaryService;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionEvent {
    pub method: String,
    #[serde(default)]
    pub body: Option<Value>,
}

impl FunctionEvent {
    pub fn post(body: Value) -> Self {
        Self {
            method: "POST".to_string(),
            body: Some(body),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunctionResponse {
    pub status: u16,
    pub body: Value,
}

impl FunctionResponse {
    fn from_error(error: &AppError) -> Self {
        Self {
            status: error.status_code().as_u16(),
            body: json!(error.body()),
        }
    }
}

pub async fn invoke(service: &SummaryService, event: FunctionEvent) -> FunctionResponse {
    let request_id = Uuid::new_v4().to_string();
    tracing::info!(request_id = %request_id, method = %event.method, "Function invoked");

    match handle(service, event).await {
        Ok(summary) => FunctionResponse {
            status: 200,
            body: json!({ "summary": summary }),
        },
        Err(e) => {
            e.log(&request_id);
            FunctionResponse::from_error(&e)
        }
    }
}

async fn handle(service: &SummaryService, event: FunctionEvent) -> AppResult<String> {
    if !event.method.eq_ignore_ascii_case("POST") {
        return Err(AppError::MethodNotAllowed);
    }

    // Some hosts pass the body through as an unparsed string.
    let request = match event.body {
        None | Some(Value::Null) => SummarizeRequest::default(),
        Some(Value::String(raw)) => serde_json::from_str(&raw).map_err(|_| AppError::no_text())?,
        Some(value) => serde_json::from_value(value).map_err(|_| AppError::no_text())?,
    };

    let text = request.into_text()?;
    service.summarize(&text).await
}
