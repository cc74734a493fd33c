//! Integration tests for the HTTP surface, driven in-process through the router.

mod support;

use std::io;
use std::sync::{Arc, Mutex};

use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderValue, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use tracing_subscriber::fmt::MakeWriter;

use learnsmart::config::GenerationSettings;
use learnsmart::handlers::{self, invoke, AppState, FunctionEvent, PAGE_COUNT_HEADER};
use learnsmart::middleware::REQUEST_ID_HEADER;
use learnsmart::services::{GroqClient, SummaryService};

use support::{service_with, text_pdf, FakeCompletionClient};

const TEN_MB: usize = 10 * 1024 * 1024;

fn app_with(client: Arc<FakeCompletionClient>) -> Router {
    handlers::router(AppState::new(service_with(client), TEN_MB))
}

/// Collects formatted log output in memory.
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn binary_request(uri: &str, content_type: &str, bytes: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(bytes))
        .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

#[tokio::test]
async fn test_summarize_returns_model_output_verbatim() {
    let client = FakeCompletionClient::replying("## Overview\n  Key points...  ");
    let app = app_with(client.clone());

    let (status, body) = send(
        app,
        json_request(Method::POST, "/api/summarize", json!({ "text": "Some long text" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "summary": "## Overview\n  Key points...  " }));
    assert_eq!(client.calls(), 1);

    let request = client.last_request().unwrap();
    assert_eq!(
        request.messages[1].content,
        "Please summarize the following text: \n\nSome long text"
    );
}

#[tokio::test]
async fn test_blank_text_is_rejected_without_upstream_call() {
    let client = FakeCompletionClient::replying("unused");

    for payload in [json!({ "text": "" }), json!({ "text": "   " }), json!({}), json!({ "text": null })] {
        let (status, body) = send(
            app_with(client.clone()),
            json_request(Method::POST, "/api/summarize", payload),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "No text provided" }));
    }

    assert_eq!(client.calls(), 0);
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let client = FakeCompletionClient::replying("unused");
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/summarize")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let (status, body) = send(app_with(client.clone()), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "No text provided" }));
    assert_eq!(client.calls(), 0);
}

#[tokio::test]
async fn test_wrong_method_is_405() {
    for method in [Method::GET, Method::PUT, Method::DELETE] {
        let request = Request::builder()
            .method(method)
            .uri("/api/summarize")
            .body(Body::empty())
            .unwrap();

        let (status, body) = send(app_with(FakeCompletionClient::replying("unused")), request).await;

        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body, json!({ "error": "Method not allowed" }));
    }
}

#[tokio::test]
async fn test_upstream_failure_is_generic_500() {
    let client = FakeCompletionClient::failing();

    let (status, body) = send(
        app_with(client.clone()),
        json_request(Method::POST, "/api/summarize", json!({ "text": "Some text" })),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "Failed to generate summary" }));
    assert_eq!(client.calls(), 1);
}

#[tokio::test]
async fn test_network_failure_is_generic_500() {
    // Nothing listens on port 1.
    let groq = GroqClient::new("http://127.0.0.1:1", "test-key", None).unwrap();
    let service = SummaryService::new(Arc::new(groq), GenerationSettings::default());
    let app = handlers::router(AppState::new(service, TEN_MB));

    let (status, body) = send(
        app,
        json_request(Method::POST, "/api/summarize", json!({ "text": "Some text" })),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "Failed to generate summary" }));
}

#[tokio::test]
async fn test_responses_carry_request_id() {
    let request = Request::builder()
        .method(Method::GET)
        .uri("/health")
        .header(REQUEST_ID_HEADER, "abc-123")
        .body(Body::empty())
        .unwrap();

    let response = app_with(FakeCompletionClient::replying("unused"))
        .oneshot(request)
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[REQUEST_ID_HEADER], "abc-123");
}

#[tokio::test]
async fn test_error_logs_use_request_id() {
    let logs = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_ansi(false)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let mut request = json_request(Method::POST, "/api/summarize", json!({ "text": "  " }));
    request
        .headers_mut()
        .insert(REQUEST_ID_HEADER, HeaderValue::from_static("corr-42"));

    let (status, _) = send(app_with(FakeCompletionClient::replying("unused")), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let output = logs.contents();
    let rejected = output
        .lines()
        .find(|line| line.contains("Request rejected"))
        .unwrap_or_else(|| panic!("no rejection logged in:\n{}", output));
    assert!(rejected.contains("corr-42"), "{}", rejected);
    assert!(rejected.contains("VALIDATION_ERROR"), "{}", rejected);
}

#[tokio::test]
async fn test_health_reports_status() {
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, body) = send(app_with(FakeCompletionClient::replying("unused")), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["services"]["summarizer_model"], "llama3-70b-8192");

    let request = Request::builder().uri("/ready").body(Body::empty()).unwrap();
    let (status, _) = send(app_with(FakeCompletionClient::replying("unused")), request).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_extract_binary_returns_page_text() {
    let bytes = text_pdf(&[&["Hello", "World"], &[]]);
    let (status, body) = send(
        app_with(FakeCompletionClient::replying("unused")),
        binary_request("/api/extract/binary", "application/pdf", bytes),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["text"], "Hello World\n\n");
    assert_eq!(body["pages"], 2);
}

#[tokio::test]
async fn test_extract_multipart_upload() {
    let pdf = text_pdf(&[&["From", "multipart"]]);
    let boundary = "learnsmart-boundary";

    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"doc.pdf\"\r\nContent-Type: application/pdf\r\n\r\n",
            b = boundary
        )
        .as_bytes(),
    );
    body.extend_from_slice(&pdf);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());

    let request = binary_request(
        "/api/extract",
        &format!("multipart/form-data; boundary={}", boundary),
        body,
    );
    let (status, body) = send(app_with(FakeCompletionClient::replying("unused")), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["text"], "From multipart\n");
}

#[tokio::test]
async fn test_extract_rejects_non_pdf() {
    let (status, body) = send(
        app_with(FakeCompletionClient::replying("unused")),
        binary_request("/api/extract/binary", "text/plain", b"hello".to_vec()),
    )
    .await;

    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(body, json!({ "error": "Please upload a valid PDF file." }));
}

#[tokio::test]
async fn test_extract_rejects_unparseable_pdf() {
    let (status, body) = send(
        app_with(FakeCompletionClient::replying("unused")),
        binary_request("/api/extract/binary", "application/pdf", b"%PDF-garbage".to_vec()),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body, json!({ "error": "Failed to extract text from PDF" }));
}

#[tokio::test]
async fn test_upload_over_byte_limit_is_413() {
    let client = FakeCompletionClient::replying("unused");
    let app = handlers::router(AppState::new(service_with(client.clone()), 64));

    let (status, body) = send(
        app,
        binary_request("/api/summarize/document", "application/pdf", text_pdf(&[&["Too", "big"]])),
    )
    .await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(body["error"].as_str().unwrap().contains("limit of 64 bytes"));
    assert_eq!(client.calls(), 0);
}

#[tokio::test]
async fn test_summarize_document_extracts_then_summarizes() {
    let client = FakeCompletionClient::replying("Short summary");
    let bytes = text_pdf(&[&["Chapter", "one"], &["Chapter", "two"]]);

    let (status, body) = send(
        app_with(client.clone()),
        binary_request("/api/summarize/document", "application/pdf", bytes),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "summary": "Short summary" }));

    let request = client.last_request().unwrap();
    assert_eq!(
        request.messages[1].content,
        "Please summarize the following text: \n\nChapter one\nChapter two\n"
    );
}

#[tokio::test]
async fn test_summarize_document_without_text_is_400() {
    let client = FakeCompletionClient::replying("unused");
    let bytes = text_pdf(&[&[], &[]]);

    let (status, body) = send(
        app_with(client.clone()),
        binary_request("/api/summarize/document", "application/pdf", bytes),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "No text provided" }));
    assert_eq!(client.calls(), 0);
}

#[tokio::test]
async fn test_preview_endpoint() {
    let app = app_with(FakeCompletionClient::replying("unused"));
    let response = app
        .oneshot(binary_request("/api/preview", "application/pdf", text_pdf(&[&["Hi"]])))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
    assert_eq!(response.headers()[PAGE_COUNT_HEADER], "1");

    let (status, _) = send(
        app_with(FakeCompletionClient::replying("unused")),
        binary_request("/api/preview", "application/pdf", b"%PDF-garbage".to_vec()),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_function_entry_point_shares_contract() {
    let client = FakeCompletionClient::replying("Function summary");
    let service = service_with(client.clone());

    let ok = invoke(&service, FunctionEvent::post(json!({ "text": "Some text" }))).await;
    assert_eq!(ok.status, 200);
    assert_eq!(ok.body, json!({ "summary": "Function summary" }));

    // Raw string bodies are parsed as JSON.
    let raw = invoke(&service, FunctionEvent::post(json!(r#"{"text":"Other text"}"#))).await;
    assert_eq!(raw.status, 200);

    let blank = invoke(&service, FunctionEvent::post(json!({ "text": "  " }))).await;
    assert_eq!(blank.status, 400);
    assert_eq!(blank.body, json!({ "error": "No text provided" }));

    let get = invoke(
        &service,
        FunctionEvent {
            method: "GET".to_string(),
            body: None,
        },
    )
    .await;
    assert_eq!(get.status, 405);
    assert_eq!(get.body, json!({ "error": "Method not allowed" }));

    assert_eq!(client.calls(), 2);
}

#[tokio::test]
async fn test_function_entry_point_upstream_failure() {
    let service = service_with(FakeCompletionClient::failing());
    let response = invoke(&service, FunctionEvent::post(json!({ "text": "Some text" }))).await;

    assert_eq!(response.status, 500);
    assert_eq!(response.body, json!({ "error": "Failed to generate summary" }));
}
