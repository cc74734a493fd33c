use axum::{
    body::Bytes,
    extract::{Multipart, State},
    http::{header, HeaderMap, HeaderName, StatusCode},
    response::{IntoResponse, Json, Response},
};
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::error::{AppError, AppResult};
use crate::handlers::AppState;
use crate::middleware::request_id;
use crate::models::{Document, ExtractResponse, SummarizeResponse};
use crate::services::ExtractedText;

/// `POST /api/extract` with a multipart `file` field.
pub async fn extract_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> AppResult<Json<ExtractResponse>> {
    let start = Instant::now();
    let request_id = request_id(&headers);

    info!(request_id = %request_id, "Starting PDF extraction request");

    let document = match extract_file_from_multipart(&mut multipart).await {
        Ok(document) => {
            info!(
                request_id = %request_id,
                file_name = %document.name,
                file_size = document.size,
                "File extracted from multipart form"
            );
            document
        }
        Err(e) => {
            error!(request_id = %request_id, error = %e, "Failed to extract file from multipart");
            return Err(e);
        }
    };

    check_size(&document, state.max_file_size_bytes)?;

    let file_size = document.size;
    let result = run_extraction(&state, document, &request_id).await?;
    let total_time = start.elapsed().as_millis() as u64;

    info!(request_id = %request_id, total_time_ms = total_time, "Request completed successfully");

    Ok(Json(ExtractResponse::new(result.text, result.pages, file_size, total_time)))
}

async fn extract_file_from_multipart(multipart: &mut Multipart) -> AppResult<Document> {
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        AppError::validation(format!("Failed to read multipart field: {}", e))
    })? {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or("unknown.pdf").to_string();
        let content_type = field.content_type().map(|ct| ct.to_string());

        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::validation(format!("Failed to read file data: {}", e)))?;

        if data.is_empty() {
            return Err(AppError::MissingFile);
        }

        let mut document = Document::new(file_name, data);
        if let Some(media_type) = content_type {
            document = document.with_media_type(media_type);
        }
        document.ensure_pdf()?;

        debug!(
            "Extracted file: {} ({} bytes, type: {:?})",
            document.name, document.size, document.media_type
        );

        return Ok(document);
    }

    Err(AppError::MissingFile)
}

/// `POST /api/extract/binary` with a raw `application/pdf` body.
pub async fn extract_binary_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<ExtractResponse>> {
    let start = Instant::now();
    let request_id = request_id(&headers);

    info!(request_id = %request_id, "Starting binary PDF extraction request");

    let document = document_from_body(&headers, body, state.max_file_size_bytes)?;
    let file_size = document.size;
    let result = run_extraction(&state, document, &request_id).await?;
    let total_time = start.elapsed().as_millis() as u64;

    info!(
        request_id = %request_id,
        total_time_ms = total_time,
        "Binary request completed successfully"
    );

    Ok(Json(ExtractResponse::new(result.text, result.pages, file_size, total_time)))
}

/// Header on a preview response carrying the document's page count.
pub const PAGE_COUNT_HEADER: &str = "x-page-count";

/// `POST /api/preview`: PNG of the first page, or 204 when it cannot be drawn.
pub async fn preview_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Response> {
    let document = document_from_body(&headers, body, state.max_file_size_bytes)?;
    let renderer = state.preview;

    let preview = tokio::task::spawn_blocking(move || {
        renderer.render_preview_best_effort(&document.content)
    })
    .await?;

    Ok(match preview {
        Some(preview) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "image/png".to_string()),
                (HeaderName::from_static(PAGE_COUNT_HEADER), preview.pages.to_string()),
            ],
            preview.png,
        )
            .into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    })
}

/// `POST /api/summarize/document`: server-side extraction followed by summarization.
pub async fn summarize_document_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<SummarizeResponse>> {
    let request_id = request_id(&headers);
    info!(request_id = %request_id, "Starting document summarization request");

    let document = document_from_body(&headers, body, state.max_file_size_bytes)?;
    let extracted = run_extraction(&state, document, &request_id).await?;
    let summary = state.summarizer.summarize(&extracted.text).await?;

    info!(request_id = %request_id, summary_chars = summary.len(), "Document summarized");

    Ok(Json(SummarizeResponse { summary }))
}

fn document_from_body(headers: &HeaderMap, body: Bytes, max_file_size_bytes: usize) -> AppResult<Document> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|ct| ct.to_str().ok())
        .map(str::to_string);

    let mut document = Document::new("uploaded.pdf", body);
    if let Some(content_type) = content_type {
        document = document.with_media_type(content_type);
    }

    if let Err(e) = document.ensure_pdf() {
        warn!(content_type = ?document.media_type, "Invalid content type for binary upload");
        return Err(e);
    }

    if document.content.is_empty() {
        warn!("Empty body received");
        return Err(AppError::MissingFile);
    }

    check_size(&document, max_file_size_bytes)?;
    Ok(document)
}

fn check_size(document: &Document, max_file_size_bytes: usize) -> AppResult<()> {
    if document.size > max_file_size_bytes {
        warn!(
            file_size = document.size,
            max_size = max_file_size_bytes,
            "File size exceeds limit"
        );
        return Err(AppError::FileTooLarge {
            size: document.size,
            limit: max_file_size_bytes,
        });
    }
    Ok(())
}

async fn run_extraction(state: &AppState, document: Document, request_id: &str) -> AppResult<ExtractedText> {
    let extractor = state.extractor;
    let result = tokio::task::spawn_blocking(move || extractor.extract_text(&document)).await?;

    match result {
        Ok(result) => {
            info!(
                request_id = %request_id,
                text_length = result.text.len(),
                pages = result.pages,
                "PDF processing completed successfully"
            );
            Ok(result)
        }
        Err(e) => {
            error!(request_id = %request_id, error = %e, "PDF processing failed");
            Err(e)
        }
    }
}
