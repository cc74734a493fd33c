use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, info};

use crate::client::SummaryClient;
use crate::error::{AppError, AppResult, INVALID_PDF, NO_DOCUMENT};
use crate::models::Document;
use crate::services::PdfExtractor;

pub const RETRY_MESSAGE: &str =
    "An error occurred while generating the summary. Please try again.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Ready,
    Processing,
    Done(String),
    Failed(String),
}

/// Identifies one summarize attempt. Only the ticket issued last may settle
/// the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket {
    id: u64,
}

impl RequestTicket {
    pub fn id(&self) -> u64 {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryOutcome {
    Applied(String),
    /// A newer request or document replaced this one; its result was dropped.
    Stale,
}

#[derive(Debug)]
struct Inner {
    document: Option<Document>,
    state: SessionState,
    latest: u64,
}

/// Client-side upload and summarize flow for one user.
///
/// Extraction happens locally; only the text travels to the service.
/// Overlapping summarize calls are allowed, but a response is applied only
/// if no request or upload was issued after it.
pub struct SummarySession {
    client: SummaryClient,
    extractor: PdfExtractor,
    inner: Mutex<Inner>,
}

impl SummarySession {
    pub fn new(client: SummaryClient) -> Self {
        Self {
            client,
            extractor: PdfExtractor::new(),
            inner: Mutex::new(Inner {
                document: None,
                state: SessionState::Idle,
                latest: 0,
            }),
        }
    }

    pub fn state(&self) -> SessionState {
        self.lock().state.clone()
    }

    pub fn document(&self) -> Option<Document> {
        self.lock().document.clone()
    }

    /// Replaces the selected document. Non-PDF files are rejected here and
    /// never reach the network.
    pub fn select_document(&self, document: Document) -> AppResult<()> {
        let mut inner = self.lock();
        inner.latest += 1;

        if let Err(e) = document.ensure_pdf() {
            debug!(file_name = %document.name, "Rejected non-PDF upload");
            inner.document = None;
            inner.state = SessionState::Failed(INVALID_PDF.to_string());
            return Err(e);
        }

        info!(file_name = %document.name, file_size = document.size, "Document selected");
        inner.document = Some(document);
        inner.state = SessionState::Ready;
        Ok(())
    }

    /// Drops the document and any in-flight result.
    pub fn reset(&self) {
        let mut inner = self.lock();
        inner.latest += 1;
        inner.document = None;
        inner.state = SessionState::Idle;
    }

    pub fn begin_request(&self) -> AppResult<(RequestTicket, Document)> {
        let mut inner = self.lock();

        let Some(document) = inner.document.clone() else {
            inner.state = SessionState::Failed(NO_DOCUMENT.to_string());
            return Err(AppError::MissingFile);
        };

        inner.latest += 1;
        inner.state = SessionState::Processing;
        Ok((RequestTicket { id: inner.latest }, document))
    }

    /// Applies `result` if `ticket` is still the latest request.
    pub fn settle(&self, ticket: RequestTicket, result: AppResult<String>) -> AppResult<SummaryOutcome> {
        let mut inner = self.lock();

        if ticket.id != inner.latest {
            debug!(
                request_id = ticket.id,
                latest_request_id = inner.latest,
                "Discarding stale summary response"
            );
            return Ok(SummaryOutcome::Stale);
        }

        match result {
            Ok(summary) => {
                inner.state = SessionState::Done(summary.clone());
                Ok(SummaryOutcome::Applied(summary))
            }
            Err(e) => {
                inner.state = SessionState::Failed(RETRY_MESSAGE.to_string());
                Err(e)
            }
        }
    }

    pub async fn summarize(&self) -> AppResult<SummaryOutcome> {
        let (ticket, document) = self.begin_request()?;
        let result = self.extract_and_summarize(document).await;
        self.settle(ticket, result)
    }

    async fn extract_and_summarize(&self, document: Document) -> AppResult<String> {
        let extractor = self.extractor;
        let extracted =
            tokio::task::spawn_blocking(move || extractor.extract_text(&document)).await??;
        self.client.summarize(&extracted.text).await
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
