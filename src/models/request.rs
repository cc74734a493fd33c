use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

pub const PDF_MEDIA_TYPE: &str = "application/pdf";

/// Body of `POST /api/summarize`.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct SummarizeRequest {
    #[serde(default)]
    pub text: Option<String>,
}

impl SummarizeRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
        }
    }

    /// Returns the text untouched, or `No text provided` when it is
    /// missing or whitespace only.
    pub fn into_text(self) -> AppResult<String> {
        match self.text {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => Err(AppError::no_text()),
        }
    }
}

/// An uploaded PDF held in memory for one extraction and summarization cycle.
#[derive(Debug, Clone)]
pub struct Document {
    pub name: String,
    pub size: usize,
    pub content: Bytes,
    pub media_type: Option<String>,
}

impl Document {
    pub fn new(name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        let content = content.into();
        Self {
            name: name.into(),
            size: content.len(),
            content,
            media_type: None,
        }
    }

    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }

    /// The declared media type must be `application/pdf`; parameters such as
    /// `; charset=binary` are ignored.
    pub fn is_pdf(&self) -> bool {
        self.media_type
            .as_deref()
            .and_then(|mt| mt.split(';').next())
            .map(|mt| mt.trim().eq_ignore_ascii_case(PDF_MEDIA_TYPE))
            .unwrap_or(false)
    }

    pub fn ensure_pdf(&self) -> AppResult<()> {
        if self.is_pdf() {
            Ok(())
        } else {
            Err(AppError::UnsupportedMedia {
                media_type: self.media_type.clone(),
            })
        }
    }
}
