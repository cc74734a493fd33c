use serde::{Deserialize, Serialize};

/// Success body of `POST /api/summarize`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SummarizeResponse {
    pub summary: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExtractResponse {
    pub text: String,
    pub pages: usize,
    pub file_size_bytes: usize,
    pub processing_time_ms: u64,
}

impl ExtractResponse {
    pub fn new(text: String, pages: usize, file_size_bytes: usize, processing_time_ms: u64) -> Self {
        Self {
            text,
            pages,
            file_size_bytes,
            processing_time_ms,
        }
    }
}
