//! LearnSmart PDF Summarizer
//!
//! Extracts plain text from PDF documents and forwards it to a chat-completion
//! provider for summarization, behind a small JSON contract served either by a
//! long-running listener or a per-invocation function.

pub mod client;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod telemetry;

pub use config::Config;
pub use error::{AppError, AppResult};
