use std::env;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};

pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_MODEL: &str = "llama3-70b-8192";
pub const DEFAULT_TEMPERATURE: f32 = 0.3;
pub const DEFAULT_MAX_TOKENS: u32 = 1024;

/// Generation parameters sent with every summarization request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSettings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

#[derive(Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub api_key: Option<String>,
    pub upstream_base_url: String,
    pub upstream_timeout_seconds: Option<u64>,
    pub generation: GenerationSettings,
    pub max_file_size_mb: usize,
    pub json_logs: bool,
}

// Hand-written so the API key never ends up in the logs.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("server_host", &self.server_host)
            .field("server_port", &self.server_port)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("upstream_base_url", &self.upstream_base_url)
            .field("upstream_timeout_seconds", &self.upstream_timeout_seconds)
            .field("generation", &self.generation)
            .field("max_file_size_mb", &self.max_file_size_mb)
            .field("json_logs", &self.json_logs)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        info!("Loading configuration from environment variables");
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = Config {
            server_host: lookup("SERVER_HOST").unwrap_or_else(|| {
                info!("SERVER_HOST not set, using default: 0.0.0.0");
                "0.0.0.0".to_string()
            }),
            server_port: Self::parse_var(&lookup, "PORT", DEFAULT_PORT)
                .context("Failed to parse PORT")?,
            api_key: lookup("GROQ_API_KEY")
                .map(|key| key.trim().to_string())
                .filter(|key| !key.is_empty()),
            upstream_base_url: lookup("GROQ_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            upstream_timeout_seconds: lookup("UPSTREAM_TIMEOUT_SECONDS")
                .and_then(|raw| match raw.parse::<u64>() {
                    Ok(secs) => Some(secs),
                    Err(e) => {
                        warn!("Failed to parse UPSTREAM_TIMEOUT_SECONDS: {} (no timeout)", e);
                        None
                    }
                }),
            generation: GenerationSettings {
                model: lookup("LLM_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                temperature: Self::parse_var(&lookup, "LLM_TEMPERATURE", DEFAULT_TEMPERATURE)
                    .context("Failed to parse LLM_TEMPERATURE")?,
                max_tokens: Self::parse_var(&lookup, "LLM_MAX_TOKENS", DEFAULT_MAX_TOKENS)
                    .context("Failed to parse LLM_MAX_TOKENS")?,
            },
            max_file_size_mb: Self::parse_var(&lookup, "MAX_FILE_SIZE_MB", 10)
                .context("Failed to parse MAX_FILE_SIZE_MB")?,
            json_logs: lookup("LOG_FORMAT")
                .map(|format| format.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
        };

        config.validate()?;

        info!("Configuration loaded successfully: {:?}", config);
        Ok(config)
    }

    fn parse_var<F, T>(lookup: &F, var_name: &str, default: T) -> Result<T>
    where
        F: Fn(&str) -> Option<String>,
        T: std::str::FromStr + Copy + std::fmt::Debug,
        T::Err: std::fmt::Display,
    {
        match lookup(var_name) {
            Some(val) => match val.trim().parse() {
                Ok(parsed) => Ok(parsed),
                Err(e) => {
                    warn!("Failed to parse {}: {} (using default: {:?})", var_name, e, default);
                    Ok(default)
                }
            },
            None => {
                info!("{} not set, using default: {:?}", var_name, default);
                Ok(default)
            }
        }
    }

    fn validate(&self) -> Result<()> {
        if self.server_port == 0 {
            return Err(anyhow::anyhow!("PORT must be greater than 0"));
        }
        if self.max_file_size_mb == 0 {
            return Err(anyhow::anyhow!("MAX_FILE_SIZE_MB must be greater than 0"));
        }
        if self.generation.max_tokens == 0 {
            return Err(anyhow::anyhow!("LLM_MAX_TOKENS must be greater than 0"));
        }
        if !(0.0..=2.0).contains(&self.generation.temperature) {
            return Err(anyhow::anyhow!("LLM_TEMPERATURE must be between 0 and 2"));
        }
        if self.api_key.is_none() {
            return Err(anyhow::anyhow!("GROQ_API_KEY must be set"));
        }
        Ok(())
    }

    pub fn upstream_timeout(&self) -> Option<Duration> {
        self.upstream_timeout_seconds.map(Duration::from_secs)
    }

    pub fn max_file_size_bytes(&self) -> usize {
        self.max_file_size_mb * 1024 * 1024
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}
