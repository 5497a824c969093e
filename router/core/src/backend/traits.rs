//! LLM Backend Traits
//!
//! Trait definitions for inference backends. The dispatcher talks to a
//! backend only through [`LlmBackend`], so Ollama can be swapped for another
//! provider (or a test double) without touching routing or logging.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Sampling temperature used unless a request overrides it
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Context window requested from the backend
pub const DEFAULT_NUM_CTX: u32 = 2048;

/// Configuration for LLM requests
#[derive(Clone, Debug, PartialEq)]
pub struct LlmRequest {
    /// The prompt/message to send
    pub prompt: String,
    /// Model to use (backend-specific identifier)
    pub model: String,
    /// System prompt (optional)
    pub system: Option<String>,
    /// Temperature (0.0-1.0, higher = more creative)
    pub temperature: f32,
    /// Context window size in tokens
    pub num_ctx: u32,
    /// Maximum tokens in response (0 = backend default)
    pub max_tokens: u32,
}

impl Default for LlmRequest {
    fn default() -> Self {
        Self {
            prompt: String::new(),
            model: String::new(),
            system: None,
            temperature: DEFAULT_TEMPERATURE,
            num_ctx: DEFAULT_NUM_CTX,
            max_tokens: 0,
        }
    }
}

impl LlmRequest {
    /// Create a new request with prompt and model
    pub fn new(prompt: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: model.into(),
            ..Default::default()
        }
    }

    /// Set system prompt
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }
}

/// Response from a non-streaming LLM request
#[derive(Clone, Debug)]
pub struct LlmResponse {
    /// The response text
    pub content: String,
    /// Model that generated the response
    pub model: String,
    /// Tokens used (if available)
    pub tokens_used: Option<u32>,
    /// Response generation time in milliseconds
    pub duration_ms: Option<u64>,
}

/// Transport-level backend failures
#[derive(Debug, Error)]
pub enum BackendError {
    /// The server could not be reached
    #[error("Could not connect to {url}")]
    Connect {
        /// Base URL of the backend
        url: String,
    },

    /// The request exceeded the client timeout
    #[error("Request timed out after {}s", .timeout.as_secs())]
    Timeout {
        /// Configured client timeout
        timeout: Duration,
    },

    /// The server answered with a non-success status
    #[error("Backend returned {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, for diagnostics
        body: String,
    },

    /// The response body was not the expected JSON
    #[error("Invalid backend response: {0}")]
    Decode(String),

    /// Any other HTTP client failure
    #[error("HTTP client error: {0}")]
    Http(String),
}

/// LLM Backend trait
///
/// Implement this trait to add support for different LLM providers.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Get the backend name (e.g., "Ollama")
    fn name(&self) -> &str;

    /// Base URL, used in diagnostics
    fn base_url(&self) -> String;

    /// Check if the backend is healthy and reachable
    async fn health_check(&self) -> bool;

    /// Send a request and wait for the complete response
    async fn send(&self, request: &LlmRequest) -> Result<LlmResponse, BackendError>;
}

/// Backend connection configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackendConfig {
    /// Ollama host address
    pub host: String,
    /// Ollama port number
    pub port: u16,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 11434,
            timeout: Duration::from_secs(30),
        }
    }
}

impl BackendConfig {
    /// Create Ollama configuration
    pub fn ollama(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Set the request timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Base URL of the server
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}
