//! Ollama Backend Implementation
//!
//! LLM backend for Ollama (local LLM server).
//!
//! # Ollama API
//!
//! - `/api/generate` - single-shot completion (`"stream": false`)
//! - `/api/tags` - list models (used for health checks)
//!
//! The system prompt is sent in Ollama's dedicated `system` field rather
//! than being prepended to the prompt.

use std::time::{Duration, Instant};

use async_trait::async_trait;

use super::traits::{BackendConfig, BackendError, LlmBackend, LlmRequest, LlmResponse};

/// Ollama backend client
#[derive(Clone, Debug)]
pub struct OllamaBackend {
    /// Connection settings
    config: BackendConfig,
    /// HTTP client
    http_client: reqwest::Client,
}

impl OllamaBackend {
    /// Create a new Ollama backend
    pub fn new(config: BackendConfig) -> Result<Self, BackendError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| BackendError::Http(e.to_string()))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    /// Get generate endpoint URL
    fn generate_url(&self) -> String {
        format!("{}/api/generate", self.config.base_url())
    }

    /// Get tags endpoint URL
    fn tags_url(&self) -> String {
        format!("{}/api/tags", self.config.base_url())
    }

    /// Build the JSON body for a request
    fn build_payload(request: &LlmRequest) -> serde_json::Value {
        let mut options = serde_json::json!({
            "temperature": request.temperature,
            "num_ctx": request.num_ctx,
        });
        if request.max_tokens > 0 {
            options["num_predict"] = serde_json::json!(request.max_tokens);
        }

        serde_json::json!({
            "model": request.model,
            "prompt": request.prompt,
            "system": request.system.as_deref().unwrap_or(""),
            "stream": false,
            "options": options,
        })
    }

    /// Classify a reqwest failure
    fn map_error(&self, error: &reqwest::Error) -> BackendError {
        if error.is_connect() {
            BackendError::Connect {
                url: self.config.base_url(),
            }
        } else if error.is_timeout() {
            BackendError::Timeout {
                timeout: self.config.timeout,
            }
        } else if error.is_decode() {
            BackendError::Decode(error.to_string())
        } else {
            BackendError::Http(error.to_string())
        }
    }

    /// Pull the completion out of a generate response
    fn parse_response(data: &serde_json::Value, model: &str, duration_ms: u64) -> LlmResponse {
        let content = data
            .get("response")
            .and_then(|r| r.as_str())
            .unwrap_or("")
            .trim()
            .to_string();

        let tokens_used = data
            .get("eval_count")
            .and_then(serde_json::Value::as_u64)
            .and_then(|c| u32::try_from(c).ok());

        LlmResponse {
            content,
            model: model.to_string(),
            tokens_used,
            duration_ms: Some(duration_ms),
        }
    }
}

#[async_trait]
impl LlmBackend for OllamaBackend {
    fn name(&self) -> &str {
        "Ollama"
    }

    fn base_url(&self) -> String {
        self.config.base_url()
    }

    async fn health_check(&self) -> bool {
        self.http_client
            .get(self.tags_url())
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .is_ok_and(|r| r.status().is_success())
    }

    async fn send(&self, request: &LlmRequest) -> Result<LlmResponse, BackendError> {
        let start = Instant::now();
        let url = self.generate_url();
        let payload = Self::build_payload(request);

        tracing::debug!(url = %url, model = %request.model, "Sending generate request");

        let response = self
            .http_client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| self.map_error(&e))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Status { status, body });
        }

        let data: serde_json::Value = response.json().await.map_err(|e| self.map_error(&e))?;
        let elapsed = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        Ok(Self::parse_response(&data, &request.model, elapsed))
    }
}
