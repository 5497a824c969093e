//! Expert Dispatch
//!
//! Sends a routed query to the model behind an expert. Dispatch never
//! fails: configuration gaps and transport failures come back as
//! human-readable sentinel strings so a chat front end can show them
//! verbatim.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::traits::{BackendError, LlmBackend, LlmRequest};
use crate::routing::ExpertId;

/// Returned when no profile exists for the expert
pub const NO_EXPERT_CONFIG: &str = "Error: No expert configuration provided.";

/// Opening of the message returned when an expert has no model
const NO_MODEL_PREFIX: &str = "Error: No model mapped for expert '";

/// Prefix shared by every transport failure message
pub const SYSTEM_ERROR_PREFIX: &str = "[System Error]:";

/// Model and persona behind an expert
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpertProfile {
    /// Backend model identifier (e.g. `llama3.2:3b`)
    #[serde(default)]
    pub model_name: String,
    /// System prompt sent with every query
    #[serde(default)]
    pub system_prompt: String,
}

impl ExpertProfile {
    /// Create a profile
    pub fn new(model_name: impl Into<String>, system_prompt: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
            system_prompt: system_prompt.into(),
        }
    }
}

/// Maps experts to models and forwards queries to a backend
pub struct ExpertDispatcher {
    backend: Arc<dyn LlmBackend>,
    profiles: HashMap<ExpertId, ExpertProfile>,
}

impl ExpertDispatcher {
    /// Create a dispatcher over a backend
    pub fn new(backend: Arc<dyn LlmBackend>) -> Self {
        Self {
            backend,
            profiles: HashMap::new(),
        }
    }

    /// Register (or replace) an expert profile
    #[must_use]
    pub fn with_profile(mut self, expert: impl Into<ExpertId>, profile: ExpertProfile) -> Self {
        self.profiles.insert(expert.into(), profile);
        self
    }

    /// Register several profiles at once
    #[must_use]
    pub fn with_profiles(
        mut self,
        profiles: impl IntoIterator<Item = (ExpertId, ExpertProfile)>,
    ) -> Self {
        self.profiles.extend(profiles);
        self
    }

    /// Profile for an expert, if registered
    #[must_use]
    pub fn profile(&self, expert: &ExpertId) -> Option<&ExpertProfile> {
        self.profiles.get(expert)
    }

    /// Backend in use
    #[must_use]
    pub fn backend(&self) -> &Arc<dyn LlmBackend> {
        &self.backend
    }

    /// Generate the expert's answer to a query
    pub async fn dispatch(&self, expert: &ExpertId, query: &str) -> String {
        let Some(profile) = self.profiles.get(expert) else {
            tracing::warn!(expert = %expert, "No profile registered for expert");
            return NO_EXPERT_CONFIG.to_string();
        };

        if profile.model_name.is_empty() {
            tracing::warn!(expert = %expert, "Expert profile has no model");
            return format!("{NO_MODEL_PREFIX}{expert}'");
        }

        let mut request = LlmRequest::new(query, profile.model_name.as_str());
        if !profile.system_prompt.is_empty() {
            request = request.with_system(profile.system_prompt.as_str());
        }

        tracing::debug!(
            expert = %expert,
            model = %profile.model_name,
            backend = self.backend.name(),
            "Dispatching query"
        );

        match self.backend.send(&request).await {
            Ok(response) => {
                tracing::debug!(
                    expert = %expert,
                    duration_ms = ?response.duration_ms,
                    tokens = ?response.tokens_used,
                    "Expert responded"
                );
                response.content
            }
            Err(e) => {
                tracing::error!(expert = %expert, error = %e, "Dispatch failed");
                Self::describe_failure(&e)
            }
        }
    }

    fn describe_failure(error: &BackendError) -> String {
        match error {
            BackendError::Connect { url } => format!(
                "{SYSTEM_ERROR_PREFIX} Could not connect to Ollama at {url}. Is 'ollama serve' running?"
            ),
            BackendError::Timeout { timeout } => format!(
                "{SYSTEM_ERROR_PREFIX} Inference timed out after {}s.",
                timeout.as_secs()
            ),
            other => format!("{SYSTEM_ERROR_PREFIX} {other}"),
        }
    }
}

impl std::fmt::Debug for ExpertDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpertDispatcher")
            .field("backend", &self.backend.name())
            .field("profiles", &self.profiles)
            .finish()
    }
}

/// Whether a dispatch result is a failure sentinel rather than model output
#[must_use]
pub fn is_error_sentinel(text: &str) -> bool {
    if text.starts_with(SYSTEM_ERROR_PREFIX) || text == NO_EXPERT_CONFIG {
        return true;
    }
    text.strip_prefix(NO_MODEL_PREFIX)
        .and_then(|rest| rest.strip_suffix('\''))
        .is_some_and(|expert| !expert.is_empty() && !expert.contains('\n'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::traits::LlmResponse;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Backend double that records requests and replays a canned outcome
    struct MockBackend {
        outcome: fn() -> Result<LlmResponse, BackendError>,
        seen: Mutex<Vec<LlmRequest>>,
    }

    impl MockBackend {
        fn new(outcome: fn() -> Result<LlmResponse, BackendError>) -> Arc<Self> {
            Arc::new(Self {
                outcome,
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl LlmBackend for MockBackend {
        fn name(&self) -> &str {
            "Mock"
        }

        fn base_url(&self) -> String {
            "http://localhost:11434".to_string()
        }

        async fn health_check(&self) -> bool {
            true
        }

        async fn send(&self, request: &LlmRequest) -> Result<LlmResponse, BackendError> {
            self.seen.lock().unwrap().push(request.clone());
            (self.outcome)()
        }
    }

    fn answer() -> Result<LlmResponse, BackendError> {
        Ok(LlmResponse {
            content: "Recursion is a function calling itself.".to_string(),
            model: "llama3.2:3b".to_string(),
            tokens_used: Some(8),
            duration_ms: Some(12),
        })
    }

    fn professor() -> ExpertProfile {
        ExpertProfile::new("llama3.2:3b", "You are a rigorous professor.")
    }

    #[tokio::test]
    async fn test_dispatch_sends_model_and_system_prompt() {
        let backend = MockBackend::new(answer);
        let dispatcher = ExpertDispatcher::new(backend.clone()).with_profile("professor", professor());

        let text = dispatcher
            .dispatch(&ExpertId::from("professor"), "explain recursion")
            .await;
        assert_eq!(text, "Recursion is a function calling itself.");

        let seen = backend.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].model, "llama3.2:3b");
        assert_eq!(seen[0].prompt, "explain recursion");
        assert_eq!(seen[0].system.as_deref(), Some("You are a rigorous professor."));
    }

    #[tokio::test]
    async fn test_unknown_expert_returns_sentinel_without_sending() {
        let backend = MockBackend::new(answer);
        let dispatcher = ExpertDispatcher::new(backend.clone());

        let text = dispatcher.dispatch(&ExpertId::from("pirate"), "ahoy").await;
        assert_eq!(text, "Error: No expert configuration provided.");
        assert!(backend.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_model_returns_sentinel() {
        let backend = MockBackend::new(answer);
        let dispatcher = ExpertDispatcher::new(backend.clone())
            .with_profile("zoomer", ExpertProfile::new("", "talk casually"));

        let text = dispatcher.dispatch(&ExpertId::from("zoomer"), "yo").await;
        assert_eq!(text, "Error: No model mapped for expert 'zoomer'");
        assert!(backend.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_connect_failure_message() {
        let backend = MockBackend::new(|| {
            Err(BackendError::Connect {
                url: "http://localhost:11434".to_string(),
            })
        });
        let dispatcher = ExpertDispatcher::new(backend).with_profile("professor", professor());

        let text = dispatcher.dispatch(&ExpertId::from("professor"), "q").await;
        assert_eq!(
            text,
            "[System Error]: Could not connect to Ollama at http://localhost:11434. Is 'ollama serve' running?"
        );
        assert!(is_error_sentinel(&text));
    }

    #[tokio::test]
    async fn test_timeout_message() {
        let backend = MockBackend::new(|| {
            Err(BackendError::Timeout {
                timeout: Duration::from_secs(30),
            })
        });
        let dispatcher = ExpertDispatcher::new(backend).with_profile("professor", professor());

        let text = dispatcher.dispatch(&ExpertId::from("professor"), "q").await;
        assert_eq!(text, "[System Error]: Inference timed out after 30s.");
    }

    #[tokio::test]
    async fn test_other_failures_carry_message() {
        let backend = MockBackend::new(|| {
            Err(BackendError::Status {
                status: 404,
                body: "model not found".to_string(),
            })
        });
        let dispatcher = ExpertDispatcher::new(backend).with_profile("professor", professor());

        let text = dispatcher.dispatch(&ExpertId::from("professor"), "q").await;
        assert_eq!(text, "[System Error]: Backend returned 404: model not found");
    }

    #[test]
    fn test_is_error_sentinel() {
        assert!(is_error_sentinel(NO_EXPERT_CONFIG));
        assert!(is_error_sentinel("Error: No model mapped for expert 'x'"));
        assert!(!is_error_sentinel("Error handling in Rust uses Result."));
    }

    #[test]
    fn test_answers_resembling_sentinels_are_not_failures() {
        assert!(!is_error_sentinel("Error: No such file or directory means the path is wrong."));
        assert!(!is_error_sentinel("Error: No expert configuration provided. Try again later."));
        assert!(!is_error_sentinel(
            "Error: No model mapped for expert 'x'\nThat message comes from the router."
        ));
    }

    #[tokio::test]
    async fn test_missing_model_sentinel_is_recognised() {
        let backend = MockBackend::new(answer);
        let dispatcher =
            ExpertDispatcher::new(backend).with_profile("zoomer", ExpertProfile::default());

        let text = dispatcher.dispatch(&ExpertId::from("zoomer"), "q").await;
        assert!(is_error_sentinel(&text));
    }

    #[test]
    fn test_profile_deserializes_with_defaults() {
        let profile: ExpertProfile = toml::from_str(r#"model_name = "qwen2.5:1.5b""#).unwrap();
        assert_eq!(profile.model_name, "qwen2.5:1.5b");
        assert!(profile.system_prompt.is_empty());
    }
}
