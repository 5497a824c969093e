//! LLM Backend Integration
//!
//! Turns a routing decision into an answer: [`ExpertDispatcher`] looks up the
//! expert's model and persona and forwards the query to an [`LlmBackend`].
//!
//! # Available Backends
//!
//! - **Ollama**: Local LLM server (default)
//!
//! # Usage
//!
//! ```ignore
//! use router_core::backend::{BackendConfig, ExpertDispatcher, ExpertProfile, OllamaBackend};
//!
//! let backend = OllamaBackend::new(BackendConfig::default())?;
//! let dispatcher = ExpertDispatcher::new(Arc::new(backend))
//!     .with_profile("professor", ExpertProfile::new("llama3.2:3b", "You are a professor."));
//! let answer = dispatcher.dispatch(&"professor".into(), "What is a monad?").await;
//! ```

mod dispatch;
mod ollama;
mod traits;

pub use dispatch::{
    is_error_sentinel, ExpertDispatcher, ExpertProfile, NO_EXPERT_CONFIG, SYSTEM_ERROR_PREFIX,
};
pub use ollama::OllamaBackend;
pub use traits::{
    BackendConfig, BackendError, LlmBackend, LlmRequest, LlmResponse, DEFAULT_NUM_CTX,
    DEFAULT_TEMPERATURE,
};
