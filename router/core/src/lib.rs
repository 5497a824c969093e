//! Router Core - Cascading Expert Routing for Local LLMs
//!
//! This crate decides which downstream expert (a persona backed by a local
//! model) should answer a user query, then optionally dispatches the query
//! and records the user's verdict for offline preference training.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         expert-router CLI                     │
//! └───────────────┬───────────────────────┬──────────────────────┘
//!                 │ query                 │ feedback
//!                 ▼                       ▼
//! ┌──────────────────────────────┐  ┌────────────────────────────┐
//! │           routing            │  │         forensics          │
//! │  ┌────────┐   ┌──────────┐   │  │  InteractionLogger (JSONL) │
//! │  │Keyword │──►│ Semantic │   │  │  export_preference_pairs   │
//! │  └────────┘   └────┬─────┘   │  │  run_benchmark             │
//! │       fallback ◄───┘         │  └────────────────────────────┘
//! └───────────────┬──────────────┘
//!                 │ RoutingDecision
//!                 ▼
//! ┌──────────────────────────────┐
//! │           backend            │
//! │  ExpertDispatcher ─► Ollama  │
//! └──────────────────────────────┘
//! ```
//!
//! # Key Types
//!
//! - [`CascadingRouter`]: keyword fast path, semantic slow path, fallback expert
//! - [`RoutingDecision`]: expert, confidence, latency and the deciding stage
//! - [`ExpertDispatcher`]: maps experts to models and never fails
//! - [`InteractionLogger`]: append-only interaction log
//! - [`AppConfig`]: layered TOML / environment / CLI configuration
//!
//! # Quick Start
//!
//! ```ignore
//! use router_core::{CascadingRouter, RouterConfig};
//!
//! let router = CascadingRouter::with_hashing_embedder(&RouterConfig::reference())?;
//! let decision = router.route("import numpy as np")?;
//! assert_eq!(decision.expert.as_str(), "professor");
//! ```
//!
//! # Module Overview
//!
//! - [`routing`]: pure, synchronous routing core (no I/O, no logging)
//! - [`backend`]: LLM backend abstraction and expert dispatch
//! - [`forensics`]: interaction log, preference export, benchmarks
//! - [`config`]: configuration file, environment and CLI overrides

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_precision_loss)]

pub mod backend;
pub mod config;
pub mod forensics;
pub mod routing;

// Routing exports
pub use routing::{
    CascadingRouter, Decision, Embedder, ExpertId, ExpertRoute, HashingEmbedder, KeywordMatcher,
    RouterConfig, RouterError, RoutingDecision, RoutingStrategy, SemanticMatcher, Stage, Timed,
};

// Backend exports
pub use backend::{
    BackendConfig, BackendError, ExpertDispatcher, ExpertProfile, LlmBackend, LlmRequest,
    LlmResponse, OllamaBackend,
};

// Forensics exports
pub use forensics::{
    export_preference_pairs, run_benchmark, BenchmarkReport, ExportError, Feedback,
    InteractionLogger, InteractionRecord, LogError,
};

// Config exports
pub use config::{
    default_config_path, load_config_from_path, AppConfig, ConfigError,
    ConfigOverrides, ConfigSource,
};
