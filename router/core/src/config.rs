//! TOML Configuration File Support
//!
//! Centralized configuration loading for the router, backed by a TOML file
//! at `~/.config/expert-router/router.toml`.
//!
//! # Configuration Priority
//!
//! Configuration values are loaded with the following priority (highest first):
//! 1. CLI arguments (applied by the caller through [`ConfigOverrides`])
//! 2. Environment variables
//! 3. TOML configuration file
//! 4. Default values
//!
//! # Example Configuration
//!
//! ```toml
//! [backend]
//! host = "localhost"
//! port = 11434
//! timeout_secs = 30
//!
//! [router]
//! semantic_threshold = 0.45
//! fallback_expert = "professor"
//! fallback_confidence = 0.1
//! embedding_dim = 512
//!
//! [logging]
//! interaction_log = "data/logs/routing_events.jsonl"
//!
//! [[experts]]
//! id = "professor"
//! model_name = "llama3.2:3b"
//! system_prompt = "You are a rigorous professor."
//! keywords = ["def", "class", "import"]
//! examples = ["explain recursion"]
//! ```
//!
//! When any `[[experts]]` table is present, the file's experts replace the
//! built-in professor/zoomer pair entirely.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backend::{BackendConfig, ExpertProfile};
use crate::forensics::DEFAULT_LOG_PATH;
use crate::routing::{ExpertId, ExpertRoute, RouterConfig};

/// Environment variable: Ollama host
pub const ENV_OLLAMA_HOST: &str = "OLLAMA_HOST";
/// Environment variable: Ollama port
pub const ENV_OLLAMA_PORT: &str = "OLLAMA_PORT";
/// Environment variable: backend request timeout in seconds
pub const ENV_TIMEOUT_SECS: &str = "EXPERT_ROUTER_TIMEOUT_SECS";
/// Environment variable: semantic acceptance threshold
pub const ENV_SEMANTIC_THRESHOLD: &str = "EXPERT_ROUTER_SEMANTIC_THRESHOLD";
/// Environment variable: fallback expert id
pub const ENV_FALLBACK_EXPERT: &str = "EXPERT_ROUTER_FALLBACK_EXPERT";
/// Environment variable: interaction log path
pub const ENV_LOG_FILE: &str = "EXPERT_ROUTER_LOG_FILE";

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

// =============================================================================
// Configuration Source Tracking
// =============================================================================

/// Tracks where a configuration value came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Value from command-line argument
    Cli,
    /// Value from environment variable
    Env,
    /// Value from TOML configuration file
    File,
    /// Default value
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI"),
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

// =============================================================================
// TOML Configuration Structures
// =============================================================================

/// Backend section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendToml {
    /// Ollama host
    pub host: Option<String>,

    /// Ollama port
    pub port: Option<u16>,

    /// Per-request timeout in seconds
    pub timeout_secs: Option<u64>,
}

/// Router section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterToml {
    /// Minimum similarity for a semantic match
    pub semantic_threshold: Option<f64>,

    /// Expert used when no stage matches
    pub fallback_expert: Option<String>,

    /// Confidence reported for fallback decisions
    pub fallback_confidence: Option<f64>,

    /// Hashing embedder dimension
    pub embedding_dim: Option<usize>,
}

/// Logging section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingToml {
    /// Interaction log path
    pub interaction_log: Option<PathBuf>,
}

/// One `[[experts]]` entry
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpertToml {
    /// Expert identifier
    pub id: String,

    /// Backend model; dispatch reports an error when missing
    pub model_name: Option<String>,

    /// Persona sent as the system prompt
    pub system_prompt: Option<String>,

    /// Keyword vocabulary for the fast path
    pub keywords: Vec<String>,

    /// Raw regex overriding the keywords
    pub pattern: Option<String>,

    /// Example utterances for the semantic stage
    pub examples: Vec<String>,
}

/// Top-level TOML configuration structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigToml {
    /// Backend configuration section
    pub backend: BackendToml,

    /// Routing configuration section
    pub router: RouterToml,

    /// Interaction log section
    pub logging: LoggingToml,

    /// Expert definitions
    pub experts: Vec<ExpertToml>,
}

// =============================================================================
// Main Configuration Struct
// =============================================================================

/// Resolved application configuration
///
/// Consolidates every source and records where values came from. Use
/// [`load_config_from_path`] to load with proper priority handling.
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Ollama connection settings
    pub backend: BackendConfig,

    /// Expert routes and cascade parameters
    pub router: RouterConfig,

    /// Model and persona per expert, in declaration order
    pub profiles: Vec<(ExpertId, ExpertProfile)>,

    /// Interaction log location
    pub interaction_log: PathBuf,

    /// Path to the config file that was loaded (if any)
    pub config_file_path: Option<PathBuf>,

    /// Source of configuration values
    source: ConfigSource,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            router: RouterConfig::reference(),
            profiles: reference_profiles(),
            interaction_log: PathBuf::from(DEFAULT_LOG_PATH),
            config_file_path: None,
            source: ConfigSource::Default,
        }
    }
}

impl AppConfig {
    /// Get the primary source of this configuration
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }

    /// Profile for an expert
    #[must_use]
    pub fn profile(&self, expert: &str) -> Option<&ExpertProfile> {
        self.profiles
            .iter()
            .find(|(id, _)| id.as_str() == expert)
            .map(|(_, profile)| profile)
    }

    /// Check the resolved configuration
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] for an invalid router setup,
    /// a zero port or a zero timeout.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.router
            .validate()
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;

        if self.backend.port == 0 {
            return Err(ConfigError::ValidationError(
                "backend port must be non-zero".to_string(),
            ));
        }
        if self.backend.timeout.is_zero() {
            return Err(ConfigError::ValidationError(
                "backend timeout must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Model and persona for the built-in experts
#[must_use]
pub fn reference_profiles() -> Vec<(ExpertId, ExpertProfile)> {
    vec![
        (
            ExpertId::from("professor"),
            ExpertProfile::new(
                "llama3.2:3b",
                "You are a rigorous professor. Answer precisely, show your reasoning, \
                 and prefer correct terminology over casual phrasing.",
            ),
        ),
        (
            ExpertId::from("zoomer"),
            ExpertProfile::new(
                "qwen2.5:1.5b",
                "You are a laid-back friend who talks casually. Keep answers short, \
                 warm and fun.",
            ),
        ),
    ]
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Get the default configuration file path
///
/// Returns `$XDG_CONFIG_HOME/expert-router/router.toml` or
/// `~/.config/expert-router/router.toml` if `XDG_CONFIG_HOME` is not set.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("expert-router").join("router.toml"))
}

/// Load configuration from a specific path, reading the process environment
///
/// # Errors
///
/// Returns an error if the specified config file cannot be read or parsed.
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<AppConfig, ConfigError> {
    load_config_with_env(path, |key| std::env::var(key).ok())
}

/// Load configuration with a custom environment lookup
///
/// # Errors
///
/// Returns an error if the specified config file cannot be read or parsed.
pub fn load_config_with_env(
    path: Option<PathBuf>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<AppConfig, ConfigError> {
    let mut config = AppConfig::default();

    if let Some(ref config_path) = path {
        if config_path.exists() {
            let toml_content =
                std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
                    path: config_path.clone(),
                    source: e,
                })?;

            let toml_config: ConfigToml = toml::from_str(&toml_content)?;
            apply_toml_config(&mut config, toml_config);
            config.config_file_path = Some(config_path.clone());
            config.source = ConfigSource::File;

            tracing::info!(
                path = %config_path.display(),
                experts = config.router.experts.len(),
                "Loaded configuration from file"
            );
        } else {
            tracing::debug!(
                path = %config_path.display(),
                "Config file not found, using defaults"
            );
        }
    }

    apply_env_config(&mut config, env);

    Ok(config)
}

/// Apply TOML configuration values to the config struct
fn apply_toml_config(config: &mut AppConfig, toml: ConfigToml) {
    // Backend settings
    if let Some(host) = toml.backend.host {
        config.backend.host = host;
    }
    if let Some(port) = toml.backend.port {
        config.backend.port = port;
    }
    if let Some(secs) = toml.backend.timeout_secs {
        config.backend.timeout = Duration::from_secs(secs);
    }

    // Experts replace the built-in set wholesale
    if !toml.experts.is_empty() {
        config.router.experts = toml.experts.iter().map(route_from_toml).collect();
        config.profiles = toml
            .experts
            .into_iter()
            .map(|e| {
                let profile = ExpertProfile::new(
                    e.model_name.unwrap_or_default(),
                    e.system_prompt.unwrap_or_default(),
                );
                (ExpertId::from(e.id), profile)
            })
            .collect();
    }

    // Router settings
    if let Some(threshold) = toml.router.semantic_threshold {
        config.router.semantic_threshold = threshold;
    }
    if let Some(fallback) = toml.router.fallback_expert {
        config.router.fallback_expert = ExpertId::from(fallback);
    }
    if let Some(confidence) = toml.router.fallback_confidence {
        config.router.fallback_confidence = confidence;
    }
    if let Some(dim) = toml.router.embedding_dim {
        config.router.embedding_dim = dim;
    }

    // Logging settings
    if let Some(path) = toml.logging.interaction_log {
        config.interaction_log = path;
    }
}

fn route_from_toml(expert: &ExpertToml) -> ExpertRoute {
    let mut route = ExpertRoute::new(expert.id.as_str())
        .with_keywords(expert.keywords.iter().cloned())
        .with_examples(expert.examples.iter().cloned());
    if let Some(ref pattern) = expert.pattern {
        route = route.with_pattern(pattern.as_str());
    }
    route
}

/// Apply environment variable overrides to the config
fn apply_env_config(config: &mut AppConfig, env: impl Fn(&str) -> Option<String>) {
    if let Some(host) = env(ENV_OLLAMA_HOST) {
        config.backend.host = host;
        config.source = ConfigSource::Env;
    }
    if let Some(port) = env(ENV_OLLAMA_PORT) {
        if let Ok(p) = port.parse::<u16>() {
            config.backend.port = p;
            config.source = ConfigSource::Env;
        } else {
            tracing::warn!(value = %port, "Ignoring invalid {ENV_OLLAMA_PORT}");
        }
    }
    if let Some(timeout) = env(ENV_TIMEOUT_SECS) {
        if let Ok(secs) = timeout.parse::<u64>() {
            config.backend.timeout = Duration::from_secs(secs);
            config.source = ConfigSource::Env;
        } else {
            tracing::warn!(value = %timeout, "Ignoring invalid {ENV_TIMEOUT_SECS}");
        }
    }
    if let Some(threshold) = env(ENV_SEMANTIC_THRESHOLD) {
        if let Ok(t) = threshold.parse::<f64>() {
            config.router.semantic_threshold = t;
            config.source = ConfigSource::Env;
        } else {
            tracing::warn!(value = %threshold, "Ignoring invalid {ENV_SEMANTIC_THRESHOLD}");
        }
    }
    if let Some(fallback) = env(ENV_FALLBACK_EXPERT) {
        config.router.fallback_expert = ExpertId::from(fallback);
        config.source = ConfigSource::Env;
    }
    if let Some(path) = env(ENV_LOG_FILE) {
        config.interaction_log = PathBuf::from(path);
        config.source = ConfigSource::Env;
    }
}

// =============================================================================
// CLI Override Support
// =============================================================================

/// Builder for applying CLI overrides to configuration
///
/// Use this after [`load_config_from_path`] to apply command-line argument overrides.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    /// Ollama host override
    pub host: Option<String>,

    /// Ollama port override
    pub port: Option<u16>,

    /// Semantic threshold override
    pub semantic_threshold: Option<f64>,

    /// Fallback expert override
    pub fallback_expert: Option<String>,

    /// Interaction log override
    pub interaction_log: Option<PathBuf>,
}

impl ConfigOverrides {
    /// Create a new empty set of overrides
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set host override
    #[must_use]
    pub fn with_host(mut self, host: String) -> Self {
        self.host = Some(host);
        self
    }

    /// Set port override
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set semantic threshold override
    #[must_use]
    pub fn with_semantic_threshold(mut self, threshold: f64) -> Self {
        self.semantic_threshold = Some(threshold);
        self
    }

    /// Set fallback expert override
    #[must_use]
    pub fn with_fallback_expert(mut self, expert: String) -> Self {
        self.fallback_expert = Some(expert);
        self
    }

    /// Set interaction log override
    #[must_use]
    pub fn with_interaction_log(mut self, path: PathBuf) -> Self {
        self.interaction_log = Some(path);
        self
    }

    /// Apply overrides to a configuration
    pub fn apply(&self, config: &mut AppConfig) {
        if self.host.is_some()
            || self.port.is_some()
            || self.semantic_threshold.is_some()
            || self.fallback_expert.is_some()
            || self.interaction_log.is_some()
        {
            config.source = ConfigSource::Cli;
        }

        if let Some(ref host) = self.host {
            config.backend.host = host.clone();
        }
        if let Some(port) = self.port {
            config.backend.port = port;
        }
        if let Some(threshold) = self.semantic_threshold {
            config.router.semantic_threshold = threshold;
        }
        if let Some(ref expert) = self.fallback_expert {
            config.router.fallback_expert = ExpertId::from(expert.as_str());
        }
        if let Some(ref path) = self.interaction_log {
            config.interaction_log = path.clone();
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn write_toml(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    // =========================================================================
    // Default Configuration Tests
    // =========================================================================

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();

        assert_eq!(config.backend.base_url(), "http://localhost:11434");
        assert_eq!(config.backend.timeout, Duration::from_secs(30));
        assert_eq!(config.router.fallback_expert.as_str(), "professor");
        assert!((config.router.semantic_threshold - 0.45).abs() < f64::EPSILON);
        assert_eq!(config.interaction_log, PathBuf::from("data/logs/routing_events.jsonl"));
        assert_eq!(config.profile("professor").unwrap().model_name, "llama3.2:3b");
        assert_eq!(config.profile("zoomer").unwrap().model_name, "qwen2.5:1.5b");
        assert_eq!(config.source(), ConfigSource::Default);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_config_path() {
        if let Some(p) = default_config_path() {
            assert!(p.to_string_lossy().contains("expert-router"));
            assert!(p.to_string_lossy().ends_with("router.toml"));
        }
    }

    // =========================================================================
    // TOML Parsing Tests
    // =========================================================================

    #[test]
    fn test_parse_sections() {
        let file = write_toml(
            r#"
[backend]
host = "gpu-box"
port = 8080
timeout_secs = 90

[router]
semantic_threshold = 0.6
fallback_confidence = 0.2

[logging]
interaction_log = "/var/log/router/events.jsonl"
"#,
        );

        let config = load_config_with_env(Some(file.path().to_path_buf()), no_env).unwrap();
        assert_eq!(config.backend.base_url(), "http://gpu-box:8080");
        assert_eq!(config.backend.timeout, Duration::from_secs(90));
        assert!((config.router.semantic_threshold - 0.6).abs() < f64::EPSILON);
        assert!((config.router.fallback_confidence - 0.2).abs() < f64::EPSILON);
        assert_eq!(config.router.experts.len(), 2);
        assert_eq!(
            config.interaction_log,
            PathBuf::from("/var/log/router/events.jsonl")
        );
        assert_eq!(config.source(), ConfigSource::File);
        assert_eq!(config.config_file_path.as_deref(), Some(file.path()));
    }

    #[test]
    fn test_experts_replace_reference_set() {
        let file = write_toml(
            r#"
[router]
fallback_expert = "chef"

[[experts]]
id = "chef"
model_name = "mistral:7b"
system_prompt = "You are a chef."
keywords = ["recipe", "bake"]
examples = ["how do I make bread"]

[[experts]]
id = "lawyer"
pattern = "\\b(contract|tort)s?\\b"
examples = ["is this agreement enforceable"]
"#,
        );

        let config = load_config_with_env(Some(file.path().to_path_buf()), no_env).unwrap();
        let ids: Vec<&str> = config.router.expert_ids().map(ExpertId::as_str).collect();
        assert_eq!(ids, vec!["chef", "lawyer"]);
        assert_eq!(config.router.expert("lawyer").unwrap().pattern.as_deref(), Some("\\b(contract|tort)s?\\b"));
        assert_eq!(config.profile("chef").unwrap().model_name, "mistral:7b");
        assert!(config.profile("lawyer").unwrap().model_name.is_empty());
        assert!(config.profile("professor").is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_toml_is_error() {
        let file = write_toml("[backend\nport = ");
        let result = load_config_with_env(Some(file.path().to_path_buf()), no_env);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config =
            load_config_with_env(Some(PathBuf::from("/nonexistent/router.toml")), no_env).unwrap();
        assert_eq!(config.source(), ConfigSource::Default);
        assert!(config.config_file_path.is_none());
    }

    // =========================================================================
    // Priority Tests
    // =========================================================================

    #[test]
    fn test_env_overrides_file() {
        let file = write_toml("[backend]\nhost = \"file-host\"\nport = 1111\n");
        let env = env_from(&[
            ("OLLAMA_HOST", "env-host"),
            ("EXPERT_ROUTER_SEMANTIC_THRESHOLD", "0.3"),
            ("EXPERT_ROUTER_FALLBACK_EXPERT", "zoomer"),
            ("EXPERT_ROUTER_LOG_FILE", "/tmp/events.jsonl"),
            ("EXPERT_ROUTER_TIMEOUT_SECS", "5"),
        ]);

        let config = load_config_with_env(Some(file.path().to_path_buf()), env).unwrap();
        assert_eq!(config.backend.host, "env-host");
        assert_eq!(config.backend.port, 1111);
        assert_eq!(config.backend.timeout, Duration::from_secs(5));
        assert!((config.router.semantic_threshold - 0.3).abs() < f64::EPSILON);
        assert_eq!(config.router.fallback_expert.as_str(), "zoomer");
        assert_eq!(config.interaction_log, PathBuf::from("/tmp/events.jsonl"));
        assert_eq!(config.source(), ConfigSource::Env);
    }

    #[test]
    fn test_invalid_env_values_are_ignored() {
        let env = env_from(&[
            ("OLLAMA_PORT", "not-a-port"),
            ("EXPERT_ROUTER_SEMANTIC_THRESHOLD", "high"),
            ("EXPERT_ROUTER_TIMEOUT_SECS", "soon"),
        ]);
        let config = load_config_with_env(None, env).unwrap();
        assert_eq!(config.backend.port, 11434);
        assert_eq!(config.backend.timeout, Duration::from_secs(30));
        assert!((config.router.semantic_threshold - 0.45).abs() < f64::EPSILON);
        assert_eq!(config.source(), ConfigSource::Default);
    }

    #[test]
    fn test_cli_overrides_env() {
        let env = env_from(&[("OLLAMA_PORT", "2222")]);
        let mut config = load_config_with_env(None, env).unwrap();

        ConfigOverrides::new()
            .with_port(3333)
            .with_semantic_threshold(0.5)
            .with_fallback_expert("zoomer".to_string())
            .apply(&mut config);

        assert_eq!(config.backend.port, 3333);
        assert!((config.router.semantic_threshold - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.router.fallback_expert.as_str(), "zoomer");
        assert_eq!(config.source(), ConfigSource::Cli);
    }

    #[test]
    fn test_empty_overrides_keep_source() {
        let mut config = AppConfig::default();
        ConfigOverrides::new().apply(&mut config);
        assert_eq!(config.source(), ConfigSource::Default);
    }

    // =========================================================================
    // Validation Tests
    // =========================================================================

    #[test]
    fn test_validate_rejects_unknown_fallback() {
        let mut config = AppConfig::default();
        ConfigOverrides::new()
            .with_fallback_expert("pirate".to_string())
            .apply(&mut config);
        assert!(matches!(config.validate(), Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = AppConfig::default();
        config.backend.timeout = Duration::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_source_display() {
        assert_eq!(ConfigSource::Cli.to_string(), "CLI");
        assert_eq!(ConfigSource::Env.to_string(), "environment");
        assert_eq!(ConfigSource::File.to_string(), "config file");
        assert_eq!(ConfigSource::Default.to_string(), "default");
    }
}
