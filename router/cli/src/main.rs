//! Expert Router - Command-line front end
//!
//! Routes queries between local expert models, talks to Ollama, and manages
//! the feedback data flywheel.
//!
//! # Usage
//!
//! ```bash
//! # Which expert would answer?
//! expert-router route "import numpy as np"
//! expert-router route --json "help me structure my backend services"
//!
//! # Ask and record a thumbs up
//! expert-router ask --feedback like "explain monads"
//!
//! # Turn recorded feedback into preference pairs
//! expert-router export-dpo --output data/training/dpo_pairs.jsonl
//!
//! # Compare routing strategies
//! expert-router benchmark
//!
//! # Verbose logging
//! RUST_LOG=debug expert-router route "yo"
//! ```

mod commands;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};

use router_core::{default_config_path, load_config_from_path, ConfigOverrides, Feedback};

/// Expert Router - cascading keyword/semantic routing for local LLM experts
#[derive(Parser, Debug)]
#[command(name = "expert-router")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short = 'c', long, env = "EXPERT_ROUTER_CONFIG", value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(
        short = 'l',
        long,
        env = "EXPERT_ROUTER_LOG_LEVEL",
        default_value = "info",
        global = true
    )]
    log_level: String,

    /// Ollama host override
    #[arg(long, value_name = "HOST", global = true)]
    ollama_host: Option<String>,

    /// Ollama port override
    #[arg(long, value_name = "PORT", global = true)]
    ollama_port: Option<u16>,

    /// Semantic acceptance threshold override
    #[arg(long, value_name = "SCORE", global = true)]
    threshold: Option<f64>,

    /// Fallback expert override
    #[arg(long, value_name = "EXPERT", global = true)]
    fallback_expert: Option<String>,

    /// Interaction log path override
    #[arg(long, value_name = "FILE", global = true)]
    interaction_log: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

/// Subcommands
#[derive(Subcommand, Debug)]
enum Command {
    /// Print the routing decision for a query
    Route {
        /// Query text
        query: String,

        /// Print the decision as JSON
        #[arg(long)]
        json: bool,
    },

    /// Route a query, ask the chosen expert and print the answer
    Ask {
        /// Query text
        query: String,

        /// Record the answer with this verdict (like or dislike)
        #[arg(short = 'f', long, value_name = "VERDICT")]
        feedback: Option<Feedback>,
    },

    /// Export recorded feedback as preference pairs (JSONL)
    ExportDpo {
        /// Interaction log to read (defaults to the configured log)
        #[arg(short = 'i', long, value_name = "FILE")]
        input: Option<PathBuf>,

        /// Output file
        #[arg(short = 'o', long, value_name = "FILE")]
        output: PathBuf,
    },

    /// Compare keyword, semantic and cascading routing on labelled queries
    Benchmark {
        /// Print reports as JSON instead of a markdown table
        #[arg(long)]
        json: bool,
    },
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        let mut overrides = ConfigOverrides::new();
        if let Some(ref host) = self.ollama_host {
            overrides = overrides.with_host(host.clone());
        }
        if let Some(port) = self.ollama_port {
            overrides = overrides.with_port(port);
        }
        if let Some(threshold) = self.threshold {
            overrides = overrides.with_semantic_threshold(threshold);
        }
        if let Some(ref expert) = self.fallback_expert {
            overrides = overrides.with_fallback_expert(expert.clone());
        }
        if let Some(ref path) = self.interaction_log {
            overrides = overrides.with_interaction_log(path.clone());
        }
        overrides
    }
}

/// Initialize logging with the specified level
fn init_logging(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!("expert_router={level},router_core={level}"))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level);

    debug!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config_path = args.config.clone().or_else(default_config_path);
    let mut config = load_config_from_path(config_path).context("Failed to load configuration")?;
    args.overrides().apply(&mut config);
    config.validate().context("Invalid configuration")?;

    info!(
        source = %config.source(),
        backend = %config.backend.base_url(),
        experts = config.router.experts.len(),
        "Configuration resolved"
    );

    match args.command {
        Command::Route { query, json } => commands::route(&config, &query, json),
        Command::Ask { query, feedback } => commands::ask(&config, &query, feedback).await,
        Command::ExportDpo { input, output } => commands::export_dpo(&config, input, output).await,
        Command::Benchmark { json } => commands::benchmark(&config, json),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_route() {
        let args = Args::try_parse_from(["expert-router", "route", "--json", "yo bruh"]).unwrap();
        assert!(matches!(
            args.command,
            Command::Route { ref query, json: true } if query == "yo bruh"
        ));
    }

    #[test]
    fn test_parse_ask_with_feedback() {
        let args =
            Args::try_parse_from(["expert-router", "ask", "--feedback", "dislike", "hi"]).unwrap();
        assert!(matches!(
            args.command,
            Command::Ask {
                feedback: Some(Feedback::Dislike),
                ..
            }
        ));
    }

    #[test]
    fn test_parse_rejects_unknown_feedback() {
        let result = Args::try_parse_from(["expert-router", "ask", "--feedback", "meh", "hi"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_export_requires_output() {
        assert!(Args::try_parse_from(["expert-router", "export-dpo"]).is_err());
        let args =
            Args::try_parse_from(["expert-router", "export-dpo", "-o", "pairs.jsonl"]).unwrap();
        assert!(matches!(args.command, Command::ExportDpo { input: None, .. }));
    }

    #[test]
    fn test_global_overrides() {
        let args = Args::try_parse_from([
            "expert-router",
            "route",
            "q",
            "--threshold",
            "0.6",
            "--fallback-expert",
            "zoomer",
        ])
        .unwrap();
        let overrides = args.overrides();
        assert_eq!(overrides.semantic_threshold, Some(0.6));
        assert_eq!(overrides.fallback_expert.as_deref(), Some("zoomer"));
        assert!(overrides.host.is_none());
    }
}
