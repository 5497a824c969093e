//! Subcommand implementations
//!
//! Each command takes the resolved [`AppConfig`] and writes its result to
//! stdout; diagnostics go through `tracing` to stderr.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use router_core::backend::is_error_sentinel;
use router_core::forensics::{reference_cases, render_markdown};
use router_core::{
    export_preference_pairs, run_benchmark, AppConfig, CascadingRouter, ExpertDispatcher,
    Feedback, HashingEmbedder, InteractionLogger, KeywordMatcher, OllamaBackend, RoutingDecision,
    RoutingStrategy, SemanticMatcher,
};

/// Build the cascade described by the configuration
pub fn build_router(config: &AppConfig) -> Result<CascadingRouter> {
    CascadingRouter::with_hashing_embedder(&config.router).context("Failed to build router")
}

/// One-line human summary of a decision
pub fn format_decision(decision: &RoutingDecision) -> String {
    format!(
        "{} (confidence {:.3}, {} stage, {:.3} ms)",
        decision.expert, decision.confidence, decision.stage, decision.latency_ms
    )
}

/// `route`: print the routing decision for a query
pub fn route(config: &AppConfig, query: &str, json: bool) -> Result<()> {
    let router = build_router(config)?;
    let decision = router.route(query).context("Routing failed")?;

    info!(
        expert = %decision.expert,
        stage = %decision.stage,
        confidence = decision.confidence,
        latency_ms = decision.latency_ms,
        "Routed query"
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&decision)?);
    } else {
        println!("{}", format_decision(&decision));
    }
    Ok(())
}

/// `ask`: route, dispatch to the expert's model, optionally record feedback
pub async fn ask(config: &AppConfig, query: &str, feedback: Option<Feedback>) -> Result<()> {
    let router = build_router(config)?;
    let decision = router.route(query).context("Routing failed")?;
    info!(decision = %format_decision(&decision), "Routed query");

    let backend = OllamaBackend::new(config.backend.clone()).context("Failed to create backend")?;
    let dispatcher =
        ExpertDispatcher::new(Arc::new(backend)).with_profiles(config.profiles.iter().cloned());

    if !dispatcher.backend().health_check().await {
        warn!(url = %dispatcher.backend().base_url(), "Backend health check failed");
    }

    let response = dispatcher.dispatch(&decision.expert, query).await;
    println!("[{}] {}", decision.expert, response);

    let Some(feedback) = feedback else {
        return Ok(());
    };

    if is_error_sentinel(&response) {
        warn!("Not recording feedback for a failed response");
        return Ok(());
    }

    let logger = InteractionLogger::open(config.interaction_log.clone())
        .await
        .context("Failed to open interaction log")?;
    let record = logger
        .log_interaction(
            query,
            decision.expert.as_str(),
            &response,
            feedback,
            decision.latency_ms,
        )
        .await
        .context("Failed to record interaction")?;

    info!(id = %record.id, path = %logger.path().display(), "Feedback recorded");
    Ok(())
}

/// `export-dpo`: convert the interaction log into preference pairs
pub async fn export_dpo(config: &AppConfig, input: Option<PathBuf>, output: PathBuf) -> Result<()> {
    let input = input.unwrap_or_else(|| config.interaction_log.clone());
    let count = export_preference_pairs(&input, &output)
        .await
        .with_context(|| format!("Failed to export preference pairs to {}", output.display()))?;

    println!("Exported {count} preference pairs to {}", output.display());
    Ok(())
}

/// `benchmark`: compare the strategies on the reference cases
pub fn benchmark(config: &AppConfig, json: bool) -> Result<()> {
    config.router.validate().context("Invalid router configuration")?;

    let embedder = Arc::new(
        HashingEmbedder::new(config.router.embedding_dim).context("Failed to create embedder")?,
    );
    let keyword = KeywordMatcher::new(&config.router.experts)?;
    let semantic = SemanticMatcher::new(embedder.clone(), &config.router.experts)?
        .with_threshold(config.router.semantic_threshold);
    let cascade = CascadingRouter::from_config(&config.router, embedder)?;

    let strategies: [&dyn RoutingStrategy; 3] = [&keyword, &semantic, &cascade];
    let reports = run_benchmark(&strategies, &reference_cases());

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        print!("{}", render_markdown(&reports));
    }
    Ok(())
}
