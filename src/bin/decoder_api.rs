//! Decoder Cloud API Server
//!
//! REST API for policy analysis and Vulnerability Scoring.
//!
//! Usage:
//!   cargo run --bin decoder-api
//!
//! Environment:
//!   DECODER_PORT - Server port (default: 8080, PORT also honored)
//!   DECODER_HOST - Server host (default: 0.0.0.0)
//!   OLLAMA_URL   - Ollama base URL (default: http://localhost:11434)
//!   OLLAMA_MODEL - Extraction model (default: llama3)
//!   RUST_LOG     - Log level (default: info)

use policy_decoder::api::{create_router, handlers::AppState, start_cleanup_task};
use policy_decoder::utils::constants::{APP_NAME, APP_VERSION};
use policy_decoder::{DecoderConfig, TelemetryCollector};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    print_banner();

    let config = DecoderConfig::from_env();
    info!(
        ollama_url = %config.ollama_url,
        model = %config.ollama_model,
        "decoder configured"
    );

    // Initialize telemetry
    let telemetry = Arc::new(TelemetryCollector::new());
    let telemetry_for_shutdown = telemetry.clone();

    // Create app state
    let state = Arc::new(AppState::new(config, telemetry));

    // Start background cleanup task for rate limiter
    start_cleanup_task();
    info!("Background cleanup task started");

    // Create router
    let app = create_router(state);

    // Get server config from env. Cloud platforms inject PORT;
    // DECODER_PORT is the local-dev override.
    let host = std::env::var("DECODER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = std::env::var("PORT")
        .or_else(|_| std::env::var("DECODER_PORT"))
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;

    info!("{} API starting on http://{}", APP_NAME, addr);
    info!("");
    info!("Endpoints:");
    info!("  POST /v1/analyze/policy   - Full policy analysis (LLM + actuarial)");
    info!("  POST /v1/extract/clauses  - Clause extraction only");
    info!("  POST /v1/score/risk       - Actuarial pass on explicit terms");
    info!("  GET  /v1/stats            - Analysis statistics");
    info!("  GET  /v1/health           - Health check");
    info!("");
    info!("Press Ctrl+C for graceful shutdown");
    info!("");

    // Start server with graceful shutdown
    let listener = TcpListener::bind(addr).await?;

    let shutdown_signal = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    // Graceful shutdown sequence
    info!("");
    info!("Shutdown signal received, cleaning up...");

    let stats = telemetry_for_shutdown.get_stats();
    info!("   Total analyzed: {}", stats.total_analyzed);
    info!("   High-risk policies: {}", stats.high_risk_detected);
    info!("   Catastrophic warnings: {}", stats.catastrophic_warnings);

    match telemetry_for_shutdown.export_stats_json() {
        Ok(path) => info!("   Stats exported to: {}", path.display()),
        Err(e) => warn!("   Failed to export stats: {}", e),
    }

    info!("{} API shutdown complete", APP_NAME);

    Ok(())
}

fn print_banner() {
    println!(
        r#"
    ==============================================================
      {} v{}
      Insurance Policy Decoder - Cloud API
      Clause Intelligence Extraction + Vulnerability Scoring
    ==============================================================
    "#,
        APP_NAME, APP_VERSION
    );
}
