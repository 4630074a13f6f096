mod handlers;
mod routes;

use axum::Router;
use gavel_engine::{JudgeConfig, JudgeEngine, LanguageRegistry};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

pub struct AppState {
    pub engine: JudgeEngine,
    pub api_token: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    info!("Gavel API booting...");

    let config = JudgeConfig::from_env();

    let registry = match &config.languages_file {
        Some(path) => LanguageRegistry::load(path)?,
        None => LanguageRegistry::builtin(),
    };
    info!("Loaded language pipelines for: {:?}", registry.names());
    info!(
        sandbox_root = %config.sandbox_root.display(),
        box_capacity = config.box_capacity,
        wait_for_box = config.wait_for_box,
        "Sandbox configuration"
    );

    let api_token = std::env::var("GAVEL_API_TOKEN").ok();
    if api_token.is_none() {
        warn!("GAVEL_API_TOKEN is not set - requests are unauthenticated");
    }

    let state = Arc::new(AppState {
        engine: JudgeEngine::new(config, registry),
        api_token,
    });

    // Build router
    let app = Router::new().merge(routes::routes()).with_state(state);

    // Start server
    let addr =
        std::env::var("GAVEL_LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:1072".to_string());
    let listener = TcpListener::bind(&addr).await?;

    info!("HTTP server listening on {}", addr);
    info!("Ready to judge submissions");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to install CTRL+C signal handler");
        return;
    }
    warn!("Received shutdown signal, draining in-flight submissions...");
}
