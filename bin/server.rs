// Cycle Tracker - Web Server
// Serves the entry form and the /api/predict endpoint

use anyhow::{Context, Result};
use cycle_tracker::api::{router, AppState};
use cycle_tracker::config::init_tracing;
use cycle_tracker::{AppConfig, SystemClock};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;
    init_tracing(&config.log_level);
    config.validate().context("Invalid configuration")?;

    println!("🌐 Cycle Tracker - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let state = AppState {
        prediction: config.prediction.clone(),
        clock: Arc::new(SystemClock),
    };

    let app = router(state);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!(%addr, strategy = config.prediction.strategy.name(), "server listening");
    println!("\n🚀 Server running on http://{}", addr);
    println!("   API: POST http://{}/api/predict", addr);
    println!("   UI:  http://{}", addr);
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app)
        .await
        .context("Server error")?;

    Ok(())
}
