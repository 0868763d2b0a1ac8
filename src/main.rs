use clap::Parser; // for cli
use std::net::SocketAddr;
use std::sync::Arc;
use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use podcast_gateway::build_router;
use podcast_gateway::config::Args;
use podcast_gateway::rate_limit::{BURST, REFILL_PER_SECOND, RateLimitRegistry, STALE_AFTER, SWEEP_INTERVAL};
use podcast_gateway::state::AppState;
use podcast_gateway::sweeper::spawn_sweeper;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // parse cli arguments
    let args = Args::parse();
    let podcasts_url = args.podcasts_url()?;

    // one registry shared by the middleware and the sweeper
    let registry = Arc::new(RateLimitRegistry::new());
    let sweeper = spawn_sweeper(Arc::clone(&registry), SWEEP_INTERVAL);

    let app = build_router(AppState::new(podcasts_url.clone(), registry));

    let addr = args.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    info!(addr = %addr, "API Gateway listening");
    info!(upstream = %podcasts_url, "Forwarding podcasts");
    info!(
        rate = REFILL_PER_SECOND,
        burst = BURST,
        idle_eviction = ?STALE_AFTER,
        "Rate limit per client"
    );

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    sweeper.stop().await;
    info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
