//! Portfolio chat proxy server.

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use portfolio_chat::adapters::http::{app_router, ChatAppState};
use portfolio_chat::adapters::upstream::DifyClient;
use portfolio_chat::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("failed to load configuration")?;
    init_tracing(&config);
    config.validate().context("invalid configuration")?;

    if !config.upstream.has_api_key() {
        tracing::warn!("No upstream API key configured; chat requests will fail with 500");
    } else if !config.upstream.has_business_api_key() {
        tracing::info!("No business API key configured; business context uses the default key");
    }

    let upstream = Arc::new(DifyClient::new(config.upstream.dify_config()));
    let app = app_router(ChatAppState::new(upstream), &config.server);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!(
        addr = %listener.local_addr()?,
        upstream = %config.upstream.base_url,
        "Chat proxy listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Chat proxy stopped");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));
    let registry = tracing_subscriber::registry().with(filter);

    if config.is_production() {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
