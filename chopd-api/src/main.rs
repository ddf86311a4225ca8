//! chopd-api - Appearance Scoring Backend
//!
//! Accepts photo uploads, gates them through the freemium quota ledger,
//! delegates scoring to an external vision model (with a mock fallback),
//! and serves subscription status, plan, and upgrade endpoints.

use anyhow::Result;
use chopd_api::services::VisionClient;
use chopd_api::{build_router, AppState};
use chopd_common::config::ServiceConfig;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Log build identification immediately after tracing init
    info!(
        "Starting chopd-api v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let config = ServiceConfig::load();
    if config.api_key.is_some() {
        info!("Vision API configured (model: {})", config.vision_model);
    } else {
        info!("Vision API key not found - will serve mock analyses");
    }

    let vision = VisionClient::new(&config)
        .map_err(|e| anyhow::anyhow!("Failed to create vision client: {}", e))?;

    let bind_addr = format!("{}:{}", config.host, config.port);
    let state = AppState::new(config, vision);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("chopd-api listening on http://{}", bind_addr);
    info!("Health check: http://{}/health", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
