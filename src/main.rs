// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc, time::Duration};
use anyhow::Context;
use axum::{routing::get, Router};
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::application::dashboard_service::DashboardService;
use crate::infrastructure::build_sources;
use crate::infrastructure::config::{load_dashboard_config, load_panels_config};
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{dashboard_page, health_check, panel_artifact, panel_events};

const DEFAULT_LOG_FILTER: &str = "market_dashboard=info,tower_http=info";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // API keys usually live in a local .env
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    // Load configuration
    let dashboard_config = load_dashboard_config()?;
    let panels = load_panels_config()?.into_definitions()?;

    // Create data sources (infrastructure layer)
    let sources = build_sources(&dashboard_config.sources)?;

    // Start one refresh worker per panel (application layer)
    let dashboard = DashboardService::start(
        panels,
        &sources,
        Duration::from_millis(dashboard_config.server.refresh_wait_ms),
    )?;

    let state = Arc::new(AppState { dashboard });

    // Build router (presentation layer)
    let router = Router::new()
        .route("/", get(dashboard_page))
        .route("/healthz", get(health_check))
        .route("/panels/:id", get(panel_artifact))
        .route("/panels/:id/events", get(panel_events))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = dashboard_config
        .server
        .bind_addr
        .parse()
        .with_context(|| format!("invalid bind address {}", dashboard_config.server.bind_addr))?;
    tracing::info!("Starting market-dashboard on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
