//! funnel-gateway server entry point.
//!
//! Starts the Axum HTTP server with the webhook, landing-page, and admin
//! endpoints.

use std::sync::Arc;
use std::time::Duration;

use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use funnel_gateway::api;
use funnel_gateway::app_state::AppState;
use funnel_gateway::clients::{
    ConversionSink, JoinApprover, MetaConversionsClient, TelegramClient,
};
use funnel_gateway::config::{GatewayConfig, LogFormat};
use funnel_gateway::domain::{Clock, SystemClock};
use funnel_gateway::persistence::{AttributionStore, MemoryStore, PostgresStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration; its log format decides the subscriber below
    let config = GatewayConfig::from_env()?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
    tracing::info!(addr = %config.listen_addr, ?config, "starting funnel-gateway");
    for warning in config.missing_settings() {
        tracing::warn!("{warning}");
    }

    // Build storage layer
    let store: Arc<dyn AttributionStore> = if config.persistence_enabled {
        let store = PostgresStore::connect(&config).await?;
        tracing::info!("postgres store connected, migrations applied");
        Arc::new(store)
    } else {
        tracing::warn!("persistence disabled; using in-memory store, data is lost on restart");
        Arc::new(MemoryStore::new())
    };

    // Build outbound clients
    let approver: Arc<dyn JoinApprover> = Arc::new(TelegramClient::new(
        &config.telegram_api_base,
        &config.telegram_bot_token,
        config.http_timeout(),
    )?);
    let sink: Arc<dyn ConversionSink> = Arc::new(MetaConversionsClient::new(
        &config.meta_graph_base,
        &config.meta_api_version,
        &config.meta_access_token,
        config.http_timeout(),
    )?);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    // Build application state
    let app_state = AppState::build(&config, store, approver, sink, clock).await?;

    // Build router
    let app = api::build_router(&app_state)
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.request_timeout_secs,
        )))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
