//! Deconfliction Server - REST backend for pre-flight mission checks

use anyhow::Result;
use deconflict_server::{api, config::Config, state::AppState};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env();

    // Initialize tracing
    let filter = EnvFilter::from_default_env()
        .add_directive("deconflict_server=debug".parse()?)
        .add_directive("deconflict_core=info".parse()?);
    if config.log_json {
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().json())
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer())
            .with(filter)
            .init();
    }

    tracing::info!("Starting Deconfliction Server...");
    tracing::info!(
        safety_buffer_m = config.rules.safety_buffer_m,
        time_resolution_s = config.rules.time_resolution_s,
        ml_threshold = config.rules.ml_threshold,
        "Deconfliction rules loaded"
    );

    let state = Arc::new(AppState::from_config(&config)?);

    let app = api::routes()
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
