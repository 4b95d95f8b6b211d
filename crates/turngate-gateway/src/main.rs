use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;

mod app;
mod auth;
mod http;
mod identity_store;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "turngate_gateway=info,tower_http=debug".into()),
        )
        .init();

    // load config: explicit path > TURNGATE_CONFIG env > ~/.turngate/turngate.toml
    let config_path = std::env::var("TURNGATE_CONFIG").ok();
    let config = turngate_core::config::TurngateConfig::load(config_path.as_deref()).unwrap_or_else(|e| {
        tracing::warn!("config load failed ({}), using defaults", e);
        turngate_core::config::TurngateConfig::default()
    });

    let bind = config.gateway.bind.clone();
    let port = config.gateway.port;

    let state = Arc::new(app::AppState::new(config)?);
    let router = app::build_router(state);

    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    info!("turngate gateway listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
