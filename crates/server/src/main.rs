//! Authoritative zombie arena game server.

use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod entity;
mod geometry;
mod server;
mod world;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Arena server v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = config::Config::load()?;
    info!("Loaded configuration");
    info!("  Port: {}", config.server.port);
    info!("  Map: {}x{}", config.map.width, config.map.height);
    info!("  Tick rate: {} Hz", config.server.tick_rate);

    // Start the game server
    server::run(config).await?;

    Ok(())
}
