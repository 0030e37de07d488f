//! Mystic Survival Game Server
//!
//! Binds the configured address and serves until Ctrl-C.

use std::sync::Arc;
use tracing::{info, error};
use tracing_subscriber::EnvFilter;

use mystic_survival::{GameServer, ServerConfig, VERSION};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env()?;

    info!("Mystic Survival Server v{}", VERSION);
    info!("World: {}x{}", config.bounds.width, config.bounds.height);
    info!(
        "Tick: {:?}, spawn every {:?}, broadcast every {:?}",
        config.tick.tick_interval, config.tick.spawn_interval, config.tick.broadcast_interval
    );
    if config.legacy_proximity_hits {
        info!("Legacy position-based hits enabled (radius {})", config.hit_radius);
    }

    let server = Arc::new(GameServer::new(config));
    let runner = server.clone();

    tokio::select! {
        result = runner.run() => {
            if let Err(e) = &result {
                error!("Server error: {}", e);
            }
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down");
            server.shutdown();
        }
    }

    Ok(())
}
