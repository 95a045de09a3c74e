//! Player Timer - An HTTP server that tracks per-player stopwatch time
//!
//! This is the main entry point for the player-timer application.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use player_timer::{
    config::Config,
    state::AppState,
    api::create_router,
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("player_timer={},tower_http=info", config.log_level()))
        .init();

    info!("Starting player-timer server v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: host={}, port={}, default_name={}",
          config.host, config.port, config.default_name);

    let state = Arc::new(AppState::new(
        config.port,
        config.host.clone(),
        config.default_name.clone(),
    ));

    let app = create_router(state);

    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST   /api/players             - Create a player timer");
    info!("  GET    /api/players             - List player timers");
    info!("  GET    /api/players/:id         - Get one player timer");
    info!("  PATCH  /api/players/:id         - Rename a player");
    info!("  DELETE /api/players/:id         - Delete a player timer");
    info!("  POST   /api/players/:id/start   - Start a timer");
    info!("  POST   /api/players/:id/stop    - Stop a timer");
    info!("  GET    /api/players/:id/elapsed - Live elapsed time");
    info!("  GET    /status                  - Server status");
    info!("  GET    /health                  - Health check");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
