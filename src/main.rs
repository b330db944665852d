//! Decide Linker server entry point.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use decide_linker::adapters::http::build_router;
use decide_linker::application::bootstrap::build_state;
use decide_linker::config::AppConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.server.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(environment = ?config.server.environment, "starting decide-linker");
    config.validate()?;

    let state = build_state(&config).await?;
    let router = build_router(state, &config.server);

    let addr = config.server.socket_addr();
    tracing::info!(%addr, "listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
