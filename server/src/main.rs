use std::{fs::OpenOptions, net::SocketAddr, sync::Arc};

use anyhow::Context;
use mop_data_management::TripStore;
use mop_lib::{map_renderer::MapRenderer, region::MapConfig};
use server::{routes, server_state::ServerState, ADDR_ENV, DEFAULT_ADDR};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    std::fs::create_dir_all("server/log")?;
    let log_file = "server/log/server.log";

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| format!("{}=trace,mop_data_management=debug", env!("CARGO_CRATE_NAME")).into())
        )
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(file))
        .init();

    tracing::info!("Starting server...");

    let store = TripStore::default_location()?;
    // Creates the file up front so a broken data directory fails at startup
    let trips = store.load()?;
    tracing::info!("Loaded {} trips from {:?}", trips.len(), store.path());

    let server_state = Arc::new(ServerState::new(store, MapRenderer::new(MapConfig::default())));
    let app = routes::router(server_state);

    let addr: SocketAddr = std::env::var(ADDR_ENV)
        .unwrap_or_else(|_| DEFAULT_ADDR.to_string())
        .parse()
        .with_context(|| format!("{} is not a socket address", ADDR_ENV))?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
