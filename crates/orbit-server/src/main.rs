//! Orbit-Live Server
//!
//! Axum backend exposing the simulation control routes and streaming particle
//! snapshots to WebSocket subscribers at the broadcast period.

use anyhow::Context;
use http::{Method, header};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use orbit_server::{BroadcastScheduler, ServerConfig, handler};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::load().context("Failed to load configuration")?;
    let scheduler = BroadcastScheduler::new(&config).context("Invalid configuration")?;

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    let app = handler::router(scheduler)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.addr))?;

    let addr = config.addr;
    tracing::info!("Server listening on {addr}");
    tracing::info!("  - Control: http://{addr}/simulation/*");
    tracing::info!("  - Push: ws://{addr}/ws/particles");
    tracing::info!(
        force_law = config.simulation.force_law.name(),
        dt = config.simulation.dt,
        period = ?config.broadcast_period(),
        "Simulation configured"
    );

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
