//! Land detector daemon - runs the detection loop and serves its results

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::broadcast;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use land_core::GroundVehicleProvider;
use land_server::config::Config;
use land_server::loops::{land_detector_loop, param_persist_loop};
use land_server::state::AppState;
use land_server::{api, persistence};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("land_server=debug".parse()?)
                .add_directive("land_core=info".parse()?),
        )
        .init();

    tracing::info!("Starting land detector...");

    let config = Config::from_env();
    config.validate().context("invalid configuration")?;
    let port = config.server_port;

    let db = persistence::init_database(&config.database_path, config.database_max_connections)
        .await?;
    let state = Arc::new(AppState::with_database(db.clone(), config));
    state.load_from_database().await?;
    tracing::info!(
        "Restored total flight time: {:.1} s",
        state.params().total_flight_time().as_secs_f64()
    );

    let (detector_shutdown, _) = broadcast::channel::<()>(1);
    let (persist_shutdown, _) = broadcast::channel::<()>(1);

    // Start background loops
    let provider = GroundVehicleProvider::new();
    let detector_handle = tokio::spawn(land_detector_loop::run_land_detector_loop(
        state.clone(),
        provider,
        detector_shutdown.subscribe(),
    ));
    let persist_handle = tokio::spawn(param_persist_loop::run_param_persist_loop(
        db,
        state.clone(),
        persist_shutdown.subscribe(),
    ));

    // Build the app
    let app = api::routes()
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    // Run server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Stopping background loops...");
    // Detector stops first so its last flight-time write is flushed
    let _ = detector_shutdown.send(());
    if let Err(err) = detector_handle.await {
        tracing::warn!("Land detector loop ended abnormally: {}", err);
    }
    let _ = persist_shutdown.send(());
    if let Err(err) = persist_handle.await {
        tracing::warn!("Parameter persistence loop ended abnormally: {}", err);
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
