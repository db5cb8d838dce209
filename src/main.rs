// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod error;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};
use tokio::sync::mpsc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::application::dispatcher::Dispatcher;
use crate::application::display::DisplayAdapter;
use crate::application::feed_listener::FeedListener;
use crate::domain::dashboard::DashboardState;
use crate::infrastructure::broadcast_surface::BroadcastSurface;
use crate::infrastructure::config::load_dashboard_config;
use crate::infrastructure::firebase_feed::FirebaseFeed;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::router;

const EVENT_QUEUE: usize = 256;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let dashboard_config = load_dashboard_config()?;

    // Display surface shared by the dispatcher and the HTTP layer
    let surface = Arc::new(BroadcastSurface::new(&dashboard_config.charts));
    let display = DisplayAdapter::new(surface.clone(), dashboard_config.display.time_format.clone());

    // Dispatcher owns all dashboard state
    let state = DashboardState::new(dashboard_config.buffer.max_points, dashboard_config.normal);
    let dispatcher = Dispatcher::new(state, display);
    let (tx, rx) = mpsc::channel(EVENT_QUEUE);
    tokio::spawn(dispatcher.run(rx));

    // Feed listeners (infrastructure layer)
    let feed = Arc::new(FirebaseFeed::new(dashboard_config.firebase.clone()));
    FeedListener::new(feed, dashboard_config.buffer.history_limit, tx).spawn();

    // Build router (presentation layer)
    let app_state = Arc::new(AppState {
        surface,
        decimation_samples: dashboard_config.display.decimation_samples,
    });
    let app = router(app_state).layer(TraceLayer::new_for_http());

    // Start server
    let addr: SocketAddr = dashboard_config.server.bind.parse()?;
    tracing::info!("Starting sensor-dashboard service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;

    Ok(())
}
