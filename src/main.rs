// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};
use anyhow::Context;
use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::application::annotation_service::AnnotationService;
use crate::application::flight_service::FlightService;
use crate::infrastructure::config::load_app_config;
use crate::infrastructure::csv_repository::CsvFlightRepository;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    flight_curves, flight_highlights, flight_report, health_check, list_flights, stream_frames,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = load_app_config().context("Failed to load configuration")?;

    // Create repository (infrastructure layer)
    let repository = Arc::new(CsvFlightRepository::new(&config.data.directory));

    // Create services (application layer)
    let flight_service = FlightService::new(repository, config.analysis);
    let annotation_service =
        AnnotationService::new(flight_service.clone(), config.annotation.frames_per_chunk);

    // Create application state
    let state = Arc::new(AppState {
        flight_service,
        annotation_service,
    });

    // Build router (presentation layer)
    // Responses are compressed by the handlers, so there is no CompressionLayer
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/flights", get(list_flights))
        .route("/flights/:id/highlights", get(flight_highlights))
        .route("/flights/:id/curves", get(flight_curves))
        .route("/flights/:id/frames", get(stream_frames))
        .route("/report", get(flight_report))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = config
        .server
        .bind
        .parse()
        .with_context(|| format!("Invalid bind address {}", config.server.bind))?;
    tracing::info!(
        "Starting flight-telemetry service on {} (data in {})",
        addr,
        config.data.directory
    );

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
