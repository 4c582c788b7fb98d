// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! MKS Tracker API Server
//!
//! Logs disc golf practice throws hole by hole, with the session, the
//! round in progress and the current hole surviving across requests.

use mks_tracker::{
    config::Config,
    db::{RemoteDataStore, SupabaseDb},
    services::{GoTrueClient, OpenMeteoWeather, RemoteAuthProvider},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting MKS Tracker API");

    let identity: Arc<dyn RemoteAuthProvider>;
    let db: Arc<dyn RemoteDataStore>;
    match (&config.supabase_url, &config.supabase_key) {
        (Some(url), Some(key)) => {
            identity = Arc::new(GoTrueClient::new(url, key, config.remote_timeout)?);
            db = Arc::new(SupabaseDb::new(url, key, config.remote_timeout)?);
        }
        _ => {
            tracing::warn!("SUPABASE_URL or SUPABASE_KEY missing, running in offline mode");
            identity = Arc::new(GoTrueClient::offline());
            db = Arc::new(SupabaseDb::offline());
        }
    }

    let weather = Arc::new(OpenMeteoWeather::new(&config)?);
    tracing::info!(
        latitude = config.venue_latitude,
        longitude = config.venue_longitude,
        ttl_secs = config.weather_ttl.as_secs(),
        "Weather provider initialized"
    );

    // Build shared state
    let state = Arc::new(AppState::new(config.clone(), identity, db, weather));

    // Build router
    let app = mks_tracker::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("mks_tracker=debug,info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(format)
        .init();
}
