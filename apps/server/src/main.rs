// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Meshport Server - HTTP front end for the model loading pipeline.
//!
//! Loads STL, OBJ, glTF/GLB and PLY models (STEP and IGES as placeholder
//! geometry), normalizes them and returns render-ready metadata, materials,
//! analysis and camera framing.
//!
//! # Endpoints
//!
//! - `GET /api/v1/health` - Health check
//! - `GET /api/v1/formats` - Supported formats
//! - `POST /api/v1/load` - Load from a URL (JSON)
//! - `POST /api/v1/load/stream` - Load from a URL with progress (SSE)
//! - `POST /api/v1/load/upload` - Load an uploaded file (multipart)

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use meshport_processing::{HttpFetcher, ModelLoader};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

mod config;
mod error;
mod routes;
mod services;
mod types;

use config::Config;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub loader: Arc<ModelLoader>,
    pub config: Arc<Config>,
    /// Bounds the number of loads running at once
    pub limiter: Arc<Semaphore>,
}

impl AppState {
    pub fn new(loader: ModelLoader, config: Config) -> Self {
        Self {
            loader: Arc::new(loader),
            limiter: Arc::new(Semaphore::new(config.max_concurrent_loads)),
            config: Arc::new(config),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug,meshport_server=debug".into()),
        )
        .pretty()
        .init();

    let config = Config::from_env();

    tracing::info!(
        port = config.port,
        max_file_size_mb = config.max_file_size_mb,
        max_concurrent_loads = config.max_concurrent_loads,
        max_retries = config.load.max_retries,
        "Starting Meshport Server"
    );

    // Remote models only. Uploads swap in their own in-memory fetcher.
    let fetcher = HttpFetcher::new(config.load.fetch_timeout)?;
    let loader = ModelLoader::new(Arc::new(fetcher), config.load.clone());
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let app = app(AppState::new(loader, config));

    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// Build the router with all routes and middleware.
fn app(state: AppState) -> Router {
    let config = state.config.clone();

    Router::new()
        // Root endpoint - API information
        .route("/", get(routes::health::info))
        // Health check
        .route("/api/v1/health", get(routes::health::check))
        .route("/api/v1/formats", get(routes::health::formats))
        // Load endpoints
        .route("/api/v1/load", post(routes::load::load))
        .route("/api/v1/load/stream", post(routes::load::load_stream))
        .route("/api/v1/load/upload", post(routes::load::load_upload))
        // Middleware
        .layer(DefaultBodyLimit::max(config.max_file_size_bytes()))
        .layer(CompressionLayer::new())
        // Note: upload decompression handled in decode_upload() to support multipart
        .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs)))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.cors_origins))
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|origin| origin == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any)
}
