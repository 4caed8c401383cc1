mod routes;
mod controllers;
mod services;
mod models;
mod api_docs;
mod shared_state;
mod config;
mod error;
mod logging;

use std::net::{IpAddr, SocketAddr};
use axum::{Router, routing::get, response::Html};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};
use utoipa::OpenApi;
use utoipa_scalar::Scalar;
use crate::api_docs::ApiDoc;
use crate::config::Config;
use crate::error::ConfigError;
use crate::routes::solar_routes::api_routes;
use crate::services::{calculation_store, solar_calculator::SolarCalculator};
use crate::shared_state::AppState;

#[tokio::main]
async fn main() {
    logging::init_logger();

    // 1. Load configuration
    let config_path = std::env::var("SOLAR_CONFIG").unwrap_or_else(|_| "config.json".to_string());
    let config = match Config::load(&config_path) {
        Ok(c) => c,
        Err(ConfigError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!(path = %config_path, "config file not found, using defaults");
            Config::default()
        }
        Err(e) => {
            error!(path = %config_path, error = %e, "failed to load configuration");
            return;
        }
    };
    info!(
        efficiency = config.calculator.system_efficiency,
        radiation_model = ?config.calculator.radiation_model,
        storage = ?config.storage.backend,
        "configuration loaded"
    );

    // 2. Build shared state
    let store = match calculation_store::open_store(&config.storage) {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "failed to open calculation store");
            return;
        }
    };
    let state = AppState::new(SolarCalculator::new(config.calculator.clone()), store);

    // 3. Start Axum HTTP server
    let app = Router::new()
        .nest("/api", api_routes(state))
        .route("/scalar", get(|| async {
            Html(Scalar::new(ApiDoc::openapi()).to_html())
        }))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let ip: IpAddr = match config.server.host.parse() {
        Ok(ip) => ip,
        Err(e) => {
            error!(host = %config.server.host, error = %e, "invalid server host");
            return;
        }
    };
    let addr = SocketAddr::new(ip, config.server.port);
    info!("API Server listening on http://{}", addr);
    info!("Scalar UI: http://{}/scalar", addr);

    if let Err(e) = axum_server::bind(addr).serve(app.into_make_service()).await {
        error!(error = %e, "server terminated");
    }
}
