use axum::{routing::{get, post}, Router};
use crate::controllers::solar_controller::{
    calculate_solar_angles, list_calculations, health_check,
};
use crate::shared_state::AppState;

/// Build the `/api/*` sub-router. Paths are served with and without the
/// trailing slash.
pub fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/solar/calculate/",   post(calculate_solar_angles))
        .route("/solar/calculate",    post(calculate_solar_angles))
        .route("/solar/calculations", get(list_calculations))
        .route("/health/",            get(health_check))
        .route("/health",             get(health_check))
        .with_state(state)
}
