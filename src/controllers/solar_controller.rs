use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;
use tracing::{error, info};

use crate::error::SolarError;
use crate::models::solar::{
    CalculateRequest, CalculationRecord, ErrorResponse, HealthResponse, ListQuery, SolarResult,
};
use crate::shared_state::AppState;

const DEFAULT_LIST_LIMIT: usize = 50;
const MAX_LIST_LIMIT: usize = 500;

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ErrorResponse { error: message.into() })).into_response()
}

/// POST /api/solar/calculate/
/// Calculate optimal solar panel angles
///
/// Returns the optimal tilt (pitch) and azimuth for a fixed panel at the
/// given coordinates, with the annual irradiation and energy output they
/// would yield. Successful calculations are recorded for analytics.
#[utoipa::path(
    post,
    path = "/api/solar/calculate/",
    request_body = CalculateRequest,
    responses(
        (status = 200, description = "Optimal geometry and yield", body = SolarResult),
        (status = 400, description = "Missing, non-numeric or out-of-range input", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn calculate_solar_angles(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Response {
    let request = match CalculateRequest::from_payload(&payload) {
        Ok(r) => r,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e.to_string()),
    };

    match state.calculator.compute(request.latitude, request.longitude, request.offset_angle) {
        Ok(result) => {
            state.record_in_background(CalculationRecord::new(&request, &result));
            (StatusCode::OK, Json(result)).into_response()
        }
        Err(SolarError::InvalidInput { field, message }) => {
            info!(field, %message, "rejected solar calculation");
            error_response(StatusCode::BAD_REQUEST, message)
        }
        Err(e @ SolarError::Internal(_)) => {
            error!(error = %e, "unexpected error in solar calculation");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}

/// GET /api/solar/calculations
/// List recent calculations
///
/// Returns stored calculation records, newest first.
#[utoipa::path(
    get,
    path = "/api/solar/calculations",
    params(ListQuery),
    responses(
        (status = 200, description = "Recent calculations", body = Vec<CalculationRecord>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn list_calculations(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Response {
    let limit = query.limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT);
    let store = state.store.clone();

    match tokio::task::spawn_blocking(move || store.recent(limit)).await {
        Ok(Ok(records)) => Json(records).into_response(),
        Ok(Err(e)) => {
            error!(backend = state.store.backend(), error = %e, "failed to read calculations");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
        Err(e) => {
            error!(error = %e, "calculation history task failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}

/// GET /api/health/
/// Health check
///
/// Static service identity for monitoring and deployment checks.
#[utoipa::path(
    get,
    path = "/api/health/",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    )
)]
pub async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "solar-panel-calculator".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CalculatorConfig;
    use crate::error::StoreError;
    use crate::services::calculation_store::{CalculationStore, MemoryStore};
    use crate::services::solar_calculator::SolarCalculator;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    fn state_with(store: Arc<dyn CalculationStore>) -> AppState {
        AppState::new(SolarCalculator::new(CalculatorConfig::default()), store)
    }

    fn state() -> AppState {
        state_with(Arc::new(MemoryStore::new(100)))
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn post(state: &AppState, payload: Value) -> (StatusCode, Value) {
        let response = calculate_solar_angles(State(state.clone()), Json(payload)).await;
        let status = response.status();
        (status, body_json(response).await)
    }

    struct FailingStore;

    impl CalculationStore for FailingStore {
        fn backend(&self) -> &'static str { "failing" }
        fn record(&self, _record: CalculationRecord) -> Result<(), StoreError> {
            Err(StoreError::Poisoned)
        }
        fn recent(&self, _limit: usize) -> Result<Vec<CalculationRecord>, StoreError> {
            Err(StoreError::Poisoned)
        }
    }

    #[tokio::test]
    async fn valid_request_returns_every_field() {
        let (status, body) = post(&state(), json!({"latitude": 40.7128, "longitude": -74.0060})).await;
        assert_eq!(status, StatusCode::OK);
        for key in [
            "optimal_pitch", "optimal_azimuth", "annual_solar_radiation",
            "efficiency_factor", "estimated_annual_output", "calculation_date",
        ] {
            assert!(body.get(key).is_some(), "missing {}", key);
        }
        assert_eq!(body["optimal_azimuth"], json!(180.0));
        assert_eq!(body["efficiency_factor"], json!(0.75));
    }

    #[tokio::test]
    async fn offset_angle_is_applied() {
        let (status, body) = post(&state(), json!({"latitude": 40.7128, "longitude": -74.0060, "offset_angle": 5})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["optimal_pitch"], json!(50.71));
    }

    #[tokio::test]
    async fn missing_latitude_is_bad_request() {
        let (status, body) = post(&state(), json!({"longitude": -74.0060})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], json!("latitude and longitude are required fields"));
    }

    #[tokio::test]
    async fn non_numeric_input_is_bad_request() {
        let (status, body) = post(&state(), json!({"latitude": "abc", "longitude": 0})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], json!("latitude and longitude must be valid numbers"));

        let (status, _) = post(&state(), json!({"latitude": 1, "longitude": 0, "offset_angle": "steep"})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn out_of_range_input_is_bad_request() {
        let (status, body) = post(&state(), json!({"latitude": 100, "longitude": 0})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], json!("Latitude must be between -90 and 90 degrees"));

        let (status, body) = post(&state(), json!({"latitude": 40, "longitude": 0, "offset_angle": 200})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], json!("Offset angle must be between -90 and 90 degrees"));
    }

    #[tokio::test]
    async fn successful_calculation_is_recorded() {
        let state = state();
        let (status, _) = post(&state, json!({"latitude": "-33", "longitude": "151"})).await;
        assert_eq!(status, StatusCode::OK);

        let mut stored = Vec::new();
        for _ in 0..100 {
            stored = state.store.recent(10).unwrap();
            if !stored.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].latitude, -33.0);
        assert_eq!(stored[0].optimal_azimuth, 0.0);
    }

    #[tokio::test]
    async fn rejected_request_is_not_recorded() {
        let state = state();
        let _ = post(&state, json!({"latitude": 0, "longitude": 200})).await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(state.store.recent(10).unwrap().is_empty());
    }

    #[tokio::test]
    async fn store_failure_does_not_fail_the_request() {
        let state = state_with(Arc::new(FailingStore));
        let (status, body) = post(&state, json!({"latitude": 10, "longitude": 10})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["optimal_pitch"], json!(10.0));
    }

    #[tokio::test]
    async fn list_returns_newest_first_and_surfaces_store_errors() {
        let state = state();
        let calc = SolarCalculator::new(CalculatorConfig::default());
        for lat in [1.0, 2.0, 3.0] {
            let request = CalculateRequest { latitude: lat, longitude: 0.0, offset_angle: None };
            let result = calc.compute(lat, 0.0, None).unwrap();
            state.store.record(CalculationRecord::new(&request, &result)).unwrap();
        }

        let response = list_calculations(State(state.clone()), Query(ListQuery { limit: Some(2) })).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let lats: Vec<f64> = body.as_array().unwrap().iter().map(|r| r["latitude"].as_f64().unwrap()).collect();
        assert_eq!(lats, vec![3.0, 2.0]);

        let failing = state_with(Arc::new(FailingStore));
        let response = list_calculations(State(failing), Query(ListQuery { limit: None })).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn health_reports_identity() {
        let response = health_check().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], json!("healthy"));
        assert_eq!(body["service"], json!("solar-panel-calculator"));
    }
}
