use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::PayloadError;

// ─── Request ─────────────────────────────────────────────────────────────────

/// Body of `POST /api/solar/calculate/`.
///
/// Numbers may also be sent as numeric strings (`"40.71"`).
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, ToSchema)]
pub struct CalculateRequest {
    /// Latitude in decimal degrees (-90..90)
    pub latitude: f64,
    /// Longitude in decimal degrees (-180..180)
    pub longitude: f64,
    /// Angle between the ground surface and true horizontal (-90..90)
    pub offset_angle: Option<f64>,
}

impl CalculateRequest {
    /// Presence check and numeric coercion. Range checks belong to the
    /// calculator.
    pub fn from_payload(payload: &Value) -> Result<Self, PayloadError> {
        let (Some(lat), Some(lon)) = (payload.get("latitude"), payload.get("longitude")) else {
            return Err(PayloadError::MissingCoordinates);
        };
        let (Some(latitude), Some(longitude)) = (coerce_number(lat), coerce_number(lon)) else {
            return Err(PayloadError::InvalidCoordinates);
        };
        let offset_angle = match payload.get("offset_angle") {
            None => None,
            Some(v) => Some(coerce_number(v).ok_or(PayloadError::InvalidOffset)?),
        };
        Ok(Self { latitude, longitude, offset_angle })
    }
}

fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// Maximum number of records, newest first (default 50, max 500)
    pub limit: Option<usize>,
}

// ─── Results ─────────────────────────────────────────────────────────────────

/// Optimal mounting geometry and yield projection for one location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SolarResult {
    /// Optimal tilt from horizontal (deg)
    pub optimal_pitch: f64,
    /// Panel facing: 180 = south, 0 = north (deg)
    pub optimal_azimuth: f64,
    /// Annual mean daily irradiation on the tilted surface
    pub annual_solar_radiation: f64,
    /// System efficiency factor (0-1)
    pub efficiency_factor: f64,
    /// Estimated annual energy output for a unit-area panel
    pub estimated_annual_output: f64,
    #[schema(value_type = String, format = Date)]
    pub calculation_date: NaiveDate,
}

/// A stored calculation, kept for analytics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CalculationRecord {
    pub id: Uuid,
    pub latitude: f64,
    pub longitude: f64,
    pub offset_angle: Option<f64>,
    pub optimal_pitch: f64,
    pub optimal_azimuth: f64,
    pub annual_solar_radiation: f64,
    pub efficiency_factor: f64,
    pub estimated_annual_output: f64,
    pub created_at: DateTime<Utc>,
    #[schema(value_type = String, format = Date)]
    pub calculation_date: NaiveDate,
}

impl CalculationRecord {
    pub fn new(request: &CalculateRequest, result: &SolarResult) -> Self {
        Self {
            id: Uuid::new_v4(),
            latitude: request.latitude,
            longitude: request.longitude,
            offset_angle: request.offset_angle,
            optimal_pitch: result.optimal_pitch,
            optimal_azimuth: result.optimal_azimuth,
            annual_solar_radiation: result.annual_solar_radiation,
            efficiency_factor: result.efficiency_factor,
            estimated_annual_output: result.estimated_annual_output,
            created_at: Utc::now(),
            calculation_date: result.calculation_date,
        }
    }
}

// ─── Misc responses ──────────────────────────────────────────────────────────

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}
