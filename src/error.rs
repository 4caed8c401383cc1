use chrono::NaiveDate;
use thiserror::Error;

/// Failures surfaced by `SolarCalculator::compute`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolarError {
    /// A geographic input is outside its valid range. Never retried.
    #[error("{message}")]
    InvalidInput { field: &'static str, message: String },

    /// Anything else that went wrong while composing the result.
    #[error("internal calculation failure: {0}")]
    Internal(String),
}

impl SolarError {
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidInput { field, message: message.into() }
    }
}

/// Failures of the clear-sky ephemeris path. These never reach the caller:
/// the radiation estimator degrades to the empirical table instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EphemerisError {
    #[error("ephemeris model unavailable")]
    Unavailable,

    #[error("coordinates out of range: lat={latitude}, lon={longitude}")]
    OutOfRange { latitude: f64, longitude: f64 },

    #[error("cannot build sampling instant for {0}")]
    InvalidInstant(NaiveDate),

    #[error("day {ordinal} does not exist in {year}")]
    InvalidDay { year: i32, ordinal: u32 },

    #[error("non-finite {quantity} on {date}")]
    NonFinite { quantity: &'static str, date: NaiveDate },

    #[error("annual mean is not a usable irradiance: {0}")]
    InvalidAggregate(f64),
}

/// Request payloads that cannot be turned into calculator inputs.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadError {
    #[error("latitude and longitude are required fields")]
    MissingCoordinates,

    #[error("latitude and longitude must be valid numbers")]
    InvalidCoordinates,

    #[error("offset_angle must be a valid number")]
    InvalidOffset,
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("store lock poisoned")]
    Poisoned,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}
