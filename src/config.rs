use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8000 }
fn default_system_efficiency() -> f64 { 0.75 }
fn default_panel_area() -> f64 { 1.0 }
fn default_seasonal_threshold() -> f64 { 25.0 }
fn default_seasonal_adjustment() -> f64 { 5.0 }
fn default_max_records() -> usize { 1000 }

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub calculator: CalculatorConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: default_host(), port: default_port() }
    }
}

/// Which radiation path the calculator starts from.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RadiationModel {
    /// Solar-position + clear-sky ephemeris, falling back on failure.
    #[default]
    ClearSky,
    /// Ephemeris disabled; latitude-band table only.
    Empirical,
}

/// Fixed engine parameters. Held by the calculator instance so tests can run
/// alternate efficiency or seasonal assumptions.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CalculatorConfig {
    /// Combined inverter / wiring / soiling losses (0..1]
    #[serde(default = "default_system_efficiency")]
    pub system_efficiency: f64,
    /// Normalised panel area (m²)
    #[serde(default = "default_panel_area")]
    pub panel_area_m2: f64,
    /// |latitude| above which the seasonal tilt term applies (deg)
    #[serde(default = "default_seasonal_threshold")]
    pub seasonal_threshold_deg: f64,
    /// Magnitude of the seasonal tilt term (deg)
    #[serde(default = "default_seasonal_adjustment")]
    pub seasonal_adjustment_deg: f64,
    #[serde(default)]
    pub radiation_model: RadiationModel,
}

impl Default for CalculatorConfig {
    fn default() -> Self {
        Self {
            system_efficiency: default_system_efficiency(),
            panel_area_m2: default_panel_area(),
            seasonal_threshold_deg: default_seasonal_threshold(),
            seasonal_adjustment_deg: default_seasonal_adjustment(),
            radiation_model: RadiationModel::default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    #[default]
    Memory,
    JsonLines,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    /// File used by the `json_lines` backend
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Retention of the `memory` backend
    #[serde(default = "default_max_records")]
    pub max_records: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { backend: StorageBackend::default(), path: None, max_records: default_max_records() }
    }
}

fn validate_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), ConfigError> {
    if !(min..=max).contains(&value) {
        return Err(ConfigError::Invalid {
            field,
            reason: format!("{} is not between {} and {}", value, min, max),
        });
    }
    Ok(())
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let c = &self.calculator;
        if !(c.system_efficiency > 0.0 && c.system_efficiency <= 1.0) {
            return Err(ConfigError::Invalid {
                field: "calculator.system_efficiency",
                reason: format!("{} is not in (0, 1]", c.system_efficiency),
            });
        }
        if !(c.panel_area_m2 > 0.0 && c.panel_area_m2.is_finite()) {
            return Err(ConfigError::Invalid {
                field: "calculator.panel_area_m2",
                reason: format!("{} must be a positive area", c.panel_area_m2),
            });
        }
        validate_range("calculator.seasonal_threshold_deg", c.seasonal_threshold_deg, 0.0, 90.0)?;
        validate_range("calculator.seasonal_adjustment_deg", c.seasonal_adjustment_deg, 0.0, 90.0)?;

        let s = &self.storage;
        if s.max_records == 0 {
            return Err(ConfigError::Invalid {
                field: "storage.max_records",
                reason: "must be at least 1".to_string(),
            });
        }
        if s.backend == StorageBackend::JsonLines && s.path.is_none() {
            return Err(ConfigError::Invalid {
                field: "storage.path",
                reason: "required by the json_lines backend".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = Config::from_json("{}").unwrap();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.calculator, CalculatorConfig::default());
        assert_eq!(config.calculator.system_efficiency, 0.75);
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.storage.max_records, 1000);
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config = Config::from_json(
            r#"{"server": {"port": 9100}, "calculator": {"radiation_model": "empirical"}}"#,
        )
        .unwrap();
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.calculator.radiation_model, RadiationModel::Empirical);
        assert_eq!(config.calculator.seasonal_adjustment_deg, 5.0);
    }

    #[test]
    fn rejects_out_of_range_efficiency() {
        let err = Config::from_json(r#"{"calculator": {"system_efficiency": 1.5}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "calculator.system_efficiency", .. }));
    }

    #[test]
    fn json_lines_backend_requires_path() {
        let err = Config::from_json(r#"{"storage": {"backend": "json_lines"}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "storage.path", .. }));

        let ok = Config::from_json(
            r#"{"storage": {"backend": "json_lines", "path": "calculations.jsonl"}}"#,
        );
        assert!(ok.is_ok());
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(Config::from_json("{not json"), Err(ConfigError::Parse(_))));
    }
}
