//! Fixed-panel mounting optimisation.
//!
//! `compute` runs the three estimators in order:
//!  1. Angle      – tilt ≈ |latitude| with a seasonal bias, hemisphere azimuth
//!  2. Radiation  – clear-sky ephemeris integrated over a year, or the
//!                  latitude-band table when the ephemeris is unusable
//!  3. Yield      – radiation × days × area × system efficiency

use chrono::{Local, NaiveDate};
use tracing::{debug, warn};

use crate::config::{CalculatorConfig, RadiationModel};
use crate::error::{EphemerisError, SolarError};
use crate::models::solar::SolarResult;
use crate::services::solar_algorithm::{ClearSky, Site, SkyModel};

/// Non-leap year sampled by the ephemeris path.
const REPRESENTATIVE_YEAR: i32 = 2023;
const DAYS_PER_YEAR: u32 = 365;
/// W/m² → kW/m²
const NATIVE_UNIT_SCALE: f64 = 1000.0;

/// Which path produced a radiation figure. Callers of `compute` only see the
/// number.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RadiationEstimate {
    Ephemeris(f64),
    Fallback(f64),
}

impl RadiationEstimate {
    pub fn value(&self) -> f64 {
        match *self {
            Self::Ephemeris(v) | Self::Fallback(v) => v,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback(_))
    }
}

pub struct SolarCalculator {
    config: CalculatorConfig,
    sky: Option<Box<dyn SkyModel>>,
}

impl SolarCalculator {
    pub fn new(config: CalculatorConfig) -> Self {
        let sky: Option<Box<dyn SkyModel>> = match config.radiation_model {
            RadiationModel::ClearSky => Some(Box::new(ClearSky)),
            RadiationModel::Empirical => None,
        };
        Self { config, sky }
    }

    /// `None` means no ephemeris is available and every call uses the
    /// empirical table.
    pub fn with_sky_model(config: CalculatorConfig, sky: Option<Box<dyn SkyModel>>) -> Self {
        Self { config, sky }
    }

    // ─── Angle estimator ─────────────────────────────────────

    /// Optimal tilt in degrees, clamped to [0, 90].
    pub fn estimate_tilt(&self, latitude: f64, offset_angle: Option<f64>) -> f64 {
        let base = latitude.abs();

        // Steeper in the north, shallower in the south, only where the
        // seasonal swing in solar elevation is large.
        let seasonal = if latitude.abs() > self.config.seasonal_threshold_deg {
            if latitude > 0.0 {
                self.config.seasonal_adjustment_deg
            } else {
                -self.config.seasonal_adjustment_deg
            }
        } else {
            0.0
        };

        let tilt = base + seasonal + offset_angle.unwrap_or(0.0);
        tilt.clamp(0.0, 90.0)
    }

    /// 180 (south) for latitude >= 0, otherwise 0 (north).
    pub fn estimate_azimuth(&self, latitude: f64) -> f64 {
        if latitude >= 0.0 { 180.0 } else { 0.0 }
    }

    // ─── Radiation estimator ─────────────────────────────────

    pub fn estimate_annual_radiation(&self, latitude: f64, longitude: f64, tilt: f64) -> f64 {
        self.radiation_estimate(latitude, longitude, tilt).value()
    }

    pub fn radiation_estimate(&self, latitude: f64, longitude: f64, tilt: f64) -> RadiationEstimate {
        let primary = match &self.sky {
            Some(sky) => ephemeris_radiation(sky.as_ref(), latitude, longitude, tilt),
            None => Err(EphemerisError::Unavailable),
        };

        match primary {
            Ok(radiation) => RadiationEstimate::Ephemeris(radiation),
            Err(EphemerisError::Unavailable) => {
                debug!(latitude, "no ephemeris configured, using empirical radiation");
                RadiationEstimate::Fallback(fallback_radiation(latitude, tilt))
            }
            Err(e) => {
                warn!(latitude, longitude, error = %e, "clear-sky radiation failed, using empirical fallback");
                RadiationEstimate::Fallback(fallback_radiation(latitude, tilt))
            }
        }
    }

    // ─── Yield estimator ─────────────────────────────────────

    pub fn estimate_annual_output(&self, radiation: f64) -> f64 {
        radiation * DAYS_PER_YEAR as f64 * self.config.panel_area_m2 * self.config.system_efficiency
    }

    // ─── Orchestration ───────────────────────────────────────

    pub fn compute(
        &self,
        latitude: f64,
        longitude: f64,
        offset_angle: Option<f64>,
    ) -> Result<SolarResult, SolarError> {
        self.compute_on(latitude, longitude, offset_angle, Local::now().date_naive())
    }

    /// Same as `compute` with an explicit presentation date.
    pub fn compute_on(
        &self,
        latitude: f64,
        longitude: f64,
        offset_angle: Option<f64>,
        calculation_date: NaiveDate,
    ) -> Result<SolarResult, SolarError> {
        check_range("latitude", latitude, 90.0, "Latitude must be between -90 and 90 degrees")?;
        check_range("longitude", longitude, 180.0, "Longitude must be between -180 and 180 degrees")?;
        if let Some(offset) = offset_angle {
            check_range("offset_angle", offset, 90.0, "Offset angle must be between -90 and 90 degrees")?;
        }

        let tilt = self.estimate_tilt(latitude, offset_angle);
        let azimuth = self.estimate_azimuth(latitude);
        let radiation = self.radiation_estimate(latitude, longitude, tilt);
        let output = self.estimate_annual_output(radiation.value());

        if !radiation.value().is_finite() || !output.is_finite() {
            return Err(SolarError::Internal(format!(
                "non-finite estimate (radiation={}, output={})",
                radiation.value(),
                output
            )));
        }

        debug!(
            latitude, longitude, tilt, azimuth,
            radiation = radiation.value(),
            fallback = radiation.is_fallback(),
            output,
            "solar calculation complete"
        );

        Ok(SolarResult {
            optimal_pitch: round2(tilt),
            optimal_azimuth: round2(azimuth),
            annual_solar_radiation: round2(radiation.value()),
            efficiency_factor: self.config.system_efficiency,
            estimated_annual_output: round2(output),
            calculation_date,
        })
    }
}

fn check_range(field: &'static str, value: f64, bound: f64, message: &str) -> Result<(), SolarError> {
    if (-bound..=bound).contains(&value) {
        Ok(())
    } else {
        Err(SolarError::invalid(field, message))
    }
}

#[inline]
fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Projects horizontal irradiance onto the tilted plane. Assumes the panel
/// faces the sun's azimuth and ignores diffuse and reflected components.
pub fn tilted_irradiance(ghi_w_m2: f64, zenith_deg: f64, tilt_deg: f64) -> f64 {
    let z = zenith_deg.to_radians();
    let t = tilt_deg.to_radians();
    let cos_incidence = (z.cos() * t.cos() + z.sin() * t.sin()).clamp(0.0, 1.0);
    ghi_w_m2 * cos_incidence
}

fn ephemeris_radiation(
    sky: &dyn SkyModel,
    latitude: f64,
    longitude: f64,
    tilt: f64,
) -> Result<f64, EphemerisError> {
    let site = Site::new(latitude, longitude)?;

    let mut total = 0.0;
    for ordinal in 1..=DAYS_PER_YEAR {
        let date = NaiveDate::from_yo_opt(REPRESENTATIVE_YEAR, ordinal)
            .ok_or(EphemerisError::InvalidDay { year: REPRESENTATIVE_YEAR, ordinal })?;
        let sample = sky.sample(&site, date)?;
        total += tilted_irradiance(sample.ghi_w_m2, sample.zenith_deg, tilt);
    }

    let mean = total / DAYS_PER_YEAR as f64;
    let radiation = mean * DAYS_PER_YEAR as f64 / NATIVE_UNIT_SCALE;
    if !radiation.is_finite() || radiation < 0.0 {
        return Err(EphemerisError::InvalidAggregate(radiation));
    }
    debug!(model = sky.name(), latitude, longitude, mean_w_m2 = mean, "ephemeris radiation");
    Ok(radiation)
}

/// Latitude-band estimate (kWh/m²/day) scaled by how close the tilt is to
/// the latitude.
pub fn fallback_radiation(latitude: f64, tilt: f64) -> f64 {
    let abs_lat = latitude.abs();

    let base = if abs_lat < 23.5 {
        5.5 // tropics
    } else if abs_lat < 45.0 {
        4.5
    } else if abs_lat < 60.0 {
        3.5
    } else {
        2.5 // polar
    };

    let tilt_factor = 1.0 + 0.1 * (1.0 - (tilt - abs_lat).abs() / 90.0);
    base * tilt_factor
}
