/// ============================================================
///  Clear-sky solar ephemeris
///
///  Algorithm pipeline (one sample per day, at local solar noon):
///   1. Solar geometry  – Spencer declination, equation of time,
///                        hour angle, elevation / zenith, azimuth
///   2. Extraterrestrial irradiance – eccentricity-corrected solar constant
///   3. Clear-sky model  – Bird & Hulstrom simplified, Kasten & Young
///                         air mass: GHI on the horizontal plane
/// ============================================================

use chrono::{DateTime, Datelike, NaiveDate, TimeDelta, Timelike, Utc};
use std::f64::consts::PI;

use crate::error::EphemerisError;

// ─── Physical constants ──────────────────────────────────────
const SC: f64 = 1361.0; // Solar constant W/m²
const DEG: f64 = PI / 180.0;

/// A location an ephemeris model has been bound to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Site {
    pub latitude: f64,
    pub longitude: f64,
}

impl Site {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, EphemerisError> {
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(EphemerisError::OutOfRange { latitude, longitude });
        }
        Ok(Self { latitude, longitude })
    }
}

/// Irradiance and geometry observed at one sampling instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkySample {
    pub ghi_w_m2: f64,
    pub zenith_deg: f64,
}

/// Solar-position + clear-sky source used by the radiation estimator.
pub trait SkyModel: Send + Sync {
    fn name(&self) -> &'static str;

    /// Clear-sky GHI and solar zenith for `site` at the model's sampling
    /// instant on `date`.
    fn sample(&self, site: &Site, date: NaiveDate) -> Result<SkySample, EphemerisError>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolarPosition {
    pub elevation_deg: f64,
    pub zenith_deg: f64,
    /// Degrees from North, clockwise
    pub azimuth_deg: f64,
}

/// Built-in ephemeris, sampled at local apparent solar noon.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClearSky;

impl SkyModel for ClearSky {
    fn name(&self) -> &'static str {
        "bird-clear-sky"
    }

    fn sample(&self, site: &Site, date: NaiveDate) -> Result<SkySample, EphemerisError> {
        let instant = solar_noon(site, date)?;
        let position = solar_position(site, instant);
        let ghi = clear_sky_ghi(position.elevation_deg, instant.ordinal() as f64);

        if !position.zenith_deg.is_finite() {
            return Err(EphemerisError::NonFinite { quantity: "zenith", date });
        }
        if !ghi.is_finite() {
            return Err(EphemerisError::NonFinite { quantity: "ghi", date });
        }
        Ok(SkySample { ghi_w_m2: ghi, zenith_deg: position.zenith_deg })
    }
}

// Spencer (1971) fractional year, radians
#[inline]
fn day_angle(doy: f64) -> f64 {
    2.0 * PI * (doy - 1.0) / 365.0
}

/// Equation of time in minutes (Spencer 1971).
fn equation_of_time_min(doy: f64) -> f64 {
    let b = day_angle(doy);
    229.18
        * (0.000075
            + 0.001868 * b.cos()
            - 0.032077 * b.sin()
            - 0.014615 * (2.0 * b).cos()
            - 0.04089 * (2.0 * b).sin())
}

/// Solar declination in radians (Spencer 1971).
fn declination(doy: f64) -> f64 {
    let b = day_angle(doy);
    0.006918
        - 0.399912 * b.cos()
        + 0.070257 * b.sin()
        - 0.006758 * (2.0 * b).cos()
        + 0.000907 * (2.0 * b).sin()
        - 0.002697 * (3.0 * b).cos()
        + 0.00148 * (3.0 * b).sin()
}

/// UTC instant of local apparent solar noon at `site` on `date`.
/// May fall on the neighbouring UTC day near the antimeridian.
pub fn solar_noon(site: &Site, date: NaiveDate) -> Result<DateTime<Utc>, EphemerisError> {
    let eot_min = equation_of_time_min(date.ordinal() as f64);
    let noon_utc_h = 12.0 - site.longitude / 15.0 - eot_min / 60.0;

    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or(EphemerisError::InvalidInstant(date))?
        .and_utc();
    let offset = TimeDelta::try_milliseconds((noon_utc_h * 3_600_000.0).round() as i64)
        .ok_or(EphemerisError::InvalidInstant(date))?;
    midnight
        .checked_add_signed(offset)
        .ok_or(EphemerisError::InvalidInstant(date))
}

pub fn solar_position(site: &Site, utc: DateTime<Utc>) -> SolarPosition {
    let doy = utc.ordinal() as f64;
    let ut_h = utc.hour() as f64
        + utc.minute() as f64 / 60.0
        + utc.second() as f64 / 3600.0;

    let decl = declination(doy);
    // Local apparent solar time (hours)
    let lst_h = ut_h + site.longitude / 15.0 + equation_of_time_min(doy) / 60.0;
    // Hour angle: negative in the morning, positive in the afternoon
    let omega_deg = 15.0 * (lst_h - 12.0);
    let omega = omega_deg * DEG;

    let lat = site.latitude * DEG;
    let sin_alpha = (lat.sin() * decl.sin() + lat.cos() * decl.cos() * omega.cos()).clamp(-1.0, 1.0);
    let alpha_rad = sin_alpha.asin();
    let elevation_deg = alpha_rad / DEG;

    let denom = alpha_rad.cos() * lat.cos();
    let cos_az = if denom.abs() > 1e-9 {
        (decl.sin() - sin_alpha * lat.sin()) / denom
    } else {
        // Sun at zenith or observer at a pole
        0.0
    };
    let az_abs = cos_az.clamp(-1.0, 1.0).acos() / DEG;
    let azimuth_deg = if omega_deg > 0.0 { 360.0 - az_abs } else { az_abs };

    SolarPosition {
        elevation_deg,
        zenith_deg: 90.0 - elevation_deg,
        azimuth_deg,
    }
}

/// Clear-sky global horizontal irradiance (W/m²) for a solar elevation.
pub fn clear_sky_ghi(elevation_deg: f64, doy: f64) -> f64 {
    if elevation_deg <= 0.1 {
        return 0.0;
    }
    let b = day_angle(doy);
    let sin_alpha = (elevation_deg * DEG).sin();

    // Eccentricity-corrected extraterrestrial irradiance
    let e0 = SC * (1.00011
        + 0.034221 * b.cos()
        + 0.00128 * b.sin()
        + 0.000719 * (2.0 * b).cos()
        + 0.000077 * (2.0 * b).sin());

    // Air mass – Kasten & Young (1989)
    let am = (1.0 / (sin_alpha + 0.50572 * (elevation_deg + 6.07995_f64).powf(-1.6364))).max(1.0);

    // Rayleigh
    let tr = (-0.0903 * am.powf(0.84) * (1.0 + am - am.powf(1.01))).exp();
    // Ozone (standard column 0.3 atm-cm)
    let to = 1.0 - 0.0013 * am;
    // Aerosol (Linke turbidity 3.0 – typical continental)
    let tk = 3.0_f64;
    let ta = (-0.09 * tk.powf(0.978) * am.powf(0.9455)).exp();
    // Water vapour (precipitable water 1.5 cm)
    let tw = 1.0 - 0.0075 * am.powf(0.65);

    let total_t = tr * to * ta * tw;
    let dni = 0.9762 * e0 * total_t;
    let dhi = 0.79 * e0 * sin_alpha * (1.0 - total_t)
        * (0.5 * (1.0 - tr) + back_scatter_coeff(ta))
        / (1.0 - am + am.powf(1.02));

    (dni * sin_alpha + dhi).max(0.0)
}

// Approximated from Bird (1981) Table 2
#[inline]
fn back_scatter_coeff(ta: f64) -> f64 {
    0.5 * (0.92 - ta.ln().abs() / 10.0).clamp(0.2, 0.5)
}
