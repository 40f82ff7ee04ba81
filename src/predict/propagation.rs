use std::f64::consts::{PI, TAU};

use chrono::{DateTime, Utc};
use sgp4::{Constants, Elements};

use crate::predict::{LookAngles, Observer, PredictError};
use crate::tle::ElementSet;

/// Position source for one compiled element set.
pub trait Propagator {
    /// TEME position in km. `PropagationSample` signals that no valid state
    /// exists at `timestamp` (decayed orbit, numeric failure).
    fn position_km(&self, timestamp: DateTime<Utc>) -> Result<[f64; 3], PredictError>;
}

/// Inertial -> Earth-fixed -> observer-relative conversions.
pub trait FrameConverter {
    /// Greenwich sidereal angle in radians
    fn sidereal_time(&self, timestamp: DateTime<Utc>) -> f64;

    fn inertial_to_earth_fixed(&self, position_km: [f64; 3], sidereal: f64) -> [f64; 3];

    fn look_angles(&self, observer: &Observer, position_ecef_km: [f64; 3]) -> RawLookAngles;
}

/// Converter output; azimuth may be any angle modulo 2π
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawLookAngles {
    pub elevation_rad: f64,
    pub azimuth_rad: f64,
}

pub struct Sgp4Propagator {
    elements: Elements,
    constants: Constants,
}

impl Sgp4Propagator {
    pub fn from_element_set(element_set: &ElementSet) -> Result<Self, PredictError> {
        let elements = Elements::from_tle(
            Some(element_set.name.clone()),
            element_set.line1.as_bytes(),
            element_set.line2.as_bytes(),
        )
        .map_err(|e| PredictError::PropagationInit(e.to_string()))?;

        let constants = Constants::from_elements(&elements)
            .map_err(|e| PredictError::PropagationInit(e.to_string()))?;

        Ok(Self {
            elements,
            constants,
        })
    }
}

impl Propagator for Sgp4Propagator {
    fn position_km(&self, timestamp: DateTime<Utc>) -> Result<[f64; 3], PredictError> {
        let minutes = self
            .elements
            .datetime_to_minutes_since_epoch(&timestamp.naive_utc())
            .map_err(|e| PredictError::PropagationSample(e.to_string()))?;

        let prediction = self
            .constants
            .propagate(minutes)
            .map_err(|e| PredictError::PropagationSample(e.to_string()))?;

        if prediction.position.iter().any(|c| !c.is_finite()) {
            return Err(PredictError::PropagationSample(
                "non-finite position".to_string(),
            ));
        }

        Ok(prediction.position)
    }
}

/// IAU sidereal time, TEME z-rotation and a WGS-84 ENU frame
pub struct Wgs84Converter;

impl FrameConverter for Wgs84Converter {
    fn sidereal_time(&self, timestamp: DateTime<Utc>) -> f64 {
        sgp4::iau_epoch_to_sidereal_time(sgp4::julian_years_since_j2000(&timestamp.naive_utc()))
    }

    fn inertial_to_earth_fixed(&self, position_km: [f64; 3], sidereal: f64) -> [f64; 3] {
        let cos_gmst = sidereal.cos();
        let sin_gmst = sidereal.sin();
        [
            position_km[0] * cos_gmst + position_km[1] * sin_gmst,
            -position_km[0] * sin_gmst + position_km[1] * cos_gmst,
            position_km[2],
        ]
    }

    fn look_angles(&self, observer: &Observer, position_ecef_km: [f64; 3]) -> RawLookAngles {
        let station = observer.position_ecef_km();
        let dr = [
            position_ecef_km[0] - station[0],
            position_ecef_km[1] - station[1],
            position_ecef_km[2] - station[2],
        ];
        let range_km = (dr[0] * dr[0] + dr[1] * dr[1] + dr[2] * dr[2]).sqrt();

        let (east, north, up) = ecef_to_enu(dr, observer.latitude_rad, observer.longitude_rad);
        let elevation_rad = if range_km > 0.0 {
            (up / range_km).asin()
        } else {
            0.0
        };

        RawLookAngles {
            elevation_rad,
            azimuth_rad: east.atan2(north),
        }
    }
}

fn ecef_to_enu(dr: [f64; 3], lat_rad: f64, lon_rad: f64) -> (f64, f64, f64) {
    let sin_lat = lat_rad.sin();
    let cos_lat = lat_rad.cos();
    let sin_lon = lon_rad.sin();
    let cos_lon = lon_rad.cos();

    let east = -sin_lon * dr[0] + cos_lon * dr[1];
    let north = -sin_lat * cos_lon * dr[0] - sin_lat * sin_lon * dr[1] + cos_lat * dr[2];
    let up = cos_lat * cos_lon * dr[0] + cos_lat * sin_lon * dr[1] + sin_lat * dr[2];
    (east, north, up)
}

/// Map an azimuth in radians (any range) to degrees in [0, 360).
///
/// The angle is first wrapped into [-π, π) and only then shifted, so
/// converter output outside a single revolution lands in range too.
pub fn normalize_azimuth_deg(azimuth_rad: f64) -> f64 {
    let wrapped = (azimuth_rad + PI).rem_euclid(TAU) - PI;
    let degrees = (wrapped.to_degrees() + 360.0).rem_euclid(360.0);
    // rem_euclid can round up to the modulus for tiny negative inputs
    if degrees >= 360.0 {
        0.0
    } else {
        degrees
    }
}

/// Propagate and convert a single sample into observer-relative degrees
pub fn look_angles_at<P, C>(
    propagator: &P,
    converter: &C,
    observer: &Observer,
    timestamp: DateTime<Utc>,
) -> Result<LookAngles, PredictError>
where
    P: Propagator + ?Sized,
    C: FrameConverter + ?Sized,
{
    let position = propagator.position_km(timestamp)?;
    let sidereal = converter.sidereal_time(timestamp);
    let earth_fixed = converter.inertial_to_earth_fixed(position, sidereal);
    let raw = converter.look_angles(observer, earth_fixed);

    Ok(LookAngles {
        elevation_deg: raw.elevation_rad.to_degrees(),
        azimuth_deg: normalize_azimuth_deg(raw.azimuth_rad),
    })
}
