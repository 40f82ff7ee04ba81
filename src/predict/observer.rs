// WGS-84
const EARTH_SEMI_MAJOR_AXIS_KM: f64 = 6378.137;
const EARTH_ECCENTRICITY_SQ: f64 = 0.006_694_379_990_14;

/// Fixed ground location in geodetic radians
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observer {
    pub latitude_rad: f64,
    pub longitude_rad: f64,
    pub height_m: f64,
}

impl Observer {
    /// Longitude is wrapped into [-180, 180) before conversion
    pub fn from_degrees(latitude_deg: f64, longitude_deg: f64, height_m: f64) -> Self {
        let longitude_deg = wrap_longitude_deg(longitude_deg);
        Self {
            latitude_rad: latitude_deg.to_radians(),
            longitude_rad: longitude_deg.to_radians(),
            height_m,
        }
    }

    pub fn position_ecef_km(&self) -> [f64; 3] {
        let sin_lat = self.latitude_rad.sin();
        let cos_lat = self.latitude_rad.cos();
        let sin_lon = self.longitude_rad.sin();
        let cos_lon = self.longitude_rad.cos();
        let n = EARTH_SEMI_MAJOR_AXIS_KM / (1.0 - EARTH_ECCENTRICITY_SQ * sin_lat * sin_lat).sqrt();
        let height_km = self.height_m / 1000.0;
        [
            (n + height_km) * cos_lat * cos_lon,
            (n + height_km) * cos_lat * sin_lon,
            (n * (1.0 - EARTH_ECCENTRICITY_SQ) + height_km) * sin_lat,
        ]
    }
}

pub fn wrap_longitude_deg(longitude_deg: f64) -> f64 {
    (longitude_deg + 180.0).rem_euclid(360.0) - 180.0
}
