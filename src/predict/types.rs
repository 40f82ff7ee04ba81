use chrono::{DateTime, Utc};

/// Observer-relative direction of the object at one instant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LookAngles {
    pub elevation_deg: f64,
    /// Always within [0, 360)
    pub azimuth_deg: f64,
}

/// A visibility window that has risen but not yet set
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingPass {
    pub start_time: DateTime<Utc>,
    pub start_azimuth_deg: f64,
    pub max_elevation_deg: f64,
}

impl PendingPass {
    pub fn open(start_time: DateTime<Utc>, look: LookAngles) -> Self {
        Self {
            start_time,
            start_azimuth_deg: look.azimuth_deg,
            max_elevation_deg: look.elevation_deg,
        }
    }

    pub fn close(self, end_time: DateTime<Utc>, end_azimuth_deg: f64) -> Pass {
        Pass {
            start_time: self.start_time,
            end_time,
            max_elevation_deg: self.max_elevation_deg,
            start_azimuth_deg: self.start_azimuth_deg,
            end_azimuth_deg,
            duration_seconds: (end_time - self.start_time).num_seconds(),
        }
    }
}

/// A completed visibility window
#[derive(Debug, Clone, PartialEq)]
pub struct Pass {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub max_elevation_deg: f64,
    pub start_azimuth_deg: f64,
    pub end_azimuth_deg: f64,
    pub duration_seconds: i64,
}
