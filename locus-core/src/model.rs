use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Position fix as reported by a location provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
    /// Meters above the WGS84 ellipsoid.
    pub altitude: Option<f64>,
    /// Horizontal accuracy radius in meters.
    pub accuracy: Option<f64>,
    pub altitude_accuracy: Option<f64>,
    /// Degrees clockwise from true north, 0..360.
    pub heading: Option<f64>,
    /// Meters per second.
    pub speed: Option<f64>,
}

impl Coordinates {
    /// Bare latitude/longitude pair with every optional metric unknown.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            altitude: None,
            accuracy: None,
            altitude_accuracy: None,
            heading: None,
            speed: None,
        }
    }

    pub fn with_accuracy(mut self, meters: f64) -> Self {
        self.accuracy = Some(meters);
        self
    }

    /// Latitude and longitude are finite and inside their valid ranges.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationSample {
    pub coordinates: Coordinates,
    pub timestamp: DateTime<Utc>,
}

impl LocationSample {
    pub fn new(coordinates: Coordinates, timestamp: DateTime<Utc>) -> Self {
        Self { coordinates, timestamp }
    }

    /// Sample captured now.
    pub fn now(coordinates: Coordinates) -> Self {
        Self::new(coordinates, Utc::now())
    }

    pub fn is_renderable(&self) -> bool {
        self.coordinates.is_valid()
    }
}

/// Answer to a permission request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionResponse {
    pub granted: bool,
    /// Whether the platform would show the prompt again after a denial.
    pub can_ask_again: bool,
}

impl PermissionResponse {
    pub fn granted() -> Self {
        Self { granted: true, can_ask_again: true }
    }

    pub fn denied() -> Self {
        Self { granted: false, can_ask_again: true }
    }
}
