//! Coordinate math in degree space.
//!
//! The fleet deliberately uses raw Euclidean distance on (lat, lng) degrees
//! rather than a geodesic metric. At city scale the error is negligible and
//! dispatch outcomes stay comparable with the recorded behavior.

use serde::{Deserialize, Serialize};

/// Rough miles-per-degree conversion at mid latitudes, used for speed and
/// fare figures only.
pub const MILES_PER_DEGREE: f64 = 69.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Euclidean distance in degree space.
    pub fn distance_deg(self, other: Coordinate) -> f64 {
        let dlat = self.lat - other.lat;
        let dlng = self.lng - other.lng;
        (dlat * dlat + dlng * dlng).sqrt()
    }

    pub fn distance_miles(self, other: Coordinate) -> f64 {
        self.distance_deg(other) * MILES_PER_DEGREE
    }

    /// Linear interpolation; `t` is clamped to [0, 1].
    pub fn lerp(self, other: Coordinate, t: f64) -> Coordinate {
        let t = t.clamp(0.0, 1.0);
        Coordinate {
            lat: self.lat + (other.lat - self.lat) * t,
            lng: self.lng + (other.lng - self.lng) * t,
        }
    }

    /// Compass-style heading in degrees toward `other` (0 = north, 90 = east).
    pub fn heading_to(self, other: Coordinate) -> f64 {
        let dlng = other.lng - self.lng;
        let dlat = other.lat - self.lat;
        dlng.atan2(dlat).to_degrees()
    }
}
