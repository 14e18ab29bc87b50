//! Geographic primitives shared across the core

use serde::{Deserialize, Serialize};

/// Tolerance, in degrees per axis, used when matching a just-created report
/// back to its store record.
pub const COORD_MATCH_TOLERANCE: f64 = 0.0001;

/// A longitude/latitude pair in decimal degrees.
///
/// Serialized as `[lng, lat]` to stay compatible with the seed marker
/// documents and the map renderer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

impl LngLat {
    pub fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }

    /// Both axes are finite (not NaN or infinite).
    pub fn is_finite(&self) -> bool {
        self.lng.is_finite() && self.lat.is_finite()
    }

    /// True when `other` lies within `tolerance` degrees of `self` on each
    /// axis independently.
    pub fn within(&self, other: LngLat, tolerance: f64) -> bool {
        (self.lng - other.lng).abs() < tolerance && (self.lat - other.lat).abs() < tolerance
    }
}

impl From<[f64; 2]> for LngLat {
    fn from([lng, lat]: [f64; 2]) -> Self {
        Self { lng, lat }
    }
}

impl From<LngLat> for [f64; 2] {
    fn from(c: LngLat) -> Self {
        [c.lng, c.lat]
    }
}

impl std::fmt::Display for LngLat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}, {:.4}", self.lng, self.lat)
    }
}
