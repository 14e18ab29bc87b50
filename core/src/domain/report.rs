//! Report records - the markers shown on the map
//!
//! Seed reports ship with the app and are immutable; user reports are
//! created through the report store at runtime. Both share one record type.

use crate::domain::geo::LngLat;
use serde::{Deserialize, Serialize};

/// An opaque reference to a locally captured photo (a device asset URI).
/// The core never interprets the contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhotoRef(pub String);

impl From<&str> for PhotoRef {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A single trash report, seed or user-created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Unique within the combined seed + store data set
    pub id: u32,

    /// Report position as `[lng, lat]`
    pub coordinates: LngLat,

    pub title: String,
    pub description: String,

    /// Ordered capture sequence, may be empty
    #[serde(default)]
    pub photos: Vec<PhotoRef>,
}

impl Report {
    /// Case-insensitive substring match against title and description.
    pub fn matches_query(&self, lowered_query: &str) -> bool {
        self.title.to_lowercase().contains(lowered_query)
            || self.description.to_lowercase().contains(lowered_query)
    }
}

/// Arguments for creating a new report; the store assigns the id.
#[derive(Debug, Clone)]
pub struct ReportCreateArgs {
    pub coordinates: LngLat,
    pub title: String,
    pub description: String,
    pub photos: Vec<PhotoRef>,
}
