//! Core domain types

pub mod fix;
pub mod geo;
pub mod report;

pub use fix::{AccuracyTier, Fix, LocationFix};
pub use geo::{LngLat, COORD_MATCH_TOLERANCE};
pub use report::{PhotoRef, Report, ReportCreateArgs};
