//! Seed marker catalog
//!
//! Seed reports are loaded once at startup, either from the embedded
//! default document or from an operator-supplied JSON file, and never
//! change afterwards.

use crate::domain::Report;
use std::path::Path;
use tracing::info;

/// Default seed document compiled into the binary.
const DEFAULT_SEED: &str = include_str!("seed_markers.json");

/// Seed catalog errors
#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("failed to read seed file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed seed document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("duplicate seed id: {0}")]
    DuplicateId(u32),

    #[error("seed record {id} has non-finite coordinates")]
    InvalidCoordinates { id: u32 },
}

/// The immutable seed marker set.
pub struct SeedCatalog {
    records: Vec<Report>,
}

impl SeedCatalog {
    /// Load from `path` when configured, otherwise the embedded default.
    pub fn load(path: Option<&Path>) -> Result<Self, SeedError> {
        match path {
            Some(path) => {
                info!("Loading seed markers from {:?}", path);
                let doc = std::fs::read_to_string(path)?;
                Self::from_json(&doc)
            }
            None => Self::from_json(DEFAULT_SEED),
        }
    }

    pub fn from_json(doc: &str) -> Result<Self, SeedError> {
        let records: Vec<Report> = serde_json::from_str(doc)?;

        let mut seen = std::collections::HashSet::new();
        for record in &records {
            if !seen.insert(record.id) {
                return Err(SeedError::DuplicateId(record.id));
            }
            if !record.coordinates.is_finite() {
                return Err(SeedError::InvalidCoordinates { id: record.id });
            }
        }

        info!("Loaded {} seed markers", records.len());
        Ok(Self { records })
    }

    pub fn records(&self) -> &[Report] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
