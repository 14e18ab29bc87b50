//! Marker aggregation and filtering
//!
//! The visible marker list is a pure projection of
//! (seed records, store records, filter state) - no hidden state, no
//! caching. Recomputed by the caller whenever any input changes.

pub mod seed;

pub use seed::{SeedCatalog, SeedError};

use crate::domain::Report;

/// Search and scope settings applied to the combined marker set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterState {
    /// Free text matched case-insensitively against title and description
    pub search_query: String,

    /// When set, only user-created reports are shown
    pub only_mine: bool,
}

/// Counts backing the stats card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerStats {
    /// Markers currently visible under the active filter
    pub total_visible: usize,
    /// All user-created reports, independent of the filter
    pub mine: usize,
}

/// Produce the ordered visible marker list.
///
/// Seed records come first, then user reports in creation order; filtering
/// preserves that order. User reports are always part of the base set; seed
/// records drop out only under `only_mine`.
pub fn visible_markers(
    seed: &[Report],
    user_reports: &[Report],
    filter: &FilterState,
) -> Vec<Report> {
    let base: Vec<&Report> = if filter.only_mine {
        user_reports.iter().collect()
    } else {
        seed.iter().chain(user_reports.iter()).collect()
    };

    let query = filter.search_query.trim().to_lowercase();
    if query.is_empty() {
        return base.into_iter().cloned().collect();
    }

    base.into_iter()
        .filter(|r| r.matches_query(&query))
        .cloned()
        .collect()
}

/// Stats for the currently visible set.
pub fn stats(visible: &[Report], user_reports: &[Report]) -> MarkerStats {
    MarkerStats {
        total_visible: visible.len(),
        mine: user_reports.len(),
    }
}
