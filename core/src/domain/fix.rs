//! Location fixes and accuracy tiers

use crate::domain::geo::LngLat;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Which level of the acquisition cascade produced a fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccuracyTier {
    /// Served from the device's last-known-position cache
    Cached,
    /// Live fix at balanced accuracy
    Balanced,
    /// Live fix at the lowest accuracy the device offers
    Lowest,
}

impl std::fmt::Display for AccuracyTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccuracyTier::Cached => write!(f, "cached"),
            AccuracyTier::Balanced => write!(f, "balanced"),
            AccuracyTier::Lowest => write!(f, "lowest"),
        }
    }
}

/// A raw coordinate reading as reported by the device location API.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fix {
    pub coordinates: LngLat,
    pub captured_at: DateTime<Utc>,
}

impl Fix {
    pub fn new(coordinates: LngLat, captured_at: DateTime<Utc>) -> Self {
        Self {
            coordinates,
            captured_at,
        }
    }

    /// Time elapsed since the reading was captured. Clamped at zero for
    /// readings stamped slightly in the future by a skewed device clock.
    pub fn age(&self) -> Duration {
        (Utc::now() - self.captured_at)
            .max(ChronoDuration::zero())
            .to_std()
            .unwrap_or(Duration::ZERO)
    }
}

/// A classified fix produced by the acquisition cascade.
///
/// Transient: held by the in-progress report flow, never persisted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationFix {
    pub coordinates: LngLat,
    pub accuracy_tier: AccuracyTier,
    pub captured_at: DateTime<Utc>,
    /// True only when the fix came from the last-resort stale-cache
    /// fallback; callers must warn the user.
    pub stale: bool,
}

impl LocationFix {
    pub fn from_reading(fix: Fix, accuracy_tier: AccuracyTier, stale: bool) -> Self {
        Self {
            coordinates: fix.coordinates,
            accuracy_tier,
            captured_at: fix.captured_at,
            stale,
        }
    }

    pub fn age(&self) -> Duration {
        Fix::new(self.coordinates, self.captured_at).age()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fix_age() {
        let fix = Fix::new(
            LngLat::new(106.8, -6.2),
            Utc::now() - ChronoDuration::seconds(90),
        );
        let age = fix.age();
        assert!(age >= Duration::from_secs(89) && age <= Duration::from_secs(92));
    }

    #[test]
    fn test_future_capture_time_clamps_to_zero() {
        let fix = Fix::new(
            LngLat::new(106.8, -6.2),
            Utc::now() + ChronoDuration::seconds(30),
        );
        assert_eq!(fix.age(), Duration::ZERO);
    }
}
