//! Location acquisition cascade
//!
//! Device location APIs are unreliable indoors, in low-power modes, and on
//! cold starts. A single-attempt strategy fails often enough to matter, so
//! acquisition runs as an explicit tier sequence that escalates accuracy
//! demands downward only after failure and prefers a fresh fix over a stale
//! one except as last resort:
//!
//! 1. services check
//! 2. foreground permission
//! 3. cached fix (max 5 min old)
//! 4. live fix, balanced accuracy, bounded
//! 5. live fix, lowest accuracy, bounded
//! 6. any cached fix up to 1 h old (flagged stale)
//!
//! Tiers run strictly sequentially within an invocation. Across invocations,
//! only the most recent invocation may publish into the shared latest-fix
//! slot; superseded resolutions are discarded.

use crate::device::{FixError, FixProvider, PermissionProvider};
use crate::domain::{AccuracyTier, Fix, LocationFix};
use crate::infrastructure::events::{Event, EventBus};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Classified outcome of an exhausted or short-circuited cascade.
///
/// No raw transport error crosses this boundary; everything folds into one
/// of these variants with the underlying message kept for diagnostics.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LocationError {
    #[error("device location services are disabled")]
    ServicesDisabled,

    #[error("foreground location permission was denied")]
    PermissionDenied,

    #[error("no location fix could be acquired: {detail}")]
    Unavailable { detail: String },
}

impl LocationError {
    /// The message the presentation layer shows for this failure.
    pub fn user_message(&self) -> &'static str {
        match self {
            LocationError::ServicesDisabled => {
                "Location services are disabled. Please enable them in your device settings."
            }
            LocationError::PermissionDenied => "Permission to access location was denied",
            LocationError::Unavailable { .. } => {
                "Unable to get your location. Please enable location services and GPS."
            }
        }
    }
}

/// Tier timing knobs. Defaults mirror the production values; tests compress
/// them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CascadeConfig {
    /// Max age for the fast cached-fix tier
    pub fresh_max_age_ms: u64,
    /// Max age for the last-resort cached fallback
    pub stale_max_age_ms: u64,
    /// Bound on the balanced-accuracy attempt
    pub balanced_timeout_ms: u64,
    /// Bound on the lowest-accuracy retry
    pub lowest_timeout_ms: u64,
}

impl Default for CascadeConfig {
    fn default() -> Self {
        Self {
            fresh_max_age_ms: 5 * 60 * 1000,
            stale_max_age_ms: 60 * 60 * 1000,
            balanced_timeout_ms: 5_000,
            lowest_timeout_ms: 10_000,
        }
    }
}

impl CascadeConfig {
    pub fn fresh_max_age(&self) -> Duration {
        Duration::from_millis(self.fresh_max_age_ms)
    }

    pub fn stale_max_age(&self) -> Duration {
        Duration::from_millis(self.stale_max_age_ms)
    }

    pub fn balanced_timeout(&self) -> Duration {
        Duration::from_millis(self.balanced_timeout_ms)
    }

    pub fn lowest_timeout(&self) -> Duration {
        Duration::from_millis(self.lowest_timeout_ms)
    }
}

/// Runs acquisition cascades and holds the latest applied fix.
///
/// `acquire` is idempotent and re-entrant: a manual retry simply runs a
/// fresh cascade. Each invocation captures a monotonically increasing token
/// at start; the token is compared at resolution time and only the latest
/// invocation publishes (last write wins).
pub struct LocationService {
    permissions: Arc<dyn PermissionProvider>,
    fixes: Arc<dyn FixProvider>,
    events: Arc<EventBus>,
    config: CascadeConfig,
    invocation: AtomicU64,
    latest: RwLock<Option<LocationFix>>,
}

impl LocationService {
    pub fn new(
        permissions: Arc<dyn PermissionProvider>,
        fixes: Arc<dyn FixProvider>,
        events: Arc<EventBus>,
        config: CascadeConfig,
    ) -> Self {
        Self {
            permissions,
            fixes,
            events,
            config,
            invocation: AtomicU64::new(0),
            latest: RwLock::new(None),
        }
    }

    /// Run one full cascade. Returns the classified fix, and publishes it to
    /// [`latest_fix`](Self::latest_fix) unless a newer invocation has
    /// started in the meantime.
    pub async fn acquire(&self) -> Result<LocationFix, LocationError> {
        let token = self.invocation.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(token, "location cascade started");

        let outcome = self.run_cascade().await;

        match &outcome {
            Ok(fix) => {
                let current = self.invocation.load(Ordering::SeqCst);
                if token == current {
                    *self.latest.write().await = Some(*fix);
                    debug!(token, tier = %fix.accuracy_tier, stale = fix.stale, "fix applied");
                    self.events.emit(Event::LocationResolved {
                        tier: fix.accuracy_tier,
                        stale: fix.stale,
                    });
                } else {
                    debug!(token, current, "discarding superseded cascade result");
                }
            }
            Err(err) => warn!(token, %err, "location cascade failed"),
        }

        outcome
    }

    /// The most recently applied fix, if any cascade has succeeded.
    pub async fn latest_fix(&self) -> Option<LocationFix> {
        *self.latest.read().await
    }

    pub fn config(&self) -> &CascadeConfig {
        &self.config
    }

    async fn run_cascade(&self) -> Result<LocationFix, LocationError> {
        if !self.fixes.services_enabled().await {
            return Err(LocationError::ServicesDisabled);
        }

        self.ensure_permission().await?;

        // Fast path: a cached fix fresh enough to trust.
        if let Some(fix) = self.fixes.last_known_fix(self.config.fresh_max_age()).await {
            debug!(age = ?fix.age(), "using fresh cached fix");
            return Ok(LocationFix::from_reading(fix, AccuracyTier::Cached, false));
        }

        let balanced_err = match self
            .bounded_fix(AccuracyTier::Balanced, self.config.balanced_timeout())
            .await
        {
            Ok(fix) => {
                return Ok(LocationFix::from_reading(fix, AccuracyTier::Balanced, false));
            }
            Err(err) => {
                warn!(%err, "balanced-accuracy fix failed, retrying at lowest accuracy");
                err
            }
        };

        match self
            .bounded_fix(AccuracyTier::Lowest, self.config.lowest_timeout())
            .await
        {
            // The balanced-tier error is intentionally discarded on success.
            Ok(fix) => return Ok(LocationFix::from_reading(fix, AccuracyTier::Lowest, false)),
            Err(err) => warn!(%err, "lowest-accuracy fix failed"),
        }

        // Last resort: any cached fix up to the stale bound. Flagged so the
        // caller warns the user.
        if let Some(fix) = self.fixes.last_known_fix(self.config.stale_max_age()).await {
            warn!(age = ?fix.age(), "falling back to stale cached fix");
            return Ok(LocationFix::from_reading(fix, AccuracyTier::Cached, true));
        }

        Err(LocationError::Unavailable {
            detail: balanced_err.to_string(),
        })
    }

    async fn ensure_permission(&self) -> Result<(), LocationError> {
        if self.permissions.foreground_status().await.is_granted() {
            return Ok(());
        }
        if self.permissions.request_foreground().await.is_granted() {
            return Ok(());
        }
        Err(LocationError::PermissionDenied)
    }

    /// A live fix attempt bounded by `limit` even when the provider ignores
    /// its timeout hint.
    async fn bounded_fix(&self, accuracy: AccuracyTier, limit: Duration) -> Result<Fix, FixError> {
        match timeout(limit, self.fixes.current_fix(accuracy, limit)).await {
            Ok(result) => result,
            Err(_) => Err(FixError(format!(
                "timed out after {limit:?} waiting for {accuracy} fix"
            ))),
        }
    }
}
