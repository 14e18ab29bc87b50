//! Camera/viewport synchronizer
//!
//! Holds the authoritative camera directive the map renderer consumes every
//! render. Every directive swaps the whole state behind one lock, so a new
//! center can never be observed with a stale zoom.

use crate::domain::{LngLat, Report, COORD_MATCH_TOLERANCE};
use crate::infrastructure::events::{Event, EventBus};
use crate::reports::ReportStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Default map center (Jakarta) and city-level zoom.
pub const DEFAULT_CENTER: LngLat = LngLat {
    lng: 106.8456,
    lat: -6.2088,
};
pub const DEFAULT_ZOOM: f64 = 10.0;

/// Zoom and animation used when focusing a single marker or fix.
pub const FOCUS_ZOOM: f64 = 15.0;
pub const FOCUS_ANIMATION_MS: u32 = 1000;

/// How long the camera animation gets to settle before the detail view for
/// a just-created report is requested.
const DETAIL_SETTLE_DELAY: Duration = Duration::from_millis(500);

/// A complete camera directive. All three fields always change together.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraState {
    pub center: LngLat,
    pub zoom: f64,
    pub animation_ms: u32,
}

impl Default for CameraState {
    fn default() -> Self {
        Self {
            center: DEFAULT_CENTER,
            zoom: DEFAULT_ZOOM,
            animation_ms: 0,
        }
    }
}

impl CameraState {
    /// An animated focus directive on `center`.
    pub fn focused_on(center: LngLat) -> Self {
        Self {
            center,
            zoom: FOCUS_ZOOM,
            animation_ms: FOCUS_ANIMATION_MS,
        }
    }
}

/// Maintains the authoritative [`CameraState`] and schedules the deferred
/// detail-open that follows a new report.
pub struct Viewport {
    camera: RwLock<CameraState>,
    /// Camera restored by [`reset_to_default`](Self::reset_to_default)
    home: CameraState,
    store: Arc<ReportStore>,
    events: Arc<EventBus>,
    settle_delay: Duration,
}

impl Viewport {
    pub fn new(store: Arc<ReportStore>, events: Arc<EventBus>, home: CameraState) -> Self {
        Self {
            camera: RwLock::new(home),
            home,
            store,
            events,
            settle_delay: DETAIL_SETTLE_DELAY,
        }
    }

    /// Shrink the settle delay; test hook.
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Atomic snapshot of the current directive.
    pub async fn camera(&self) -> CameraState {
        *self.camera.read().await
    }

    /// Jump back to the home view with no animation.
    pub async fn reset_to_default(&self) {
        self.apply(self.home).await;
    }

    /// Animated focus on an existing marker.
    pub async fn focus_on_marker(&self, report: &Report) {
        self.apply(CameraState::focused_on(report.coordinates)).await;
    }

    /// Animated focus on an acquired location fix.
    pub async fn focus_on_fix(&self, coordinates: LngLat) {
        self.apply(CameraState::focused_on(coordinates)).await;
    }

    /// Animated focus on a just-created report, plus a deferred follow-up:
    /// once the camera has had `settle_delay` to move, the newest store
    /// record within [`COORD_MATCH_TOLERANCE`] of `coordinates` (ties go to
    /// the highest id) gets a detail-view request.
    ///
    /// The follow-up runs on `interest`; cancelling the token before the
    /// delay elapses makes the whole thing a no-op.
    pub async fn focus_on_new_report(&self, coordinates: LngLat, interest: CancellationToken) {
        self.apply(CameraState::focused_on(coordinates)).await;

        let store = self.store.clone();
        let events = self.events.clone();
        let delay = self.settle_delay;
        tokio::spawn(async move {
            tokio::select! {
                _ = interest.cancelled() => {
                    debug!("detail follow-up cancelled before settle delay");
                    return;
                }
                _ = tokio::time::sleep(delay) => {}
            }
            if interest.is_cancelled() {
                return;
            }

            let records = store.records().await;
            let target = records
                .iter()
                .filter(|r| r.coordinates.within(coordinates, COORD_MATCH_TOLERANCE))
                .max_by_key(|r| r.id);

            match target {
                Some(report) => {
                    debug!(id = report.id, "requesting detail view for new report");
                    events.emit(Event::MarkerDetailRequested { id: report.id });
                }
                None => debug!("no store record within tolerance of new-report focus"),
            }
        });
    }

    async fn apply(&self, next: CameraState) {
        *self.camera.write().await = next;
        self.events.emit(Event::CameraMoved { camera: next });
    }
}
