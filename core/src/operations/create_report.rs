//! Report creation flow
//!
//! Drives one report draft at a time: opening the flow starts a location
//! cascade in the background, photos are captured through the device seam,
//! and submission validates locally before anything reaches the store.
//!
//! Each open()..close() session owns a cancellation token. Closing the flow
//! abandons interest in any in-flight cascade result and in the deferred
//! detail-open (their eventual resolutions become no-ops) without aborting
//! the underlying device requests.

use crate::device::{PermissionProvider, PhotoCapture};
use crate::domain::{LocationFix, PhotoRef, Report, ReportCreateArgs};
use crate::infrastructure::events::{Event, EventBus, Severity};
use crate::location::{LocationError, LocationService};
use crate::reports::ReportStore;
use crate::viewport::Viewport;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Local validation failures; these block submission and never reach the
/// store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("title is required")]
    MissingTitle,

    #[error("description is required")]
    MissingDescription,

    #[error("no location fix has been acquired")]
    MissingLocation,
}

impl ValidationError {
    pub fn user_message(&self) -> &'static str {
        "Please fill all fields and wait for location."
    }
}

/// Snapshot of the draft under construction.
#[derive(Debug, Clone, Default)]
pub struct DraftState {
    pub title: String,
    pub description: String,
    pub photos: Vec<PhotoRef>,
    pub fix: Option<LocationFix>,
    /// True while a cascade started by this flow is still running
    pub acquiring: bool,
}

pub struct ReportFlow {
    store: Arc<ReportStore>,
    location: Arc<LocationService>,
    viewport: Arc<Viewport>,
    permissions: Arc<dyn PermissionProvider>,
    camera: Arc<dyn PhotoCapture>,
    events: Arc<EventBus>,
    draft: Arc<RwLock<DraftState>>,
    /// Token for the current open()..close() session
    session: Mutex<CancellationToken>,
}

impl ReportFlow {
    pub fn new(
        store: Arc<ReportStore>,
        location: Arc<LocationService>,
        viewport: Arc<Viewport>,
        permissions: Arc<dyn PermissionProvider>,
        camera: Arc<dyn PhotoCapture>,
        events: Arc<EventBus>,
    ) -> Self {
        Self {
            store,
            location,
            viewport,
            permissions,
            camera,
            events,
            draft: Arc::new(RwLock::new(DraftState::default())),
            session: Mutex::new(CancellationToken::new()),
        }
    }

    /// Open the flow: reset the draft, start a new session, and kick off a
    /// location cascade in the background.
    pub async fn open(&self) {
        {
            let mut session = self.session.lock().await;
            session.cancel();
            *session = CancellationToken::new();
        }
        *self.draft.write().await = DraftState::default();
        debug!("report flow opened");
        self.start_acquire().await;
    }

    /// Re-run the cascade on user request. Last write wins across runs.
    pub async fn retry_location(&self) {
        self.start_acquire().await;
    }

    pub async fn set_title(&self, title: impl Into<String>) {
        self.draft.write().await.title = title.into();
    }

    pub async fn set_description(&self, description: impl Into<String>) {
        self.draft.write().await.description = description.into();
    }

    /// Capture a photo and append it to the draft. A denied camera
    /// permission warns; a cancelled capture is a silent no-op.
    pub async fn add_photo(&self) {
        if !self.permissions.request_camera().await.is_granted() {
            self.events.emit(Event::notice(
                Severity::Warning,
                "Camera permission denied. Please enable camera access in settings.",
            ));
            return;
        }

        if let Some(photo) = self.camera.capture_image().await {
            self.draft.write().await.photos.push(photo);
        }
    }

    /// Drop the photo at `index`; out-of-range is a no-op.
    pub async fn remove_photo(&self, index: usize) {
        let mut draft = self.draft.write().await;
        if index < draft.photos.len() {
            draft.photos.remove(index);
        }
    }

    pub async fn draft(&self) -> DraftState {
        self.draft.read().await.clone()
    }

    /// Validate and submit the draft. On success the report is stored, the
    /// camera focuses on it, and its detail view opens after the settle
    /// delay; the draft resets for the next report.
    pub async fn submit(&self) -> Result<Report, ValidationError> {
        let args = {
            let draft = self.draft.read().await;
            match Self::validate(&draft) {
                Ok(fix) => ReportCreateArgs {
                    coordinates: fix.coordinates,
                    title: draft.title.clone(),
                    description: draft.description.clone(),
                    photos: draft.photos.clone(),
                },
                Err(err) => {
                    self.events
                        .emit(Event::notice(Severity::Error, err.user_message()));
                    return Err(err);
                }
            }
        };

        let report = self.store.add_report(args).await;
        debug!(id = report.id, "report submitted");
        self.events
            .emit(Event::notice(Severity::Success, "Report submitted successfully!"));

        // The session completed; hand its token to the deferred detail-open
        // and start a fresh one, so a later close() cannot kill the
        // follow-up for an already-submitted report.
        let completed = {
            let mut session = self.session.lock().await;
            std::mem::replace(&mut *session, CancellationToken::new())
        };
        self.viewport
            .focus_on_new_report(report.coordinates, completed)
            .await;

        *self.draft.write().await = DraftState::default();
        Ok(report)
    }

    /// Close the flow early: reset the draft and abandon interest in any
    /// in-flight cascade and deferred follow-up.
    pub async fn close(&self) {
        self.session.lock().await.cancel();
        *self.draft.write().await = DraftState::default();
        debug!("report flow closed");
    }

    fn validate(draft: &DraftState) -> Result<LocationFix, ValidationError> {
        if draft.title.trim().is_empty() {
            return Err(ValidationError::MissingTitle);
        }
        if draft.description.trim().is_empty() {
            return Err(ValidationError::MissingDescription);
        }
        draft.fix.ok_or(ValidationError::MissingLocation)
    }

    async fn start_acquire(&self) {
        let token = self.session.lock().await.clone();
        self.draft.write().await.acquiring = true;

        let location = self.location.clone();
        let draft = self.draft.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            let outcome = location.acquire().await;

            if token.is_cancelled() {
                debug!("report flow closed; dropping cascade result");
                return;
            }

            let mut draft = draft.write().await;
            draft.acquiring = false;
            match outcome {
                Ok(fix) => {
                    if fix.stale {
                        events.emit(Event::notice(
                            Severity::Warning,
                            "Using last known location. GPS may be unavailable.",
                        ));
                    }
                    draft.fix = Some(fix);
                }
                Err(err) => {
                    let severity = match err {
                        LocationError::PermissionDenied => Severity::Warning,
                        _ => Severity::Error,
                    };
                    events.emit(Event::notice(severity, err.user_message()));
                }
            }
        });
    }
}
