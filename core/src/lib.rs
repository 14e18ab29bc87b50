//! Trashmap Core
//!
//! Headless core of the trash-report map app: seed + user markers with
//! search and scope filtering, a tiered location-acquisition cascade, and
//! the camera directives the map renderer consumes. The presentation layer
//! subscribes to the event bus and calls into [`Core`].

pub mod config;
pub mod device;
pub mod domain;
pub mod infrastructure;
pub mod location;
pub mod markers;
pub mod operations;
pub mod reports;
pub mod testing;
pub mod viewport;

use crate::config::AppConfig;
use crate::device::Devices;
use crate::infrastructure::api::{ApiClient, AuthService, UserService};
use crate::infrastructure::events::{Event, EventBus, Severity};
use crate::location::LocationService;
use crate::markers::{FilterState, MarkerStats, SeedCatalog};
use crate::operations::ReportFlow;
use crate::reports::ReportStore;
use crate::viewport::Viewport;
use anyhow::Result;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// The main context for all core operations
pub struct Core {
    /// Application configuration
    config: Arc<RwLock<AppConfig>>,

    /// Event bus for state changes and notices
    pub events: Arc<EventBus>,

    /// Immutable seed markers
    pub seed: Arc<SeedCatalog>,

    /// User-submitted reports
    pub reports: Arc<ReportStore>,

    /// Location acquisition
    pub location: Arc<LocationService>,

    /// Camera directives for the map renderer
    pub viewport: Arc<Viewport>,

    /// Report creation workflow
    pub report_flow: Arc<ReportFlow>,

    /// Demo API: authentication
    pub auth: Arc<AuthService>,

    /// Demo API: profile updates
    pub users: Arc<UserService>,

    devices: Devices,
    filter: RwLock<FilterState>,
    has_location_permission: AtomicBool,
}

impl Core {
    /// Initialize the core with a data directory and the platform's device
    /// implementations.
    pub async fn new(data_dir: PathBuf, devices: Devices) -> Result<Self> {
        info!("Initializing Trashmap core at {:?}", data_dir);

        // 1. Load or create app config
        let config = AppConfig::load_or_create(&data_dir)?;

        // 2. Create event bus
        let events = Arc::new(EventBus::default());

        // 3. Load the seed marker catalog
        let seed = Arc::new(SeedCatalog::load(config.seed_path.as_deref())?);

        // 4. Report store
        let reports = Arc::new(ReportStore::new(events.clone()));

        // 5. Location service
        let location = Arc::new(LocationService::new(
            devices.permissions.clone(),
            devices.fixes.clone(),
            events.clone(),
            config.cascade.clone(),
        ));

        // 6. Viewport, opening on the configured home camera
        let viewport = Arc::new(Viewport::new(
            reports.clone(),
            events.clone(),
            config.default_camera,
        ));

        // 7. Report creation flow
        let report_flow = Arc::new(ReportFlow::new(
            reports.clone(),
            location.clone(),
            viewport.clone(),
            devices.permissions.clone(),
            devices.camera.clone(),
            events.clone(),
        ));

        // 8. Demo API services
        let api = Arc::new(ApiClient::new(
            config.api_base_url.clone(),
            devices.credentials.clone(),
        )?);
        let auth = Arc::new(AuthService::new(api.clone(), devices.credentials.clone()));
        let users = Arc::new(UserService::new(api));

        let core = Self {
            config: Arc::new(RwLock::new(config)),
            events,
            seed,
            reports,
            location,
            viewport,
            report_flow,
            auth,
            users,
            devices,
            filter: RwLock::new(FilterState::default()),
            has_location_permission: AtomicBool::new(false),
        };

        // 9. Probe location permission so the map can show the user dot
        core.probe_location_permission().await;

        core.events.emit(Event::CoreStarted);
        info!("Core initialized");
        Ok(core)
    }

    /// Get the application configuration
    pub fn config(&self) -> Arc<RwLock<AppConfig>> {
        self.config.clone()
    }

    /// Whether foreground location permission was granted at startup or
    /// since.
    pub fn has_location_permission(&self) -> bool {
        self.has_location_permission.load(Ordering::SeqCst)
    }

    /// The ordered marker list under the active filter.
    pub async fn visible_markers(&self) -> Vec<domain::Report> {
        let filter = self.filter.read().await.clone();
        let user_reports = self.reports.records().await;
        markers::visible_markers(self.seed.records(), &user_reports, &filter)
    }

    /// Counts for the stats card.
    pub async fn stats(&self) -> MarkerStats {
        let visible = self.visible_markers().await;
        let user_reports = self.reports.records().await;
        markers::stats(&visible, &user_reports)
    }

    pub async fn filter(&self) -> FilterState {
        self.filter.read().await.clone()
    }

    pub async fn set_search_query(&self, query: impl Into<String>) {
        self.filter.write().await.search_query = query.into();
    }

    pub async fn clear_search(&self) {
        self.filter.write().await.search_query.clear();
    }

    pub async fn set_only_mine(&self, only_mine: bool) {
        self.filter.write().await.only_mine = only_mine;
    }

    /// Handle a marker selection from the map renderer: focus the camera and
    /// request the detail view.
    pub async fn select_marker(&self, id: u32) -> Option<domain::Report> {
        let report = match self.find_marker(id).await {
            Some(report) => report,
            None => {
                warn!(id, "selected marker not found");
                return None;
            }
        };

        self.viewport.focus_on_marker(&report).await;
        self.events.emit(Event::MarkerDetailRequested { id });
        Some(report)
    }

    /// The current-location button: prompt for permission if needed, then
    /// center the camera on a live fix.
    pub async fn goto_current_location(&self) {
        if !self.devices.permissions.request_foreground().await.is_granted() {
            self.has_location_permission.store(false, Ordering::SeqCst);
            self.events.emit(Event::notice(
                Severity::Error,
                "Permission to access location was denied",
            ));
            return;
        }
        self.has_location_permission.store(true, Ordering::SeqCst);

        let timeout = self.location.config().balanced_timeout();
        match self
            .devices
            .fixes
            .current_fix(domain::AccuracyTier::Balanced, timeout)
            .await
        {
            Ok(fix) => self.viewport.focus_on_fix(fix.coordinates).await,
            Err(err) => {
                warn!(%err, "current-location request failed");
                self.events
                    .emit(Event::notice(Severity::Error, "Failed to get current location"));
            }
        }
    }

    /// Shutdown the core gracefully
    pub async fn shutdown(&self) -> Result<()> {
        info!("Shutting down Trashmap core...");

        self.report_flow.close().await;
        self.config.read().await.save()?;
        self.events.emit(Event::CoreShutdown);

        info!("Core shutdown complete");
        Ok(())
    }

    async fn find_marker(&self, id: u32) -> Option<domain::Report> {
        if let Some(report) = self.seed.records().iter().find(|r| r.id == id) {
            return Some(report.clone());
        }
        self.reports.get(id).await
    }

    /// Check foreground permission on startup, prompting once when it is
    /// not yet granted.
    async fn probe_location_permission(&self) {
        let permissions = &self.devices.permissions;
        let granted = if permissions.foreground_status().await.is_granted() {
            true
        } else {
            permissions.request_foreground().await.is_granted()
        };

        debug!(granted, "startup location permission probe");
        self.has_location_permission.store(granted, Ordering::SeqCst);
    }
}
