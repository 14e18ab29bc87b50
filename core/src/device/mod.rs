//! Device platform seams
//!
//! The core never talks to OS location, camera, or keychain APIs directly.
//! Each capability is a trait the embedding shell implements; scripted
//! implementations live in [`crate::testing`].

use crate::domain::{AccuracyTier, Fix, PhotoRef};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Outcome of a permission probe or request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
}

impl PermissionStatus {
    pub fn is_granted(&self) -> bool {
        matches!(self, PermissionStatus::Granted)
    }
}

/// Foreground-location and camera permission API.
#[async_trait]
pub trait PermissionProvider: Send + Sync {
    /// Current foreground location permission without prompting.
    async fn foreground_status(&self) -> PermissionStatus;

    /// Prompt the user for foreground location permission.
    async fn request_foreground(&self) -> PermissionStatus;

    /// Prompt the user for camera permission.
    async fn request_camera(&self) -> PermissionStatus;
}

/// Transport or timeout failure from the device location API.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct FixError(pub String);

/// Device location-fix API.
#[async_trait]
pub trait FixProvider: Send + Sync {
    /// Whether device-level location services are enabled at all.
    async fn services_enabled(&self) -> bool;

    /// The most recent cached reading no older than `max_age`, if any.
    async fn last_known_fix(&self, max_age: Duration) -> Option<Fix>;

    /// A live reading at the requested accuracy. `timeout` is a hint to the
    /// device; the cascade enforces its own bound on top.
    async fn current_fix(&self, accuracy: AccuracyTier, timeout: Duration)
        -> Result<Fix, FixError>;
}

/// Camera capture API. `None` means the user cancelled the capture.
#[async_trait]
pub trait PhotoCapture: Send + Sync {
    async fn capture_image(&self) -> Option<PhotoRef>;
}

/// Opaque key/value secret storage (keychain-backed on device).
/// Read failures surface as `None`, matching the shell's best-effort reads.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn get(&self, key: &str) -> Option<String>;
    async fn set(&self, key: &str, value: &str);
    async fn delete(&self, key: &str);
}

/// The bundle of device capabilities the core is constructed with.
#[derive(Clone)]
pub struct Devices {
    pub permissions: Arc<dyn PermissionProvider>,
    pub fixes: Arc<dyn FixProvider>,
    pub camera: Arc<dyn PhotoCapture>,
    pub credentials: Arc<dyn CredentialStore>,
}
