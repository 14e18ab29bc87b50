//! Scripted device implementations for tests
//!
//! These stand in for the platform shell: permissions and fix outcomes are
//! scripted up front, and every call is recorded so tests can assert which
//! tiers actually ran.

use crate::device::{
    CredentialStore, Devices, FixError, FixProvider, PermissionProvider, PermissionStatus,
    PhotoCapture,
};
use crate::domain::{AccuracyTier, Fix, LngLat, PhotoRef};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A fix captured `age` ago at the given coordinates.
pub fn fix_aged(lng: f64, lat: f64, age: Duration) -> Fix {
    Fix::new(
        LngLat::new(lng, lat),
        Utc::now() - chrono::Duration::from_std(age).unwrap_or_else(|_| chrono::Duration::zero()),
    )
}

/// A fix captured just now.
pub fn fresh_fix(lng: f64, lat: f64) -> Fix {
    fix_aged(lng, lat, Duration::ZERO)
}

/// Permission provider with scripted answers.
pub struct ScriptedPermissions {
    foreground: Mutex<PermissionStatus>,
    grant_on_request: bool,
    camera: PermissionStatus,
    foreground_requests: AtomicUsize,
}

impl ScriptedPermissions {
    /// Foreground already granted, camera granted.
    pub fn granted() -> Self {
        Self {
            foreground: Mutex::new(PermissionStatus::Granted),
            grant_on_request: true,
            camera: PermissionStatus::Granted,
            foreground_requests: AtomicUsize::new(0),
        }
    }

    /// Foreground not yet granted; the request prompt resolves to
    /// `on_request`.
    pub fn prompt(on_request: PermissionStatus) -> Self {
        Self {
            foreground: Mutex::new(PermissionStatus::Denied),
            grant_on_request: on_request.is_granted(),
            camera: PermissionStatus::Granted,
            foreground_requests: AtomicUsize::new(0),
        }
    }

    pub fn with_camera(mut self, camera: PermissionStatus) -> Self {
        self.camera = camera;
        self
    }

    /// How many times the foreground prompt was shown.
    pub fn foreground_requests(&self) -> usize {
        self.foreground_requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PermissionProvider for ScriptedPermissions {
    async fn foreground_status(&self) -> PermissionStatus {
        *self.foreground.lock().unwrap()
    }

    async fn request_foreground(&self) -> PermissionStatus {
        self.foreground_requests.fetch_add(1, Ordering::SeqCst);
        if self.grant_on_request {
            *self.foreground.lock().unwrap() = PermissionStatus::Granted;
            PermissionStatus::Granted
        } else {
            PermissionStatus::Denied
        }
    }

    async fn request_camera(&self) -> PermissionStatus {
        self.camera
    }
}

/// One scripted answer for a live-fix request.
pub struct ScriptedOutcome {
    /// Simulated device latency before the result is produced
    pub delay: Duration,
    pub result: Result<Fix, String>,
}

impl ScriptedOutcome {
    pub fn ok(fix: Fix) -> Self {
        Self {
            delay: Duration::ZERO,
            result: Ok(fix),
        }
    }

    pub fn err(message: &str) -> Self {
        Self {
            delay: Duration::ZERO,
            result: Err(message.to_string()),
        }
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Calls observed by [`ScriptedFixes`].
#[derive(Debug, Clone, PartialEq)]
pub enum FixCall {
    LastKnown { max_age: Duration },
    Current { accuracy: AccuracyTier },
}

/// Fix provider with a scripted cache and a queue of live-fix outcomes.
/// Live requests consume outcomes in order, matching the cascade's strictly
/// sequential tiers.
pub struct ScriptedFixes {
    services_enabled: bool,
    cached: Mutex<Option<Fix>>,
    outcomes: Mutex<VecDeque<ScriptedOutcome>>,
    calls: Mutex<Vec<FixCall>>,
}

impl ScriptedFixes {
    pub fn new() -> Self {
        Self {
            services_enabled: true,
            cached: Mutex::new(None),
            outcomes: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn services_disabled() -> Self {
        Self {
            services_enabled: false,
            ..Self::new()
        }
    }

    /// Set the device's cached reading; freshness is derived from its
    /// capture time against the requested max age.
    pub fn set_cached(&self, fix: Fix) {
        *self.cached.lock().unwrap() = Some(fix);
    }

    pub fn push_outcome(&self, outcome: ScriptedOutcome) {
        self.outcomes.lock().unwrap().push_back(outcome);
    }

    pub fn calls(&self) -> Vec<FixCall> {
        self.calls.lock().unwrap().clone()
    }

    /// True when no live-fix request was ever made.
    pub fn no_live_calls(&self) -> bool {
        !self
            .calls()
            .iter()
            .any(|c| matches!(c, FixCall::Current { .. }))
    }
}

impl Default for ScriptedFixes {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FixProvider for ScriptedFixes {
    async fn services_enabled(&self) -> bool {
        self.services_enabled
    }

    async fn last_known_fix(&self, max_age: Duration) -> Option<Fix> {
        self.calls
            .lock()
            .unwrap()
            .push(FixCall::LastKnown { max_age });
        let cached = *self.cached.lock().unwrap();
        cached.filter(|fix| fix.age() <= max_age)
    }

    async fn current_fix(
        &self,
        accuracy: AccuracyTier,
        _timeout: Duration,
    ) -> Result<Fix, FixError> {
        self.calls
            .lock()
            .unwrap()
            .push(FixCall::Current { accuracy });

        let outcome = self.outcomes.lock().unwrap().pop_front();
        match outcome {
            Some(outcome) => {
                if !outcome.delay.is_zero() {
                    tokio::time::sleep(outcome.delay).await;
                }
                outcome.result.map_err(FixError)
            }
            None => Err(FixError("no scripted fix outcome".to_string())),
        }
    }
}

/// Photo capture with a queue of canned results; an empty queue means the
/// user cancelled.
pub struct StubCamera {
    photos: Mutex<VecDeque<PhotoRef>>,
}

impl StubCamera {
    pub fn new() -> Self {
        Self {
            photos: Mutex::new(VecDeque::new()),
        }
    }

    pub fn with_photos(refs: &[&str]) -> Self {
        Self {
            photos: Mutex::new(refs.iter().map(|r| PhotoRef::from(*r)).collect()),
        }
    }
}

impl Default for StubCamera {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PhotoCapture for StubCamera {
    async fn capture_image(&self) -> Option<PhotoRef> {
        self.photos.lock().unwrap().pop_front()
    }
}

/// In-memory credential store.
pub struct MemoryCredentialStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self {
            values: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for MemoryCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn get(&self, key: &str) -> Option<String> {
        self.values.lock().unwrap().get(key).cloned()
    }

    async fn set(&self, key: &str, value: &str) {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }

    async fn delete(&self, key: &str) {
        self.values.lock().unwrap().remove(key);
    }
}

/// A full device bundle from individual fakes.
pub fn devices(permissions: Arc<ScriptedPermissions>, fixes: Arc<ScriptedFixes>) -> Devices {
    Devices {
        permissions,
        fixes,
        camera: Arc::new(StubCamera::new()),
        credentials: Arc::new(MemoryCredentialStore::new()),
    }
}
