//! Location acquisition cascade behavior

use std::sync::Arc;
use std::time::Duration;
use tm_core::device::PermissionStatus;
use tm_core::domain::AccuracyTier;
use tm_core::infrastructure::events::EventBus;
use tm_core::location::{CascadeConfig, LocationError, LocationService};
use tm_core::testing::{
    fix_aged, fresh_fix, FixCall, ScriptedFixes, ScriptedOutcome, ScriptedPermissions,
};

fn fast_config() -> CascadeConfig {
    CascadeConfig {
        balanced_timeout_ms: 80,
        lowest_timeout_ms: 80,
        ..CascadeConfig::default()
    }
}

fn service(
    permissions: Arc<ScriptedPermissions>,
    fixes: Arc<ScriptedFixes>,
    config: CascadeConfig,
) -> LocationService {
    LocationService::new(permissions, fixes, Arc::new(EventBus::default()), config)
}

#[tokio::test]
async fn test_services_disabled_short_circuits() {
    let _ = tracing_subscriber::fmt::try_init();

    // Permission denied and a perfectly good cache: neither may matter.
    let permissions = Arc::new(ScriptedPermissions::prompt(PermissionStatus::Denied));
    let fixes = Arc::new(ScriptedFixes::services_disabled());
    fixes.set_cached(fresh_fix(106.8, -6.2));
    fixes.push_outcome(ScriptedOutcome::ok(fresh_fix(106.8, -6.2)));

    let service = service(permissions.clone(), fixes.clone(), fast_config());
    match service.acquire().await {
        Err(LocationError::ServicesDisabled) => {}
        other => panic!("expected ServicesDisabled, got {other:?}"),
    }

    // Short-circuit: no prompt shown, no fix API touched
    assert_eq!(permissions.foreground_requests(), 0);
    assert!(fixes.calls().is_empty());
}

#[tokio::test]
async fn test_permission_denied_terminates_cascade() {
    let permissions = Arc::new(ScriptedPermissions::prompt(PermissionStatus::Denied));
    let fixes = Arc::new(ScriptedFixes::new());
    fixes.set_cached(fresh_fix(106.8, -6.2));

    let service = service(permissions.clone(), fixes.clone(), fast_config());
    match service.acquire().await {
        Err(LocationError::PermissionDenied) => {}
        other => panic!("expected PermissionDenied, got {other:?}"),
    }

    assert_eq!(permissions.foreground_requests(), 1);
    assert!(fixes.calls().is_empty());
}

#[tokio::test]
async fn test_already_granted_permission_skips_prompt() {
    let permissions = Arc::new(ScriptedPermissions::granted());
    let fixes = Arc::new(ScriptedFixes::new());
    fixes.set_cached(fresh_fix(106.8, -6.2));

    let service = service(permissions.clone(), fixes, fast_config());
    service.acquire().await.unwrap();
    assert_eq!(permissions.foreground_requests(), 0);
}

#[tokio::test]
async fn test_fresh_cached_fix_avoids_live_calls() {
    let permissions = Arc::new(ScriptedPermissions::granted());
    let fixes = Arc::new(ScriptedFixes::new());
    fixes.set_cached(fix_aged(106.81, -6.21, Duration::from_secs(4 * 60)));

    let service = service(permissions, fixes.clone(), fast_config());
    let fix = service.acquire().await.unwrap();

    assert_eq!(fix.accuracy_tier, AccuracyTier::Cached);
    assert!(!fix.stale);
    assert!(fixes.no_live_calls());
}

#[tokio::test]
async fn test_balanced_fix_when_cache_is_too_old() {
    let permissions = Arc::new(ScriptedPermissions::granted());
    let fixes = Arc::new(ScriptedFixes::new());
    // Outside the 5-minute freshness window
    fixes.set_cached(fix_aged(106.8, -6.2, Duration::from_secs(10 * 60)));
    fixes.push_outcome(ScriptedOutcome::ok(fresh_fix(106.85, -6.19)));

    let service = service(permissions, fixes.clone(), fast_config());
    let fix = service.acquire().await.unwrap();

    assert_eq!(fix.accuracy_tier, AccuracyTier::Balanced);
    assert_eq!(
        fixes
            .calls()
            .iter()
            .filter(|c| matches!(c, FixCall::Current { .. }))
            .count(),
        1
    );
}

#[tokio::test]
async fn test_lowest_accuracy_retry_swallows_balanced_error() {
    let permissions = Arc::new(ScriptedPermissions::granted());
    let fixes = Arc::new(ScriptedFixes::new());
    fixes.push_outcome(ScriptedOutcome::err("kCLErrorLocationUnknown"));
    fixes.push_outcome(ScriptedOutcome::ok(fresh_fix(106.9, -6.3)));

    let service = service(permissions, fixes.clone(), fast_config());
    let fix = service.acquire().await.unwrap();

    assert_eq!(fix.accuracy_tier, AccuracyTier::Lowest);
    assert!(!fix.stale);
    assert_eq!(
        fixes.calls(),
        vec![
            FixCall::LastKnown {
                max_age: Duration::from_secs(300)
            },
            FixCall::Current {
                accuracy: AccuracyTier::Balanced
            },
            FixCall::Current {
                accuracy: AccuracyTier::Lowest
            },
        ]
    );
}

#[tokio::test]
async fn test_balanced_timeout_falls_through_to_lowest() {
    let permissions = Arc::new(ScriptedPermissions::granted());
    let fixes = Arc::new(ScriptedFixes::new());
    // Slower than the 80 ms bound
    fixes.push_outcome(ScriptedOutcome::ok(fresh_fix(1.0, 1.0)).after(Duration::from_millis(400)));
    fixes.push_outcome(ScriptedOutcome::ok(fresh_fix(106.9, -6.3)));

    let service = service(permissions, fixes, fast_config());
    let fix = service.acquire().await.unwrap();
    assert_eq!(fix.accuracy_tier, AccuracyTier::Lowest);
}

#[tokio::test]
async fn test_stale_cached_fallback_flags_fix() {
    let permissions = Arc::new(ScriptedPermissions::granted());
    let fixes = Arc::new(ScriptedFixes::new());
    // 30 minutes old: misses the fresh window, within the stale bound
    fixes.set_cached(fix_aged(106.7, -6.1, Duration::from_secs(30 * 60)));
    fixes.push_outcome(ScriptedOutcome::err("balanced failed"));
    fixes.push_outcome(ScriptedOutcome::err("lowest failed"));

    let service = service(permissions, fixes, fast_config());
    let fix = service.acquire().await.unwrap();

    assert_eq!(fix.accuracy_tier, AccuracyTier::Cached);
    assert!(fix.stale);
}

#[tokio::test]
async fn test_exhausted_cascade_preserves_balanced_error() {
    let permissions = Arc::new(ScriptedPermissions::granted());
    let fixes = Arc::new(ScriptedFixes::new());
    fixes.push_outcome(ScriptedOutcome::err("balanced transport error"));
    fixes.push_outcome(ScriptedOutcome::err("lowest transport error"));

    let service = service(permissions, fixes, fast_config());
    match service.acquire().await {
        Err(err @ LocationError::Unavailable { .. }) => {
            assert!(err.to_string().contains("balanced transport error"));
            assert_eq!(
                err.user_message(),
                "Unable to get your location. Please enable location services and GPS."
            );
        }
        other => panic!("expected Unavailable, got {other:?}"),
    }
}

#[tokio::test]
async fn test_superseded_invocation_does_not_overwrite_latest() {
    let permissions = Arc::new(ScriptedPermissions::granted());
    let fixes = Arc::new(ScriptedFixes::new());
    // First cascade's balanced attempt is slow, second one is instant
    fixes.push_outcome(ScriptedOutcome::ok(fresh_fix(1.0, 1.0)).after(Duration::from_millis(500)));
    fixes.push_outcome(ScriptedOutcome::ok(fresh_fix(2.0, 2.0)));

    let service = Arc::new(service(permissions, fixes, CascadeConfig::default()));

    let slow = {
        let service = service.clone();
        tokio::spawn(async move { service.acquire().await })
    };
    // Let the slow invocation claim the first scripted outcome
    tokio::time::sleep(Duration::from_millis(100)).await;

    let newer = service.acquire().await.unwrap();
    assert_eq!(newer.coordinates.lng, 2.0);

    // The slow invocation still resolves successfully...
    let superseded = slow.await.unwrap().unwrap();
    assert_eq!(superseded.coordinates.lng, 1.0);

    // ...but only the newer result was applied
    let latest = service.latest_fix().await.unwrap();
    assert_eq!(latest.coordinates.lng, 2.0);
}
