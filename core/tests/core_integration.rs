//! Core wiring: startup, filtering, marker selection, current location

mod helpers;

use helpers::{drain_notices, wait_for_event};
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;
use tm_core::device::PermissionStatus;
use tm_core::infrastructure::events::Event;
use tm_core::testing::{devices, fresh_fix, ScriptedFixes, ScriptedOutcome, ScriptedPermissions};
use tm_core::viewport::FOCUS_ZOOM;
use tm_core::Core;

async fn core_with(
    permissions: ScriptedPermissions,
) -> (Core, Arc<ScriptedPermissions>, Arc<ScriptedFixes>, tempfile::TempDir) {
    let _ = tracing_subscriber::fmt::try_init();

    let dir = tempdir().unwrap();
    let permissions = Arc::new(permissions);
    let fixes = Arc::new(ScriptedFixes::new());
    let core = Core::new(
        dir.path().to_path_buf(),
        devices(permissions.clone(), fixes.clone()),
    )
    .await
    .expect("Failed to create core");
    (core, permissions, fixes, dir)
}

#[tokio::test]
async fn test_startup_loads_seed_markers() {
    let (core, permissions, _fixes, _dir) = core_with(ScriptedPermissions::granted()).await;

    let markers = core.visible_markers().await;
    assert_eq!(markers.len(), core.seed.len());
    assert!(core.has_location_permission());
    // Already granted, so no prompt was shown
    assert_eq!(permissions.foreground_requests(), 0);
}

#[tokio::test]
async fn test_startup_prompts_when_not_granted() {
    let (core, permissions, _fixes, _dir) =
        core_with(ScriptedPermissions::prompt(PermissionStatus::Granted)).await;

    assert!(core.has_location_permission());
    assert_eq!(permissions.foreground_requests(), 1);
}

#[tokio::test]
async fn test_search_and_scope_filtering() {
    let (core, _permissions, _fixes, _dir) = core_with(ScriptedPermissions::granted()).await;

    // A query matching nothing in the seed set
    core.set_search_query("xyzzy-no-such-report").await;
    assert!(core.visible_markers().await.is_empty());

    core.clear_search().await;
    core.set_only_mine(true).await;
    assert!(core.visible_markers().await.is_empty());

    core.set_only_mine(false).await;
    let stats = core.stats().await;
    assert_eq!(stats.total_visible, core.seed.len());
    assert_eq!(stats.mine, 0);
}

#[tokio::test]
async fn test_select_marker_focuses_and_requests_detail() {
    let (core, _permissions, _fixes, _dir) = core_with(ScriptedPermissions::granted()).await;
    let mut rx = core.events.subscribe();

    let seed_first = core.seed.records()[0].clone();
    let selected = core.select_marker(seed_first.id).await.unwrap();
    assert_eq!(selected.id, seed_first.id);

    let camera = core.viewport.camera().await;
    assert_eq!(camera.center, seed_first.coordinates);
    assert_eq!(camera.zoom, FOCUS_ZOOM);

    wait_for_event(&mut rx, Duration::from_secs(1), |e| {
        matches!(e, Event::MarkerDetailRequested { id } if *id == seed_first.id)
    })
    .await;
}

#[tokio::test]
async fn test_select_unknown_marker_is_none() {
    let (core, _permissions, _fixes, _dir) = core_with(ScriptedPermissions::granted()).await;
    assert!(core.select_marker(9999).await.is_none());
}

#[tokio::test]
async fn test_goto_current_location_centers_camera() {
    let (core, _permissions, fixes, _dir) = core_with(ScriptedPermissions::granted()).await;
    fixes.push_outcome(ScriptedOutcome::ok(fresh_fix(106.77, -6.25)));

    core.goto_current_location().await;

    let camera = core.viewport.camera().await;
    assert_eq!(camera.center.lng, 106.77);
    assert_eq!(camera.zoom, FOCUS_ZOOM);
}

#[tokio::test]
async fn test_goto_current_location_denied_notifies() {
    let (core, _permissions, _fixes, _dir) =
        core_with(ScriptedPermissions::prompt(PermissionStatus::Denied)).await;
    let mut rx = core.events.subscribe();

    core.goto_current_location().await;

    assert!(!core.has_location_permission());
    let notices = drain_notices(&mut rx);
    assert_eq!(notices, vec!["Permission to access location was denied"]);
}

#[tokio::test]
async fn test_goto_current_location_failure_notifies() {
    let (core, _permissions, _fixes, _dir) = core_with(ScriptedPermissions::granted()).await;
    let mut rx = core.events.subscribe();

    // No scripted outcome: the live fix request fails
    core.goto_current_location().await;

    let notices = drain_notices(&mut rx);
    assert_eq!(notices, vec!["Failed to get current location"]);
}

#[tokio::test]
async fn test_shutdown_saves_config_and_emits() {
    let (core, _permissions, _fixes, dir) = core_with(ScriptedPermissions::granted()).await;
    let mut rx = core.events.subscribe();

    core.shutdown().await.unwrap();

    assert!(dir.path().join("trashmap.json").exists());
    wait_for_event(&mut rx, Duration::from_secs(1), |e| {
        matches!(e, Event::CoreShutdown)
    })
    .await;
}

#[tokio::test]
async fn test_full_report_round_trip_through_core() {
    let (core, _permissions, fixes, _dir) = core_with(ScriptedPermissions::granted()).await;
    fixes.push_outcome(ScriptedOutcome::ok(fresh_fix(106.82, -6.17)));

    core.report_flow.open().await;
    let deadline = tokio::time::Instant::now() + Duration::from_secs(1);
    while core.report_flow.draft().await.fix.is_none() {
        assert!(tokio::time::Instant::now() < deadline, "no fix within 1s");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    core.report_flow.set_title("Trash pile").await;
    core.report_flow.set_description("Behind the market").await;
    let report = core.report_flow.submit().await.unwrap();
    assert_eq!(report.id, 101);

    // The new report joins the visible set after the seed records
    let markers = core.visible_markers().await;
    assert_eq!(markers.last().unwrap().id, 101);
    assert_eq!(core.stats().await.mine, 1);

    // And the "mine" scope shows exactly the user report
    core.set_only_mine(true).await;
    let mine = core.visible_markers().await;
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].id, 101);
}
