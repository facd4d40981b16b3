use beacon::config::BeaconConfig;
use beacon::render::RecordedCall;
use beacon::{PhaseStatus, SessionConfig, SessionUpdate};

use crate::integration::test_utils::{recording_registry, recording_registry_with};

#[test]
fn show_applies_defaults() {
    let (registry, _) = recording_registry();
    registry.show("s", SessionConfig::new());

    let snapshot = registry.snapshot("s").unwrap();
    assert_eq!(snapshot.title, "Processing...");
    assert_eq!(snapshot.message, "Please wait...");
    assert!(snapshot.show_progress);
    assert!(snapshot.show_percentage);
    assert!(!snapshot.cancellable);
    assert!(!snapshot.compact);
    assert!(snapshot.phases.is_empty());
    assert_eq!(snapshot.current_progress, 0.0);
    assert!(!snapshot.indeterminate);
    assert_eq!(snapshot.current_phase, None);
    assert_eq!(snapshot.details, None);
}

#[test]
fn configured_defaults_and_prefix_are_used() {
    let mut config = BeaconConfig::default();
    config.defaults.title = "Working".to_string();
    config.id_prefix = "job".to_string();
    let (registry, _) = recording_registry_with(config);

    let id = registry.show_unnamed(SessionConfig::new());
    assert!(id.starts_with("job-"));
    assert_eq!(registry.snapshot(&id).unwrap().title, "Working");
}

#[test]
fn spinner_sessions_start_indeterminate() {
    let (registry, renderer) = recording_registry();
    registry.show("s", SessionConfig::new().show_progress(false));
    assert!(registry.snapshot("s").unwrap().indeterminate);
    assert!(renderer.view_for("s").unwrap().spinner);
}

#[test]
fn progress_is_clamped() {
    let (registry, renderer) = recording_registry();
    registry.show("s", SessionConfig::new());

    registry.update("s", SessionUpdate::new().progress(150.0));
    assert_eq!(registry.snapshot("s").unwrap().current_progress, 100.0);
    assert_eq!(renderer.view_for("s").unwrap().progress, Some(100.0));

    registry.update("s", SessionUpdate::new().progress(-5.0));
    assert_eq!(registry.snapshot("s").unwrap().current_progress, 0.0);
}

#[test]
fn duplicate_id_replaces_previous_session() {
    let (registry, renderer) = recording_registry();
    registry.show("x", SessionConfig::new().title("A"));
    registry.update("x", SessionUpdate::new().progress(80.0));
    registry.show("x", SessionConfig::new().title("B").show_progress(false));

    let live = renderer.live_for("x");
    assert_eq!(live.len(), 1);
    assert_eq!(live[0].view.title, "B");

    let snapshot = registry.snapshot("x").unwrap();
    assert_eq!(snapshot.title, "B");
    assert_eq!(snapshot.current_progress, 0.0);
    assert_eq!(registry.len(), 1);

    let calls = renderer.calls();
    let first_destroy = calls
        .iter()
        .position(|c| matches!(c, RecordedCall::Destroy { .. }))
        .unwrap();
    let second_materialize = calls
        .iter()
        .enumerate()
        .filter(|(_, c)| matches!(c, RecordedCall::Materialize { .. }))
        .map(|(i, _)| i)
        .nth(1)
        .unwrap();
    assert!(first_destroy < second_materialize);
}

#[test]
fn hide_is_idempotent() {
    let (registry, renderer) = recording_registry();
    registry.show("x", SessionConfig::new());
    registry.hide("x");
    registry.hide("x");
    assert!(!registry.is_active("x"));
    assert_eq!(renderer.live_count(), 0);

    let destroys = renderer
        .calls()
        .into_iter()
        .filter(|c| matches!(c, RecordedCall::Destroy { .. }))
        .count();
    assert_eq!(destroys, 1);
}

#[test]
fn determinate_update_overrides_indeterminate() {
    let (registry, renderer) = recording_registry();
    registry.show("x", SessionConfig::new());
    registry.set_indeterminate("x");
    registry.update("x", SessionUpdate::new().progress(40.0));

    let snapshot = registry.snapshot("x").unwrap();
    assert!(!snapshot.indeterminate);
    assert_eq!(snapshot.current_progress, 40.0);
    let drawn = renderer.view_for("x").unwrap();
    assert!(!drawn.spinner);
    assert_eq!(drawn.progress, Some(40.0));
}

#[test]
fn out_of_range_phase_leaves_phase_unchanged() {
    let (registry, _) = recording_registry();
    registry.show("x", SessionConfig::new().phases(["a", "b"]));
    registry.update("x", SessionUpdate::new().phase(1));
    registry.update("x", SessionUpdate::new().phase(5));
    assert_eq!(registry.snapshot("x").unwrap().current_phase, Some(1));
}

#[test]
fn phase_update_recomputes_statuses() {
    let (registry, renderer) = recording_registry();
    registry.show("x", SessionConfig::new().phases(["fetch", "build", "test"]));
    assert!(renderer
        .view_for("x")
        .unwrap()
        .phases
        .iter()
        .all(|s| *s == PhaseStatus::Pending));

    registry.update("x", SessionUpdate::new().phase(1));
    assert_eq!(
        renderer.view_for("x").unwrap().phases,
        vec![PhaseStatus::Completed, PhaseStatus::Active, PhaseStatus::Pending]
    );
}

#[test]
fn text_fields_are_replaced() {
    let (registry, renderer) = recording_registry();
    registry.show("x", SessionConfig::new());
    registry.update("x", SessionUpdate::new().message("halfway").details("12 of 24"));

    let snapshot = registry.snapshot("x").unwrap();
    assert_eq!(snapshot.message, "halfway");
    assert_eq!(snapshot.details.as_deref(), Some("12 of 24"));
    assert_eq!(renderer.view_for("x").unwrap().message, "halfway");
}

#[test]
fn show_elapsed_wins_over_details() {
    let (registry, _) = recording_registry();
    registry.show("x", SessionConfig::new());
    registry.update("x", SessionUpdate::new().details("manual").show_elapsed());

    let details = registry.snapshot("x").unwrap().details.unwrap();
    assert!(details.starts_with("Elapsed: "));
    assert!(details.ends_with('s'));
    assert!(registry.elapsed("x").is_some());
}

#[test]
fn operations_on_unknown_ids_are_no_ops() {
    let (registry, renderer) = recording_registry();
    registry.update("ghost", SessionUpdate::new().progress(10.0));
    registry.set_indeterminate("ghost");
    registry.hide("ghost");
    assert!(!registry.cancel("ghost"));
    assert!(!registry.is_active("ghost"));
    assert!(registry.snapshot("ghost").is_none());
    assert!(renderer.calls().is_empty());
}

#[test]
fn hide_all_clears_registry() {
    let (registry, renderer) = recording_registry();
    for id in ["a", "b", "c"] {
        registry.show(id, SessionConfig::new());
    }
    assert_eq!(registry.active_ids(), vec!["a", "b", "c"]);

    registry.hide_all();
    assert!(registry.is_empty());
    assert!(registry.active_ids().is_empty());
    assert_eq!(renderer.live_count(), 0);
}

#[test]
fn sessions_are_independent() {
    let (registry, _) = recording_registry();
    registry.show("a", SessionConfig::new());
    registry.show("b", SessionConfig::new());
    registry.update("a", SessionUpdate::new().progress(90.0));
    registry.hide("b");

    assert_eq!(registry.snapshot("a").unwrap().current_progress, 90.0);
    assert!(registry.is_active("a"));
    assert!(!registry.is_active("b"));
}
