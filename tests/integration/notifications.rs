use std::time::Duration;

use beacon::config::BeaconConfig;
use beacon::SessionConfig;

use crate::integration::test_utils::{recording_registry, recording_registry_with};

#[tokio::test(start_paused = true)]
async fn notification_expires_on_its_own() {
    let (registry, renderer) = recording_registry();
    let id = registry.show_notification("done", Some(Duration::from_millis(50)));
    assert!(registry.is_active(&id));

    tokio::time::sleep(Duration::from_millis(60)).await;
    assert!(!registry.is_active(&id));
    assert_eq!(renderer.live_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn notification_shape() {
    let (registry, _) = recording_registry();
    let id = registry.show_notification("Saved", None);

    let snapshot = registry.snapshot(&id).unwrap();
    assert_eq!(snapshot.title, "Saved");
    assert!(snapshot.compact);
    assert!(!snapshot.cancellable);
    assert!(!snapshot.show_progress);
    assert!(snapshot.indeterminate);
}

#[tokio::test(start_paused = true)]
async fn default_duration_comes_from_config() {
    let mut config = BeaconConfig::default();
    config.notification.duration_ms = 200;
    let (registry, _) = recording_registry_with(config);
    let id = registry.show_notification("hello", None);

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(registry.is_active(&id));
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!registry.is_active(&id));
}

#[tokio::test(start_paused = true)]
async fn early_hide_makes_timer_a_no_op() {
    let (registry, renderer) = recording_registry();
    let id = registry.show_notification("bye", Some(Duration::from_millis(50)));
    registry.hide(&id);

    tokio::time::sleep(Duration::from_millis(60)).await;
    assert!(!registry.is_active(&id));
    assert_eq!(renderer.live_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn replaced_notification_is_not_hidden_by_stale_timer() {
    let (registry, _) = recording_registry();
    let id = registry.show_notification("first", Some(Duration::from_millis(50)));
    registry.show(id.clone(), SessionConfig::new().title("replacement"));

    tokio::time::sleep(Duration::from_millis(60)).await;
    let snapshot = registry.snapshot(&id).unwrap();
    assert_eq!(snapshot.title, "replacement");
}

#[test]
fn notification_expires_without_a_runtime() {
    let (registry, _) = recording_registry();
    let id = registry.show_notification("threaded", Some(Duration::from_millis(20)));
    assert!(registry.is_active(&id));

    let deadline = std::time::Instant::now() + Duration::from_secs(5);
    while registry.is_active(&id) && std::time::Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(5));
    }
    assert!(!registry.is_active(&id));
}

#[test]
fn notification_expires_on_a_runtime_without_timers() {
    let (registry, renderer) = recording_registry();
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();
    let id = runtime.block_on(async {
        registry.show_notification("no timers", Some(Duration::from_millis(20)))
    });
    assert!(registry.is_active(&id));

    let deadline = std::time::Instant::now() + Duration::from_secs(5);
    while registry.is_active(&id) && std::time::Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(5));
    }
    assert!(!registry.is_active(&id));
    assert_eq!(renderer.live_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn dropping_the_registry_disarms_pending_timers() {
    let (registry, renderer) = recording_registry();
    registry.show_notification("orphaned", Some(Duration::from_millis(50)));
    drop(registry);
    let calls_after_drop = renderer.calls().len();
    assert_eq!(renderer.live_count(), 0);

    tokio::time::sleep(Duration::from_millis(60)).await;
    assert_eq!(renderer.calls().len(), calls_after_drop);
}
