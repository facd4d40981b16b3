use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use beacon::SessionConfig;

use crate::integration::test_utils::recording_registry;

fn counting_hook(counter: &Arc<AtomicUsize>) -> impl FnOnce() -> anyhow::Result<()> + Send + 'static {
    let counter = counter.clone();
    move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[test]
fn bus_trigger_fires_hook_and_hides() {
    let (registry, renderer) = recording_registry();
    let calls = Arc::new(AtomicUsize::new(0));
    registry.show(
        "upload",
        SessionConfig::new()
            .cancellable(true)
            .on_cancel(counting_hook(&calls)),
    );

    let bus = registry.cancel_bus();
    bus.trigger("upload").unwrap();
    bus.trigger("upload").unwrap();

    assert_eq!(registry.pump_cancellations(), 1);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(!registry.is_active("upload"));
    assert_eq!(renderer.live_count(), 0);
}

#[test]
fn failing_hook_still_hides() {
    let (registry, _) = recording_registry();
    registry.show(
        "upload",
        SessionConfig::new()
            .cancellable(true)
            .on_cancel(|| Err(anyhow::anyhow!("network gone"))),
    );

    assert!(registry.cancel("upload"));
    assert!(!registry.is_active("upload"));
}

#[test]
fn cancellable_without_hook_just_hides() {
    let (registry, _) = recording_registry();
    registry.show("upload", SessionConfig::new().cancellable(true));
    assert!(registry.cancel("upload"));
    assert!(!registry.is_active("upload"));
}

#[test]
fn replaced_session_hook_never_fires() {
    let (registry, _) = recording_registry();
    let first = Arc::new(AtomicUsize::new(0));
    let second = Arc::new(AtomicUsize::new(0));
    registry.show(
        "job",
        SessionConfig::new()
            .cancellable(true)
            .on_cancel(counting_hook(&first)),
    );
    registry.show(
        "job",
        SessionConfig::new()
            .cancellable(true)
            .on_cancel(counting_hook(&second)),
    );

    assert!(registry.cancel("job"));
    assert_eq!(first.load(Ordering::SeqCst), 0);
    assert_eq!(second.load(Ordering::SeqCst), 1);
}

#[test]
fn hook_replacing_its_own_id_keeps_the_new_session() {
    let (registry, _) = recording_registry();
    let handle = registry.clone();
    registry.show(
        "job",
        SessionConfig::new().cancellable(true).on_cancel(move || {
            handle.show("job", SessionConfig::new().title("Rolling back"));
            Ok(())
        }),
    );

    assert!(registry.cancel("job"));
    let snapshot = registry.snapshot("job").unwrap();
    assert_eq!(snapshot.title, "Rolling back");
}

#[test]
fn non_cancellable_trigger_is_ignored() {
    let (registry, _) = recording_registry();
    let calls = Arc::new(AtomicUsize::new(0));
    registry.show("job", SessionConfig::new().on_cancel(counting_hook(&calls)));

    registry.cancel_bus().trigger("job").unwrap();
    assert_eq!(registry.pump_cancellations(), 0);
    assert!(registry.is_active("job"));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}
