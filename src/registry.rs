//! Session registry: the lifecycle state machine for progress indicators.
//!
//! A [`SessionRegistry`] owns every live session and its rendered
//! representation. Callers refer to sessions only by id. Operations on an id
//! that is not active are logged and ignored; the only failure a caller ever
//! sees is the one its own tracked operation produced.

use std::collections::HashMap;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::Receiver;
use std::sync::{Arc, Weak};
use std::time::Duration;

use futures::FutureExt;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::config::BeaconConfig;
use crate::error::SessionError;
use crate::events::{CancelBus, CancelTrigger};
use crate::render::{Renderer, SessionView};
use crate::session::{new_session_id, Session, SessionConfig, SessionSnapshot, SessionUpdate};

struct RegistryState {
    sessions: HashMap<String, Session>,
    next_generation: u64,
}

struct RegistryInner {
    state: Mutex<RegistryState>,
    renderer: Arc<dyn Renderer>,
    config: BeaconConfig,
    cancel_bus: CancelBus,
    cancel_rx: Mutex<Receiver<CancelTrigger>>,
}

impl Drop for RegistryInner {
    fn drop(&mut self) {
        for (_, session) in self.state.get_mut().sessions.drain() {
            self.renderer.destroy(session.handle);
        }
    }
}

/// Handle to a registry. Clones share the same sessions.
#[derive(Clone)]
pub struct SessionRegistry {
    inner: Arc<RegistryInner>,
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("active", &self.active_ids())
            .finish()
    }
}

impl SessionRegistry {
    pub fn new(renderer: Arc<dyn Renderer>) -> Self {
        Self::with_config(renderer, BeaconConfig::default())
    }

    pub fn with_config(renderer: Arc<dyn Renderer>, config: BeaconConfig) -> Self {
        let (cancel_bus, cancel_rx) = CancelBus::new_pair();
        Self {
            inner: Arc::new(RegistryInner {
                state: Mutex::new(RegistryState {
                    sessions: HashMap::new(),
                    next_generation: 1,
                }),
                renderer,
                config,
                cancel_bus,
                cancel_rx: Mutex::new(cancel_rx),
            }),
        }
    }

    pub fn config(&self) -> &BeaconConfig {
        &self.inner.config
    }

    /// Show a session under `id`, replacing any live session with that id.
    ///
    /// The previous session is destroyed first; its cancel hook never fires.
    /// An empty id gets a generated one; any other id is used verbatim.
    /// Returns the id.
    pub fn show(&self, id: impl Into<String>, config: SessionConfig) -> String {
        let mut id = id.into();
        if id.is_empty() {
            id = new_session_id(&self.inner.config.id_prefix);
        }

        let mut state = self.inner.state.lock();
        if let Some(previous) = state.sessions.remove(&id) {
            debug!(session_id = %id, generation = previous.generation, "replacing session");
            self.inner.renderer.destroy(previous.handle);
        }

        let generation = state.next_generation;
        state.next_generation += 1;

        let view = SessionView::from_config(&id, &config, &self.inner.config.defaults);
        let handle = self.inner.renderer.materialize(&view);
        let session = Session::new(view, config.on_cancel, generation, handle);
        state.sessions.insert(id.clone(), session);
        debug!(session_id = %id, generation, "session shown");
        id
    }

    /// Show a session under a freshly generated id.
    pub fn show_unnamed(&self, config: SessionConfig) -> String {
        self.show(new_session_id(&self.inner.config.id_prefix), config)
    }

    /// Apply a partial update. Unknown ids and out-of-range phases are ignored.
    pub fn update(&self, id: &str, update: SessionUpdate) {
        if let Err(err) = self.try_update(id, &update) {
            debug!(session_id = %id, error = %err, "update ignored");
        }
    }

    fn try_update(&self, id: &str, update: &SessionUpdate) -> Result<(), SessionError> {
        let mut state = self.inner.state.lock();
        let session = state
            .sessions
            .get_mut(id)
            .ok_or_else(|| SessionError::UnknownSession(id.to_string()))?;

        let (render, rejected) = session.apply(update);
        if !render.is_empty() {
            self.inner.renderer.apply_update(session.handle, &render);
        }
        match rejected {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Switch to the open-ended indicator. The stored progress is kept, not shown.
    pub fn set_indeterminate(&self, id: &str) {
        let mut state = self.inner.state.lock();
        let Some(session) = state.sessions.get_mut(id) else {
            debug!(session_id = %id, "set_indeterminate on inactive session");
            return;
        };
        session.indeterminate = true;
        self.inner.renderer.apply_spinner_mode(session.handle);
    }

    /// Destroy the session's representation and forget it. Idempotent.
    pub fn hide(&self, id: &str) {
        if let Err(err) = self.remove_where(id, |_| true) {
            debug!(session_id = %id, error = %err, "hide ignored");
        }
    }

    /// Hide `id` only while it is still the session of the given generation.
    fn hide_generation(&self, id: &str, generation: u64) {
        match self.remove_where(id, |s| s.generation == generation) {
            Ok(true) => {}
            Ok(false) => debug!(session_id = %id, generation, "session replaced; skipping hide"),
            Err(_) => debug!(session_id = %id, generation, "session already hidden"),
        }
    }

    fn remove_where(
        &self,
        id: &str,
        matches: impl FnOnce(&Session) -> bool,
    ) -> Result<bool, SessionError> {
        let mut state = self.inner.state.lock();
        let session = state
            .sessions
            .get(id)
            .ok_or_else(|| SessionError::UnknownSession(id.to_string()))?;
        if !matches(session) {
            return Ok(false);
        }
        if let Some(session) = state.sessions.remove(id) {
            self.inner.renderer.destroy(session.handle);
            debug!(session_id = %session.id(), generation = session.generation, "session hidden");
        }
        Ok(true)
    }

    /// Hide every session active at the time of the call.
    pub fn hide_all(&self) {
        for id in self.active_ids() {
            self.hide(&id);
        }
    }

    pub fn is_active(&self, id: &str) -> bool {
        self.inner.state.lock().sessions.contains_key(id)
    }

    /// Active ids in creation order.
    pub fn active_ids(&self) -> Vec<String> {
        let state = self.inner.state.lock();
        let mut live: Vec<(u64, &String)> = state
            .sessions
            .iter()
            .map(|(id, s)| (s.generation, id))
            .collect();
        live.sort_unstable_by_key(|(generation, _)| *generation);
        live.into_iter().map(|(_, id)| id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.inner.state.lock().sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn snapshot(&self, id: &str) -> Option<SessionSnapshot> {
        self.inner.state.lock().sessions.get(id).map(Session::snapshot)
    }

    /// Time since the session was shown.
    pub fn elapsed(&self, id: &str) -> Option<Duration> {
        self.inner.state.lock().sessions.get(id).map(Session::elapsed)
    }

    /// Sender for renderers and hosts to report cancel triggers.
    pub fn cancel_bus(&self) -> CancelBus {
        self.inner.cancel_bus.clone()
    }

    /// Handle every cancel trigger reported so far. Returns how many cancelled a session.
    pub fn pump_cancellations(&self) -> usize {
        let pending: Vec<CancelTrigger> = self.inner.cancel_rx.lock().try_iter().collect();
        pending
            .iter()
            .filter(|trigger| self.cancel(&trigger.session_id))
            .count()
    }

    /// Advisory cancellation of a cancellable session.
    ///
    /// Runs the cancel hook (at most once per session) and then hides the
    /// session, even if the hook fails or panics. Returns `false` when `id` is
    /// inactive or not cancellable.
    pub fn cancel(&self, id: &str) -> bool {
        let (generation, callback) = {
            let mut state = self.inner.state.lock();
            let Some(session) = state.sessions.get_mut(id) else {
                debug!(session_id = %id, "cancel on inactive session");
                return false;
            };
            if !session.view.cancellable {
                debug!(session_id = %id, "cancel on non-cancellable session");
                return false;
            }
            (session.generation, session.on_cancel.take())
        };

        // The hook runs unlocked so it may call back into the registry.
        if let Some(callback) = callback {
            if let Err(err) = run_cancel_callback(id, callback) {
                warn!(session_id = %id, error = %err, "cancel callback failed");
            }
        }

        self.hide_generation(id, generation);
        true
    }

    /// Show a compact, non-cancellable notification that hides itself.
    ///
    /// `duration` defaults to the configured notification duration. The timer
    /// only hides this exact session: replacing the id disarms it.
    pub fn show_notification(&self, message: impl Into<String>, duration: Option<Duration>) -> String {
        let config = SessionConfig::new()
            .title(message)
            .message("")
            .show_progress(false)
            .compact(true);
        let id = self.show_unnamed(config);
        let duration = duration.unwrap_or_else(|| self.inner.config.notification.duration());

        if let Some(generation) = self.generation_of(&id) {
            self.schedule_hide(id.clone(), generation, duration);
        }
        id
    }

    fn generation_of(&self, id: &str) -> Option<u64> {
        self.inner.state.lock().sessions.get(id).map(|s| s.generation)
    }

    fn schedule_hide(&self, id: String, generation: u64, duration: Duration) {
        let weak: Weak<RegistryInner> = Arc::downgrade(&self.inner);
        let fire = move || {
            if let Some(inner) = weak.upgrade() {
                SessionRegistry { inner }.hide_generation(&id, generation);
            }
        };

        // A runtime built without `enable_time` panics on `sleep`; such hosts
        // get the thread timer instead.
        let sleep = tokio::runtime::Handle::try_current().ok().and_then(|handle| {
            panic::catch_unwind(|| tokio::time::sleep(duration))
                .ok()
                .map(|sleep| (handle, sleep))
        });

        match sleep {
            Some((handle, sleep)) => {
                handle.spawn(async move {
                    sleep.await;
                    fire();
                });
            }
            None => {
                let spawned = std::thread::Builder::new()
                    .name("beacon-notification".to_string())
                    .spawn(move || {
                        std::thread::sleep(duration);
                        fire();
                    });
                if let Err(err) = spawned {
                    warn!(error = %err, "failed to schedule notification hide");
                }
            }
        }
    }

    /// Show an indeterminate session for the lifetime of `operation`.
    ///
    /// The session is hidden before the result is handed back, on success,
    /// failure, or panic (which is resumed after the hide). `show_progress`
    /// is always forced off.
    pub async fn track<Fut, T, E>(&self, operation: Fut, options: SessionConfig) -> Result<T, E>
    where
        Fut: Future<Output = Result<T, E>>,
    {
        self.track_with(move || operation, options).await
    }

    /// Like [`track`](Self::track) but builds the operation after the session
    /// is shown, so a failure while starting it is covered too.
    pub async fn track_with<F, Fut, T, E>(&self, start: F, options: SessionConfig) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let id = self.show_unnamed(options.show_progress(false));
        let generation = self.generation_of(&id).unwrap_or_default();

        let outcome = match panic::catch_unwind(AssertUnwindSafe(start)) {
            Ok(operation) => AssertUnwindSafe(operation).catch_unwind().await,
            Err(payload) => Err(payload),
        };

        self.hide_generation(&id, generation);

        match outcome {
            Ok(result) => result,
            Err(payload) => panic::resume_unwind(payload),
        }
    }
}

fn run_cancel_callback(
    id: &str,
    callback: crate::session::CancelCallback,
) -> Result<(), SessionError> {
    let failure = |reason: String| SessionError::CallbackFailure {
        id: id.to_string(),
        reason,
    };
    match panic::catch_unwind(AssertUnwindSafe(callback)) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => Err(failure(err.to_string())),
        Err(payload) => Err(failure(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic".to_string()
    }
}
