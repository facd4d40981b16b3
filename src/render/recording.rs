//! In-memory renderer that keeps the drawn state and a log of every call.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::render::{RenderHandle, RenderUpdate, Renderer, SessionView};
use crate::session::{phase_statuses, PhaseStatus};

#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    Materialize { handle: RenderHandle, id: String },
    Update { handle: RenderHandle, update: RenderUpdate },
    Spinner { handle: RenderHandle },
    Destroy { handle: RenderHandle },
}

/// What a live handle currently shows.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedSession {
    pub view: SessionView,
    pub message: String,
    pub details: Option<String>,
    pub progress: Option<f64>,
    pub spinner: bool,
    pub phases: Vec<PhaseStatus>,
}

#[derive(Debug, Default)]
struct RecordingState {
    next_handle: u64,
    live: HashMap<RenderHandle, RecordedSession>,
    calls: Vec<RecordedCall>,
}

#[derive(Debug, Default)]
pub struct RecordingRenderer {
    state: Mutex<RecordingState>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of materialized, not yet destroyed representations.
    pub fn live_count(&self) -> usize {
        self.state.lock().live.len()
    }

    /// Live representations bound to `id`.
    pub fn live_for(&self, id: &str) -> Vec<RecordedSession> {
        self.state
            .lock()
            .live
            .values()
            .filter(|s| s.view.id == id)
            .cloned()
            .collect()
    }

    pub fn view_for(&self, id: &str) -> Option<RecordedSession> {
        self.live_for(id).into_iter().next()
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.lock().calls.clone()
    }
}

impl Renderer for RecordingRenderer {
    fn materialize(&self, view: &SessionView) -> RenderHandle {
        let mut state = self.state.lock();
        state.next_handle += 1;
        let handle = RenderHandle(state.next_handle);
        state.live.insert(
            handle,
            RecordedSession {
                view: view.clone(),
                message: view.message.clone(),
                details: None,
                progress: view.show_progress.then_some(0.0),
                spinner: !view.show_progress,
                phases: phase_statuses(view.phases.len(), None),
            },
        );
        state.calls.push(RecordedCall::Materialize {
            handle,
            id: view.id.clone(),
        });
        handle
    }

    fn apply_update(&self, handle: RenderHandle, update: &RenderUpdate) {
        let mut state = self.state.lock();
        if let Some(session) = state.live.get_mut(&handle) {
            if let Some(message) = &update.message {
                session.message = message.clone();
            }
            if let Some(details) = &update.details {
                session.details = Some(details.clone());
            }
            if let Some(progress) = update.progress {
                session.progress = Some(progress);
                session.spinner = false;
            }
            if let Some(phases) = &update.phases {
                session.phases = phases.clone();
            }
        }
        state.calls.push(RecordedCall::Update {
            handle,
            update: update.clone(),
        });
    }

    fn apply_spinner_mode(&self, handle: RenderHandle) {
        let mut state = self.state.lock();
        if let Some(session) = state.live.get_mut(&handle) {
            session.spinner = true;
            session.progress = None;
        }
        state.calls.push(RecordedCall::Spinner { handle });
    }

    fn destroy(&self, handle: RenderHandle) {
        let mut state = self.state.lock();
        state.live.remove(&handle);
        state.calls.push(RecordedCall::Destroy { handle });
    }
}
