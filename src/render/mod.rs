//! Renderer abstraction
//!
//! The registry is pure state logic; everything visual goes through a [`Renderer`].
//! Adapters exist for an ANSI terminal, JSON lines, and an in-memory recorder.

use serde::{Deserialize, Serialize};

use crate::session::PhaseStatus;

pub mod json;
pub mod recording;
pub mod terminal;

pub use json::JsonRenderer;
pub use recording::{RecordedCall, RecordingRenderer};
pub use terminal::TerminalRenderer;

/// Opaque token a renderer hands back for one materialized session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RenderHandle(pub u64);

/// Everything a renderer needs to draw a session for the first time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionView {
    pub id: String,
    pub title: String,
    pub message: String,
    pub show_progress: bool,
    pub show_percentage: bool,
    pub cancellable: bool,
    pub compact: bool,
    pub phases: Vec<String>,
}

/// Changed fields of a session after an update. `None` means unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RenderUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phases: Option<Vec<PhaseStatus>>,
}

impl RenderUpdate {
    pub fn is_empty(&self) -> bool {
        self.message.is_none()
            && self.details.is_none()
            && self.progress.is_none()
            && self.phases.is_none()
    }
}

/// Visual backend driven by the registry.
///
/// Calls arrive synchronously on every lifecycle transition while the registry
/// holds its state lock, so implementations must not call back into the
/// registry. Cancellation is reported through a [`crate::events::CancelBus`].
pub trait Renderer: Send + Sync {
    /// Draw a new session and return a handle for later calls.
    fn materialize(&self, view: &SessionView) -> RenderHandle;

    fn apply_update(&self, handle: RenderHandle, update: &RenderUpdate);

    /// Switch to the open-ended indicator, hiding any percentage.
    fn apply_spinner_mode(&self, handle: RenderHandle);

    fn destroy(&self, handle: RenderHandle);
}

/// Renderer that draws nothing.
#[derive(Debug, Default)]
pub struct NullRenderer {
    next: std::sync::atomic::AtomicU64,
}

impl Renderer for NullRenderer {
    fn materialize(&self, _view: &SessionView) -> RenderHandle {
        RenderHandle(self.next.fetch_add(1, std::sync::atomic::Ordering::Relaxed))
    }

    fn apply_update(&self, _handle: RenderHandle, _update: &RenderUpdate) {}

    fn apply_spinner_mode(&self, _handle: RenderHandle) {}

    fn destroy(&self, _handle: RenderHandle) {}
}

/// Fixed-width text bar, e.g. `[#####-----]` for 50%.
pub(crate) fn progress_bar(progress: f64, width: usize) -> String {
    let filled = ((progress / 100.0) * width as f64).round() as usize;
    let filled = filled.min(width);
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}
