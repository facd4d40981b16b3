//! Session records and the options and patches that drive them.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::config::SessionDefaults;
use crate::error::SessionError;
use crate::render::{RenderHandle, RenderUpdate, SessionView};

static SESSION_COUNTER: AtomicU64 = AtomicU64::new(1);

pub const DEFAULT_TITLE: &str = "Processing...";
pub const DEFAULT_MESSAGE: &str = "Please wait...";

/// Advisory cancel hook. Runs at most once; an `Err` is logged and discarded.
pub type CancelCallback = Box<dyn FnOnce() -> anyhow::Result<()> + Send + 'static>;

/// Visual status of one phase relative to the session's current phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseStatus {
    Completed,
    Active,
    Pending,
}

impl PhaseStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PhaseStatus::Completed => "completed",
            PhaseStatus::Active => "active",
            PhaseStatus::Pending => "pending",
        }
    }
}

/// Options recognized when a session is shown.
///
/// `title` and `message` fall back to the registry's configured defaults when
/// left unset. An empty `phases` list is treated the same as no phases.
pub struct SessionConfig {
    pub title: Option<String>,
    pub message: Option<String>,
    pub show_progress: bool,
    pub show_percentage: bool,
    pub cancellable: bool,
    pub compact: bool,
    pub phases: Option<Vec<String>>,
    pub on_cancel: Option<CancelCallback>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            title: None,
            message: None,
            show_progress: true,
            show_percentage: true,
            cancellable: false,
            compact: false,
            phases: None,
            on_cancel: None,
        }
    }
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn show_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn show_percentage(mut self, show: bool) -> Self {
        self.show_percentage = show;
        self
    }

    pub fn cancellable(mut self, cancellable: bool) -> Self {
        self.cancellable = cancellable;
        self
    }

    pub fn compact(mut self, compact: bool) -> Self {
        self.compact = compact;
        self
    }

    pub fn phases<I, S>(mut self, phases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.phases = Some(phases.into_iter().map(Into::into).collect());
        self
    }

    /// Set the cancel hook. Only fires for cancellable sessions.
    pub fn on_cancel<F>(mut self, callback: F) -> Self
    where
        F: FnOnce() -> anyhow::Result<()> + Send + 'static,
    {
        self.on_cancel = Some(Box::new(callback));
        self
    }
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("title", &self.title)
            .field("message", &self.message)
            .field("show_progress", &self.show_progress)
            .field("show_percentage", &self.show_percentage)
            .field("cancellable", &self.cancellable)
            .field("compact", &self.compact)
            .field("phases", &self.phases)
            .field("on_cancel", &self.on_cancel.is_some())
            .finish()
    }
}

/// Partial update applied to a live session. Every field is independent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionUpdate {
    pub message: Option<String>,
    pub details: Option<String>,
    pub progress: Option<f64>,
    pub phase: Option<usize>,
    /// Replace details with `Elapsed: {seconds}s`. Wins over `details`.
    pub show_elapsed: bool,
}

impl SessionUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn progress(mut self, progress: f64) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn phase(mut self, phase: usize) -> Self {
        self.phase = Some(phase);
        self
    }

    pub fn show_elapsed(mut self) -> Self {
        self.show_elapsed = true;
        self
    }
}

/// Read-only copy of a live session's state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub id: String,
    pub title: String,
    pub message: String,
    pub show_progress: bool,
    pub show_percentage: bool,
    pub cancellable: bool,
    pub compact: bool,
    pub phases: Vec<String>,
    pub current_progress: f64,
    pub indeterminate: bool,
    pub current_phase: Option<usize>,
    pub details: Option<String>,
    pub started_at_ms: u64,
    pub generation: u64,
    pub has_cancel_callback: bool,
}

/// A live session owned by the registry.
pub(crate) struct Session {
    pub(crate) view: SessionView,
    pub(crate) current_progress: f64,
    pub(crate) indeterminate: bool,
    pub(crate) current_phase: Option<usize>,
    pub(crate) details: Option<String>,
    pub(crate) start_time: Instant,
    pub(crate) started_at_ms: u64,
    pub(crate) generation: u64,
    pub(crate) handle: RenderHandle,
    pub(crate) on_cancel: Option<CancelCallback>,
}

impl Session {
    pub(crate) fn new(
        view: SessionView,
        on_cancel: Option<CancelCallback>,
        generation: u64,
        handle: RenderHandle,
    ) -> Self {
        Self {
            indeterminate: !view.show_progress,
            view,
            current_progress: 0.0,
            current_phase: None,
            details: None,
            start_time: Instant::now(),
            started_at_ms: now_millis(),
            generation,
            handle,
            on_cancel,
        }
    }

    pub(crate) fn id(&self) -> &str {
        &self.view.id
    }

    pub(crate) fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Apply `update` in place and return what the renderer needs to redraw.
    ///
    /// A rejected phase leaves the phase untouched but the remaining fields
    /// are still applied; the rejection comes back alongside the redraw.
    pub(crate) fn apply(&mut self, update: &SessionUpdate) -> (RenderUpdate, Option<SessionError>) {
        let mut render = RenderUpdate::default();
        let mut rejected = None;

        if let Some(message) = &update.message {
            self.view.message = message.clone();
            render.message = Some(message.clone());
        }

        if update.show_elapsed {
            let details = format!("Elapsed: {}s", self.elapsed().as_secs());
            self.details = Some(details.clone());
            render.details = Some(details);
        } else if let Some(details) = &update.details {
            self.details = Some(details.clone());
            render.details = Some(details.clone());
        }

        if let Some(progress) = update.progress {
            let clamped = clamp_progress(progress);
            self.current_progress = clamped;
            self.indeterminate = false;
            if self.view.show_progress {
                render.progress = Some(clamped);
            }
        }

        if let Some(phase) = update.phase {
            let len = self.view.phases.len();
            if len == 0 {
                // No phases configured: nothing to advance.
            } else if phase >= len {
                rejected = Some(SessionError::InvalidPhaseIndex {
                    id: self.view.id.clone(),
                    index: phase,
                    len,
                });
            } else {
                self.current_phase = Some(phase);
                render.phases = Some(phase_statuses(len, Some(phase)));
            }
        }

        (render, rejected)
    }

    pub(crate) fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            id: self.view.id.clone(),
            title: self.view.title.clone(),
            message: self.view.message.clone(),
            show_progress: self.view.show_progress,
            show_percentage: self.view.show_percentage,
            cancellable: self.view.cancellable,
            compact: self.view.compact,
            phases: self.view.phases.clone(),
            current_progress: self.current_progress,
            indeterminate: self.indeterminate,
            current_phase: self.current_phase,
            details: self.details.clone(),
            started_at_ms: self.started_at_ms,
            generation: self.generation,
            has_cancel_callback: self.on_cancel.is_some(),
        }
    }
}

impl SessionView {
    /// Resolve `config` against the registry defaults.
    pub(crate) fn from_config(id: &str, config: &SessionConfig, defaults: &SessionDefaults) -> Self {
        Self {
            id: id.to_string(),
            title: config
                .title
                .clone()
                .unwrap_or_else(|| defaults.title.clone()),
            message: config
                .message
                .clone()
                .unwrap_or_else(|| defaults.message.clone()),
            show_progress: config.show_progress,
            show_percentage: config.show_progress && config.show_percentage,
            cancellable: config.cancellable,
            compact: config.compact,
            phases: config.phases.clone().unwrap_or_default(),
        }
    }
}

/// Clamp a reported progress value into `[0, 100]`. NaN reads as 0.
pub fn clamp_progress(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

/// Status of every phase given the active index. No active phase means all pending.
pub fn phase_statuses(len: usize, current: Option<usize>) -> Vec<PhaseStatus> {
    (0..len)
        .map(|index| match current {
            Some(active) if index < active => PhaseStatus::Completed,
            Some(active) if index == active => PhaseStatus::Active,
            _ => PhaseStatus::Pending,
        })
        .collect()
}

pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

pub fn new_session_id(prefix: &str) -> String {
    let ts = now_millis();
    let pid = std::process::id();
    let seq = SESSION_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}-{ts}-{pid}-{seq}")
}
