//! ANSI terminal renderer. Writes one status line per transition.

use std::collections::HashMap;
use std::io::Write;

use owo_colors::OwoColorize;
use parking_lot::Mutex;
use tracing::warn;

use crate::render::{progress_bar, RenderHandle, RenderUpdate, Renderer, SessionView};
use crate::session::{phase_statuses, PhaseStatus};

const BAR_WIDTH: usize = 20;
const SPINNER: &str = "~working~";

#[derive(Debug, Clone)]
struct DrawnSession {
    view: SessionView,
    message: String,
    details: Option<String>,
    progress: f64,
    spinner: bool,
    phases: Vec<PhaseStatus>,
}

struct TerminalState<W> {
    out: W,
    next_handle: u64,
    drawn: HashMap<RenderHandle, DrawnSession>,
}

pub struct TerminalRenderer<W: Write + Send> {
    state: Mutex<TerminalState<W>>,
    color: bool,
}

impl TerminalRenderer<std::io::Stderr> {
    pub fn stderr(color: bool) -> Self {
        Self::new(std::io::stderr(), color)
    }
}

impl<W: Write + Send> TerminalRenderer<W> {
    pub fn new(out: W, color: bool) -> Self {
        Self {
            state: Mutex::new(TerminalState {
                out,
                next_handle: 0,
                drawn: HashMap::new(),
            }),
            color,
        }
    }

    /// Give back the writer, e.g. to inspect captured output.
    pub fn into_inner(self) -> W {
        self.state.into_inner().out
    }

    fn write_line(&self, state: &mut TerminalState<W>, line: &str) {
        if let Err(err) = writeln!(state.out, "{line}").and_then(|_| state.out.flush()) {
            warn!(error = %err, "failed to write progress line");
        }
    }

    fn format(&self, session: &DrawnSession) -> String {
        let mut parts = Vec::new();
        let title = if self.color {
            session.view.title.bold().to_string()
        } else {
            session.view.title.clone()
        };
        parts.push(title);

        if session.spinner || !session.view.show_progress {
            let spinner = if self.color {
                SPINNER.cyan().to_string()
            } else {
                SPINNER.to_string()
            };
            parts.push(spinner);
        } else {
            let bar = progress_bar(session.progress, BAR_WIDTH);
            parts.push(if self.color { bar.green().to_string() } else { bar });
            if session.view.show_percentage {
                parts.push(format!("{}%", session.progress.round() as u32));
            }
        }

        if !session.view.compact {
            if !session.message.is_empty() {
                parts.push(session.message.clone());
            }
            if !session.phases.is_empty() {
                parts.push(self.format_phases(session));
            }
            if let Some(details) = &session.details {
                let details = if self.color {
                    details.dimmed().to_string()
                } else {
                    details.clone()
                };
                parts.push(details);
            }
        }

        if session.view.cancellable {
            let cancel = if self.color {
                "[cancel]".yellow().to_string()
            } else {
                "[cancel]".to_string()
            };
            parts.push(cancel);
        }

        parts.join(" ")
    }

    fn format_phases(&self, session: &DrawnSession) -> String {
        session
            .view
            .phases
            .iter()
            .zip(&session.phases)
            .map(|(label, status)| {
                let marker = match status {
                    PhaseStatus::Completed => "✓",
                    PhaseStatus::Active => "▶",
                    PhaseStatus::Pending => "·",
                };
                let text = format!("{marker}{label}");
                match (self.color, status) {
                    (true, PhaseStatus::Active) => text.bold().to_string(),
                    (true, PhaseStatus::Pending) => text.dimmed().to_string(),
                    _ => text,
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl<W: Write + Send> Renderer for TerminalRenderer<W> {
    fn materialize(&self, view: &SessionView) -> RenderHandle {
        let mut state = self.state.lock();
        state.next_handle += 1;
        let handle = RenderHandle(state.next_handle);
        let session = DrawnSession {
            view: view.clone(),
            message: view.message.clone(),
            details: None,
            progress: 0.0,
            spinner: !view.show_progress,
            phases: phase_statuses(view.phases.len(), None),
        };
        let line = format!("+ {}", self.format(&session));
        state.drawn.insert(handle, session);
        self.write_line(&mut state, &line);
        handle
    }

    fn apply_update(&self, handle: RenderHandle, update: &RenderUpdate) {
        let mut state = self.state.lock();
        let Some(session) = state.drawn.get_mut(&handle) else {
            return;
        };
        if let Some(message) = &update.message {
            session.message = message.clone();
        }
        if let Some(details) = &update.details {
            session.details = Some(details.clone());
        }
        if let Some(progress) = update.progress {
            session.progress = progress;
            session.spinner = false;
        }
        if let Some(phases) = &update.phases {
            session.phases = phases.clone();
        }
        let line = format!("~ {}", self.format(session));
        self.write_line(&mut state, &line);
    }

    fn apply_spinner_mode(&self, handle: RenderHandle) {
        let mut state = self.state.lock();
        let Some(session) = state.drawn.get_mut(&handle) else {
            return;
        };
        session.spinner = true;
        let line = format!("~ {}", self.format(session));
        self.write_line(&mut state, &line);
    }

    fn destroy(&self, handle: RenderHandle) {
        let mut state = self.state.lock();
        if let Some(session) = state.drawn.remove(&handle) {
            let line = format!("- {}", session.view.title);
            self.write_line(&mut state, &line);
        }
    }
}
