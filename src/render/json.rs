//! JSON-lines renderer: one sequenced event per renderer call.

use std::collections::HashMap;
use std::io::Write;

use chrono::{SecondsFormat, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::warn;

use crate::render::{RenderHandle, RenderUpdate, Renderer, SessionView};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderEvent {
    pub ts: String,
    pub seq: u64,
    #[serde(rename = "type")]
    pub event_type: String,
    pub session: String,
    pub data: Value,
}

struct JsonState<W> {
    out: W,
    next_seq: u64,
    next_handle: u64,
    sessions: HashMap<RenderHandle, String>,
}

pub struct JsonRenderer<W: Write + Send> {
    state: Mutex<JsonState<W>>,
}

impl JsonRenderer<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> JsonRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            state: Mutex::new(JsonState {
                out,
                next_seq: 1,
                next_handle: 0,
                sessions: HashMap::new(),
            }),
        }
    }

    pub fn into_inner(self) -> W {
        self.state.into_inner().out
    }

    fn emit(state: &mut JsonState<W>, session: String, event_type: &str, data: Value) {
        let event = RenderEvent {
            ts: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            seq: state.next_seq,
            event_type: event_type.to_string(),
            session,
            data,
        };
        state.next_seq += 1;
        let written = serde_json::to_string(&event)
            .map_err(std::io::Error::from)
            .and_then(|line| writeln!(state.out, "{line}"));
        if let Err(err) = written {
            warn!(event_type = %event_type, error = %err, "failed to write render event");
        }
    }
}

impl<W: Write + Send> Renderer for JsonRenderer<W> {
    fn materialize(&self, view: &SessionView) -> RenderHandle {
        let mut state = self.state.lock();
        state.next_handle += 1;
        let handle = RenderHandle(state.next_handle);
        state.sessions.insert(handle, view.id.clone());
        let data = serde_json::to_value(view).unwrap_or(Value::Null);
        Self::emit(&mut state, view.id.clone(), "materialized", data);
        handle
    }

    fn apply_update(&self, handle: RenderHandle, update: &RenderUpdate) {
        let mut state = self.state.lock();
        let Some(session) = state.sessions.get(&handle).cloned() else {
            return;
        };
        let data = serde_json::to_value(update).unwrap_or(Value::Null);
        Self::emit(&mut state, session, "updated", data);
    }

    fn apply_spinner_mode(&self, handle: RenderHandle) {
        let mut state = self.state.lock();
        let Some(session) = state.sessions.get(&handle).cloned() else {
            return;
        };
        Self::emit(&mut state, session, "spinner", json!({}));
    }

    fn destroy(&self, handle: RenderHandle) {
        let mut state = self.state.lock();
        let Some(session) = state.sessions.remove(&handle) else {
            return;
        };
        Self::emit(&mut state, session, "destroyed", json!({}));
    }
}
