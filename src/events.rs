//! Cancellation triggers reported by renderers.

use std::sync::mpsc::{channel, Receiver, SendError, Sender};

/// The user activated the cancel affordance of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelTrigger {
    pub session_id: String,
}

/// Sending half handed to renderers and hosts. Cheap to clone.
#[derive(Debug, Clone)]
pub struct CancelBus {
    sender: Sender<CancelTrigger>,
}

impl CancelBus {
    pub fn new_pair() -> (Self, Receiver<CancelTrigger>) {
        let (sender, receiver) = channel();
        (Self { sender }, receiver)
    }

    pub fn trigger(&self, session_id: impl Into<String>) -> Result<(), SendError<CancelTrigger>> {
        self.sender.send(CancelTrigger {
            session_id: session_id.into(),
        })
    }
}
