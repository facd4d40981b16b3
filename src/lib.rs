//! Beacon: Progress Session Registry
//!
//! Tracks any number of concurrently visible progress indicators, each created,
//! updated and torn down independently. The registry is pure state logic;
//! drawing is delegated to a [`render::Renderer`] chosen by the host.

pub mod cli;
pub mod config;
pub mod error;
pub mod events;
pub mod logging;
pub mod registry;
pub mod render;
pub mod session;

pub use error::{ApiError, SessionError};
pub use events::{CancelBus, CancelTrigger};
pub use registry::SessionRegistry;
pub use render::{RenderHandle, RenderUpdate, Renderer, SessionView};
pub use session::{PhaseStatus, SessionConfig, SessionSnapshot, SessionUpdate};
