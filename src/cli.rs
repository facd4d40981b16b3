//! CLI: clap definitions and command routing for the demo host.

pub mod output;
pub mod parse;
pub mod route;

pub use output::map_error;
pub use parse::{Cli, Commands};
pub use route::RunContext;
