//! Logging of the pathfinder: `tracing` events are written to stdout and to
//! a log file.

pub use errors::full_error_message;
pub use setup::init;

mod errors;
mod setup;
