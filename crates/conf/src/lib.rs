//! This crate implements loading of the pathfinder configuration:
//!
//! * Loading of the configuration from a YAML file, the file is (re)created
//!   with defaults when it is missing or invalid.
//!
//! * Parsing, validation and configuration provisioning.

pub use conf::{Configuration, MessengerConf};
pub use io::load_conf;

mod conf;
mod io;
mod persisted;
