//! Parsing and validation of `ghostbus.toml` generator configuration.
//!
//! The configuration is read once and passed by shared reference through every
//! stage as an immutable [`GhostbusConfig`]; nothing in the pipeline consults
//! global state for policy decisions.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_file, load_config_from_str, CONFIG_FILE_NAME};
pub use types::*;
