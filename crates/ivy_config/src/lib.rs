//! Parsing and validation of `ivy.toml` project configuration files.
//!
//! This crate reads the project configuration file and produces a strongly-typed
//! [`ProjectConfig`] describing libraries, toolchain settings, parameter
//! overrides and simulator options, and merges command-line overrides into it.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod resolve;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str, CONFIG_FILE_NAME};
pub use resolve::{parse_generic_override, resolve_run_settings, ResolvedRun, RunOverrides};
pub use types::*;
