//! The HDL project model consumed by the ivy build core.
//!
//! Discovers source files from the libraries declared in `ivy.toml`, scans
//! each file for the design units it defines and references, and links them
//! into a [`FileGraph`] that answers dependency queries through the
//! [`ProjectGraph`] trait.

#![warn(missing_docs)]

pub mod dialect;
pub mod discovery;
pub mod error;
pub mod file_id;
pub mod graph;
pub mod scanner;
pub mod source_file;

pub use dialect::Dialect;
pub use discovery::discover_sources;
pub use error::{CycleError, ProjectError};
pub use file_id::FileId;
pub use graph::{FileGraph, FileSet, ProjectGraph};
pub use scanner::{scan_source, UnitScan};
pub use source_file::SourceFile;
