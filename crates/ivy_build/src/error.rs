//! Error types for build resolution and toolchain runs.
//!
//! Every variant is fatal to the request that raised it. None is retried.

use crate::version::Version;
use ivy_project::{CycleError, Dialect};
use std::path::PathBuf;

/// Errors raised while resolving, synthesizing or running a top-level.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// The detected toolchain is older than the minimum supported version.
    #[error("{toolchain} version {detected} not supported, min version is {minimum}")]
    ToolchainVersion {
        /// Toolchain name.
        toolchain: String,
        /// Version parsed from the toolchain's output.
        detected: Version,
        /// Minimum supported version.
        minimum: Version,
    },

    /// The dependency graph has no valid topological order.
    #[error(transparent)]
    GraphCycle(#[from] CycleError),

    /// The requested name is not defined by any root file.
    #[error("unit '{requested}' can't be found among top-levels [{}]", .known.join(", "))]
    UnknownTopLevel {
        /// The requested top-level name.
        requested: String,
        /// Every known top-level name, sorted.
        known: Vec<String>,
    },

    /// Two different root files define the same unit.
    #[error("top-level '{unit}' is defined by both {} and {}", .first.display(), .second.display())]
    DuplicateTopLevel {
        /// The unit name.
        unit: String,
        /// The file seen first.
        first: PathBuf,
        /// The file seen second.
        second: PathBuf,
    },

    /// A file in the resolved set has a dialect the toolchain cannot compile.
    #[error("unsupported file type '{dialect}': {}", .path.display())]
    UnsupportedFileType {
        /// The offending file.
        path: PathBuf,
        /// Its dialect.
        dialect: Dialect,
    },

    /// The compiler exited unsuccessfully.
    #[error("failed to compile sources for '{top}' (exit status {})", display_status(*.status))]
    CompileFailed {
        /// The top-level being compiled.
        top: String,
        /// Exit code, if the process exited normally.
        status: Option<i32>,
        /// Captured standard error.
        stderr: String,
    },

    /// The simulation exited unsuccessfully or could not be launched.
    #[error("failed to run simulation of '{top}': {reason}")]
    SimulateFailed {
        /// The top-level being simulated.
        top: String,
        /// Exit status or launch failure description.
        reason: String,
        /// Captured standard output, empty if the runtime never started.
        stdout: String,
        /// Captured standard error, empty if the runtime never started.
        stderr: String,
    },

    /// The output directory could not be created or is not a directory.
    #[error("output directory {}: {reason}", .path.display())]
    OutputDirectory {
        /// The directory path.
        path: PathBuf,
        /// Description of the problem.
        reason: String,
    },

    /// The compiler file list could not be written.
    #[error("failed to write file list {}: {source}", .path.display())]
    FileList {
        /// The file list path.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A toolchain program could not be started.
    #[error("failed to launch {program}: {source}")]
    Process {
        /// The program that failed to start.
        program: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}

fn display_status(status: Option<i32>) -> String {
    status.map_or_else(|| "none".to_string(), |code| code.to_string())
}

/// Discriminant of a [`BuildError`], used to label terminal run states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`BuildError::ToolchainVersion`].
    ToolchainVersion,
    /// See [`BuildError::GraphCycle`].
    GraphCycle,
    /// See [`BuildError::UnknownTopLevel`].
    UnknownTopLevel,
    /// See [`BuildError::DuplicateTopLevel`].
    DuplicateTopLevel,
    /// See [`BuildError::UnsupportedFileType`].
    UnsupportedFileType,
    /// See [`BuildError::CompileFailed`].
    CompileFailed,
    /// See [`BuildError::SimulateFailed`].
    SimulateFailed,
    /// See [`BuildError::OutputDirectory`].
    OutputDirectory,
    /// See [`BuildError::FileList`].
    FileList,
    /// See [`BuildError::Process`].
    Process,
}

impl BuildError {
    /// Returns the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            BuildError::ToolchainVersion { .. } => ErrorKind::ToolchainVersion,
            BuildError::GraphCycle(_) => ErrorKind::GraphCycle,
            BuildError::UnknownTopLevel { .. } => ErrorKind::UnknownTopLevel,
            BuildError::DuplicateTopLevel { .. } => ErrorKind::DuplicateTopLevel,
            BuildError::UnsupportedFileType { .. } => ErrorKind::UnsupportedFileType,
            BuildError::CompileFailed { .. } => ErrorKind::CompileFailed,
            BuildError::SimulateFailed { .. } => ErrorKind::SimulateFailed,
            BuildError::OutputDirectory { .. } => ErrorKind::OutputDirectory,
            BuildError::FileList { .. } => ErrorKind::FileList,
            BuildError::Process { .. } => ErrorKind::Process,
        }
    }

    /// Returns true for errors that invalidate every request against the
    /// same toolchain or project, not just the one that raised them.
    pub fn aborts_batch(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::ToolchainVersion | ErrorKind::GraphCycle
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toolchain_version_display() {
        let err = BuildError::ToolchainVersion {
            toolchain: "icarus".to_string(),
            detected: Version::new(10, 1, 9),
            minimum: Version::new(10, 2, 0),
        };
        assert_eq!(
            err.to_string(),
            "icarus version 10.1.9 not supported, min version is 10.2.0"
        );
        assert!(err.aborts_batch());
    }

    #[test]
    fn unknown_top_level_lists_known_names() {
        let err = BuildError::UnknownTopLevel {
            requested: "missing_tb".to_string(),
            known: vec!["adder_tb".to_string(), "subtract_tb".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("missing_tb"));
        assert!(msg.contains("[adder_tb, subtract_tb]"));
        assert!(!err.aborts_batch());
    }

    #[test]
    fn duplicate_top_level_names_both_files() {
        let err = BuildError::DuplicateTopLevel {
            unit: "tb".to_string(),
            first: PathBuf::from("/p/a_tb.sv"),
            second: PathBuf::from("/p/b_tb.sv"),
        };
        let msg = err.to_string();
        assert!(msg.contains("/p/a_tb.sv"));
        assert!(msg.contains("/p/b_tb.sv"));
    }

    #[test]
    fn compile_failed_display() {
        let err = BuildError::CompileFailed {
            top: "adder_tb".to_string(),
            status: Some(2),
            stderr: String::new(),
        };
        assert!(err.to_string().contains("exit status 2"));
        let err = BuildError::CompileFailed {
            top: "adder_tb".to_string(),
            status: None,
            stderr: String::new(),
        };
        assert!(err.to_string().contains("exit status none"));
    }

    #[test]
    fn simulate_failed_display_omits_output() {
        let err = BuildError::SimulateFailed {
            top: "adder_tb".to_string(),
            reason: "exit status 1".to_string(),
            stdout: "ERROR: sum mismatch".to_string(),
            stderr: String::new(),
        };
        assert_eq!(
            err.to_string(),
            "failed to run simulation of 'adder_tb': exit status 1"
        );
        assert!(!err.aborts_batch());
    }

    #[test]
    fn cycle_converts_and_aborts() {
        let err: BuildError = CycleError {
            files: vec![PathBuf::from("/p/a.v")],
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::GraphCycle);
        assert!(err.aborts_batch());
    }

    #[test]
    fn unsupported_file_type_display() {
        let err = BuildError::UnsupportedFileType {
            path: PathBuf::from("/p/e.vhd"),
            dialect: Dialect::Vhdl,
        };
        assert_eq!(err.to_string(), "unsupported file type 'vhdl': /p/e.vhd");
    }
}
