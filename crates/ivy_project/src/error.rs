//! Error types for project loading and graph queries.

use std::path::PathBuf;

/// Errors that can occur while discovering and scanning project sources.
#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    /// An I/O error occurred while reading a source file or directory.
    #[error("failed to read {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A library names a source path that does not exist.
    #[error("library '{library}' lists missing source {path}")]
    MissingSource {
        /// The library declaring the source.
        library: String,
        /// The resolved path that was not found.
        path: PathBuf,
    },

    /// Walking a source directory failed.
    #[error("failed to walk {path}: {reason}")]
    Walk {
        /// The directory being walked.
        path: PathBuf,
        /// Description of the failure.
        reason: String,
    },
}

/// The dependency graph contains a cycle, so no compile order exists.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("dependency cycle between {}", format_paths(.files))]
pub struct CycleError {
    /// Files participating in the cycle, sorted by path.
    pub files: Vec<PathBuf>,
}

fn format_paths(files: &[PathBuf]) -> String {
    files
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_source_display() {
        let err = ProjectError::MissingSource {
            library: "adder_lib".to_string(),
            path: PathBuf::from("/p/src/missing.v"),
        };
        let msg = err.to_string();
        assert!(msg.contains("adder_lib"));
        assert!(msg.contains("missing.v"));
    }

    #[test]
    fn io_error_display() {
        let err = ProjectError::Io {
            path: PathBuf::from("/p/src/a.v"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.to_string().starts_with("failed to read /p/src/a.v"));
    }

    #[test]
    fn cycle_error_lists_files() {
        let err = CycleError {
            files: vec![PathBuf::from("/p/a.v"), PathBuf::from("/p/b.v")],
        };
        assert_eq!(err.to_string(), "dependency cycle between /p/a.v, /p/b.v");
    }
}
