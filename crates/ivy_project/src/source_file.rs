//! Source file metadata as reported by the project model.

use crate::dialect::Dialect;
use crate::file_id::FileId;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

/// A source file of the project and everything the build core needs to know
/// about it.
///
/// Immutable once the project is loaded; a new build pass reloads the project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceFile {
    /// Identifier of this file within its project.
    pub id: FileId,
    /// Absolute path. Unique within a project.
    pub path: PathBuf,
    /// Language dialect.
    pub dialect: Dialect,
    /// Name of the library this file belongs to.
    pub library: String,
    /// Include directories, in declaration order.
    pub include_dirs: Vec<PathBuf>,
    /// Preprocessor defines.
    pub defines: BTreeMap<String, String>,
    /// Design units defined in this file, in source order.
    pub units: Vec<String>,
    /// Names of design units this file references.
    #[serde(skip)]
    pub uses: BTreeSet<String>,
}

impl SourceFile {
    /// Creates a file with no metadata beyond its path, dialect and library.
    pub fn new(id: FileId, path: impl Into<PathBuf>, library: impl Into<String>) -> Self {
        let path = path.into();
        let dialect = Dialect::from_path(&path);
        Self {
            id,
            path,
            dialect,
            library: library.into(),
            include_dirs: Vec::new(),
            defines: BTreeMap::new(),
            units: Vec::new(),
            uses: BTreeSet::new(),
        }
    }

    /// Sets the defined design units.
    pub fn with_units<I, S>(mut self, units: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.units = units.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the referenced design unit names.
    pub fn with_uses<I, S>(mut self, uses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.uses = uses.into_iter().map(Into::into).collect();
        self
    }

    /// Adds an include directory.
    pub fn with_include_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.include_dirs.push(dir.into());
        self
    }

    /// Adds a preprocessor define.
    pub fn with_define(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.defines.insert(name.into(), value.into());
        self
    }
}
