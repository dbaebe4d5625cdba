//! Opaque identifier for source files within one project.

use serde::{Deserialize, Serialize};

/// Opaque identifier for a [`SourceFile`](crate::SourceFile) in a project.
///
/// Ids are assigned densely in discovery order, so the raw value doubles as
/// the file's index in [`ProjectGraph::source_files`](crate::ProjectGraph::source_files).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct FileId(u32);

impl FileId {
    /// Creates a `FileId` from a raw `u32` value.
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the position of this file in its project's file list.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}
