//! Root detection and closure queries over a [`ProjectGraph`].

use crate::error::BuildError;
use ivy_project::{FileId, FileSet, ProjectGraph, SourceFile};

/// A read-only view of a project graph with its topological order and root
/// set computed once.
///
/// Construction fails with [`BuildError::GraphCycle`] when the graph has no
/// topological order, so every later query runs against a DAG.
pub struct DependencyGraph<'g> {
    graph: &'g dyn ProjectGraph,
    order: Vec<FileId>,
    roots: FileSet,
}

impl<'g> DependencyGraph<'g> {
    /// Wraps `graph`, computing its full order and root files.
    pub fn new(graph: &'g dyn ProjectGraph) -> Result<Self, BuildError> {
        let order = graph.topological_order()?;
        let roots = order
            .iter()
            .copied()
            .filter(|&id| {
                let single = FileSet::from([id]);
                graph.dependents_of(&single) == single
            })
            .collect();
        Ok(Self {
            graph,
            order,
            roots,
        })
    }

    /// Returns true if no other file depends on `id`.
    pub fn is_root(&self, id: FileId) -> bool {
        self.roots.contains(&id)
    }

    /// Every root file.
    pub fn roots(&self) -> &FileSet {
        &self.roots
    }

    /// The transitive dependencies of `id`, including `id`.
    pub fn closure(&self, id: FileId) -> FileSet {
        self.graph.dependencies_of(&FileSet::from([id]))
    }

    /// All files, dependencies first.
    pub fn order(&self) -> &[FileId] {
        &self.order
    }

    /// Returns the file with the given id.
    pub fn file(&self, id: FileId) -> &'g SourceFile {
        self.graph.file(id)
    }

    /// All source files of the wrapped graph.
    pub fn files(&self) -> &'g [SourceFile] {
        self.graph.source_files()
    }
}
