//! The file dependency graph.
//!
//! An edge `A -> B` means "A depends on B": B must be compiled before A.
//! [`ProjectGraph`] is the query surface the build core consumes; [`FileGraph`]
//! implements it over a [`petgraph`] directed graph whose node indices are
//! the files' [`FileId`]s.

use crate::error::CycleError;
use crate::file_id::FileId;
use crate::source_file::SourceFile;
use petgraph::algo::kosaraju_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{Dfs, Reversed};
use petgraph::Direction;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// An ordered set of files.
pub type FileSet = BTreeSet<FileId>;

/// Dependency queries over a project's source files.
///
/// Implementations must be usable from several threads at once; queries never
/// mutate the graph.
pub trait ProjectGraph: Sync {
    /// All source files, indexed by [`FileId::index`].
    fn source_files(&self) -> &[SourceFile];

    /// Every file that depends, directly or transitively, on a member of
    /// `files`. The result includes `files` itself.
    fn dependents_of(&self, files: &FileSet) -> FileSet;

    /// Every file that a member of `files` depends on, directly or
    /// transitively. The result includes `files` itself.
    fn dependencies_of(&self, files: &FileSet) -> FileSet;

    /// All files, each one after every file it depends on.
    fn topological_order(&self) -> Result<Vec<FileId>, CycleError>;

    /// Returns the file with the given id.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not belong to this graph.
    fn file(&self, id: FileId) -> &SourceFile {
        &self.source_files()[id.index()]
    }
}

/// A [`ProjectGraph`] backed by a [`petgraph::graph::DiGraph`].
#[derive(Debug)]
pub struct FileGraph {
    files: Vec<SourceFile>,
    graph: DiGraph<FileId, ()>,
}

impl FileGraph {
    /// Builds a graph from explicit `(dependent, dependency)` edges.
    ///
    /// File ids are reassigned to match each file's position in `files`.
    /// Self-edges and repeated edges are dropped.
    pub fn from_edges(
        files: Vec<SourceFile>,
        edges: impl IntoIterator<Item = (FileId, FileId)>,
    ) -> Self {
        let files: Vec<SourceFile> = files
            .into_iter()
            .enumerate()
            .map(|(i, mut f)| {
                f.id = FileId::from_raw(i as u32);
                f
            })
            .collect();

        let mut graph = DiGraph::with_capacity(files.len(), 0);
        for file in &files {
            graph.add_node(file.id);
        }
        for (from, to) in edges {
            if from != to && from.index() < files.len() && to.index() < files.len() {
                graph.update_edge(node(from), node(to), ());
            }
        }
        Self { files, graph }
    }

    /// Builds a graph by linking every referenced unit name to the files that
    /// define it.
    ///
    /// A name defined by several files links to all of them. Names defined
    /// nowhere in the project are ignored.
    pub fn from_units(files: Vec<SourceFile>) -> Self {
        let mut definers: BTreeMap<&str, Vec<FileId>> = BTreeMap::new();
        for (i, file) in files.iter().enumerate() {
            for unit in &file.units {
                definers
                    .entry(unit.as_str())
                    .or_default()
                    .push(FileId::from_raw(i as u32));
            }
        }

        let mut edges = Vec::new();
        for (i, file) in files.iter().enumerate() {
            let from = FileId::from_raw(i as u32);
            for name in &file.uses {
                for &to in definers.get(name.as_str()).into_iter().flatten() {
                    if to != from {
                        debug!(
                            file = %file.path.display(),
                            dependency = %files[to.index()].path.display(),
                            unit = %name,
                            "linked unit reference"
                        );
                        edges.push((from, to));
                    }
                }
            }
        }
        Self::from_edges(files, edges)
    }

    /// Number of dependency edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Direct dependencies of `id`, in id order.
    pub fn direct_dependencies(&self, id: FileId) -> Vec<FileId> {
        let mut deps: Vec<FileId> = self
            .graph
            .neighbors_directed(node(id), Direction::Outgoing)
            .map(|n| self.graph[n])
            .collect();
        deps.sort();
        deps
    }

    fn cycle_error(&self) -> CycleError {
        let mut members: Vec<&SourceFile> = kosaraju_scc(&self.graph)
            .into_iter()
            .find(|scc| scc.len() > 1)
            .unwrap_or_default()
            .into_iter()
            .map(|n| &self.files[self.graph[n].index()])
            .collect();
        members.sort_by(|a, b| a.path.cmp(&b.path));
        CycleError {
            files: members.into_iter().map(|f| f.path.clone()).collect(),
        }
    }
}

fn node(id: FileId) -> NodeIndex {
    NodeIndex::new(id.index())
}

impl ProjectGraph for FileGraph {
    fn source_files(&self) -> &[SourceFile] {
        &self.files
    }

    fn dependents_of(&self, files: &FileSet) -> FileSet {
        let reversed = Reversed(&self.graph);
        let mut out = FileSet::new();
        for &start in files {
            let mut dfs = Dfs::new(reversed, node(start));
            while let Some(n) = dfs.next(reversed) {
                out.insert(self.graph[n]);
            }
        }
        out
    }

    fn dependencies_of(&self, files: &FileSet) -> FileSet {
        let mut out = FileSet::new();
        for &start in files {
            let mut dfs = Dfs::new(&self.graph, node(start));
            while let Some(n) = dfs.next(&self.graph) {
                out.insert(self.graph[n]);
            }
        }
        out
    }

    /// Kahn's algorithm over "remaining dependency" counts, always taking the
    /// lowest ready id so the order is stable for a given file list.
    fn topological_order(&self) -> Result<Vec<FileId>, CycleError> {
        let mut remaining: Vec<usize> = self
            .graph
            .node_indices()
            .map(|n| self.graph.neighbors_directed(n, Direction::Outgoing).count())
            .collect();
        let mut ready: BTreeSet<FileId> = self
            .graph
            .node_indices()
            .filter(|n| remaining[n.index()] == 0)
            .map(|n| self.graph[n])
            .collect();

        let mut order = Vec::with_capacity(self.files.len());
        while let Some(id) = ready.pop_first() {
            order.push(id);
            for dependent in self.graph.neighbors_directed(node(id), Direction::Incoming) {
                let count = &mut remaining[dependent.index()];
                *count -= 1;
                if *count == 0 {
                    ready.insert(self.graph[dependent]);
                }
            }
        }

        if order.len() != self.files.len() {
            return Err(self.cycle_error());
        }
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(i: u32, name: &str) -> SourceFile {
        SourceFile::new(FileId::from_raw(i), format!("/p/{name}.v"), "lib").with_units([name])
    }

    fn id(i: u32) -> FileId {
        FileId::from_raw(i)
    }

    fn set(ids: &[u32]) -> FileSet {
        ids.iter().map(|&i| id(i)).collect()
    }

    /// a depends on b, c depends on b.
    fn shared_dependency() -> FileGraph {
        FileGraph::from_edges(
            vec![file(0, "a"), file(1, "b"), file(2, "c")],
            [(id(0), id(1)), (id(2), id(1))],
        )
    }

    #[test]
    fn dependencies_are_transitive_and_inclusive() {
        let g = FileGraph::from_edges(
            vec![file(0, "top"), file(1, "mid"), file(2, "leaf"), file(3, "other")],
            [(id(0), id(1)), (id(1), id(2))],
        );
        assert_eq!(g.dependencies_of(&set(&[0])), set(&[0, 1, 2]));
        assert_eq!(g.dependencies_of(&set(&[3])), set(&[3]));
    }

    #[test]
    fn dependents_are_transitive_and_inclusive() {
        let g = shared_dependency();
        assert_eq!(g.dependents_of(&set(&[1])), set(&[0, 1, 2]));
        assert_eq!(g.dependents_of(&set(&[0])), set(&[0]));
    }

    #[test]
    fn topological_order_puts_dependencies_first() {
        let g = shared_dependency();
        assert_eq!(g.topological_order().unwrap(), vec![id(1), id(0), id(2)]);
    }

    #[test]
    fn topological_order_independent_files_keep_id_order() {
        let g = FileGraph::from_edges(vec![file(0, "x"), file(1, "y"), file(2, "z")], []);
        assert_eq!(g.topological_order().unwrap(), vec![id(0), id(1), id(2)]);
    }

    #[test]
    fn cycle_is_reported_with_members() {
        let g = FileGraph::from_edges(
            vec![file(0, "a"), file(1, "b"), file(2, "c")],
            [(id(0), id(1)), (id(1), id(0)), (id(2), id(0))],
        );
        let err = g.topological_order().unwrap_err();
        assert_eq!(
            err.files,
            vec![
                std::path::PathBuf::from("/p/a.v"),
                std::path::PathBuf::from("/p/b.v")
            ]
        );
    }

    #[test]
    fn self_and_repeated_edges_are_dropped() {
        let g = FileGraph::from_edges(
            vec![file(0, "a"), file(1, "b")],
            [(id(0), id(0)), (id(0), id(1)), (id(0), id(1))],
        );
        assert_eq!(g.edge_count(), 1);
        assert!(g.topological_order().is_ok());
    }

    #[test]
    fn from_units_links_references() {
        let files = vec![
            file(0, "adder_tb").with_uses(["adder", "not_in_project"]),
            file(1, "adder"),
            file(2, "subtract_tb").with_uses(["subtract"]),
            file(3, "subtract"),
        ];
        let g = FileGraph::from_units(files);
        assert_eq!(g.direct_dependencies(id(0)), vec![id(1)]);
        assert_eq!(g.direct_dependencies(id(2)), vec![id(3)]);
        assert_eq!(g.edge_count(), 2);
    }

    #[test]
    fn from_units_ignores_self_reference() {
        let g = FileGraph::from_units(vec![file(0, "rec").with_uses(["rec"])]);
        assert_eq!(g.edge_count(), 0);
    }

    #[test]
    fn from_edges_reassigns_ids() {
        let g = FileGraph::from_edges(vec![file(9, "a"), file(4, "b")], []);
        assert_eq!(g.source_files()[0].id, id(0));
        assert_eq!(g.file(id(1)).path, std::path::PathBuf::from("/p/b.v"));
    }
}
