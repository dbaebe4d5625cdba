//! Build-order resolution for one requested top-level.

use crate::adapter::DependencyGraph;
use crate::error::BuildError;
use crate::top_level::TopLevelIndex;
use ivy_config::ClosureMode;
use ivy_project::{FileId, ProjectGraph, SourceFile};
use tracing::debug;

/// Returns the files to compile for `name`, dependencies first.
///
/// The result is the project's topological order filtered to the
/// top-level's dependency closure. Under [`ClosureMode::RetainNonTop`] every
/// file that is not a root is kept as well, so only unrelated top-levels are
/// dropped.
pub fn resolve(
    graph: &DependencyGraph<'_>,
    index: &TopLevelIndex,
    name: &str,
    mode: ClosureMode,
) -> Result<Vec<FileId>, BuildError> {
    let top = index.lookup(name)?;
    let closure = graph.closure(top);
    let order: Vec<FileId> = graph
        .order()
        .iter()
        .copied()
        .filter(|id| match mode {
            ClosureMode::Strict => closure.contains(id),
            ClosureMode::RetainNonTop => closure.contains(id) || !graph.is_root(*id),
        })
        .collect();
    debug!(
        top = name,
        closure = closure.len(),
        files = order.len(),
        ?mode,
        "resolved build order"
    );
    Ok(order)
}

/// Builds the adapter and index for `graph` and resolves `name` strictly.
///
/// Convenience for hosts that resolve a single top-level per pass.
pub fn resolve_build_order<'g>(
    graph: &'g dyn ProjectGraph,
    name: &str,
) -> Result<Vec<&'g SourceFile>, BuildError> {
    let adapter = DependencyGraph::new(graph)?;
    let index = TopLevelIndex::build(&adapter)?;
    let order = resolve(&adapter, &index, name, ClosureMode::Strict)?;
    Ok(order.into_iter().map(|id| adapter.file(id)).collect())
}
