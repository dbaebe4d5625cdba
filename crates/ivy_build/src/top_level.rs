//! Mapping from design-unit name to the root file that defines it.

use crate::adapter::DependencyGraph;
use crate::error::BuildError;
use ivy_project::FileId;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use tracing::error;

/// Every design unit defined by a root file, keyed by name.
///
/// Built once per build pass and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopLevelIndex {
    units: BTreeMap<String, FileId>,
}

impl TopLevelIndex {
    /// Indexes the units of every root file of `graph`.
    ///
    /// Fails with [`BuildError::DuplicateTopLevel`] when two different root
    /// files define the same unit.
    pub fn build(graph: &DependencyGraph<'_>) -> Result<Self, BuildError> {
        let mut units = BTreeMap::new();
        for &id in graph.roots() {
            for unit in &graph.file(id).units {
                match units.entry(unit.clone()) {
                    Entry::Vacant(slot) => {
                        slot.insert(id);
                    }
                    Entry::Occupied(slot) if *slot.get() != id => {
                        return Err(BuildError::DuplicateTopLevel {
                            unit: unit.clone(),
                            first: graph.file(*slot.get()).path.clone(),
                            second: graph.file(id).path.clone(),
                        });
                    }
                    Entry::Occupied(_) => {}
                }
            }
        }
        Ok(Self { units })
    }

    /// Returns the root file defining `name`.
    pub fn lookup(&self, name: &str) -> Result<FileId, BuildError> {
        self.units.get(name).copied().ok_or_else(|| {
            let known = self.names();
            error!(requested = name, known = ?known, "unknown top-level");
            BuildError::UnknownTopLevel {
                requested: name.to_string(),
                known,
            }
        })
    }

    /// All top-level names, sorted.
    pub fn names(&self) -> Vec<String> {
        self.units.keys().cloned().collect()
    }

    /// Iterates `(name, file)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, FileId)> + '_ {
        self.units.iter().map(|(name, &id)| (name.as_str(), id))
    }

    /// Number of indexed top-levels.
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Returns true if no root file defines any unit.
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}
