//! The pointer-flow graph.
//!
//! A directed graph over pointer nodes; an edge `s -> t` means every object
//! in `s`'s points-to set flows into `t`'s. Edges, once added, are never
//! removed.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::pta::PointerId;

/// The pointer-flow graph of one solve.
#[derive(Debug, Default)]
pub struct PointerFlowGraph {
    succs: FxHashMap<PointerId, FxHashSet<PointerId>>,
    edge_count: usize,
}

impl PointerFlowGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the edge `source -> target`, returning `true` on first
    /// insertion.
    pub fn add_edge(&mut self, source: PointerId, target: PointerId) -> bool {
        let inserted = self.succs.entry(source).or_default().insert(target);
        if inserted {
            self.edge_count += 1;
        }
        inserted
    }

    /// The successors of a pointer.
    pub fn succs_of(&self, source: PointerId) -> impl Iterator<Item = PointerId> + '_ {
        self.succs.get(&source).into_iter().flatten().copied()
    }

    /// Number of edges.
    #[must_use]
    pub const fn edge_count(&self) -> usize {
        self.edge_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_edge_reports_first_insertion() {
        let mut pfg = PointerFlowGraph::new();
        let a = PointerId::new(0);
        let b = PointerId::new(1);
        assert!(pfg.add_edge(a, b));
        assert!(!pfg.add_edge(a, b));
        assert_eq!(pfg.edge_count(), 1);
        assert_eq!(pfg.succs_of(a).collect::<Vec<_>>(), vec![b]);
        assert_eq!(pfg.succs_of(b).count(), 0);
    }
}
