//! The call graph container.

use std::hash::Hash;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::ir::stmt::CallKind;

/// An edge of the call graph: a call site invoking a callee with a given
/// kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallEdge<C, M> {
    /// The invocation kind at the call site.
    pub kind: CallKind,
    /// The call site.
    pub callsite: C,
    /// The resolved callee.
    pub callee: M,
}

/// A directed multigraph from call sites to methods.
///
/// Generic over the call-site handle `C` and the method handle `M`; both the
/// context-insensitive graph (`CallGraph<StmtId, MethodId>`) and the
/// context-sensitive one used inside the pointer analysis are instances.
///
/// The reachable-method set and the edge set only ever grow; insertion order
/// of reachable methods is preserved for deterministic iteration.
#[derive(Debug)]
pub struct CallGraph<C, M> {
    entries: Vec<M>,
    reachable: Vec<M>,
    reachable_set: FxHashSet<M>,
    edges: Vec<CallEdge<C, M>>,
    edge_set: FxHashSet<(C, M)>,
    callees: FxHashMap<C, Vec<CallEdge<C, M>>>,
    callers: FxHashMap<M, Vec<CallEdge<C, M>>>,
    callsites_in: FxHashMap<M, Vec<C>>,
    container_of: FxHashMap<C, M>,
}

impl<C, M> Default for CallGraph<C, M>
where
    C: Copy + Eq + Hash,
    M: Copy + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<C, M> CallGraph<C, M>
where
    C: Copy + Eq + Hash,
    M: Copy + Eq + Hash,
{
    /// Creates an empty call graph.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            reachable: Vec::new(),
            reachable_set: FxHashSet::default(),
            edges: Vec::new(),
            edge_set: FxHashSet::default(),
            callees: FxHashMap::default(),
            callers: FxHashMap::default(),
            callsites_in: FxHashMap::default(),
            container_of: FxHashMap::default(),
        }
    }

    /// Registers an entry method (also marking it reachable).
    pub fn add_entry_method(&mut self, method: M) {
        self.entries.push(method);
        self.add_reachable_method(method);
    }

    /// Marks a method reachable, returning `true` if it was new.
    pub fn add_reachable_method(&mut self, method: M) -> bool {
        if self.reachable_set.insert(method) {
            self.reachable.push(method);
            return true;
        }
        false
    }

    /// Returns `true` if the method is reachable.
    #[must_use]
    pub fn contains(&self, method: M) -> bool {
        self.reachable_set.contains(&method)
    }

    /// Records a call site belonging to a (reachable) container method.
    pub fn add_callsite(&mut self, callsite: C, container: M) {
        if self.container_of.insert(callsite, container).is_none() {
            self.callsites_in.entry(container).or_default().push(callsite);
        }
    }

    /// Adds an edge, returning `true` if it was not present yet.
    ///
    /// Duplicate (call site, callee) pairs are coalesced regardless of kind.
    pub fn add_edge(&mut self, edge: CallEdge<C, M>) -> bool {
        if !self.edge_set.insert((edge.callsite, edge.callee)) {
            return false;
        }
        self.edges.push(edge);
        self.callees.entry(edge.callsite).or_default().push(edge);
        self.callers.entry(edge.callee).or_default().push(edge);
        true
    }

    /// The entry methods.
    #[must_use]
    pub fn entry_methods(&self) -> &[M] {
        &self.entries
    }

    /// The reachable methods in insertion order.
    #[must_use]
    pub fn reachable_methods(&self) -> &[M] {
        &self.reachable
    }

    /// All edges in insertion order.
    #[must_use]
    pub fn edges(&self) -> &[CallEdge<C, M>] {
        &self.edges
    }

    /// The callees resolved for a call site.
    pub fn callees_of(&self, callsite: C) -> impl Iterator<Item = M> + '_ {
        self.callees
            .get(&callsite)
            .into_iter()
            .flatten()
            .map(|e| e.callee)
    }

    /// The edges targeting a method.
    #[must_use]
    pub fn callers_of(&self, callee: M) -> &[CallEdge<C, M>] {
        match self.callers.get(&callee) {
            Some(edges) => edges,
            None => &[],
        }
    }

    /// The recorded call sites of a container method.
    #[must_use]
    pub fn callsites_in(&self, container: M) -> &[C] {
        match self.callsites_in.get(&container) {
            Some(sites) => sites,
            None => &[],
        }
    }

    /// The container method of a recorded call site.
    #[must_use]
    pub fn container_of(&self, callsite: C) -> Option<M> {
        self.container_of.get(&callsite).copied()
    }

    /// Returns `true` if at least one edge leaves the call site.
    #[must_use]
    pub fn is_resolved_callsite(&self, callsite: C) -> bool {
        self.callees.contains_key(&callsite)
    }

    /// Number of reachable methods.
    #[must_use]
    pub fn method_count(&self) -> usize {
        self.reachable.len()
    }

    /// Number of coalesced edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edges_are_coalesced() {
        let mut cg: CallGraph<u32, u32> = CallGraph::new();
        cg.add_entry_method(0);
        cg.add_reachable_method(1);
        let edge = CallEdge {
            kind: CallKind::Static,
            callsite: 100,
            callee: 1,
        };
        assert!(cg.add_edge(edge));
        assert!(!cg.add_edge(edge));
        assert_eq!(cg.edge_count(), 1);
        assert_eq!(cg.callees_of(100).collect::<Vec<_>>(), vec![1]);
        assert_eq!(cg.callers_of(1).len(), 1);
    }

    #[test]
    fn test_reachable_set_grows_once() {
        let mut cg: CallGraph<u32, u32> = CallGraph::new();
        assert!(cg.add_reachable_method(7));
        assert!(!cg.add_reachable_method(7));
        assert!(cg.contains(7));
        assert_eq!(cg.reachable_methods(), &[7]);
    }

    #[test]
    fn test_callsite_registration() {
        let mut cg: CallGraph<u32, u32> = CallGraph::new();
        cg.add_reachable_method(1);
        cg.add_callsite(10, 1);
        cg.add_callsite(11, 1);
        cg.add_callsite(10, 1);
        assert_eq!(cg.callsites_in(1), &[10, 11]);
        assert_eq!(cg.container_of(10), Some(1));
        assert_eq!(cg.container_of(99), None);
    }
}
