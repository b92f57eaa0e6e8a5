//! Taint tracking overlay on the pointer analysis.
//!
//! Taint objects are distinguished heap objects fabricated at configured
//! *source* calls; they ride the ordinary points-to machinery, so the
//! pointer-analysis fixpoint propagates them with no extra solver logic.
//! What the overlay adds:
//!
//! - a contextless **flow map** of taint transfer edges: when new points-to
//!   arrives at the source pointer of an edge, the taints among the arrivals
//!   are re-tagged with the edge's declared type and injected at the target
//!   pointer, triggering another worklist round
//! - **sink recording**: argument pointers at configured sink positions are
//!   remembered, and at the fixpoint every taint object found in their
//!   points-to sets becomes a [`TaintFlow`] record
//!
//! The solver owns the hooks (see [`crate::pta::solver`]); this module owns
//! the configuration and the overlay state.

pub mod config;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::{
    ir::{StmtId, TypeId},
    pta::PointerId,
};

pub use config::{TaintConfig, TaintTransfer, TransferEnd};

/// A witnessed taint propagation: a source call whose taint reached a sink
/// call's parameter position.
///
/// Flows order by (source, sink, parameter index), which is the order result
/// sets are reported in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TaintFlow {
    /// The call site that fabricated the taint.
    pub source: StmtId,
    /// The sink call site the taint reached.
    pub sink: StmtId,
    /// The sink parameter position (`-1` denotes the receiver).
    pub index: i32,
}

/// The overlay state carried through one pointer-analysis run.
#[derive(Debug)]
pub struct TaintAnalysis {
    config: TaintConfig,
    flow_edges: FxHashMap<PointerId, Vec<(PointerId, TypeId)>>,
    flow_edge_set: FxHashSet<(PointerId, PointerId, TypeId)>,
    sinks: Vec<(StmtId, i32, PointerId)>,
    sink_set: FxHashSet<(StmtId, i32, PointerId)>,
}

impl TaintAnalysis {
    /// Creates the overlay for a resolved configuration.
    #[must_use]
    pub fn new(config: TaintConfig) -> Self {
        Self {
            config,
            flow_edges: FxHashMap::default(),
            flow_edge_set: FxHashSet::default(),
            sinks: Vec::new(),
            sink_set: FxHashSet::default(),
        }
    }

    /// The resolved configuration.
    #[must_use]
    pub const fn config(&self) -> &TaintConfig {
        &self.config
    }

    /// Adds a transfer edge to the flow map, returning `true` on first
    /// insertion.
    pub fn add_flow_edge(&mut self, source: PointerId, target: PointerId, ty: TypeId) -> bool {
        if !self.flow_edge_set.insert((source, target, ty)) {
            return false;
        }
        self.flow_edges.entry(source).or_default().push((target, ty));
        true
    }

    /// The transfer edges leaving a pointer.
    #[must_use]
    pub fn edges_of(&self, source: PointerId) -> &[(PointerId, TypeId)] {
        match self.flow_edges.get(&source) {
            Some(edges) => edges,
            None => &[],
        }
    }

    /// Records a pointer sitting at a sink position.
    pub fn record_sink(&mut self, callsite: StmtId, index: i32, pointer: PointerId) {
        if self.sink_set.insert((callsite, index, pointer)) {
            self.sinks.push((callsite, index, pointer));
        }
    }

    /// The recorded sink positions.
    #[must_use]
    pub fn sinks(&self) -> &[(StmtId, i32, PointerId)] {
        &self.sinks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_taint_flow_ordering() {
        let s = StmtId::new(1);
        let t = StmtId::new(2);
        let a = TaintFlow {
            source: s,
            sink: t,
            index: 0,
        };
        let b = TaintFlow {
            source: s,
            sink: t,
            index: 1,
        };
        let c = TaintFlow {
            source: t,
            sink: s,
            index: 0,
        };
        let mut flows = vec![c, b, a];
        flows.sort();
        assert_eq!(flows, vec![a, b, c]);
    }
}
