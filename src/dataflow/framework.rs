//! Data flow analysis framework trait and direction.
//!
//! This module defines the core abstraction for intra-procedural data flow
//! analyses. Any specific analysis (live variables, constant propagation)
//! implements the [`DataflowAnalysis`] trait to work with the solver. Facts
//! are opaque to the solver: it only creates, meets and transfers them
//! through the capability methods below.

use crate::cfg::{Cfg, CfgNode};

/// Direction of data flow analysis.
///
/// The direction determines how information propagates through the CFG and
/// which neighbor set is joined over at merge points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Information flows forward, from entry to exit.
    ///
    /// The in-fact of a node is the join over its predecessors' out-facts.
    /// Example: constant propagation.
    Forward,

    /// Information flows backward, from exit to entry.
    ///
    /// The out-fact of a node is the join over its successors' in-facts.
    /// Example: live variables.
    Backward,
}

/// An intra-procedural data flow analysis.
///
/// Implementations provide the lattice operations and the per-node transfer
/// function; [`DataflowSolver`](crate::dataflow::DataflowSolver) handles
/// iteration to a fixpoint.
///
/// # Transfer Functions
///
/// `transfer_node` receives both facts of a node and mutates the
/// direction-appropriate one in place, returning whether it changed:
///
/// - Forward: read `in_fact`, update `out_fact`
/// - Backward: read `out_fact`, update `in_fact`
///
/// The solver guarantees the two facts are disjoint storage, so reading one
/// while writing the other is safe regardless of iteration order.
pub trait DataflowAnalysis {
    /// The fact type at each program point.
    type Fact: Clone;

    /// The direction of this analysis.
    const DIRECTION: Direction;

    /// Returns the fact holding at the analysis boundary: the entry node for
    /// forward analyses, the exit node for backward ones.
    fn new_boundary_fact(&self, cfg: &Cfg) -> Self::Fact;

    /// Returns the initial fact for every other node, usually the identity of
    /// the meet.
    fn new_initial_fact(&self) -> Self::Fact;

    /// Joins `fact` into `target` in place.
    fn meet_into(&self, fact: &Self::Fact, target: &mut Self::Fact);

    /// Applies the node transfer function, mutating the output-side fact in
    /// place.
    ///
    /// Returns `true` if the mutated fact changed, which re-enqueues the
    /// node's dependents.
    fn transfer_node(
        &self,
        node: CfgNode,
        in_fact: &mut Self::Fact,
        out_fact: &mut Self::Fact,
    ) -> bool;
}
