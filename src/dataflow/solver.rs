//! Worklist-based data flow solver.
//!
//! This module provides the iterative solver that computes fixpoints for
//! intra-procedural data flow analyses. It uses a FIFO worklist seeded in
//! reverse postorder (postorder for backward analyses) with a set-backed
//! in-queue check, so no node is queued twice at the same time but every
//! (node, changed-neighbor) pair is eventually reconsidered.
//!
//! # Algorithm
//!
//! 1. Initialize every node's in- and out-fact with the initial fact
//! 2. Set the boundary fact at the entry (forward) or exit (backward) node
//! 3. Queue all non-boundary nodes
//! 4. While the worklist is non-empty: pop a node, join the neighbor facts
//!    into its input side, apply the transfer function, and re-enqueue the
//!    dependents when the output side changed
//!
//! Worklist order does not affect the final fixpoint (monotone framework,
//! finite-height lattice); it only affects how fast the solver converges.

use std::collections::VecDeque;

use crate::{
    cfg::Cfg,
    dataflow::{
        fact::DataflowResult,
        framework::{DataflowAnalysis, Direction},
    },
};

/// Worklist-based data flow solver.
///
/// # Usage
///
/// ```rust,ignore
/// use irscope::dataflow::{ConstantPropagation, DataflowSolver};
///
/// let analysis = ConstantPropagation::new(&program);
/// let result = DataflowSolver::new(analysis).solve(&cfg);
/// let exit_fact = result.out_fact(cfg.exit());
/// ```
pub struct DataflowSolver<A: DataflowAnalysis> {
    analysis: A,
    worklist: VecDeque<usize>,
    in_worklist: Vec<bool>,
    iterations: usize,
}

impl<A: DataflowAnalysis> DataflowSolver<A> {
    /// Creates a new solver for the given analysis.
    #[must_use]
    pub fn new(analysis: A) -> Self {
        Self {
            analysis,
            worklist: VecDeque::new(),
            in_worklist: Vec::new(),
            iterations: 0,
        }
    }

    /// Number of node visits performed by the last [`DataflowSolver::solve`].
    #[must_use]
    pub const fn iterations(&self) -> usize {
        self.iterations
    }

    /// Solves the analysis over the given CFG to a fixpoint.
    pub fn solve(mut self, cfg: &Cfg) -> DataflowResult<A::Fact> {
        let n = cfg.node_count();
        let mut result = DataflowResult::new(
            (0..n).map(|_| self.analysis.new_initial_fact()).collect(),
            (0..n).map(|_| self.analysis.new_initial_fact()).collect(),
        );

        let boundary_node = match A::DIRECTION {
            Direction::Forward => cfg.entry(),
            Direction::Backward => cfg.exit(),
        };
        result.in_facts[boundary_node] = self.analysis.new_boundary_fact(cfg);
        result.out_facts[boundary_node] = self.analysis.new_boundary_fact(cfg);

        self.in_worklist = vec![false; n];
        let order = match A::DIRECTION {
            Direction::Forward => cfg.reverse_postorder(),
            Direction::Backward => cfg.postorder(),
        };
        for node in order {
            if node != boundary_node {
                self.worklist.push_back(node);
                self.in_worklist[node] = true;
            }
        }

        while let Some(node) = self.worklist.pop_front() {
            self.in_worklist[node] = false;
            self.iterations += 1;

            let changed = match A::DIRECTION {
                Direction::Forward => self.process_forward(node, cfg, &mut result),
                Direction::Backward => self.process_backward(node, cfg, &mut result),
            };
            if changed {
                self.enqueue_dependents(node, cfg, boundary_node);
            }
        }

        log::debug!(
            "dataflow solver finished after {} node visits over {} nodes",
            self.iterations,
            n
        );
        result
    }

    /// Joins predecessor out-facts into the node's in-fact, then transfers.
    fn process_forward(&self, node: usize, cfg: &Cfg, result: &mut DataflowResult<A::Fact>) -> bool {
        let mut new_in = self.analysis.new_initial_fact();
        for pred in cfg.preds_of(node) {
            self.analysis.meet_into(&result.out_facts[pred], &mut new_in);
        }
        result.in_facts[node] = new_in;

        let DataflowResult {
            in_facts,
            out_facts,
        } = result;
        self.analysis
            .transfer_node(cfg.node(node), &mut in_facts[node], &mut out_facts[node])
    }

    /// Joins successor in-facts into the node's out-fact, then transfers.
    fn process_backward(
        &self,
        node: usize,
        cfg: &Cfg,
        result: &mut DataflowResult<A::Fact>,
    ) -> bool {
        let mut new_out = self.analysis.new_initial_fact();
        for succ in cfg.succs_of(node) {
            self.analysis.meet_into(&result.in_facts[succ], &mut new_out);
        }
        result.out_facts[node] = new_out;

        let DataflowResult {
            in_facts,
            out_facts,
        } = result;
        self.analysis
            .transfer_node(cfg.node(node), &mut in_facts[node], &mut out_facts[node])
    }

    fn enqueue_dependents(&mut self, node: usize, cfg: &Cfg, boundary_node: usize) {
        let dependents: Vec<usize> = match A::DIRECTION {
            Direction::Forward => cfg.succs_of(node).collect(),
            Direction::Backward => cfg.preds_of(node).collect(),
        };
        for dep in dependents {
            if dep != boundary_node && !self.in_worklist[dep] {
                self.worklist.push_back(dep);
                self.in_worklist[dep] = true;
            }
        }
    }
}
