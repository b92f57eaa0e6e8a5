//! Live variable analysis.
//!
//! A variable is *live* at a program point if some path from that point
//! reaches a use of the variable without passing a redefinition. This is the
//! classic backward may-analysis: the lattice is the set of live variables,
//! the meet is union, and the transfer is `in = use ∪ (out \ def)`.
//!
//! Dead-code detection consumes the out-facts: an assignment whose target is
//! not live on exit (and whose right-hand side cannot trap) is dead.

use crate::{
    cfg::{Cfg, CfgNode},
    dataflow::{
        fact::SetFact,
        framework::{DataflowAnalysis, Direction},
    },
    ir::VarId,
    Program,
};

/// Analysis id under which results are stored.
pub const ID: &str = "livevar";

/// Live variable analysis (backward, may).
pub struct LiveVariableAnalysis<'a> {
    program: &'a Program,
}

impl<'a> LiveVariableAnalysis<'a> {
    /// Creates the analysis over the given program.
    #[must_use]
    pub const fn new(program: &'a Program) -> Self {
        Self { program }
    }
}

impl DataflowAnalysis for LiveVariableAnalysis<'_> {
    type Fact = SetFact<VarId>;
    const DIRECTION: Direction = Direction::Backward;

    fn new_boundary_fact(&self, _cfg: &Cfg) -> SetFact<VarId> {
        SetFact::new()
    }

    fn new_initial_fact(&self) -> SetFact<VarId> {
        SetFact::new()
    }

    fn meet_into(&self, fact: &SetFact<VarId>, target: &mut SetFact<VarId>) {
        target.union_with(fact);
    }

    fn transfer_node(
        &self,
        node: CfgNode,
        in_fact: &mut SetFact<VarId>,
        out_fact: &mut SetFact<VarId>,
    ) -> bool {
        let mut new_in = out_fact.clone();
        if let CfgNode::Stmt(sid) = node {
            let stmt = &self.program.stmt(sid).kind;
            if let Some(def) = stmt.def() {
                new_in.remove(def);
            }
            for use_var in stmt.uses() {
                new_in.insert(use_var);
            }
        }
        in_fact.set_to(&new_in)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dataflow::solver::DataflowSolver,
        ir::{BinaryOp, MethodFlags, PrimType, ProgramBuilder},
    };

    #[test]
    fn test_straight_line_liveness() {
        let mut pb = ProgramBuilder::new();
        let int = pb.primitive(PrimType::Int);
        let c = pb.add_class("C", None);
        let m = pb.declare_method(c, "m", &[], Some(int), MethodFlags::STATIC);
        let mut b = pb.body(m);
        let x = b.var("x", int);
        let y = b.var("y", int);
        let z = b.var("z", int);
        // 0: x = 1
        // 1: y = 2
        // 2: z = x + y
        // 3: return z
        b.assign_literal(x, 1);
        b.assign_literal(y, 2);
        b.assign_binary(z, BinaryOp::Add, x, y);
        b.ret(Some(z));
        b.seal().unwrap();
        let program = pb.finish();

        let cfg = Cfg::build(&program, m);
        let result = DataflowSolver::new(LiveVariableAnalysis::new(&program)).solve(&cfg);

        // x and y are live between their definitions and the addition
        let before_add = result.in_fact(cfg.node_of_index(2));
        assert!(before_add.contains(x));
        assert!(before_add.contains(y));
        assert!(!before_add.contains(z));

        // z is live right before the return, nothing after it
        let before_ret = result.in_fact(cfg.node_of_index(3));
        assert!(before_ret.contains(z));
        assert!(result.out_fact(cfg.node_of_index(3)).is_empty());

        // x is not live before its own definition
        assert!(!result.in_fact(cfg.node_of_index(0)).contains(x));
    }

    #[test]
    fn test_branch_keeps_either_use_alive() {
        let mut pb = ProgramBuilder::new();
        let int = pb.primitive(PrimType::Int);
        let c = pb.add_class("C", None);
        let m = pb.declare_method(c, "m", &[int], Some(int), MethodFlags::STATIC);
        let mut b = pb.body(m);
        let p = b.param(0);
        let a = b.var("a", int);
        let r = b.var("r", int);
        // 0: a = 5
        // 1: if (p < a) goto 4
        // 2: r = p
        // 3: goto 5
        // 4: r = a
        // 5: return r
        b.assign_literal(a, 5);
        b.if_cmp(BinaryOp::Lt, p, a, 4);
        b.copy(r, p);
        b.goto(5);
        b.copy(r, a);
        b.ret(Some(r));
        b.seal().unwrap();
        let program = pb.finish();

        let cfg = Cfg::build(&program, m);
        let result = DataflowSolver::new(LiveVariableAnalysis::new(&program)).solve(&cfg);

        // after the branch both p and a may still be read
        let out_if = result.out_fact(cfg.node_of_index(1));
        assert!(out_if.contains(p));
        assert!(out_if.contains(a));
    }
}
