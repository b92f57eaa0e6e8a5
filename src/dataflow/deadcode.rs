//! Dead-code detection.
//!
//! A client of the CFG, constant propagation and live variables. Two kinds of
//! dead code are reported:
//!
//! - **Unreachable statements**: the CFG is traversed from the entry while
//!   honoring constant-folded branches: an `If` whose guard folds to a
//!   constant only follows the matching outcome, a `Switch` over a constant
//!   only follows the matching case (or the default). Whatever the walk
//!   never reaches is dead.
//! - **Useless assignments**: an assignment whose target is not live on exit
//!   and whose right-hand side is side-effect free. Allocations, casts,
//!   field and array accesses and integer division/remainder all count as
//!   side-effecting (they may trap or touch the heap), so such assignments
//!   are never removed.
//!
//! The result is ordered by intra-method statement index.

use std::collections::BTreeSet;

use rustc_hash::FxHashSet;

use crate::{
    cfg::{Cfg, CfgEdgeKind, CfgNode},
    dataflow::{
        constprop::{evaluate, CpFact},
        fact::{DataflowResult, SetFact},
    },
    ir::{Exp, Stmt, StmtId, VarId},
    Program,
};

/// Analysis id under which results are stored.
pub const ID: &str = "deadcode";

/// Dead-code detection over one method.
pub struct DeadCodeDetection<'a> {
    program: &'a Program,
}

impl<'a> DeadCodeDetection<'a> {
    /// Creates the detection over the given program.
    #[must_use]
    pub const fn new(program: &'a Program) -> Self {
        Self { program }
    }

    /// Finds the dead statements of the method behind `cfg`.
    ///
    /// `constants` and `live_vars` are the solved constant-propagation and
    /// live-variable results for the same CFG.
    #[must_use]
    pub fn find(
        &self,
        cfg: &Cfg,
        constants: &DataflowResult<CpFact>,
        live_vars: &DataflowResult<SetFact<VarId>>,
    ) -> Vec<StmtId> {
        let mut dead: BTreeSet<StmtId> = BTreeSet::new();
        let mut visited: FxHashSet<usize> = FxHashSet::default();
        let mut stack: Vec<usize> = vec![cfg.entry()];

        while let Some(node) = stack.pop() {
            if !visited.insert(node) {
                continue;
            }
            let CfgNode::Stmt(sid) = cfg.node(node) else {
                for succ in cfg.succs_of(node) {
                    stack.push(succ);
                }
                continue;
            };
            let stmt = &self.program.stmt(sid).kind;

            if let Some((lhs, side_effect_free)) = assignment_of(stmt) {
                if side_effect_free && !live_vars.out_fact(node).contains(lhs) {
                    dead.insert(sid);
                }
            }

            if let Stmt::If { cond, .. } = stmt {
                let value = evaluate(&cond.as_exp(), constants.out_fact(node));
                if let Some(c) = value.as_const() {
                    for edge in cfg.out_edges_of(node) {
                        if (c == 1 && edge.kind == CfgEdgeKind::IfTrue)
                            || (c == 0 && edge.kind == CfgEdgeKind::IfFalse)
                        {
                            stack.push(edge.target);
                        }
                    }
                    continue;
                }
            }

            if let Stmt::Switch { var, cases, .. } = stmt {
                if let Some(c) = constants.out_fact(node).get(*var).as_const() {
                    let matched = cases.iter().any(|&(value, _)| value == c);
                    for edge in cfg.out_edges_of(node) {
                        let follow = match edge.kind {
                            CfgEdgeKind::SwitchCase(value) => matched && value == c,
                            CfgEdgeKind::SwitchDefault => !matched,
                            _ => false,
                        };
                        if follow {
                            stack.push(edge.target);
                        }
                    }
                    continue;
                }
            }

            for succ in cfg.succs_of(node) {
                if !visited.contains(&succ) {
                    stack.push(succ);
                }
            }
        }

        if let Some(body) = self.program.method(cfg.method()).body() {
            for &sid in &body.stmts {
                if !visited.contains(&cfg.node_of_stmt(self.program, sid)) {
                    dead.insert(sid);
                }
            }
        }

        dead.into_iter().collect()
    }
}

/// Classifies a statement as an assignment to a variable, returning the
/// target and whether the right-hand side is side-effect free.
///
/// Allocation modifies the heap; a cast may throw; field access may trigger
/// initialization or a null-pointer trap; array access may trap on null or
/// bounds; division and remainder may trap on zero. Calls are never
/// removable.
fn assignment_of(stmt: &Stmt) -> Option<(VarId, bool)> {
    match stmt {
        Stmt::Copy { lhs, .. } => Some((*lhs, true)),
        Stmt::Assign { lhs, rhs } => {
            let pure = match rhs {
                Exp::Cast { .. } => false,
                Exp::Binary { op, .. } => !op.is_division(),
                Exp::IntLiteral(_) | Exp::Var(_) => true,
            };
            Some((*lhs, pure))
        }
        Stmt::New { lhs, .. } | Stmt::LoadField { lhs, .. } | Stmt::LoadArray { lhs, .. } => {
            Some((*lhs, false))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assignment_classification() {
        let v = VarId::new(0);
        let w = VarId::new(1);
        assert_eq!(assignment_of(&Stmt::Copy { lhs: v, rhs: w }), Some((v, true)));
        assert_eq!(
            assignment_of(&Stmt::Assign {
                lhs: v,
                rhs: Exp::IntLiteral(1)
            }),
            Some((v, true))
        );
        assert_eq!(
            assignment_of(&Stmt::Assign {
                lhs: v,
                rhs: Exp::Binary {
                    op: crate::ir::BinaryOp::Div,
                    lhs: w,
                    rhs: w
                }
            }),
            Some((v, false))
        );
        assert_eq!(assignment_of(&Stmt::Return(Some(v))), None);
    }
}
