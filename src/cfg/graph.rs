//! Control flow graph representation and construction.
//!
//! The graph is built directly from a sealed method body: node 0 is the
//! synthetic entry, node 1 the synthetic exit, and statement `i` of the body
//! maps to node `i + 2`. Statements that fall off the end of the body flow to
//! the exit node, and unreachable statements still get nodes so dead-code
//! detection can report them.

use crate::{
    cfg::edge::{CfgEdge, CfgEdgeKind},
    ir::{MethodId, Stmt, StmtId},
    Program,
};

/// A node of the control flow graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CfgNode {
    /// The synthetic entry node.
    Entry,
    /// The synthetic exit node.
    Exit,
    /// A statement node.
    Stmt(StmtId),
}

impl CfgNode {
    /// Returns the statement behind a statement node.
    #[must_use]
    pub const fn stmt(&self) -> Option<StmtId> {
        match self {
            Self::Stmt(s) => Some(*s),
            _ => None,
        }
    }
}

/// The control flow graph of one method.
#[derive(Debug)]
pub struct Cfg {
    method: MethodId,
    nodes: Vec<CfgNode>,
    out_edges: Vec<Vec<CfgEdge>>,
    in_edges: Vec<Vec<CfgEdge>>,
}

/// Index of the synthetic entry node.
const ENTRY: usize = 0;
/// Index of the synthetic exit node.
const EXIT: usize = 1;
/// Offset between a statement's intra-method index and its node index.
const STMT_BASE: usize = 2;

impl Cfg {
    /// Builds the CFG of a method from its sealed body.
    ///
    /// Methods without a body (abstract, native) produce a graph with just
    /// the entry and exit nodes connected by an entry edge.
    #[must_use]
    pub fn build(program: &Program, method: MethodId) -> Self {
        let stmts: &[StmtId] = match program.method(method).body() {
            Some(body) => &body.stmts,
            None => &[],
        };

        let mut nodes = vec![CfgNode::Entry, CfgNode::Exit];
        nodes.extend(stmts.iter().map(|&s| CfgNode::Stmt(s)));

        let mut cfg = Self {
            method,
            out_edges: vec![Vec::new(); nodes.len()],
            in_edges: vec![Vec::new(); nodes.len()],
            nodes,
        };

        if stmts.is_empty() {
            cfg.add_edge(ENTRY, EXIT, CfgEdgeKind::Entry);
            return cfg;
        }
        cfg.add_edge(ENTRY, STMT_BASE, CfgEdgeKind::Entry);

        let node_of = |index: usize| STMT_BASE + index;
        let after = |i: usize| if i + 1 < stmts.len() { node_of(i + 1) } else { EXIT };

        for (i, &sid) in stmts.iter().enumerate() {
            let from = node_of(i);
            match &program.stmt(sid).kind {
                Stmt::If { target, .. } => {
                    cfg.add_edge(from, after(i), CfgEdgeKind::IfFalse);
                    cfg.add_edge(from, node_of(*target), CfgEdgeKind::IfTrue);
                }
                Stmt::Goto { target } => {
                    cfg.add_edge(from, node_of(*target), CfgEdgeKind::Goto);
                }
                Stmt::Switch {
                    cases, default, ..
                } => {
                    for &(value, target) in cases {
                        cfg.add_edge(from, node_of(target), CfgEdgeKind::SwitchCase(value));
                    }
                    cfg.add_edge(from, node_of(*default), CfgEdgeKind::SwitchDefault);
                }
                Stmt::Return(_) => {
                    cfg.add_edge(from, EXIT, CfgEdgeKind::Return);
                }
                Stmt::Throw(_) => {
                    cfg.add_edge(from, EXIT, CfgEdgeKind::Exceptional);
                }
                _ => {
                    cfg.add_edge(from, after(i), CfgEdgeKind::FallThrough);
                }
            }
        }
        cfg
    }

    fn add_edge(&mut self, source: usize, target: usize, kind: CfgEdgeKind) {
        let edge = CfgEdge::new(source, target, kind);
        self.out_edges[source].push(edge);
        self.in_edges[target].push(edge);
    }

    /// The method this graph belongs to.
    #[must_use]
    pub const fn method(&self) -> MethodId {
        self.method
    }

    /// Index of the entry node.
    #[must_use]
    pub const fn entry(&self) -> usize {
        ENTRY
    }

    /// Index of the exit node.
    #[must_use]
    pub const fn exit(&self) -> usize {
        EXIT
    }

    /// Number of nodes (statements plus entry and exit).
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// The node at the given index.
    #[must_use]
    pub fn node(&self, index: usize) -> CfgNode {
        self.nodes[index]
    }

    /// The node index of a statement, given its intra-method index.
    #[must_use]
    pub const fn node_of_index(&self, stmt_index: usize) -> usize {
        STMT_BASE + stmt_index
    }

    /// The node index of a statement handle.
    ///
    /// The statement must belong to this graph's method.
    #[must_use]
    pub fn node_of_stmt(&self, program: &Program, stmt: StmtId) -> usize {
        debug_assert_eq!(program.stmt(stmt).method, self.method);
        STMT_BASE + program.stmt(stmt).index
    }

    /// Out-edges of a node.
    #[must_use]
    pub fn out_edges_of(&self, node: usize) -> &[CfgEdge] {
        &self.out_edges[node]
    }

    /// In-edges of a node.
    #[must_use]
    pub fn in_edges_of(&self, node: usize) -> &[CfgEdge] {
        &self.in_edges[node]
    }

    /// Successor node indices of a node.
    pub fn succs_of(&self, node: usize) -> impl Iterator<Item = usize> + '_ {
        self.out_edges[node].iter().map(|e| e.target)
    }

    /// Predecessor node indices of a node.
    pub fn preds_of(&self, node: usize) -> impl Iterator<Item = usize> + '_ {
        self.in_edges[node].iter().map(|e| e.source)
    }

    /// Postorder over the nodes reachable from entry.
    ///
    /// Used to seed backward worklists; [`Cfg::reverse_postorder`] seeds
    /// forward ones. Unreachable nodes are appended at the end so solvers
    /// still initialize facts for them.
    #[must_use]
    pub fn postorder(&self) -> Vec<usize> {
        let mut visited = vec![false; self.nodes.len()];
        let mut order = Vec::with_capacity(self.nodes.len());
        self.postorder_visit(ENTRY, &mut visited, &mut order);
        for n in 0..self.nodes.len() {
            if !visited[n] {
                order.push(n);
            }
        }
        order
    }

    fn postorder_visit(&self, node: usize, visited: &mut [bool], order: &mut Vec<usize>) {
        if visited[node] {
            return;
        }
        visited[node] = true;
        for i in 0..self.out_edges[node].len() {
            self.postorder_visit(self.out_edges[node][i].target, visited, order);
        }
        order.push(node);
    }

    /// Reverse postorder over the nodes reachable from entry.
    #[must_use]
    pub fn reverse_postorder(&self) -> Vec<usize> {
        let mut order = self.postorder();
        order.reverse();
        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{BinaryOp, MethodFlags, PrimType, ProgramBuilder};

    fn linear_method() -> (Program, MethodId) {
        let mut pb = ProgramBuilder::new();
        let int = pb.primitive(PrimType::Int);
        let c = pb.add_class("C", None);
        let m = pb.declare_method(c, "m", &[], None, MethodFlags::STATIC);
        let mut b = pb.body(m);
        let x = b.var("x", int);
        b.assign_literal(x, 1);
        b.assign_literal(x, 2);
        b.ret(None);
        b.seal().unwrap();
        (pb.finish(), m)
    }

    #[test]
    fn test_linear_cfg_shape() {
        let (program, m) = linear_method();
        let cfg = Cfg::build(&program, m);

        // entry + exit + 3 statements
        assert_eq!(cfg.node_count(), 5);
        assert_eq!(cfg.succs_of(cfg.entry()).collect::<Vec<_>>(), vec![2]);
        assert_eq!(cfg.succs_of(2).collect::<Vec<_>>(), vec![3]);
        // return flows to exit
        assert_eq!(cfg.succs_of(4).collect::<Vec<_>>(), vec![cfg.exit()]);
        assert_eq!(cfg.out_edges_of(4)[0].kind, CfgEdgeKind::Return);
    }

    #[test]
    fn test_branch_edges() {
        let mut pb = ProgramBuilder::new();
        let int = pb.primitive(PrimType::Int);
        let c = pb.add_class("C", None);
        let m = pb.declare_method(c, "m", &[], None, MethodFlags::STATIC);
        let mut b = pb.body(m);
        let x = b.var("x", int);
        let y = b.var("y", int);
        // 0: if (x < y) goto 3
        // 1: x = 1
        // 2: goto 4
        // 3: x = 2
        // 4: return
        b.if_cmp(BinaryOp::Lt, x, y, 3);
        b.assign_literal(x, 1);
        b.goto(4);
        b.assign_literal(x, 2);
        b.ret(None);
        b.seal().unwrap();
        let program = pb.finish();
        let cfg = Cfg::build(&program, m);

        let if_node = cfg.node_of_index(0);
        let kinds: Vec<_> = cfg.out_edges_of(if_node).iter().map(|e| e.kind).collect();
        assert!(kinds.contains(&CfgEdgeKind::IfTrue));
        assert!(kinds.contains(&CfgEdgeKind::IfFalse));

        // both arms join at the return
        let ret_node = cfg.node_of_index(4);
        assert_eq!(cfg.preds_of(ret_node).count(), 2);

        // reverse postorder starts at entry
        assert_eq!(cfg.reverse_postorder()[0], cfg.entry());
    }

    #[test]
    fn test_switch_edges() {
        let mut pb = ProgramBuilder::new();
        let int = pb.primitive(PrimType::Int);
        let c = pb.add_class("C", None);
        let m = pb.declare_method(c, "m", &[int], None, MethodFlags::STATIC);
        let mut b = pb.body(m);
        let p = b.param(0);
        let x = b.var("x", int);
        // 0: switch p { 1 -> 1, 2 -> 2, default -> 3 }
        b.switch(p, &[(1, 1), (2, 2)], 3);
        b.assign_literal(x, 10);
        b.assign_literal(x, 20);
        b.ret(None);
        b.seal().unwrap();
        let program = pb.finish();
        let cfg = Cfg::build(&program, m);

        let sw = cfg.node_of_index(0);
        let kinds: Vec<_> = cfg.out_edges_of(sw).iter().map(|e| e.kind).collect();
        assert!(kinds.contains(&CfgEdgeKind::SwitchCase(1)));
        assert!(kinds.contains(&CfgEdgeKind::SwitchCase(2)));
        assert!(kinds.contains(&CfgEdgeKind::SwitchDefault));
    }
}
