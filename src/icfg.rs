//! Interprocedural control-flow graph.
//!
//! The ICFG stitches the per-method CFGs of every reachable method together
//! using a call graph. Four edge kinds connect the nodes:
//!
//! - **Normal**: an intra-procedural edge whose source is not a call site
//! - **CallToReturn**: replaces the intra edge leaving a call site; facts
//!   bypass the callee along it (minus the call result)
//! - **Call**: call site → callee entry node
//! - **Return**: callee exit node → the call site's return site
//!
//! Node indices are global: each method's CFG nodes occupy a contiguous
//! block, so per-method node indices translate by a fixed offset.

use rustc_hash::FxHashMap;

use crate::{
    callgraph::CallGraph,
    cfg::{Cfg, CfgNode},
    ir::{MethodId, StmtId},
    Program,
};

/// The kind of an ICFG edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IcfgEdgeKind {
    /// An intra-procedural edge.
    Normal,
    /// The intra-procedural edge leaving a call site.
    CallToReturn,
    /// A call edge into the entry of `callee`.
    Call {
        /// The invoked method.
        callee: MethodId,
    },
    /// A return edge from a callee exit back to the return site of
    /// `callsite`.
    Return {
        /// The call site being returned to.
        callsite: StmtId,
    },
}

/// An edge of the interprocedural CFG.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IcfgEdge {
    /// Global index of the source node.
    pub source: usize,
    /// Global index of the target node.
    pub target: usize,
    /// The edge kind.
    pub kind: IcfgEdgeKind,
}

/// The interprocedural control-flow graph over the reachable methods of a
/// call graph.
#[derive(Debug)]
pub struct Icfg {
    methods: Vec<MethodId>,
    cfgs: FxHashMap<MethodId, Cfg>,
    offsets: FxHashMap<MethodId, usize>,
    /// Per-node `(method, local node index)` for reverse lookup.
    nodes: Vec<(MethodId, usize)>,
    out_edges: Vec<Vec<IcfgEdge>>,
    in_edges: Vec<Vec<IcfgEdge>>,
    entries: Vec<MethodId>,
}

impl Icfg {
    /// Builds the ICFG over the reachable methods of `call_graph`.
    ///
    /// Call sites with no resolved callee still get their CallToReturn edge,
    /// so facts flow past them (the unresolved call result stays undefined).
    #[must_use]
    pub fn build(program: &Program, call_graph: &CallGraph<StmtId, MethodId>) -> Self {
        let methods: Vec<MethodId> = call_graph.reachable_methods().to_vec();
        let mut cfgs = FxHashMap::default();
        let mut offsets = FxHashMap::default();
        let mut nodes = Vec::new();
        for &m in &methods {
            let cfg = Cfg::build(program, m);
            offsets.insert(m, nodes.len());
            for local in 0..cfg.node_count() {
                nodes.push((m, local));
            }
            cfgs.insert(m, cfg);
        }

        let mut icfg = Self {
            out_edges: vec![Vec::new(); nodes.len()],
            in_edges: vec![Vec::new(); nodes.len()],
            methods,
            cfgs,
            offsets,
            nodes,
            entries: call_graph.entry_methods().to_vec(),
        };

        for m in icfg.methods.clone() {
            let offset = icfg.offsets[&m];
            let cfg = &icfg.cfgs[&m];

            // Intra edges, demoting those out of call sites to CallToReturn.
            let mut intra = Vec::new();
            for node in 0..cfg.node_count() {
                let is_call = matches!(
                    cfg.node(node),
                    CfgNode::Stmt(sid) if program.stmt(sid).kind.is_invoke()
                );
                for edge in cfg.out_edges_of(node) {
                    let kind = if is_call {
                        IcfgEdgeKind::CallToReturn
                    } else {
                        IcfgEdgeKind::Normal
                    };
                    intra.push(IcfgEdge {
                        source: offset + edge.source,
                        target: offset + edge.target,
                        kind,
                    });
                }
            }

            // Call and return edges for every resolved call site.
            let mut inter = Vec::new();
            for &callsite in call_graph.callsites_in(m) {
                let call_node = offset + icfg.cfgs[&m].node_of_stmt(program, callsite);
                let return_sites: Vec<usize> = icfg.cfgs[&m]
                    .succs_of(call_node - offset)
                    .map(|succ| offset + succ)
                    .collect();
                for callee in call_graph.callees_of(callsite) {
                    let Some(&callee_offset) = icfg.offsets.get(&callee) else {
                        continue;
                    };
                    let callee_cfg = &icfg.cfgs[&callee];
                    inter.push(IcfgEdge {
                        source: call_node,
                        target: callee_offset + callee_cfg.entry(),
                        kind: IcfgEdgeKind::Call { callee },
                    });
                    for &ret_site in &return_sites {
                        inter.push(IcfgEdge {
                            source: callee_offset + callee_cfg.exit(),
                            target: ret_site,
                            kind: IcfgEdgeKind::Return { callsite },
                        });
                    }
                }
            }

            for edge in intra.into_iter().chain(inter) {
                icfg.add_edge(edge);
            }
        }
        icfg
    }

    fn add_edge(&mut self, edge: IcfgEdge) {
        self.out_edges[edge.source].push(edge);
        self.in_edges[edge.target].push(edge);
    }

    /// Number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// The reachable methods this graph spans, in call-graph order.
    #[must_use]
    pub fn methods(&self) -> &[MethodId] {
        &self.methods
    }

    /// The entry methods of the underlying call graph.
    #[must_use]
    pub fn entry_methods(&self) -> &[MethodId] {
        &self.entries
    }

    /// The method containing a node.
    #[must_use]
    pub fn method_of(&self, node: usize) -> MethodId {
        self.nodes[node].0
    }

    /// The statement behind a node, if it is a statement node.
    #[must_use]
    pub fn stmt_of(&self, node: usize) -> Option<StmtId> {
        let (method, local) = self.nodes[node];
        self.cfgs[&method].node(local).stmt()
    }

    /// Global index of a method's entry node.
    #[must_use]
    pub fn entry_of(&self, method: MethodId) -> usize {
        self.offsets[&method] + self.cfgs[&method].entry()
    }

    /// Global index of a method's exit node.
    #[must_use]
    pub fn exit_of(&self, method: MethodId) -> usize {
        self.offsets[&method] + self.cfgs[&method].exit()
    }

    /// Global index of a statement node.
    ///
    /// The statement's method must be part of this graph.
    #[must_use]
    pub fn node_of_stmt(&self, program: &Program, stmt: StmtId) -> usize {
        let method = program.stmt(stmt).method;
        self.offsets[&method] + self.cfgs[&method].node_of_stmt(program, stmt)
    }

    /// Returns `true` if the node is the entry node of an entry method.
    #[must_use]
    pub fn is_entry_node(&self, node: usize) -> bool {
        let (method, local) = self.nodes[node];
        local == self.cfgs[&method].entry() && self.entries.contains(&method)
    }

    /// Returns `true` if the node is a call statement.
    #[must_use]
    pub fn is_call_node(&self, program: &Program, node: usize) -> bool {
        self.stmt_of(node)
            .is_some_and(|sid| program.stmt(sid).kind.is_invoke())
    }

    /// Out-edges of a node.
    #[must_use]
    pub fn out_edges_of(&self, node: usize) -> &[IcfgEdge] {
        &self.out_edges[node]
    }

    /// In-edges of a node.
    #[must_use]
    pub fn in_edges_of(&self, node: usize) -> &[IcfgEdge] {
        &self.in_edges[node]
    }

    /// The per-method CFG of a member method.
    #[must_use]
    pub fn cfg_of(&self, method: MethodId) -> &Cfg {
        &self.cfgs[&method]
    }

    /// The return variables flowing along a `Return` edge out of `method`.
    #[must_use]
    pub fn return_vars_of<'p>(
        &self,
        program: &'p Program,
        method: MethodId,
    ) -> &'p [crate::ir::VarId] {
        match program.method(method).body() {
            Some(body) => &body.return_vars,
            None => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        callgraph::ChaBuilder,
        ir::{MethodFlags, PrimType, ProgramBuilder},
    };

    #[test]
    fn test_call_and_return_edges() {
        let mut pb = ProgramBuilder::new();
        let int = pb.primitive(PrimType::Int);
        let c = pb.add_class("C", None);
        let callee = pb.declare_method(c, "id", &[int], Some(int), MethodFlags::STATIC);
        let main = pb.declare_method(c, "main", &[], None, MethodFlags::STATIC);

        let mut b = pb.body(callee);
        let p = b.param(0);
        b.ret(Some(p));
        b.seal().unwrap();

        let mut b = pb.body(main);
        let x = b.var("x", int);
        let r = b.var("r", int);
        b.assign_literal(x, 1);
        b.call_static(Some(r), callee, &[x]);
        b.ret(None);
        b.seal().unwrap();
        let program = pb.finish();

        let cg = ChaBuilder::new(&program).build(main);
        let icfg = Icfg::build(&program, &cg);

        let callsite = cg.callsites_in(main)[0];
        let call_node = icfg.node_of_stmt(&program, callsite);
        assert!(icfg.is_call_node(&program, call_node));

        let kinds: Vec<_> = icfg.out_edges_of(call_node).iter().map(|e| e.kind).collect();
        assert!(kinds.contains(&IcfgEdgeKind::CallToReturn));
        assert!(kinds.contains(&IcfgEdgeKind::Call { callee }));

        // the callee exit returns to the call site's return site
        let exit = icfg.exit_of(callee);
        let has_return = icfg
            .out_edges_of(exit)
            .iter()
            .any(|e| e.kind == IcfgEdgeKind::Return { callsite });
        assert!(has_return);

        // entry-method entry node is flagged
        assert!(icfg.is_entry_node(icfg.entry_of(main)));
        assert!(!icfg.is_entry_node(icfg.entry_of(callee)));
    }
}
