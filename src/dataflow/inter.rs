//! Interprocedural data-flow analysis over the ICFG.
//!
//! The interprocedural solver differs from the intra-procedural one in a
//! single structural point: facts entering a node are first pushed through an
//! **edge transfer** that depends on the ICFG edge kind. Normal edges copy,
//! call-to-return edges bypass the callee (killing the call result), call
//! edges bind arguments to parameters, and return edges carry the callee's
//! return values back to the call result.
//!
//! The boundary fact of an entry method is the empty fact: parameters of
//! callees are bound exclusively by call edges, so a pessimistic boundary can
//! never erode the precision of interprocedural argument passing.

use std::collections::VecDeque;

use rustc_hash::FxHashMap;

use crate::{
    dataflow::{
        constprop::{ConstantPropagation, CpFact, Value},
        fact::DataflowResult,
    },
    icfg::{Icfg, IcfgEdge, IcfgEdgeKind},
    ir::{FieldId, Stmt, StmtId},
    pta::PtaResult,
    Program,
};

/// Analysis id under which interprocedural constant propagation stores its
/// result.
pub const ID: &str = "inter-constprop";

/// An interprocedural data flow analysis over ICFG nodes.
///
/// The contract mirrors [`DataflowAnalysis`](crate::dataflow::DataflowAnalysis)
/// with two additions: edge transfers and an optional dependency hook for
/// analyses whose node transfers read facts of non-adjacent nodes (the
/// alias-aware refinement reads store out-facts at loads).
pub trait InterDataflowAnalysis {
    /// The fact type at each ICFG node.
    type Fact: Clone + PartialEq;

    /// The fact holding at the entry node of an entry method.
    fn new_boundary_fact(&self) -> Self::Fact;

    /// The initial fact for every other node.
    fn new_initial_fact(&self) -> Self::Fact;

    /// Joins `fact` into `target` in place.
    fn meet_into(&self, fact: &Self::Fact, target: &mut Self::Fact);

    /// Computes the new out-fact of a node from its in-fact.
    ///
    /// `facts` exposes the solver's current state for analyses that read
    /// facts of other nodes; plain analyses ignore it.
    fn transfer_node(
        &self,
        node: usize,
        in_fact: &Self::Fact,
        facts: &DataflowResult<Self::Fact>,
    ) -> Self::Fact;

    /// Derives the fact entering `edge.target` from the out-fact of
    /// `edge.source`.
    fn transfer_edge(&self, edge: &IcfgEdge, out_fact: &Self::Fact) -> Self::Fact;

    /// Nodes beyond the ICFG successors that must be revisited when this
    /// node's out-fact changes.
    fn dependents_of(&self, _node: usize) -> Vec<usize> {
        Vec::new()
    }
}

/// Worklist solver for interprocedural analyses.
///
/// FIFO worklist with a set-backed in-queue check, seeded with every node
/// except the entry nodes of entry methods (those keep their boundary fact;
/// they have no in-edges, so nothing could recompute them anyway).
pub struct InterSolver<'a, A: InterDataflowAnalysis> {
    analysis: &'a A,
    icfg: &'a Icfg,
}

impl<'a, A: InterDataflowAnalysis> InterSolver<'a, A> {
    /// Creates a solver for the given analysis and graph.
    #[must_use]
    pub const fn new(analysis: &'a A, icfg: &'a Icfg) -> Self {
        Self { analysis, icfg }
    }

    /// Runs the analysis to its fixpoint.
    #[must_use]
    pub fn solve(&self) -> DataflowResult<A::Fact> {
        let n = self.icfg.node_count();
        let mut result = DataflowResult::new(
            (0..n).map(|_| self.analysis.new_initial_fact()).collect(),
            (0..n).map(|_| self.analysis.new_initial_fact()).collect(),
        );
        for &method in self.icfg.entry_methods() {
            let entry = self.icfg.entry_of(method);
            result.in_facts[entry] = self.analysis.new_boundary_fact();
            result.out_facts[entry] = self.analysis.new_boundary_fact();
        }

        let mut worklist: VecDeque<usize> = VecDeque::new();
        let mut in_worklist = vec![false; n];
        for node in 0..n {
            if !self.icfg.is_entry_node(node) {
                worklist.push_back(node);
                in_worklist[node] = true;
            }
        }

        let mut iterations = 0usize;
        while let Some(node) = worklist.pop_front() {
            in_worklist[node] = false;
            iterations += 1;

            let mut new_in = self.analysis.new_initial_fact();
            for edge in self.icfg.in_edges_of(node) {
                let through = self
                    .analysis
                    .transfer_edge(edge, &result.out_facts[edge.source]);
                self.analysis.meet_into(&through, &mut new_in);
            }
            result.in_facts[node] = new_in;

            let new_out = self
                .analysis
                .transfer_node(node, &result.in_facts[node], &result);
            if new_out != result.out_facts[node] {
                result.out_facts[node] = new_out;
                for target in self
                    .icfg
                    .out_edges_of(node)
                    .iter()
                    .map(|e| e.target)
                    .chain(self.analysis.dependents_of(node))
                {
                    if !self.icfg.is_entry_node(target) && !in_worklist[target] {
                        worklist.push_back(target);
                        in_worklist[target] = true;
                    }
                }
            }
        }

        log::debug!(
            "interprocedural solver finished after {iterations} node visits over {n} nodes"
        );
        result
    }
}

/// Interprocedural constant propagation.
///
/// Node transfers delegate to the intra-procedural analysis except at call
/// sites, where the node itself is the identity and all inter-method effect
/// rides on the Call/Return edges. With
/// [`InterConstantPropagation::with_alias_refinement`] attached, field and
/// array loads evaluate through the stores that may feed them instead of
/// collapsing to not-a-constant.
pub struct InterConstantPropagation<'a> {
    program: &'a Program,
    icfg: &'a Icfg,
    cp: ConstantPropagation<'a>,
    refinement: Option<AliasRefinement<'a>>,
}

impl<'a> InterConstantPropagation<'a> {
    /// Creates the plain interprocedural lift.
    #[must_use]
    pub fn new(program: &'a Program, icfg: &'a Icfg) -> Self {
        Self {
            program,
            icfg,
            cp: ConstantPropagation::new(program),
            refinement: None,
        }
    }

    /// Creates the lift with the alias-aware load refinement, fed by a solved
    /// pointer analysis.
    #[must_use]
    pub fn with_alias_refinement(
        program: &'a Program,
        icfg: &'a Icfg,
        pta: &'a PtaResult,
    ) -> Self {
        Self {
            program,
            icfg,
            cp: ConstantPropagation::new(program),
            refinement: Some(AliasRefinement::build(program, icfg, pta)),
        }
    }

    fn eval_load(
        &self,
        refinement: &AliasRefinement<'_>,
        stmt: &Stmt,
        in_fact: &CpFact,
        facts: &DataflowResult<CpFact>,
    ) -> Value {
        let mut value = Value::Undef;
        match stmt {
            Stmt::LoadField {
                base: None, field, ..
            } => {
                for &store in refinement.static_stores(*field) {
                    value = value.meet(self.store_value(store, facts));
                }
            }
            Stmt::LoadField {
                base: Some(base),
                field,
                ..
            } => {
                for &store in refinement.instance_stores(*field) {
                    let Stmt::StoreField {
                        base: Some(store_base),
                        ..
                    } = &self.program.stmt(store).kind
                    else {
                        continue;
                    };
                    if refinement.pta.may_alias(*base, *store_base) {
                        value = value.meet(self.store_value(store, facts));
                    }
                }
            }
            Stmt::LoadArray { base, index, .. } => {
                for &store in refinement.array_stores() {
                    let Stmt::StoreArray {
                        base: store_base,
                        index: store_index,
                        ..
                    } = &self.program.stmt(store).kind
                    else {
                        continue;
                    };
                    if !refinement.pta.may_alias(*base, *store_base) {
                        continue;
                    }
                    let store_node = self.icfg.node_of_stmt(self.program, store);
                    let vi = in_fact.get(*index);
                    let vj = facts.out_fact(store_node).get(*store_index);
                    // An undefined index marks an unreachable access.
                    if vi.is_undef() || vj.is_undef() {
                        continue;
                    }
                    if let (Value::Const(a), Value::Const(b)) = (vi, vj) {
                        if a != b {
                            continue;
                        }
                    }
                    value = value.meet(self.store_value(store, facts));
                }
            }
            _ => {}
        }
        value
    }

    /// The value flowing out of a store's right-hand side at the store.
    fn store_value(&self, store: StmtId, facts: &DataflowResult<CpFact>) -> Value {
        let rhs = match &self.program.stmt(store).kind {
            Stmt::StoreField { rhs, .. } | Stmt::StoreArray { rhs, .. } => *rhs,
            _ => return Value::Undef,
        };
        if !self.program.is_int_like_var(rhs) {
            return Value::Undef;
        }
        let store_node = self.icfg.node_of_stmt(self.program, store);
        facts.out_fact(store_node).get(rhs)
    }
}

impl InterDataflowAnalysis for InterConstantPropagation<'_> {
    type Fact = CpFact;

    fn new_boundary_fact(&self) -> CpFact {
        CpFact::new()
    }

    fn new_initial_fact(&self) -> CpFact {
        CpFact::new()
    }

    fn meet_into(&self, fact: &CpFact, target: &mut CpFact) {
        for (var, value) in fact.iter() {
            target.update(var, value.meet(target.get(var)));
        }
    }

    fn transfer_node(&self, node: usize, in_fact: &CpFact, facts: &DataflowResult<CpFact>) -> CpFact {
        let Some(sid) = self.icfg.stmt_of(node) else {
            return in_fact.clone();
        };
        let stmt = &self.program.stmt(sid).kind;
        if stmt.is_invoke() {
            // All inter-method effect is carried by the Call/Return edges.
            return in_fact.clone();
        }
        if let Some(refinement) = &self.refinement {
            if let Stmt::LoadField { lhs, .. } | Stmt::LoadArray { lhs, .. } = stmt {
                if self.program.is_int_like_var(*lhs) {
                    let mut out = in_fact.clone();
                    out.update(*lhs, self.eval_load(refinement, stmt, in_fact, facts));
                    return out;
                }
            }
        }
        self.cp.transfer_stmt(stmt, in_fact)
    }

    fn transfer_edge(&self, edge: &IcfgEdge, out_fact: &CpFact) -> CpFact {
        match edge.kind {
            IcfgEdgeKind::Normal => out_fact.clone(),
            IcfgEdgeKind::CallToReturn => {
                let mut fact = out_fact.clone();
                if let Some(Stmt::Invoke {
                    result: Some(r), ..
                }) = self.icfg.stmt_of(edge.source).map(|s| &self.program.stmt(s).kind)
                {
                    // The call result is restored along the matching Return
                    // edge; the bypassing fact must not carry a stale value.
                    fact.remove(*r);
                }
                fact
            }
            IcfgEdgeKind::Call { callee } => {
                let mut fact = CpFact::new();
                let Some(Stmt::Invoke { args, .. }) = self
                    .icfg
                    .stmt_of(edge.source)
                    .map(|s| &self.program.stmt(s).kind)
                else {
                    return fact;
                };
                if let Some(body) = self.program.method(callee).body() {
                    for (&arg, &param) in args.iter().zip(&body.params) {
                        if self.program.is_int_like_var(param) {
                            fact.update(param, out_fact.get(arg));
                        }
                    }
                }
                fact
            }
            IcfgEdgeKind::Return { callsite } => {
                let mut fact = CpFact::new();
                let Stmt::Invoke {
                    result: Some(r), ..
                } = &self.program.stmt(callsite).kind
                else {
                    return fact;
                };
                let callee = self.icfg.method_of(edge.source);
                let mut value = Value::Undef;
                for &ret in self.icfg.return_vars_of(self.program, callee) {
                    value = value.meet(out_fact.get(ret));
                }
                fact.update(*r, value);
                fact
            }
        }
    }

    fn dependents_of(&self, node: usize) -> Vec<usize> {
        match &self.refinement {
            Some(refinement) => refinement.dependents_of(node),
            None => Vec::new(),
        }
    }
}

/// Store maps and dependency edges for the alias-aware load refinement.
///
/// Built as a pre-pass over every method the ICFG treats as reachable. A
/// load's candidate stores are fixed by the (already solved) pointer
/// analysis, so the maps never change during the constant-propagation solve;
/// only the store out-facts they point at do.
struct AliasRefinement<'a> {
    pta: &'a PtaResult,
    static_stores: FxHashMap<FieldId, Vec<StmtId>>,
    instance_stores: FxHashMap<FieldId, Vec<StmtId>>,
    array_stores: Vec<StmtId>,
    /// store node -> load nodes whose evaluation reads the store's out-fact.
    dependents: FxHashMap<usize, Vec<usize>>,
}

impl<'a> AliasRefinement<'a> {
    fn build(program: &Program, icfg: &Icfg, pta: &'a PtaResult) -> Self {
        let mut refinement = Self {
            pta,
            static_stores: FxHashMap::default(),
            instance_stores: FxHashMap::default(),
            array_stores: Vec::new(),
            dependents: FxHashMap::default(),
        };

        let mut loads: Vec<StmtId> = Vec::new();
        for &method in icfg.methods() {
            let Some(body) = program.method(method).body() else {
                continue;
            };
            for &sid in &body.stmts {
                match &program.stmt(sid).kind {
                    Stmt::StoreField {
                        base: None, field, ..
                    } => refinement.static_stores.entry(*field).or_default().push(sid),
                    Stmt::StoreField {
                        base: Some(_),
                        field,
                        ..
                    } => refinement
                        .instance_stores
                        .entry(*field)
                        .or_default()
                        .push(sid),
                    Stmt::StoreArray { .. } => refinement.array_stores.push(sid),
                    Stmt::LoadField { .. } | Stmt::LoadArray { .. } => loads.push(sid),
                    _ => {}
                }
            }
        }

        // Wire store -> load dependencies so the solver revisits loads when a
        // feeding store's out-fact changes.
        for &load in &loads {
            let load_node = icfg.node_of_stmt(program, load);
            let candidates: Vec<StmtId> = match &program.stmt(load).kind {
                Stmt::LoadField {
                    base: None, field, ..
                } => refinement.static_stores(*field).to_vec(),
                Stmt::LoadField {
                    base: Some(base),
                    field,
                    ..
                } => refinement
                    .instance_stores(*field)
                    .iter()
                    .copied()
                    .filter(|&store| match &program.stmt(store).kind {
                        Stmt::StoreField {
                            base: Some(store_base),
                            ..
                        } => pta.may_alias(*base, *store_base),
                        _ => false,
                    })
                    .collect(),
                Stmt::LoadArray { base, .. } => refinement
                    .array_stores
                    .iter()
                    .copied()
                    .filter(|&store| match &program.stmt(store).kind {
                        Stmt::StoreArray {
                            base: store_base, ..
                        } => pta.may_alias(*base, *store_base),
                        _ => false,
                    })
                    .collect(),
                _ => Vec::new(),
            };
            for store in candidates {
                let store_node = icfg.node_of_stmt(program, store);
                refinement
                    .dependents
                    .entry(store_node)
                    .or_default()
                    .push(load_node);
            }
        }
        refinement
    }

    fn static_stores(&self, field: FieldId) -> &[StmtId] {
        match self.static_stores.get(&field) {
            Some(stores) => stores,
            None => &[],
        }
    }

    fn instance_stores(&self, field: FieldId) -> &[StmtId] {
        match self.instance_stores.get(&field) {
            Some(stores) => stores,
            None => &[],
        }
    }

    fn array_stores(&self) -> &[StmtId] {
        &self.array_stores
    }

    fn dependents_of(&self, node: usize) -> Vec<usize> {
        self.dependents.get(&node).cloned().unwrap_or_default()
    }
}
