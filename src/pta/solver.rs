//! The pointer-analysis worklist solver.
//!
//! An Andersen-style fixpoint with on-the-fly call-graph growth:
//!
//! 1. The entry method is made reachable under the empty context. Making a
//!    method reachable walks its statements once: allocations seed the
//!    worklist, copies and static field accesses add pointer-flow edges,
//!    and static calls grow the call graph immediately.
//! 2. The worklist carries `(pointer, points-to delta)` pairs. Popping one
//!    unions the true delta into the pointer's set and forwards it along
//!    the pointer-flow graph. When the pointer is a variable, every new
//!    object additionally wires the variable's instance field and array
//!    accesses and dispatches the variable's call sites on the object's
//!    runtime type, possibly making new methods reachable and growing the
//!    graph further.
//!
//! The fixpoint is order-independent: points-to sets, the pointer-flow
//! graph, the call graph and the reachable set only ever grow. IR oddities
//! (arity mismatch, failed dispatch) are logged once per site and the call
//! skipped, so the solver always terminates with a sound partial result.
//!
//! The taint overlay hooks into exactly three places: call-edge processing
//! (sources, transfer edges, sink recording), delta propagation (transfer
//! re-tagging) and the final sweep over sink pointers.

use std::collections::{BTreeSet, VecDeque};

use rustc_hash::FxHashSet;

use crate::{
    callgraph::{CallEdge, CallGraph},
    ir::{CallKind, MethodId, Stmt, StmtId, TypeId, VarId},
    pta::{
        context::ContextSelector,
        csmanager::{CsManager, PointerKey},
        heap::HeapModel,
        pfg::PointerFlowGraph,
        pts::PointsToSet,
        result::PtaResult,
        ContextId, CsCallSiteId, CsMethodId, CsObjId, PointerId,
    },
    taint::{TaintAnalysis, TaintConfig, TaintFlow, TransferEnd},
    Program,
};

/// The pointer-analysis solver.
///
/// Construct with a context selector (see
/// [`selector_by_name`](crate::pta::selector_by_name)), optionally attach a
/// taint configuration, then [`PointerAnalysis::solve`] from an entry
/// method.
pub struct PointerAnalysis<'a> {
    program: &'a Program,
    selector: Box<dyn ContextSelector>,
    heap: HeapModel,
    csm: CsManager,
    cg: CallGraph<CsCallSiteId, CsMethodId>,
    pfg: PointerFlowGraph,
    worklist: VecDeque<(PointerId, PointsToSet)>,
    taint: Option<TaintAnalysis>,
    warned_sites: FxHashSet<StmtId>,
}

impl<'a> PointerAnalysis<'a> {
    /// Creates a solver over the given program and context selector.
    #[must_use]
    pub fn new(program: &'a Program, selector: Box<dyn ContextSelector>) -> Self {
        Self {
            program,
            selector,
            heap: HeapModel::new(),
            csm: CsManager::new(),
            cg: CallGraph::new(),
            pfg: PointerFlowGraph::new(),
            worklist: VecDeque::new(),
            taint: None,
            warned_sites: FxHashSet::default(),
        }
    }

    /// Attaches the taint overlay.
    #[must_use]
    pub fn with_taint(mut self, config: TaintConfig) -> Self {
        self.taint = Some(TaintAnalysis::new(config));
        self
    }

    /// Runs the analysis from `entry` to its fixpoint.
    #[must_use]
    pub fn solve(mut self, entry: MethodId) -> PtaResult {
        let empty = self.csm.empty_context();
        let cs_entry = self.csm.cs_method(empty, entry);
        self.cg.add_entry_method(cs_entry);
        // add_entry_method already marked it reachable; walk the body directly
        self.walk_statements(cs_entry);
        self.analyze();
        log::debug!(
            "pointer analysis reached {} methods, {} pointers, {} flow edges",
            self.cg.method_count(),
            self.csm.pointer_count(),
            self.pfg.edge_count()
        );
        self.finish(entry)
    }

    /// Marks a context-sensitive method reachable and walks its statements.
    fn add_reachable(&mut self, cs_method: CsMethodId) {
        if !self.cg.add_reachable_method(cs_method) {
            return;
        }
        self.walk_statements(cs_method);
    }

    /// Processes the statements of a newly reachable method.
    fn walk_statements(&mut self, cs_method: CsMethodId) {
        let (ctx, method) = self.csm.cs_method_parts(cs_method);
        let program = self.program;
        let Some(body) = program.method(method).body() else {
            return;
        };
        for &sid in &body.stmts {
            match &program.stmt(sid).kind {
                Stmt::New { lhs, ty } => {
                    let obj = self.heap.alloc_obj(sid, *ty, method);
                    let heap_ctx = self.selector.select_heap_context(
                        program,
                        &self.heap,
                        &mut self.csm.contexts,
                        ctx,
                        obj,
                    );
                    let cs_obj = self.csm.cs_obj(heap_ctx, obj);
                    let ptr = self.csm.var_ptr(ctx, *lhs);
                    self.worklist.push_back((ptr, PointsToSet::singleton(cs_obj)));
                }
                Stmt::Copy { lhs, rhs } => {
                    let source = self.csm.var_ptr(ctx, *rhs);
                    let target = self.csm.var_ptr(ctx, *lhs);
                    self.add_pfg_edge(source, target);
                }
                Stmt::LoadField {
                    lhs,
                    base: None,
                    field,
                } => {
                    let source = self.csm.static_field_ptr(*field);
                    let target = self.csm.var_ptr(ctx, *lhs);
                    self.add_pfg_edge(source, target);
                }
                Stmt::StoreField {
                    base: None,
                    field,
                    rhs,
                } => {
                    let source = self.csm.var_ptr(ctx, *rhs);
                    let target = self.csm.static_field_ptr(*field);
                    self.add_pfg_edge(source, target);
                }
                Stmt::Invoke {
                    kind: CallKind::Static,
                    method_ref,
                    ..
                } => {
                    let Some(callee) = program.resolve_ref(CallKind::Static, *method_ref, None)
                    else {
                        self.warn_unresolved(sid);
                        continue;
                    };
                    let cs_callsite = self.csm.cs_callsite(ctx, sid);
                    let callee_ctx = self.selector.select_context(
                        program,
                        &mut self.csm.contexts,
                        ctx,
                        sid,
                        callee,
                    );
                    let cs_callee = self.csm.cs_method(callee_ctx, callee);
                    self.process_call_edge(
                        CallKind::Static,
                        cs_callsite,
                        sid,
                        ctx,
                        callee_ctx,
                        cs_callee,
                        callee,
                        None,
                    );
                }
                _ => {}
            }
        }
    }

    /// Adds a pointer-flow edge; on first insertion the source's current
    /// points-to set is queued at the target.
    fn add_pfg_edge(&mut self, source: PointerId, target: PointerId) {
        if self.pfg.add_edge(source, target) {
            let pts = self.csm.pts(source);
            if !pts.is_empty() {
                let pts = pts.clone();
                self.worklist.push_back((target, pts));
            }
        }
    }

    /// The main worklist loop.
    fn analyze(&mut self) {
        while let Some((ptr, pts)) = self.worklist.pop_front() {
            let diff = self.propagate(ptr, &pts);
            if diff.is_empty() {
                continue;
            }
            if let PointerKey::Var(ctx, var) = self.csm.pointer_key(ptr) {
                let objs: Vec<CsObjId> = diff.iter().collect();
                for cs_obj in objs {
                    self.wire_field_accesses(ctx, var, cs_obj);
                    self.process_instance_calls(ctx, var, cs_obj);
                }
            }
        }
    }

    /// Unions a delta into a pointer's set, forwards the true additions to
    /// the pointer's PFG successors and returns them.
    fn propagate(&mut self, ptr: PointerId, pts: &PointsToSet) -> PointsToSet {
        let mut diff = PointsToSet::new();
        for obj in pts.iter() {
            if !self.csm.pts(ptr).contains(obj) {
                diff.insert(obj);
            }
        }
        if !diff.is_empty() {
            for obj in diff.iter() {
                self.csm.pts_mut(ptr).insert(obj);
            }
            let succs: Vec<PointerId> = self.pfg.succs_of(ptr).collect();
            for succ in succs {
                self.worklist.push_back((succ, diff.clone()));
            }
            self.propagate_taint(ptr, &diff);
        }
        diff
    }

    /// Wires the instance field and array accesses of `var` against a newly
    /// discovered receiver object.
    fn wire_field_accesses(&mut self, ctx: ContextId, var: VarId, cs_obj: CsObjId) {
        let program = self.program;
        for &store in program.var(var).store_fields() {
            let Stmt::StoreField { field, rhs, .. } = &program.stmt(store).kind else {
                continue;
            };
            let source = self.csm.var_ptr(ctx, *rhs);
            let target = self.csm.instance_field_ptr(cs_obj, *field);
            self.add_pfg_edge(source, target);
        }
        for &load in program.var(var).load_fields() {
            let Stmt::LoadField { lhs, field, .. } = &program.stmt(load).kind else {
                continue;
            };
            let source = self.csm.instance_field_ptr(cs_obj, *field);
            let target = self.csm.var_ptr(ctx, *lhs);
            self.add_pfg_edge(source, target);
        }
        for &store in program.var(var).store_arrays() {
            let Stmt::StoreArray { rhs, .. } = &program.stmt(store).kind else {
                continue;
            };
            let source = self.csm.var_ptr(ctx, *rhs);
            let target = self.csm.array_index_ptr(cs_obj);
            self.add_pfg_edge(source, target);
        }
        for &load in program.var(var).load_arrays() {
            let Stmt::LoadArray { lhs, .. } = &program.stmt(load).kind else {
                continue;
            };
            let source = self.csm.array_index_ptr(cs_obj);
            let target = self.csm.var_ptr(ctx, *lhs);
            self.add_pfg_edge(source, target);
        }
    }

    /// Dispatches the call sites using `var` as receiver against a newly
    /// discovered receiver object.
    fn process_instance_calls(&mut self, caller_ctx: ContextId, var: VarId, recv: CsObjId) {
        let program = self.program;
        for &callsite in program.var(var).invokes() {
            let Stmt::Invoke {
                kind, method_ref, ..
            } = &program.stmt(callsite).kind
            else {
                continue;
            };
            let (recv_ctx, recv_obj) = self.csm.cs_obj_parts(recv);
            let recv_ty = self.heap.obj(recv_obj).ty;
            let Some(callee) = program.resolve_ref(*kind, *method_ref, Some(recv_ty)) else {
                self.warn_unresolved(callsite);
                continue;
            };
            let cs_callsite = self.csm.cs_callsite(caller_ctx, callsite);
            let callee_ctx = self.selector.select_context_with_recv(
                program,
                &self.heap,
                &mut self.csm.contexts,
                caller_ctx,
                callsite,
                recv_ctx,
                recv_obj,
                callee,
            );
            let cs_callee = self.csm.cs_method(callee_ctx, callee);

            // The callee's receiver variable sees this object regardless of
            // whether the call edge is new.
            if let Some(this_var) = program.method(callee).body().and_then(|b| b.this_var) {
                let this_ptr = self.csm.var_ptr(callee_ctx, this_var);
                self.worklist
                    .push_back((this_ptr, PointsToSet::singleton(recv)));
            }

            let base_ptr = self.csm.var_ptr(caller_ctx, var);
            self.process_call_edge(
                *kind,
                cs_callsite,
                callsite,
                caller_ctx,
                callee_ctx,
                cs_callee,
                callee,
                Some(base_ptr),
            );
        }
    }

    /// Adds a call edge; on first insertion the callee becomes reachable and
    /// arguments, returns and taint positions are wired.
    #[allow(clippy::too_many_arguments)]
    fn process_call_edge(
        &mut self,
        kind: CallKind,
        cs_callsite: CsCallSiteId,
        callsite: StmtId,
        caller_ctx: ContextId,
        callee_ctx: ContextId,
        cs_callee: CsMethodId,
        callee: MethodId,
        base: Option<PointerId>,
    ) {
        if !self.cg.add_edge(CallEdge {
            kind,
            callsite: cs_callsite,
            callee: cs_callee,
        }) {
            return;
        }
        self.add_reachable(cs_callee);

        let program = self.program;
        let Stmt::Invoke { result, args, .. } = &program.stmt(callsite).kind else {
            return;
        };
        if let Some(body) = program.method(callee).body() {
            if args.len() != body.params.len() {
                log::warn!(
                    "call site {callsite} passes {} arguments, callee declares {}; call skipped",
                    args.len(),
                    body.params.len()
                );
            } else {
                for (&arg, &param) in args.iter().zip(&body.params) {
                    let source = self.csm.var_ptr(caller_ctx, arg);
                    let target = self.csm.var_ptr(callee_ctx, param);
                    self.add_pfg_edge(source, target);
                }
                if let Some(r) = result {
                    let result_ptr = self.csm.var_ptr(caller_ctx, *r);
                    for &ret in &body.return_vars {
                        let source = self.csm.var_ptr(callee_ctx, ret);
                        self.add_pfg_edge(source, result_ptr);
                    }
                }
            }
        }
        self.taint_on_call(callsite, caller_ctx, callee, base);
    }

    fn warn_unresolved(&mut self, callsite: StmtId) {
        if self.warned_sites.insert(callsite) {
            log::warn!("no dispatch target for call site {callsite}; call skipped");
        }
    }

    // ---- taint overlay hooks -------------------------------------------

    /// Source fabrication, transfer-edge installation and sink recording at
    /// a freshly added call edge.
    fn taint_on_call(
        &mut self,
        callsite: StmtId,
        caller_ctx: ContextId,
        callee: MethodId,
        base: Option<PointerId>,
    ) {
        let program = self.program;
        let Stmt::Invoke { result, args, .. } = &program.stmt(callsite).kind else {
            return;
        };
        let result = *result;
        let (source_ty, transfers, sink_args, sink_base) = {
            let Some(taint) = &self.taint else {
                return;
            };
            let config = taint.config();
            let sink_args: Vec<i32> = (0..args.len() as i32)
                .filter(|&i| config.is_sink(callee, i))
                .collect();
            (
                config.source_type_of(callee),
                config.transfers_of(callee).to_vec(),
                sink_args,
                config.is_sink(callee, -1),
            )
        };

        if let (Some(ty), Some(r)) = (source_ty, result) {
            let obj = self.heap.taint_obj(callsite, ty);
            let empty = self.csm.empty_context();
            let cs_obj = self.csm.cs_obj(empty, obj);
            let result_ptr = self.csm.var_ptr(caller_ctx, r);
            self.worklist
                .push_back((result_ptr, PointsToSet::singleton(cs_obj)));
        }

        for transfer in transfers {
            let from = match transfer.from {
                TransferEnd::Arg(i) if i < args.len() => {
                    Some(self.csm.var_ptr(caller_ctx, args[i]))
                }
                TransferEnd::Arg(i) => {
                    log::warn!("transfer argument {i} out of range at call site {callsite}");
                    None
                }
                TransferEnd::Base => base,
                TransferEnd::Result => None,
            };
            let to = match transfer.to {
                TransferEnd::Result => result.map(|r| self.csm.var_ptr(caller_ctx, r)),
                TransferEnd::Base => base,
                TransferEnd::Arg(_) => None,
            };
            if let (Some(source), Some(target)) = (from, to) {
                self.add_taint_flow_edge(source, target, transfer.ty);
            }
        }

        for index in sink_args {
            let ptr = self.csm.var_ptr(caller_ctx, args[index as usize]);
            if let Some(taint) = &mut self.taint {
                taint.record_sink(callsite, index, ptr);
            }
        }
        if sink_base {
            if let (Some(ptr), Some(taint)) = (base, &mut self.taint) {
                taint.record_sink(callsite, -1, ptr);
            }
        }
    }

    /// Installs a transfer edge; taints already sitting at the source are
    /// injected immediately.
    fn add_taint_flow_edge(&mut self, source: PointerId, target: PointerId, ty: TypeId) {
        let inserted = match &mut self.taint {
            Some(taint) => taint.add_flow_edge(source, target, ty),
            None => false,
        };
        if !inserted {
            return;
        }
        let objs: Vec<CsObjId> = self.csm.pts(source).iter().collect();
        let taints = self.retag_taints(&objs, ty);
        if !taints.is_empty() {
            self.worklist.push_back((target, taints));
        }
    }

    /// Pushes the taints of a freshly propagated delta across the transfer
    /// edges leaving `ptr`.
    fn propagate_taint(&mut self, ptr: PointerId, diff: &PointsToSet) {
        let edges: Vec<(PointerId, TypeId)> = match &self.taint {
            Some(taint) => taint.edges_of(ptr).to_vec(),
            None => return,
        };
        if edges.is_empty() {
            return;
        }
        let objs: Vec<CsObjId> = diff.iter().collect();
        for (target, ty) in edges {
            let taints = self.retag_taints(&objs, ty);
            if !taints.is_empty() {
                self.worklist.push_back((target, taints));
            }
        }
    }

    /// Re-tags the taint objects among `objs` with the type label `ty`.
    fn retag_taints(&mut self, objs: &[CsObjId], ty: TypeId) -> PointsToSet {
        let mut out = PointsToSet::new();
        for &cs_obj in objs {
            let (_, obj) = self.csm.cs_obj_parts(cs_obj);
            if let Some(source) = self.heap.source_call(obj) {
                let tainted = self.heap.taint_obj(source, ty);
                let empty = self.csm.empty_context();
                let cs = self.csm.cs_obj(empty, tainted);
                out.insert(cs);
            }
        }
        out
    }

    // ---- result construction -------------------------------------------

    /// Collapses the context-sensitive fixpoint into the result view.
    fn finish(self, entry: MethodId) -> PtaResult {
        let mut cg: CallGraph<StmtId, MethodId> = CallGraph::new();
        cg.add_entry_method(entry);
        for &cs_method in self.cg.reachable_methods() {
            cg.add_reachable_method(self.csm.cs_method_parts(cs_method).1);
        }
        for edge in self.cg.edges() {
            let callsite = self.csm.cs_callsite_parts(edge.callsite).1;
            let callee = self.csm.cs_method_parts(edge.callee).1;
            cg.add_callsite(callsite, self.program.stmt(callsite).method);
            cg.add_edge(CallEdge {
                kind: edge.kind,
                callsite,
                callee,
            });
        }

        let mut result = PtaResult::new(cg);
        for (ptr, key) in self.csm.pointers() {
            let objs = self
                .csm
                .pts(ptr)
                .iter()
                .map(|cs| self.csm.cs_obj_parts(cs).1);
            match key {
                PointerKey::Var(_, var) => result.add_var_pts(var, objs),
                PointerKey::StaticField(field) => result.add_static_field_pts(field, objs),
                PointerKey::InstanceField(cs_obj, field) => {
                    let obj = self.csm.cs_obj_parts(cs_obj).1;
                    result.add_obj_field_pts(obj, field, objs);
                }
                PointerKey::ArrayIndex(cs_obj) => {
                    let obj = self.csm.cs_obj_parts(cs_obj).1;
                    result.add_array_pts(obj, objs);
                }
            }
        }

        let mut flows: BTreeSet<TaintFlow> = BTreeSet::new();
        if let Some(taint) = &self.taint {
            for &(sink, index, ptr) in taint.sinks() {
                for cs_obj in self.csm.pts(ptr).iter() {
                    let obj = self.csm.cs_obj_parts(cs_obj).1;
                    if let Some(source) = self.heap.source_call(obj) {
                        flows.insert(TaintFlow {
                            source,
                            sink,
                            index,
                        });
                    }
                }
            }
        }
        result.set_taint_flows(flows.into_iter().collect());
        result
    }
}
