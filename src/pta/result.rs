//! Context-collapsed pointer-analysis results.
//!
//! The fixpoint is computed over context-qualified elements; the result view
//! projects contexts away, which is what most clients (alias queries, the
//! refined constant propagation, taint reporting) want. The collapsed call
//! graph keeps the full edge set, merely dropping context qualifiers.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::{
    callgraph::CallGraph,
    ir::{FieldId, MethodId, StmtId, VarId},
    pta::ObjId,
    taint::TaintFlow,
};

/// The queryable outcome of a pointer-analysis run.
#[derive(Debug)]
pub struct PtaResult {
    var_pts: FxHashMap<VarId, FxHashSet<ObjId>>,
    static_field_pts: FxHashMap<FieldId, FxHashSet<ObjId>>,
    obj_field_pts: FxHashMap<(ObjId, FieldId), FxHashSet<ObjId>>,
    array_pts: FxHashMap<ObjId, FxHashSet<ObjId>>,
    call_graph: CallGraph<StmtId, MethodId>,
    taint_flows: Vec<TaintFlow>,
    empty: FxHashSet<ObjId>,
}

impl PtaResult {
    /// Creates an empty result around a collapsed call graph.
    #[must_use]
    pub fn new(call_graph: CallGraph<StmtId, MethodId>) -> Self {
        Self {
            var_pts: FxHashMap::default(),
            static_field_pts: FxHashMap::default(),
            obj_field_pts: FxHashMap::default(),
            array_pts: FxHashMap::default(),
            call_graph,
            taint_flows: Vec::new(),
            empty: FxHashSet::default(),
        }
    }

    pub(crate) fn add_var_pts(&mut self, var: VarId, objs: impl Iterator<Item = ObjId>) {
        self.var_pts.entry(var).or_default().extend(objs);
    }

    pub(crate) fn add_static_field_pts(
        &mut self,
        field: FieldId,
        objs: impl Iterator<Item = ObjId>,
    ) {
        self.static_field_pts.entry(field).or_default().extend(objs);
    }

    pub(crate) fn add_obj_field_pts(
        &mut self,
        obj: ObjId,
        field: FieldId,
        objs: impl Iterator<Item = ObjId>,
    ) {
        self.obj_field_pts.entry((obj, field)).or_default().extend(objs);
    }

    pub(crate) fn add_array_pts(&mut self, obj: ObjId, objs: impl Iterator<Item = ObjId>) {
        self.array_pts.entry(obj).or_default().extend(objs);
    }

    pub(crate) fn set_taint_flows(&mut self, flows: Vec<TaintFlow>) {
        self.taint_flows = flows;
    }

    /// The objects a variable may point to, across all contexts.
    #[must_use]
    pub fn points_to(&self, var: VarId) -> &FxHashSet<ObjId> {
        self.var_pts.get(&var).unwrap_or(&self.empty)
    }

    /// The objects `var.field` may point to: the union over the field
    /// pointers of every object `var` points to.
    #[must_use]
    pub fn points_to_field(&self, var: VarId, field: FieldId) -> FxHashSet<ObjId> {
        let mut out = FxHashSet::default();
        for &base in self.points_to(var) {
            if let Some(objs) = self.obj_field_pts.get(&(base, field)) {
                out.extend(objs.iter().copied());
            }
        }
        out
    }

    /// The objects a static field may point to.
    #[must_use]
    pub fn points_to_static(&self, field: FieldId) -> &FxHashSet<ObjId> {
        self.static_field_pts.get(&field).unwrap_or(&self.empty)
    }

    /// Returns `true` if two variables may point to a common object.
    #[must_use]
    pub fn may_alias(&self, a: VarId, b: VarId) -> bool {
        let pa = self.points_to(a);
        let pb = self.points_to(b);
        let (small, large) = if pa.len() <= pb.len() { (pa, pb) } else { (pb, pa) };
        small.iter().any(|obj| large.contains(obj))
    }

    /// The collapsed call graph.
    #[must_use]
    pub const fn call_graph(&self) -> &CallGraph<StmtId, MethodId> {
        &self.call_graph
    }

    /// The taint flows witnessed at the fixpoint, ordered by
    /// (source, sink, parameter index).
    #[must_use]
    pub fn taint_flows(&self) -> &[TaintFlow] {
        &self.taint_flows
    }
}
