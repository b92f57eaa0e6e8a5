//! Canonicalization of context-sensitive elements.
//!
//! The manager maps every (context, element) pair to a unique handle:
//! variables, static fields, instance fields, array elements, methods, call
//! sites and objects. The invariant all of pointer analysis rests on:
//! **pointer identity depends only on the semantic key**. Asking for the
//! same key twice returns the same handle, and handles are never removed.
//!
//! The manager also owns the points-to set of every pointer, so the solver
//! mutates the sets through it for the lifetime of a run.

use rustc_hash::FxHashMap;

use crate::{
    ir::{FieldId, MethodId, StmtId, VarId},
    pta::{
        context::ContextTable,
        pts::PointsToSet,
        ContextId, CsCallSiteId, CsMethodId, CsObjId, ObjId, PointerId,
    },
};

/// The semantic key of a pointer node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerKey {
    /// A method-local variable under a context.
    Var(ContextId, VarId),
    /// A static field (contexts never apply).
    StaticField(FieldId),
    /// An instance field of a context-qualified object.
    InstanceField(CsObjId, FieldId),
    /// The elements of a context-qualified array object, modeled as one
    /// pointer.
    ArrayIndex(CsObjId),
}

/// Canonicalizer and owner of all context-sensitive elements of one run.
#[derive(Debug, Default)]
pub struct CsManager {
    /// The context interning table.
    pub(crate) contexts: ContextTable,
    cs_objs: Vec<(ContextId, ObjId)>,
    cs_obj_cache: FxHashMap<(ContextId, ObjId), CsObjId>,
    cs_methods: Vec<(ContextId, MethodId)>,
    cs_method_cache: FxHashMap<(ContextId, MethodId), CsMethodId>,
    cs_callsites: Vec<(ContextId, StmtId)>,
    cs_callsite_cache: FxHashMap<(ContextId, StmtId), CsCallSiteId>,
    pointers: Vec<PointerKey>,
    pointer_cache: FxHashMap<PointerKey, PointerId>,
    points_to: Vec<PointsToSet>,
}

impl CsManager {
    /// Creates an empty manager (holding the empty context).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The empty context.
    #[must_use]
    pub fn empty_context(&self) -> ContextId {
        self.contexts.empty()
    }

    /// Shared access to the context table.
    #[must_use]
    pub const fn contexts(&self) -> &ContextTable {
        &self.contexts
    }

    /// Mutable access to the context table, for selectors.
    pub fn contexts_mut(&mut self) -> &mut ContextTable {
        &mut self.contexts
    }

    /// The canonical handle of `(heap context, object)`.
    pub fn cs_obj(&mut self, heap_ctx: ContextId, obj: ObjId) -> CsObjId {
        if let Some(&id) = self.cs_obj_cache.get(&(heap_ctx, obj)) {
            return id;
        }
        let id = CsObjId::new(self.cs_objs.len());
        self.cs_objs.push((heap_ctx, obj));
        self.cs_obj_cache.insert((heap_ctx, obj), id);
        id
    }

    /// The (heap context, object) behind a handle.
    #[must_use]
    pub fn cs_obj_parts(&self, id: CsObjId) -> (ContextId, ObjId) {
        self.cs_objs[id.index()]
    }

    /// The canonical handle of `(context, method)`.
    pub fn cs_method(&mut self, ctx: ContextId, method: MethodId) -> CsMethodId {
        if let Some(&id) = self.cs_method_cache.get(&(ctx, method)) {
            return id;
        }
        let id = CsMethodId::new(self.cs_methods.len());
        self.cs_methods.push((ctx, method));
        self.cs_method_cache.insert((ctx, method), id);
        id
    }

    /// The (context, method) behind a handle.
    #[must_use]
    pub fn cs_method_parts(&self, id: CsMethodId) -> (ContextId, MethodId) {
        self.cs_methods[id.index()]
    }

    /// The canonical handle of `(context, call site)`.
    pub fn cs_callsite(&mut self, ctx: ContextId, callsite: StmtId) -> CsCallSiteId {
        if let Some(&id) = self.cs_callsite_cache.get(&(ctx, callsite)) {
            return id;
        }
        let id = CsCallSiteId::new(self.cs_callsites.len());
        self.cs_callsites.push((ctx, callsite));
        self.cs_callsite_cache.insert((ctx, callsite), id);
        id
    }

    /// The (context, call site) behind a handle.
    #[must_use]
    pub fn cs_callsite_parts(&self, id: CsCallSiteId) -> (ContextId, StmtId) {
        self.cs_callsites[id.index()]
    }

    /// The pointer of a variable under a context.
    pub fn var_ptr(&mut self, ctx: ContextId, var: VarId) -> PointerId {
        self.pointer(PointerKey::Var(ctx, var))
    }

    /// The pointer of a static field.
    pub fn static_field_ptr(&mut self, field: FieldId) -> PointerId {
        self.pointer(PointerKey::StaticField(field))
    }

    /// The pointer of an instance field of a context-qualified object.
    pub fn instance_field_ptr(&mut self, obj: CsObjId, field: FieldId) -> PointerId {
        self.pointer(PointerKey::InstanceField(obj, field))
    }

    /// The pointer of the array elements of a context-qualified object.
    pub fn array_index_ptr(&mut self, obj: CsObjId) -> PointerId {
        self.pointer(PointerKey::ArrayIndex(obj))
    }

    fn pointer(&mut self, key: PointerKey) -> PointerId {
        if let Some(&id) = self.pointer_cache.get(&key) {
            return id;
        }
        let id = PointerId::new(self.pointers.len());
        self.pointers.push(key);
        self.pointer_cache.insert(key, id);
        self.points_to.push(PointsToSet::new());
        id
    }

    /// The semantic key of a pointer.
    #[must_use]
    pub fn pointer_key(&self, id: PointerId) -> PointerKey {
        self.pointers[id.index()]
    }

    /// The points-to set of a pointer.
    #[must_use]
    pub fn pts(&self, id: PointerId) -> &PointsToSet {
        &self.points_to[id.index()]
    }

    /// Mutable points-to set of a pointer (solver only; sets never shrink).
    pub fn pts_mut(&mut self, id: PointerId) -> &mut PointsToSet {
        &mut self.points_to[id.index()]
    }

    /// Number of pointers created so far.
    #[must_use]
    pub fn pointer_count(&self) -> usize {
        self.pointers.len()
    }

    /// Iterates all pointers with their keys.
    pub fn pointers(&self) -> impl Iterator<Item = (PointerId, PointerKey)> + '_ {
        self.pointers
            .iter()
            .enumerate()
            .map(|(i, &key)| (PointerId::new(i), key))
    }
}
