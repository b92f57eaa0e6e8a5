//! Contexts and context selectors.
//!
//! A context is an immutable ordered list of at most `k` elements: call
//! sites for call-site sensitivity, receiver objects for object sensitivity,
//! allocating classes for type sensitivity. Contexts are interned in a
//! [`ContextTable`]; equal element lists share one [`ContextId`], and the
//! empty context (id 0) is the sole initial context.
//!
//! Appending beyond length `k` discards the least recent element, so every
//! context a selector produces satisfies the length bound by construction.

use rustc_hash::FxHashMap;

use crate::{
    ir::{ClassId, MethodId, StmtId},
    pta::{heap::HeapModel, ContextId, ObjId},
    Error, Program, Result,
};

/// One element of a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextElem {
    /// A call site, for k-call-site sensitivity.
    CallSite(StmtId),
    /// A receiver object, for k-object sensitivity.
    Obj(ObjId),
    /// The class containing an allocation site, for k-type sensitivity.
    Type(ClassId),
}

/// Interning table for contexts.
#[derive(Debug)]
pub struct ContextTable {
    contexts: Vec<Vec<ContextElem>>,
    cache: FxHashMap<Vec<ContextElem>, ContextId>,
}

impl Default for ContextTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextTable {
    /// Creates a table holding just the empty context.
    #[must_use]
    pub fn new() -> Self {
        let mut table = Self {
            contexts: Vec::new(),
            cache: FxHashMap::default(),
        };
        table.intern(Vec::new());
        table
    }

    /// The empty context.
    #[must_use]
    pub const fn empty(&self) -> ContextId {
        ContextId::new(0)
    }

    /// The elements of a context, most recent last.
    #[must_use]
    pub fn elems(&self, id: ContextId) -> &[ContextElem] {
        &self.contexts[id.index()]
    }

    /// The length of a context.
    #[must_use]
    pub fn len_of(&self, id: ContextId) -> usize {
        self.contexts[id.index()].len()
    }

    /// Interns an element list.
    pub fn intern(&mut self, elems: Vec<ContextElem>) -> ContextId {
        if let Some(&id) = self.cache.get(&elems) {
            return id;
        }
        let id = ContextId::new(self.contexts.len());
        self.contexts.push(elems.clone());
        self.cache.insert(elems, id);
        id
    }

    /// Appends `elem` to `base` and truncates to the `k` most recent
    /// elements.
    pub fn append_truncated(&mut self, base: ContextId, elem: ContextElem, k: usize) -> ContextId {
        let mut elems = self.elems(base).to_vec();
        elems.push(elem);
        if elems.len() > k {
            elems.drain(..elems.len() - k);
        }
        self.intern(elems)
    }
}

/// Chooses callee contexts and heap contexts during the solve.
///
/// The solver consults the selector at every call edge it discovers and at
/// every allocation it first reaches. Selection creates contexts, so every
/// method receives the interning table; the heap model is along for
/// selectors keyed on object properties.
pub trait ContextSelector {
    /// The context for `callee` invoked from a call site without a receiver
    /// (static calls).
    fn select_context(
        &self,
        program: &Program,
        ctxs: &mut ContextTable,
        caller_ctx: ContextId,
        callsite: StmtId,
        callee: MethodId,
    ) -> ContextId;

    /// The context for `callee` invoked on the receiver object
    /// `(recv_ctx, recv_obj)`.
    #[allow(clippy::too_many_arguments)]
    fn select_context_with_recv(
        &self,
        program: &Program,
        heap: &HeapModel,
        ctxs: &mut ContextTable,
        caller_ctx: ContextId,
        callsite: StmtId,
        recv_ctx: ContextId,
        recv_obj: ObjId,
        callee: MethodId,
    ) -> ContextId;

    /// The heap context for an object allocated in a method running under
    /// `method_ctx`.
    fn select_heap_context(
        &self,
        program: &Program,
        heap: &HeapModel,
        ctxs: &mut ContextTable,
        method_ctx: ContextId,
        obj: ObjId,
    ) -> ContextId;
}

/// The context-insensitive selector: every context is empty.
#[derive(Debug, Default)]
pub struct CiSelector;

impl ContextSelector for CiSelector {
    fn select_context(
        &self,
        _program: &Program,
        ctxs: &mut ContextTable,
        _caller_ctx: ContextId,
        _callsite: StmtId,
        _callee: MethodId,
    ) -> ContextId {
        ctxs.empty()
    }

    fn select_context_with_recv(
        &self,
        _program: &Program,
        _heap: &HeapModel,
        ctxs: &mut ContextTable,
        _caller_ctx: ContextId,
        _callsite: StmtId,
        _recv_ctx: ContextId,
        _recv_obj: ObjId,
        _callee: MethodId,
    ) -> ContextId {
        ctxs.empty()
    }

    fn select_heap_context(
        &self,
        _program: &Program,
        _heap: &HeapModel,
        ctxs: &mut ContextTable,
        _method_ctx: ContextId,
        _obj: ObjId,
    ) -> ContextId {
        ctxs.empty()
    }
}

/// k-call-site sensitivity: callee contexts are the `k` most recent call
/// sites; heap contexts are empty.
#[derive(Debug)]
pub struct KCallSelector {
    k: usize,
}

impl KCallSelector {
    /// Creates the selector with call-string bound `k`.
    #[must_use]
    pub const fn new(k: usize) -> Self {
        Self { k }
    }
}

impl ContextSelector for KCallSelector {
    fn select_context(
        &self,
        _program: &Program,
        ctxs: &mut ContextTable,
        caller_ctx: ContextId,
        callsite: StmtId,
        _callee: MethodId,
    ) -> ContextId {
        ctxs.append_truncated(caller_ctx, ContextElem::CallSite(callsite), self.k)
    }

    fn select_context_with_recv(
        &self,
        _program: &Program,
        _heap: &HeapModel,
        ctxs: &mut ContextTable,
        caller_ctx: ContextId,
        callsite: StmtId,
        _recv_ctx: ContextId,
        _recv_obj: ObjId,
        _callee: MethodId,
    ) -> ContextId {
        ctxs.append_truncated(caller_ctx, ContextElem::CallSite(callsite), self.k)
    }

    fn select_heap_context(
        &self,
        _program: &Program,
        _heap: &HeapModel,
        ctxs: &mut ContextTable,
        _method_ctx: ContextId,
        _obj: ObjId,
    ) -> ContextId {
        ctxs.empty()
    }
}

/// k-object sensitivity: callee contexts are the `k` most recent receiver
/// objects; the heap context of a new object is the most recent element of
/// the allocating method's context.
#[derive(Debug)]
pub struct KObjSelector {
    k: usize,
}

impl KObjSelector {
    /// Creates the selector with receiver-chain bound `k`.
    #[must_use]
    pub const fn new(k: usize) -> Self {
        Self { k }
    }
}

impl ContextSelector for KObjSelector {
    fn select_context(
        &self,
        _program: &Program,
        _ctxs: &mut ContextTable,
        caller_ctx: ContextId,
        _callsite: StmtId,
        _callee: MethodId,
    ) -> ContextId {
        // Static calls carry the caller's context unchanged.
        caller_ctx
    }

    fn select_context_with_recv(
        &self,
        _program: &Program,
        _heap: &HeapModel,
        ctxs: &mut ContextTable,
        _caller_ctx: ContextId,
        _callsite: StmtId,
        recv_ctx: ContextId,
        recv_obj: ObjId,
        _callee: MethodId,
    ) -> ContextId {
        ctxs.append_truncated(recv_ctx, ContextElem::Obj(recv_obj), self.k)
    }

    fn select_heap_context(
        &self,
        _program: &Program,
        _heap: &HeapModel,
        ctxs: &mut ContextTable,
        method_ctx: ContextId,
        _obj: ObjId,
    ) -> ContextId {
        match ctxs.elems(method_ctx).last().copied() {
            Some(last) => ctxs.intern(vec![last]),
            None => ctxs.empty(),
        }
    }
}

/// k-type sensitivity: like k-object, but context elements are the classes
/// containing the allocation sites of the receiver objects.
#[derive(Debug)]
pub struct KTypeSelector {
    k: usize,
}

impl KTypeSelector {
    /// Creates the selector with type-chain bound `k`.
    #[must_use]
    pub const fn new(k: usize) -> Self {
        Self { k }
    }

    /// The class containing the allocation site of `obj`; taint objects fall
    /// back to the class behind their type label.
    fn allocating_class(program: &Program, heap: &HeapModel, obj: ObjId) -> Option<ClassId> {
        let obj = heap.obj(obj);
        match obj.container {
            Some(method) => Some(program.method(method).class),
            None => program.ty(obj.ty).as_class(),
        }
    }
}

impl ContextSelector for KTypeSelector {
    fn select_context(
        &self,
        _program: &Program,
        _ctxs: &mut ContextTable,
        caller_ctx: ContextId,
        _callsite: StmtId,
        _callee: MethodId,
    ) -> ContextId {
        caller_ctx
    }

    fn select_context_with_recv(
        &self,
        program: &Program,
        heap: &HeapModel,
        ctxs: &mut ContextTable,
        _caller_ctx: ContextId,
        _callsite: StmtId,
        recv_ctx: ContextId,
        recv_obj: ObjId,
        _callee: MethodId,
    ) -> ContextId {
        match Self::allocating_class(program, heap, recv_obj) {
            Some(class) => ctxs.append_truncated(recv_ctx, ContextElem::Type(class), self.k),
            None => recv_ctx,
        }
    }

    fn select_heap_context(
        &self,
        _program: &Program,
        _heap: &HeapModel,
        ctxs: &mut ContextTable,
        method_ctx: ContextId,
        _obj: ObjId,
    ) -> ContextId {
        match ctxs.elems(method_ctx).last().copied() {
            Some(last) => ctxs.intern(vec![last]),
            None => ctxs.empty(),
        }
    }
}

/// Parses a selector name from analysis options.
///
/// Accepted names: `ci`, `1-call`, `2-call`, `1-obj`, `2-obj`, `1-type`,
/// `2-type`.
///
/// # Errors
///
/// Returns [`Error::Config`] for any other name.
pub fn selector_by_name(name: &str) -> Result<Box<dyn ContextSelector>> {
    match name {
        "ci" => Ok(Box::new(CiSelector)),
        "1-call" => Ok(Box::new(KCallSelector::new(1))),
        "2-call" => Ok(Box::new(KCallSelector::new(2))),
        "1-obj" => Ok(Box::new(KObjSelector::new(1))),
        "2-obj" => Ok(Box::new(KObjSelector::new(2))),
        "1-type" => Ok(Box::new(KTypeSelector::new(1))),
        "2-type" => Ok(Box::new(KTypeSelector::new(2))),
        other => Err(Error::Config(format!("unknown context selector: {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contexts_are_interned() {
        let mut table = ContextTable::new();
        let a = table.intern(vec![ContextElem::CallSite(StmtId::new(1))]);
        let b = table.intern(vec![ContextElem::CallSite(StmtId::new(1))]);
        let c = table.intern(vec![ContextElem::CallSite(StmtId::new(2))]);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(table.empty(), ContextId::new(0));
        assert!(table.elems(table.empty()).is_empty());
    }

    #[test]
    fn test_append_truncates_least_recent() {
        let mut table = ContextTable::new();
        let s = |n| ContextElem::CallSite(StmtId::new(n));
        let c1 = table.append_truncated(table.empty(), s(1), 2);
        let c12 = table.append_truncated(c1, s(2), 2);
        let c23 = table.append_truncated(c12, s(3), 2);
        assert_eq!(table.elems(c12), &[s(1), s(2)]);
        // the least recent element (1) is discarded
        assert_eq!(table.elems(c23), &[s(2), s(3)]);
        assert_eq!(table.len_of(c23), 2);
    }

    #[test]
    fn test_selector_names() {
        assert!(selector_by_name("ci").is_ok());
        assert!(selector_by_name("2-obj").is_ok());
        assert!(selector_by_name("2-type").is_ok());
        assert!(selector_by_name("3-obj").is_err());
        assert!(selector_by_name("").is_err());
    }
}
