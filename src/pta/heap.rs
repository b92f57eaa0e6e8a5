//! Heap abstraction.
//!
//! The allocation-site model: every `New` statement denotes one abstract
//! object, canonicalized to a single [`ObjId`] no matter how often the site
//! is revisited. Taint objects are distinguished objects fabricated at
//! source call sites by the taint overlay; they carry the fabricating call
//! and a type label, and live in the same points-to sets as regular objects.

use rustc_hash::FxHashMap;

use crate::{
    ir::{MethodId, StmtId, TypeId},
    pta::ObjId,
};

/// What an abstract object stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjKind {
    /// An allocation site (`New` statement).
    Alloc(StmtId),
    /// A taint object fabricated at a source call site.
    Taint {
        /// The source call that produced the taint.
        source: StmtId,
    },
}

/// An abstract heap object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Obj {
    /// The object's identity.
    pub kind: ObjKind,
    /// The object's type (the allocated type, or the taint type label).
    pub ty: TypeId,
    /// The method containing the allocation site; `None` for taint objects.
    pub container: Option<MethodId>,
}

/// The allocation-site heap model.
///
/// Canonicalizes abstract objects: one handle per `New` site and one per
/// (source call, type label) taint pair. Objects are never removed.
#[derive(Debug, Default)]
pub struct HeapModel {
    objs: Vec<Obj>,
    alloc_cache: FxHashMap<StmtId, ObjId>,
    taint_cache: FxHashMap<(StmtId, TypeId), ObjId>,
}

impl HeapModel {
    /// Creates an empty heap model.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The canonical object of an allocation site.
    pub fn alloc_obj(&mut self, site: StmtId, ty: TypeId, container: MethodId) -> ObjId {
        if let Some(&id) = self.alloc_cache.get(&site) {
            return id;
        }
        let id = ObjId::new(self.objs.len());
        self.objs.push(Obj {
            kind: ObjKind::Alloc(site),
            ty,
            container: Some(container),
        });
        self.alloc_cache.insert(site, id);
        id
    }

    /// The canonical taint object for a source call and type label.
    pub fn taint_obj(&mut self, source: StmtId, ty: TypeId) -> ObjId {
        if let Some(&id) = self.taint_cache.get(&(source, ty)) {
            return id;
        }
        let id = ObjId::new(self.objs.len());
        self.objs.push(Obj {
            kind: ObjKind::Taint { source },
            ty,
            container: None,
        });
        self.taint_cache.insert((source, ty), id);
        id
    }

    /// The object behind a handle.
    #[must_use]
    pub fn obj(&self, id: ObjId) -> &Obj {
        &self.objs[id.index()]
    }

    /// Returns `true` for taint objects.
    #[must_use]
    pub fn is_taint(&self, id: ObjId) -> bool {
        matches!(self.obj(id).kind, ObjKind::Taint { .. })
    }

    /// The fabricating source call of a taint object.
    #[must_use]
    pub fn source_call(&self, id: ObjId) -> Option<StmtId> {
        match self.obj(id).kind {
            ObjKind::Taint { source } => Some(source),
            ObjKind::Alloc(_) => None,
        }
    }

    /// Number of abstract objects.
    #[must_use]
    pub fn obj_count(&self) -> usize {
        self.objs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocation_sites_are_canonical() {
        let mut heap = HeapModel::new();
        let site = StmtId::new(5);
        let ty = TypeId::new(0);
        let m = MethodId::new(0);
        let a = heap.alloc_obj(site, ty, m);
        let b = heap.alloc_obj(site, ty, m);
        assert_eq!(a, b);
        assert_eq!(heap.obj_count(), 1);
        assert!(!heap.is_taint(a));
        assert_eq!(heap.source_call(a), None);
    }

    #[test]
    fn test_taint_objects_keyed_by_call_and_type() {
        let mut heap = HeapModel::new();
        let call = StmtId::new(1);
        let t1 = TypeId::new(0);
        let t2 = TypeId::new(1);
        let a = heap.taint_obj(call, t1);
        let b = heap.taint_obj(call, t1);
        let c = heap.taint_obj(call, t2);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(heap.is_taint(a));
        assert_eq!(heap.source_call(c), Some(call));
    }
}
