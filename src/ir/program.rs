//! The program arena and its hierarchy queries.
//!
//! [`Program`] owns every IR element for the lifetime of an analysis run:
//! interned types and subsignatures, classes, fields, methods, variables and
//! statements. Reverse hierarchy maps (direct subclasses, subinterfaces and
//! implementors) are maintained incrementally as classes are added, so the
//! closure walks of class-hierarchy analysis are simple queue traversals.

use rustc_hash::FxHashMap;

use crate::ir::{
    method::{Class, Field, Method, Subsig, Var},
    stmt::{CallKind, MethodRef, Stmt, StmtData},
    types::Type,
    ClassId, FieldId, MethodId, StmtId, SubsigId, TypeId, VarId,
};

/// The analyzed program: arenas for all IR elements plus the class-hierarchy
/// oracle.
///
/// All handles returned by accessors stay valid for the lifetime of the
/// program; nothing is ever removed.
#[derive(Debug, Default)]
pub struct Program {
    pub(crate) types: Vec<Type>,
    pub(crate) type_cache: FxHashMap<Type, TypeId>,
    pub(crate) classes: Vec<Class>,
    pub(crate) class_names: FxHashMap<String, ClassId>,
    pub(crate) fields: Vec<Field>,
    pub(crate) methods: Vec<Method>,
    pub(crate) vars: Vec<Var>,
    pub(crate) stmts: Vec<StmtData>,
    pub(crate) subsigs: Vec<Subsig>,
    pub(crate) subsig_cache: FxHashMap<Subsig, SubsigId>,
    pub(crate) direct_subclasses: FxHashMap<ClassId, Vec<ClassId>>,
    pub(crate) direct_subinterfaces: FxHashMap<ClassId, Vec<ClassId>>,
    pub(crate) direct_implementors: FxHashMap<ClassId, Vec<ClassId>>,
}

impl Program {
    /// Returns the interned type behind a handle.
    #[must_use]
    pub fn ty(&self, id: TypeId) -> &Type {
        &self.types[id.index()]
    }

    /// Returns the class behind a handle.
    #[must_use]
    pub fn class(&self, id: ClassId) -> &Class {
        &self.classes[id.index()]
    }

    /// Looks a class up by name.
    #[must_use]
    pub fn class_by_name(&self, name: &str) -> Option<ClassId> {
        self.class_names.get(name).copied()
    }

    /// Returns the field behind a handle.
    #[must_use]
    pub fn field(&self, id: FieldId) -> &Field {
        &self.fields[id.index()]
    }

    /// Returns the method behind a handle.
    #[must_use]
    pub fn method(&self, id: MethodId) -> &Method {
        &self.methods[id.index()]
    }

    /// Returns the variable behind a handle.
    #[must_use]
    pub fn var(&self, id: VarId) -> &Var {
        &self.vars[id.index()]
    }

    /// Returns the statement behind a handle.
    #[must_use]
    pub fn stmt(&self, id: StmtId) -> &StmtData {
        &self.stmts[id.index()]
    }

    /// Returns the interned subsignature behind a handle.
    #[must_use]
    pub fn subsig(&self, id: SubsigId) -> &Subsig {
        &self.subsigs[id.index()]
    }

    /// Iterates all declared methods.
    pub fn methods(&self) -> impl Iterator<Item = MethodId> + '_ {
        (0..self.methods.len()).map(MethodId::new)
    }

    /// Returns `true` if the variable's declared type participates in the
    /// 32-bit constant lattice.
    #[must_use]
    pub fn is_int_like_var(&self, var: VarId) -> bool {
        self.ty(self.var(var).ty).is_int_like()
    }

    /// The direct subclasses of a class.
    #[must_use]
    pub fn direct_subclasses_of(&self, class: ClassId) -> &[ClassId] {
        match self.direct_subclasses.get(&class) {
            Some(subs) => subs,
            None => &[],
        }
    }

    /// The direct subinterfaces of an interface.
    #[must_use]
    pub fn direct_subinterfaces_of(&self, class: ClassId) -> &[ClassId] {
        match self.direct_subinterfaces.get(&class) {
            Some(subs) => subs,
            None => &[],
        }
    }

    /// The direct (class) implementors of an interface.
    #[must_use]
    pub fn direct_implementors_of(&self, class: ClassId) -> &[ClassId] {
        match self.direct_implementors.get(&class) {
            Some(impls) => impls,
            None => &[],
        }
    }

    /// Looks up the runtime dispatch target for `subsig` starting at `class`.
    ///
    /// Walks the superclass chain from `class` and returns the first declared,
    /// non-abstract method with the given subsignature, or `None` when no
    /// concrete implementation exists on the chain.
    #[must_use]
    pub fn dispatch(&self, class: ClassId, subsig: SubsigId) -> Option<MethodId> {
        let mut current = Some(class);
        while let Some(c) = current {
            if let Some(m) = self.class(c).declared_method(subsig) {
                if !self.method(m).is_abstract() {
                    return Some(m);
                }
            }
            current = self.class(c).super_class;
        }
        None
    }

    /// Resolves the concrete callee of a call site given the runtime type of
    /// the receiver object.
    ///
    /// Static calls resolve from the declared class alone and ignore
    /// `recv_type`; special calls dispatch from the declared class; virtual
    /// and interface calls dispatch from the receiver's class. Returns `None`
    /// when no concrete target exists (the caller logs and skips).
    #[must_use]
    pub fn resolve_callee(&self, recv_type: Option<TypeId>, callsite: StmtId) -> Option<MethodId> {
        let Stmt::Invoke {
            kind, method_ref, ..
        } = &self.stmt(callsite).kind
        else {
            return None;
        };
        self.resolve_ref(*kind, *method_ref, recv_type)
    }

    /// Resolves a method reference for a given call kind and receiver type.
    #[must_use]
    pub fn resolve_ref(
        &self,
        kind: CallKind,
        method_ref: MethodRef,
        recv_type: Option<TypeId>,
    ) -> Option<MethodId> {
        match kind {
            CallKind::Static => self.class(method_ref.class).declared_method(method_ref.subsig),
            CallKind::Special => self.dispatch(method_ref.class, method_ref.subsig),
            CallKind::Virtual | CallKind::Interface => {
                let class = recv_type.and_then(|t| self.ty(t).as_class())?;
                self.dispatch(class, method_ref.subsig)
            }
            CallKind::Dynamic => None,
        }
    }

    /// Finds a declared method by class name and method name.
    ///
    /// Used to resolve configuration documents; when the class declares
    /// several overloads of the name, an arbitrary one is returned.
    #[must_use]
    pub fn find_method(&self, class_name: &str, method_name: &str) -> Option<MethodId> {
        let class = self.class_by_name(class_name)?;
        self.class(class)
            .declared_methods()
            .find(|&m| self.method(m).name == method_name)
    }

    /// Finds a declared field by class name and field name.
    #[must_use]
    pub fn find_field(&self, class_name: &str, field_name: &str) -> Option<FieldId> {
        let class = self.class_by_name(class_name)?;
        self.class(class)
            .fields
            .iter()
            .copied()
            .find(|&f| self.field(f).name == field_name)
    }

    /// Interns a type, returning its canonical handle.
    pub fn intern_type(&mut self, ty: Type) -> TypeId {
        if let Some(&id) = self.type_cache.get(&ty) {
            return id;
        }
        let id = TypeId::new(self.types.len());
        self.types.push(ty);
        self.type_cache.insert(ty, id);
        id
    }

    /// Interns a subsignature, returning its canonical handle.
    pub fn intern_subsig(&mut self, subsig: Subsig) -> SubsigId {
        if let Some(&id) = self.subsig_cache.get(&subsig) {
            return id;
        }
        let id = SubsigId::new(self.subsigs.len());
        self.subsigs.push(subsig.clone());
        self.subsig_cache.insert(subsig, id);
        id
    }
}

#[cfg(test)]
mod tests {
    use crate::ir::{builder::ProgramBuilder, MethodFlags, PrimType};

    #[test]
    fn test_dispatch_walks_superclass_chain() {
        let mut pb = ProgramBuilder::new();
        let int = pb.primitive(PrimType::Int);
        let a = pb.add_class("A", None);
        let b = pb.add_class("B", Some(a));
        let c = pb.add_class("C", Some(b));
        let m_a = pb.declare_method(a, "m", &[], Some(int), MethodFlags::empty());
        let m_b = pb.declare_method(b, "m", &[], Some(int), MethodFlags::empty());
        let program = pb.finish();

        let subsig = program.method(m_a).subsig;
        // C inherits B's override, B declares its own, A declares the root.
        assert_eq!(program.dispatch(c, subsig), Some(m_b));
        assert_eq!(program.dispatch(b, subsig), Some(m_b));
        assert_eq!(program.dispatch(a, subsig), Some(m_a));
    }

    #[test]
    fn test_dispatch_skips_abstract() {
        let mut pb = ProgramBuilder::new();
        let a = pb.add_class("A", None);
        let b = pb.add_class("B", Some(a));
        let _ = pb.declare_method(a, "m", &[], None, MethodFlags::ABSTRACT);
        let m_b = pb.declare_method(b, "m", &[], None, MethodFlags::empty());
        let program = pb.finish();

        let subsig = program.method(m_b).subsig;
        assert_eq!(program.dispatch(b, subsig), Some(m_b));
        // Dispatch from the abstract declaration site finds nothing concrete.
        assert_eq!(program.dispatch(a, subsig), None);
    }

    #[test]
    fn test_reverse_hierarchy_maps() {
        let mut pb = ProgramBuilder::new();
        let i = pb.add_interface("I", &[]);
        let j = pb.add_interface("J", &[i]);
        let a = pb.add_class("A", None);
        pb.add_implements(a, i);
        let b = pb.add_class("B", Some(a));
        let program = pb.finish();

        assert_eq!(program.direct_subinterfaces_of(i), &[j]);
        assert_eq!(program.direct_implementors_of(i), &[a]);
        assert_eq!(program.direct_subclasses_of(a), &[b]);
        assert!(program.direct_subclasses_of(b).is_empty());
    }
}
