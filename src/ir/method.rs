//! Classes, fields, methods and variables.
//!
//! These are the arena payloads behind the handles in [`crate::ir`]. Bodies
//! are sealed by the builder: sealing assigns global statement handles,
//! records return variables and fills the per-variable relevant-statement
//! tables the pointer-analysis solver walks (which field/array accesses use a
//! variable as base, and which call sites use it as receiver).

use bitflags::bitflags;
use rustc_hash::FxHashMap;

use crate::ir::{ClassId, FieldId, MethodId, StmtId, SubsigId, TypeId, VarId};

bitflags! {
    /// Modifier flags of a declared method.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MethodFlags: u8 {
        /// Static method: no receiver, dispatched from the declared class.
        const STATIC = 0x01;
        /// Abstract method: declared without a body, skipped by dispatch.
        const ABSTRACT = 0x02;
        /// Constructor.
        const CONSTRUCTOR = 0x04;
        /// Native method: body opaque to the engine.
        const NATIVE = 0x08;
    }
}

/// A class or interface declaration.
#[derive(Debug)]
pub struct Class {
    /// The (unique) class name.
    pub name: String,
    /// The direct superclass; `None` for the hierarchy root and interfaces
    /// without one.
    pub super_class: Option<ClassId>,
    /// Direct superinterfaces (for interfaces) or implemented interfaces (for
    /// classes).
    pub interfaces: Vec<ClassId>,
    /// `true` if this is an interface.
    pub is_interface: bool,
    /// Declared methods keyed by subsignature.
    pub(crate) methods: FxHashMap<SubsigId, MethodId>,
    /// Declared fields.
    pub fields: Vec<FieldId>,
}

impl Class {
    /// Returns the declared method with the given subsignature, not
    /// considering inherited ones.
    #[must_use]
    pub fn declared_method(&self, subsig: SubsigId) -> Option<MethodId> {
        self.methods.get(&subsig).copied()
    }

    /// Iterates the declared methods.
    pub fn declared_methods(&self) -> impl Iterator<Item = MethodId> + '_ {
        self.methods.values().copied()
    }
}

/// A declared field.
#[derive(Debug)]
pub struct Field {
    /// The declaring class.
    pub class: ClassId,
    /// The field name.
    pub name: String,
    /// The declared type.
    pub ty: TypeId,
    /// `true` for static fields.
    pub is_static: bool,
}

/// An interned method subsignature: everything identifying a method except the
/// declaring class. Dispatch walks class hierarchies comparing subsignatures.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Subsig {
    /// The method name.
    pub name: String,
    /// Parameter types in declaration order.
    pub params: Vec<TypeId>,
    /// Return type; `None` for void.
    pub ret: Option<TypeId>,
}

/// A method-local variable.
///
/// The relevant-statement tables are filled when the owning body is sealed and
/// never change afterwards; the pointer-analysis solver reads them every time
/// the variable's points-to set grows.
#[derive(Debug)]
pub struct Var {
    /// The owning method.
    pub method: MethodId,
    /// The variable name (auto-generated unless given).
    pub name: String,
    /// The declared type.
    pub ty: TypeId,
    /// Instance field stores with this variable as base.
    pub(crate) store_fields: Vec<StmtId>,
    /// Instance field loads with this variable as base.
    pub(crate) load_fields: Vec<StmtId>,
    /// Array stores with this variable as base.
    pub(crate) store_arrays: Vec<StmtId>,
    /// Array loads with this variable as base.
    pub(crate) load_arrays: Vec<StmtId>,
    /// Instance call sites with this variable as receiver.
    pub(crate) invokes: Vec<StmtId>,
}

impl Var {
    /// Instance field stores `v.f := x` with this variable as base.
    #[must_use]
    pub fn store_fields(&self) -> &[StmtId] {
        &self.store_fields
    }

    /// Instance field loads `x := v.f` with this variable as base.
    #[must_use]
    pub fn load_fields(&self) -> &[StmtId] {
        &self.load_fields
    }

    /// Array stores `v[i] := x` with this variable as base.
    #[must_use]
    pub fn store_arrays(&self) -> &[StmtId] {
        &self.store_arrays
    }

    /// Array loads `x := v[i]` with this variable as base.
    #[must_use]
    pub fn load_arrays(&self) -> &[StmtId] {
        &self.load_arrays
    }

    /// Call sites `v.m(...)` with this variable as receiver.
    #[must_use]
    pub fn invokes(&self) -> &[StmtId] {
        &self.invokes
    }
}

/// A sealed method body.
#[derive(Debug)]
pub struct Body {
    /// Parameter variables in declaration order.
    pub params: Vec<VarId>,
    /// The receiver variable; `None` for static methods.
    pub this_var: Option<VarId>,
    /// All variables of the method (parameters and receiver included).
    pub vars: Vec<VarId>,
    /// The statements in program order.
    pub stmts: Vec<StmtId>,
    /// The variables returned by `Return` statements, in order of appearance.
    pub return_vars: Vec<VarId>,
}

/// A declared method.
#[derive(Debug)]
pub struct Method {
    /// The declaring class.
    pub class: ClassId,
    /// The method name.
    pub name: String,
    /// The interned subsignature.
    pub subsig: SubsigId,
    /// Modifier flags.
    pub flags: MethodFlags,
    /// Parameter types in declaration order.
    pub param_types: Vec<TypeId>,
    /// Return type; `None` for void.
    pub ret_type: Option<TypeId>,
    /// The sealed body; `None` for abstract and native methods.
    pub body: Option<Body>,
}

impl Method {
    /// Returns `true` if this method is static.
    #[must_use]
    pub const fn is_static(&self) -> bool {
        self.flags.contains(MethodFlags::STATIC)
    }

    /// Returns `true` if this method is abstract.
    #[must_use]
    pub const fn is_abstract(&self) -> bool {
        self.flags.contains(MethodFlags::ABSTRACT)
    }

    /// Returns the sealed body, if the method has one.
    #[must_use]
    pub const fn body(&self) -> Option<&Body> {
        self.body.as_ref()
    }
}
