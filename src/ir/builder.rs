//! Construction API for the program arena.
//!
//! [`ProgramBuilder`] registers classes, fields and method declarations;
//! [`BodyBuilder`] assembles one method body statement by statement and seals
//! it. Sealing validates branch targets, assigns global statement handles,
//! collects return variables and fills the per-variable relevant-statement
//! tables. Front ends lower their input through this API; the test suites use
//! it directly.
//!
//! # Examples
//!
//! ```rust
//! use irscope::ir::{MethodFlags, PrimType, ProgramBuilder};
//!
//! let mut pb = ProgramBuilder::new();
//! let int = pb.primitive(PrimType::Int);
//! let main_class = pb.add_class("Main", None);
//! let main = pb.declare_method(main_class, "main", &[], None, MethodFlags::STATIC);
//!
//! let mut b = pb.body(main);
//! let x = b.var("x", int);
//! b.assign_literal(x, 42);
//! b.ret(None);
//! b.seal()?;
//!
//! let program = pb.finish();
//! assert_eq!(program.method(main).body().unwrap().stmts.len(), 2);
//! # Ok::<(), irscope::Error>(())
//! ```

use crate::{
    ir::{
        exp::{BinaryOp, Exp},
        method::{Body, Class, Field, Method, MethodFlags, Subsig, Var},
        stmt::{CallKind, CondExp, MethodRef, Stmt, StmtData},
        types::{PrimType, Type},
        ClassId, FieldId, MethodId, StmtId, TypeId, VarId,
    },
    Program, Result,
};

/// Builder for a [`Program`].
///
/// Classes and method declarations must exist before call sites referencing
/// them are built, so construction is two-phase: declare everything, then
/// build bodies with [`ProgramBuilder::body`].
#[derive(Debug, Default)]
pub struct ProgramBuilder {
    program: Program,
}

impl ProgramBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns a primitive type.
    pub fn primitive(&mut self, prim: PrimType) -> TypeId {
        self.program.intern_type(Type::Primitive(prim))
    }

    /// Interns the reference type of a class.
    pub fn class_type(&mut self, class: ClassId) -> TypeId {
        self.program.intern_type(Type::Class(class))
    }

    /// Interns an array type over the given element type.
    pub fn array_type(&mut self, elem: TypeId) -> TypeId {
        self.program.intern_type(Type::Array(elem))
    }

    /// Adds a class with an optional superclass. Class names must be unique.
    pub fn add_class(&mut self, name: &str, super_class: Option<ClassId>) -> ClassId {
        self.insert_class(name, super_class, &[], false)
    }

    /// Adds an interface extending the given superinterfaces.
    pub fn add_interface(&mut self, name: &str, extends: &[ClassId]) -> ClassId {
        self.insert_class(name, None, extends, true)
    }

    /// Records that `class` implements `interface`.
    pub fn add_implements(&mut self, class: ClassId, interface: ClassId) {
        self.program.classes[class.index()].interfaces.push(interface);
        self.program
            .direct_implementors
            .entry(interface)
            .or_default()
            .push(class);
    }

    fn insert_class(
        &mut self,
        name: &str,
        super_class: Option<ClassId>,
        interfaces: &[ClassId],
        is_interface: bool,
    ) -> ClassId {
        let id = ClassId::new(self.program.classes.len());
        self.program.classes.push(Class {
            name: name.to_string(),
            super_class,
            interfaces: interfaces.to_vec(),
            is_interface,
            methods: Default::default(),
            fields: Vec::new(),
        });
        self.program.class_names.insert(name.to_string(), id);
        if let Some(sup) = super_class {
            self.program
                .direct_subclasses
                .entry(sup)
                .or_default()
                .push(id);
        }
        for &itf in interfaces {
            let map = if is_interface {
                &mut self.program.direct_subinterfaces
            } else {
                &mut self.program.direct_implementors
            };
            map.entry(itf).or_default().push(id);
        }
        id
    }

    /// Adds a field to a class.
    pub fn add_field(&mut self, class: ClassId, name: &str, ty: TypeId, is_static: bool) -> FieldId {
        let id = FieldId::new(self.program.fields.len());
        self.program.fields.push(Field {
            class,
            name: name.to_string(),
            ty,
            is_static,
        });
        self.program.classes[class.index()].fields.push(id);
        id
    }

    /// Declares a method on a class. The body, if any, is built separately
    /// with [`ProgramBuilder::body`].
    pub fn declare_method(
        &mut self,
        class: ClassId,
        name: &str,
        params: &[TypeId],
        ret: Option<TypeId>,
        flags: MethodFlags,
    ) -> MethodId {
        let subsig = self.program.intern_subsig(Subsig {
            name: name.to_string(),
            params: params.to_vec(),
            ret,
        });
        let id = MethodId::new(self.program.methods.len());
        self.program.methods.push(Method {
            class,
            name: name.to_string(),
            subsig,
            flags,
            param_types: params.to_vec(),
            ret_type: ret,
            body: None,
        });
        self.program.classes[class.index()].methods.insert(subsig, id);
        id
    }

    /// Returns the symbolic [`MethodRef`] naming a declared method, as a call
    /// site would spell it.
    #[must_use]
    pub fn method_ref(&self, method: MethodId) -> MethodRef {
        let m = &self.program.methods[method.index()];
        MethodRef {
            class: m.class,
            subsig: m.subsig,
        }
    }

    /// Starts building the body of a declared method.
    ///
    /// Parameter variables and (for instance methods) the receiver variable
    /// are created up front; query them with [`BodyBuilder::param`] and
    /// [`BodyBuilder::this_var`].
    pub fn body(&mut self, method: MethodId) -> BodyBuilder<'_> {
        let (param_types, is_static, class) = {
            let m = &self.program.methods[method.index()];
            (m.param_types.clone(), m.is_static(), m.class)
        };
        let this_var = if is_static {
            None
        } else {
            let ty = self.program.intern_type(Type::Class(class));
            Some(self.alloc_var(method, "this", ty))
        };
        let params: Vec<VarId> = param_types
            .iter()
            .enumerate()
            .map(|(i, &ty)| self.alloc_var(method, &format!("p{i}"), ty))
            .collect();
        let mut vars = Vec::new();
        vars.extend(this_var);
        vars.extend(params.iter().copied());
        BodyBuilder {
            pb: self,
            method,
            params,
            this_var,
            vars,
            stmts: Vec::new(),
        }
    }

    /// Finishes construction and returns the program.
    #[must_use]
    pub fn finish(self) -> Program {
        self.program
    }

    /// Read access to the program under construction.
    #[must_use]
    pub fn program(&self) -> &Program {
        &self.program
    }

    fn alloc_var(&mut self, method: MethodId, name: &str, ty: TypeId) -> VarId {
        let id = VarId::new(self.program.vars.len());
        self.program.vars.push(Var {
            method,
            name: name.to_string(),
            ty,
            store_fields: Vec::new(),
            load_fields: Vec::new(),
            store_arrays: Vec::new(),
            load_arrays: Vec::new(),
            invokes: Vec::new(),
        });
        id
    }
}

/// Builder for one method body.
///
/// Statements are appended in program order; branch targets are intra-method
/// statement indices and may point forward (reserve the statement with the
/// provisional target and patch it with [`BodyBuilder::set_target`]).
/// [`BodyBuilder::seal`] validates the body and installs it on the method.
#[derive(Debug)]
pub struct BodyBuilder<'a> {
    pb: &'a mut ProgramBuilder,
    method: MethodId,
    params: Vec<VarId>,
    this_var: Option<VarId>,
    vars: Vec<VarId>,
    stmts: Vec<Stmt>,
}

impl BodyBuilder<'_> {
    /// The parameter variable at declaration position `i`.
    #[must_use]
    pub fn param(&self, i: usize) -> VarId {
        self.params[i]
    }

    /// The receiver variable of an instance method.
    ///
    /// # Panics
    ///
    /// Panics if the method is static.
    #[must_use]
    pub fn this_var(&self) -> VarId {
        self.this_var.expect("static methods have no receiver")
    }

    /// Creates a fresh local variable.
    pub fn var(&mut self, name: &str, ty: TypeId) -> VarId {
        let id = self.pb.alloc_var(self.method, name, ty);
        self.vars.push(id);
        id
    }

    /// Index the next pushed statement will get.
    #[must_use]
    pub fn next_index(&self) -> usize {
        self.stmts.len()
    }

    /// Appends a raw statement and returns its intra-method index.
    pub fn push(&mut self, stmt: Stmt) -> usize {
        self.stmts.push(stmt);
        self.stmts.len() - 1
    }

    /// `lhs := literal`.
    pub fn assign_literal(&mut self, lhs: VarId, value: i32) -> usize {
        self.push(Stmt::Assign {
            lhs,
            rhs: Exp::IntLiteral(value),
        })
    }

    /// `lhs := a op b`.
    pub fn assign_binary(&mut self, lhs: VarId, op: BinaryOp, a: VarId, b: VarId) -> usize {
        self.push(Stmt::Assign {
            lhs,
            rhs: Exp::Binary { op, lhs: a, rhs: b },
        })
    }

    /// `lhs := (ty) arg`.
    pub fn assign_cast(&mut self, lhs: VarId, ty: TypeId, arg: VarId) -> usize {
        self.push(Stmt::Assign {
            lhs,
            rhs: Exp::Cast { ty, arg },
        })
    }

    /// `lhs := rhs` between locals.
    pub fn copy(&mut self, lhs: VarId, rhs: VarId) -> usize {
        self.push(Stmt::Copy { lhs, rhs })
    }

    /// `lhs := new ty`; the pushed statement is the allocation site.
    pub fn new_obj(&mut self, lhs: VarId, ty: TypeId) -> usize {
        self.push(Stmt::New { lhs, ty })
    }

    /// `lhs := base.field` / `lhs := Class.field` when `base` is `None`.
    pub fn load_field(&mut self, lhs: VarId, base: Option<VarId>, field: FieldId) -> usize {
        self.push(Stmt::LoadField { lhs, base, field })
    }

    /// `base.field := rhs` / `Class.field := rhs` when `base` is `None`.
    pub fn store_field(&mut self, base: Option<VarId>, field: FieldId, rhs: VarId) -> usize {
        self.push(Stmt::StoreField { base, field, rhs })
    }

    /// `lhs := base[index]`.
    pub fn load_array(&mut self, lhs: VarId, base: VarId, index: VarId) -> usize {
        self.push(Stmt::LoadArray { lhs, base, index })
    }

    /// `base[index] := rhs`.
    pub fn store_array(&mut self, base: VarId, index: VarId, rhs: VarId) -> usize {
        self.push(Stmt::StoreArray { base, index, rhs })
    }

    /// A static call of a declared method.
    pub fn call_static(&mut self, result: Option<VarId>, callee: MethodId, args: &[VarId]) -> usize {
        let method_ref = self.pb.method_ref(callee);
        self.push(Stmt::Invoke {
            result,
            kind: CallKind::Static,
            method_ref,
            recv: None,
            args: args.to_vec(),
        })
    }

    /// An instance call of the method `declared` names, with the given kind.
    pub fn call_instance(
        &mut self,
        result: Option<VarId>,
        kind: CallKind,
        recv: VarId,
        declared: MethodId,
        args: &[VarId],
    ) -> usize {
        let method_ref = self.pb.method_ref(declared);
        self.push(Stmt::Invoke {
            result,
            kind,
            method_ref,
            recv: Some(recv),
            args: args.to_vec(),
        })
    }

    /// `if (a op b) goto target`.
    pub fn if_cmp(&mut self, op: BinaryOp, a: VarId, b: VarId, target: usize) -> usize {
        self.push(Stmt::If {
            cond: CondExp { op, lhs: a, rhs: b },
            target,
        })
    }

    /// `goto target`.
    pub fn goto(&mut self, target: usize) -> usize {
        self.push(Stmt::Goto { target })
    }

    /// Table dispatch on `var`.
    pub fn switch(&mut self, var: VarId, cases: &[(i32, usize)], default: usize) -> usize {
        self.push(Stmt::Switch {
            var,
            cases: cases.to_vec(),
            default,
        })
    }

    /// `return` / `return value`.
    pub fn ret(&mut self, value: Option<VarId>) -> usize {
        self.push(Stmt::Return(value))
    }

    /// `throw value`.
    pub fn throw(&mut self, value: VarId) -> usize {
        self.push(Stmt::Throw(value))
    }

    /// Patches the branch target of the `If` or `Goto` statement at `index`.
    pub fn set_target(&mut self, index: usize, target: usize) {
        match &mut self.stmts[index] {
            Stmt::If { target: t, .. } | Stmt::Goto { target: t } => *t = target,
            _ => {}
        }
    }

    /// Validates the body and installs it on the method.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedIr`](crate::Error::MalformedIr) when a branch
    /// target lies outside the statement list or a call site's argument count
    /// disagrees with the named method's parameter count.
    pub fn seal(self) -> Result<()> {
        let Self {
            pb,
            method,
            params,
            this_var,
            vars,
            stmts,
        } = self;
        let len = stmts.len();
        for (i, stmt) in stmts.iter().enumerate() {
            match stmt {
                Stmt::If { target, .. } | Stmt::Goto { target } => {
                    if *target >= len {
                        return Err(malformed_ir!(
                            "branch target {} out of range at statement {i}",
                            target
                        ));
                    }
                }
                Stmt::Switch { cases, default, .. } => {
                    if cases.iter().any(|&(_, t)| t >= len) || *default >= len {
                        return Err(malformed_ir!("switch target out of range at statement {}", i));
                    }
                }
                Stmt::Invoke {
                    method_ref, args, ..
                } => {
                    let declared = pb.program.class(method_ref.class).declared_method(method_ref.subsig);
                    if let Some(callee) = declared {
                        let expected = pb.program.method(callee).param_types.len();
                        if expected != args.len() {
                            return Err(malformed_ir!(
                                "call at statement {i} passes {} arguments, callee declares {expected}",
                                args.len()
                            ));
                        }
                    }
                }
                _ => {}
            }
        }

        // Assign global handles and fill the per-variable relevant tables.
        let mut ids = Vec::with_capacity(len);
        let mut return_vars = Vec::new();
        for (index, kind) in stmts.into_iter().enumerate() {
            let id = StmtId::new(pb.program.stmts.len());
            match &kind {
                Stmt::StoreField {
                    base: Some(base), ..
                } => pb.program.vars[base.index()].store_fields.push(id),
                Stmt::LoadField {
                    base: Some(base), ..
                } => pb.program.vars[base.index()].load_fields.push(id),
                Stmt::StoreArray { base, .. } => {
                    pb.program.vars[base.index()].store_arrays.push(id);
                }
                Stmt::LoadArray { base, .. } => {
                    pb.program.vars[base.index()].load_arrays.push(id);
                }
                Stmt::Invoke {
                    recv: Some(recv), ..
                } => pb.program.vars[recv.index()].invokes.push(id),
                Stmt::Return(Some(v)) => return_vars.push(*v),
                _ => {}
            }
            pb.program.stmts.push(StmtData {
                kind,
                method,
                index,
            });
            ids.push(id);
        }

        pb.program.methods[method.index()].body = Some(Body {
            params,
            this_var,
            vars,
            stmts: ids,
            return_vars,
        });
        Ok(())
    }
}
