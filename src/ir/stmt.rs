//! Statement representation.
//!
//! Statements form a closed sum matched exhaustively by every consumer (the
//! statement walk of the pointer-analysis solver, the constant-propagation
//! transfer, the CFG builder). Branch targets are intra-method statement
//! indices; the global [`StmtId`] handle carries the containing method and
//! index alongside the kind.

use crate::ir::{
    exp::{BinaryOp, Exp},
    ClassId, FieldId, MethodId, SubsigId, VarId,
};

/// The invocation kind of a call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallKind {
    /// Call of a static method; resolved from the declared class alone.
    Static,
    /// Constructor or private/super call; dispatched from the declared class.
    Special,
    /// Instance call dispatched on the runtime class of the receiver.
    Virtual,
    /// Instance call through an interface-declared method.
    Interface,
    /// Dynamically bound call; targets are opaque to the engine.
    Dynamic,
}

/// A symbolic reference to a method as written at a call site: the declared
/// class plus the subsignature. Resolution against the class hierarchy happens
/// during call-graph construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MethodRef {
    /// The class the call site names.
    pub class: ClassId,
    /// The interned subsignature of the named method.
    pub subsig: SubsigId,
}

/// The comparison guarding an [`Stmt::If`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CondExp {
    /// The comparison operator (one of the comparison members of [`BinaryOp`]).
    pub op: BinaryOp,
    /// Left operand.
    pub lhs: VarId,
    /// Right operand.
    pub rhs: VarId,
}

impl CondExp {
    /// Views the condition as an expression, for constant evaluation.
    #[must_use]
    pub const fn as_exp(&self) -> Exp {
        Exp::Binary {
            op: self.op,
            lhs: self.lhs,
            rhs: self.rhs,
        }
    }
}

/// A three-address statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    /// No operation.
    Nop,
    /// `lhs := exp` for expression right-hand sides.
    Assign {
        /// Defined variable.
        lhs: VarId,
        /// Right-hand side.
        rhs: Exp,
    },
    /// `lhs := new ty`. The statement itself is the allocation site.
    New {
        /// Variable receiving the fresh object.
        lhs: VarId,
        /// The allocated (class or array) type.
        ty: crate::ir::TypeId,
    },
    /// `lhs := rhs` between locals.
    Copy {
        /// Defined variable.
        lhs: VarId,
        /// Source variable.
        rhs: VarId,
    },
    /// `lhs := base.field` (instance) or `lhs := Class.field` (static, `base`
    /// is `None`).
    LoadField {
        /// Variable receiving the field value.
        lhs: VarId,
        /// Base variable; `None` for static fields.
        base: Option<VarId>,
        /// The accessed field.
        field: FieldId,
    },
    /// `base.field := rhs` (instance) or `Class.field := rhs` (static).
    StoreField {
        /// Base variable; `None` for static fields.
        base: Option<VarId>,
        /// The written field.
        field: FieldId,
        /// Stored value.
        rhs: VarId,
    },
    /// `lhs := base[index]`.
    LoadArray {
        /// Variable receiving the element.
        lhs: VarId,
        /// Array variable.
        base: VarId,
        /// Index variable.
        index: VarId,
    },
    /// `base[index] := rhs`.
    StoreArray {
        /// Array variable.
        base: VarId,
        /// Index variable.
        index: VarId,
        /// Stored value.
        rhs: VarId,
    },
    /// `result := method(args)` in all its invocation kinds.
    Invoke {
        /// Variable receiving the return value, if the result is used.
        result: Option<VarId>,
        /// The invocation kind.
        kind: CallKind,
        /// The statically named target.
        method_ref: MethodRef,
        /// Receiver variable; `None` for static calls.
        recv: Option<VarId>,
        /// Argument variables in declaration order.
        args: Vec<VarId>,
    },
    /// `if (cond) goto target`, falling through otherwise.
    If {
        /// The guard.
        cond: CondExp,
        /// Intra-method index of the branch target.
        target: usize,
    },
    /// Unconditional jump.
    Goto {
        /// Intra-method index of the jump target.
        target: usize,
    },
    /// Table dispatch on an integer variable.
    Switch {
        /// The tested variable.
        var: VarId,
        /// `(case value, target index)` pairs.
        cases: Vec<(i32, usize)>,
        /// Target index when no case matches.
        default: usize,
    },
    /// Method return, with an optional returned variable.
    Return(Option<VarId>),
    /// Throw of an exception object; control leaves the method.
    Throw(VarId),
}

impl Stmt {
    /// Returns the variable this statement defines, if any.
    #[must_use]
    pub fn def(&self) -> Option<VarId> {
        match self {
            Self::Assign { lhs, .. }
            | Self::New { lhs, .. }
            | Self::Copy { lhs, .. }
            | Self::LoadField { lhs, .. }
            | Self::LoadArray { lhs, .. } => Some(*lhs),
            Self::Invoke { result, .. } => *result,
            _ => None,
        }
    }

    /// Returns the variables this statement reads.
    #[must_use]
    pub fn uses(&self) -> Vec<VarId> {
        let mut out = Vec::new();
        match self {
            Self::Nop | Self::New { .. } | Self::Goto { .. } | Self::Return(None) => {}
            Self::Assign { rhs, .. } => rhs.collect_uses(&mut out),
            Self::Copy { rhs, .. } => out.push(*rhs),
            Self::LoadField { base, .. } => out.extend(base.iter().copied()),
            Self::StoreField { base, rhs, .. } => {
                out.extend(base.iter().copied());
                out.push(*rhs);
            }
            Self::LoadArray { base, index, .. } => out.extend([*base, *index]),
            Self::StoreArray { base, index, rhs } => out.extend([*base, *index, *rhs]),
            Self::Invoke { recv, args, .. } => {
                out.extend(recv.iter().copied());
                out.extend(args.iter().copied());
            }
            Self::If { cond, .. } => out.extend([cond.lhs, cond.rhs]),
            Self::Switch { var, .. } => out.push(*var),
            Self::Return(Some(v)) | Self::Throw(v) => out.push(*v),
        }
        out
    }

    /// Returns `true` for call statements.
    #[must_use]
    pub const fn is_invoke(&self) -> bool {
        matches!(self, Self::Invoke { .. })
    }
}

/// A statement together with its location: the containing method and the
/// intra-method index. This is what the program arena stores per [`StmtId`]
/// (crate::ir::StmtId).
#[derive(Debug, Clone)]
pub struct StmtData {
    /// The statement itself.
    pub kind: Stmt,
    /// The containing method.
    pub method: MethodId,
    /// The position within the containing method's statement list.
    pub index: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_def_and_uses() {
        let v = |n| VarId::new(n);
        let stmt = Stmt::Assign {
            lhs: v(0),
            rhs: Exp::Binary {
                op: BinaryOp::Add,
                lhs: v(1),
                rhs: v(2),
            },
        };
        assert_eq!(stmt.def(), Some(v(0)));
        assert_eq!(stmt.uses(), vec![v(1), v(2)]);

        let store = Stmt::StoreArray {
            base: v(3),
            index: v(4),
            rhs: v(5),
        };
        assert_eq!(store.def(), None);
        assert_eq!(store.uses(), vec![v(3), v(4), v(5)]);
    }

    #[test]
    fn test_invoke_uses_receiver_and_args() {
        let v = |n| VarId::new(n);
        let call = Stmt::Invoke {
            result: Some(v(0)),
            kind: CallKind::Virtual,
            method_ref: MethodRef {
                class: ClassId::new(0),
                subsig: SubsigId::new(0),
            },
            recv: Some(v(1)),
            args: vec![v(2), v(3)],
        };
        assert_eq!(call.def(), Some(v(0)));
        assert_eq!(call.uses(), vec![v(1), v(2), v(3)]);
        assert!(call.is_invoke());
    }
}
