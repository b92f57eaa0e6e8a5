//! Program model: a method-level three-address IR for a managed, class-based
//! object-oriented language.
//!
//! The IR is produced by an external front end (or by the [`ProgramBuilder`]
//! API, which is what the test suites use) and consumed by every analysis in
//! this crate. All program elements live in arenas owned by [`Program`] and
//! are referenced through small copyable index handles ([`ClassId`],
//! [`MethodId`], [`VarId`], [`StmtId`], ...). Handles are canonical: equal
//! elements have equal handles, and no element is ever removed once inserted.
//!
//! # Architecture
//!
//! - [`types`] - interned type representation and the integer-width predicate
//!   used by constant propagation
//! - [`stmt`] / [`exp`] - the closed statement and expression sums; analyses
//!   match on them exhaustively
//! - [`method`] - classes, fields, methods, variables and sealed bodies with
//!   per-variable relevant-statement tables
//! - [`program`] - the arena container plus class-hierarchy and dispatch
//!   queries
//! - [`builder`] - construction API that validates and seals method bodies

id_type!(
    /// Handle of an interned [`Type`](types::Type).
    TypeId
);
id_type!(
    /// Handle of a class or interface in the analyzed program.
    ClassId
);
id_type!(
    /// Handle of a declared field.
    FieldId
);
id_type!(
    /// Handle of a declared method.
    MethodId
);
id_type!(
    /// Handle of a method-local variable. Variable handles are program-global;
    /// the owning method is recorded on the variable itself.
    VarId
);
id_type!(
    /// Handle of a statement. Statement handles are program-global; the
    /// containing method and the intra-method index are recorded on the
    /// statement itself.
    StmtId
);
id_type!(
    /// Handle of an interned method subsignature (name + parameter types +
    /// return type, without the declaring class).
    SubsigId
);

pub mod builder;
pub mod exp;
pub mod method;
pub mod program;
pub mod stmt;
pub mod types;

pub use builder::{BodyBuilder, ProgramBuilder};
pub use exp::{BinaryOp, Exp};
pub use method::{Body, Class, Field, Method, MethodFlags, Subsig, Var};
pub use program::Program;
pub use stmt::{CallKind, CondExp, MethodRef, Stmt, StmtData};
pub use types::{PrimType, Type};
