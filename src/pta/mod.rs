//! Pointer analysis.
//!
//! An Andersen-style, inclusion-based, flow-insensitive points-to analysis
//! solved as a graph-reachability fixpoint. The solver is context-sensitive
//! throughout; context insensitivity is just the
//! [`CiSelector`](context::CiSelector), which keeps every context empty.
//!
//! # Architecture
//!
//! - [`heap`] - allocation-site heap abstraction (plus taint objects)
//! - [`context`] - interned contexts and the context selectors (`ci`,
//!   k-call-site, k-object, k-type)
//! - [`csmanager`] - canonicalization of context-sensitive elements: every
//!   (context, element) pair maps to exactly one handle for the lifetime of
//!   the run
//! - [`pts`] - grow-only points-to sets
//! - [`pfg`] - the pointer-flow graph; an edge means "everything the source
//!   points to flows into the target"
//! - [`solver`] - the worklist fixpoint: statement walk of newly reachable
//!   methods, delta propagation, on-the-fly call-graph growth, taint hooks
//! - [`result`] - context-collapsed queries over the fixpoint
//!
//! # Invariants
//!
//! Points-to sets, the reachable-method set, the pointer-flow graph and the
//! call graph grow monotonically during a solve; no handle is ever
//! invalidated. Worklist order does not affect the fixpoint.

id_type!(
    /// Handle of an abstract heap object.
    ObjId
);
id_type!(
    /// Handle of a context-qualified heap object.
    CsObjId
);
id_type!(
    /// Handle of an interned context.
    ContextId
);
id_type!(
    /// Handle of a pointer node (context-qualified variable, static field,
    /// instance field or array element).
    PointerId
);
id_type!(
    /// Handle of a context-qualified method.
    CsMethodId
);
id_type!(
    /// Handle of a context-qualified call site.
    CsCallSiteId
);

pub mod context;
pub mod csmanager;
pub mod heap;
pub mod pfg;
pub mod pts;
pub mod result;
pub mod solver;

pub use context::{selector_by_name, ContextElem, ContextSelector, ContextTable};
pub use csmanager::{CsManager, PointerKey};
pub use heap::{HeapModel, Obj, ObjKind};
pub use pfg::PointerFlowGraph;
pub use pts::PointsToSet;
pub use result::PtaResult;
pub use solver::PointerAnalysis;

/// Analysis id under which pointer-analysis results are stored.
pub const ID: &str = "pta";
