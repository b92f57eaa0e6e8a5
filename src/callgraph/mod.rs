//! Call graph construction and representation.
//!
//! The call graph is a directed multigraph whose nodes are reachable methods
//! and whose edges connect call sites to resolved callees, labeled by the
//! invocation kind. Duplicate edges are coalesced. The container is generic
//! over the call-site and method handle types so the same structure serves
//! the class-hierarchy-based builder (plain statement/method handles) and
//! the pointer-analysis solver (context-sensitive handles).
//!
//! Two builders exist:
//! - [`ChaBuilder`] resolves call sites against the class hierarchy alone
//!   (sound but imprecise; every override of a virtual target is a callee)
//! - the pointer-analysis solver grows its call graph on the fly from the
//!   receiver objects it discovers (see [`crate::pta`])

mod cha;
mod graph;

pub use cha::ChaBuilder;
pub use graph::{CallEdge, CallGraph};

pub use crate::ir::stmt::CallKind;

/// Analysis id under which the CHA call graph is stored.
pub const ID: &str = "cha";
