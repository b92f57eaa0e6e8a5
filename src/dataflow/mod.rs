//! Data-flow analysis framework and the analyses built on it.
//!
//! The framework follows the classic monotone setup: an analysis contributes
//! boundary/initial facts, a meet and a node transfer function; the solver
//! iterates a FIFO worklist to the fixpoint. Termination needs a
//! finite-height lattice per variable and monotone transfers; the solver
//! itself is agnostic to the fact representation.
//!
//! # Architecture
//!
//! - [`framework`] - the [`DataflowAnalysis`] capability trait and
//!   [`Direction`]
//! - [`solver`] - the worklist solver
//! - [`fact`] - fact containers: [`SetFact`] and [`DataflowResult`]
//! - [`livevar`] - live-variable analysis (backward, may)
//! - [`constprop`] - constant propagation over the three-point lattice
//! - [`deadcode`] - dead-code detection as a client of the two above
//! - [`inter`] - the interprocedural solver and interprocedural constant
//!   propagation over the ICFG

pub mod constprop;
pub mod deadcode;
pub mod fact;
pub mod framework;
pub mod inter;
pub mod livevar;
pub mod solver;

pub use constprop::{ConstantPropagation, CpFact, Value};
pub use deadcode::DeadCodeDetection;
pub use fact::{DataflowResult, SetFact};
pub use framework::{DataflowAnalysis, Direction};
pub use inter::{InterConstantPropagation, InterDataflowAnalysis, InterSolver};
pub use livevar::LiveVariableAnalysis;
pub use solver::DataflowSolver;
