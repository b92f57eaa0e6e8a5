//! # irscope Prelude
//!
//! This module provides a convenient prelude for the most commonly used
//! types and traits of the library. Import it to get quick access to the
//! essentials for building IR and running analyses.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all irscope operations
pub use crate::Error;

/// The result type used throughout irscope
pub use crate::Result;

// ================================================================================================
// Program Model
// ================================================================================================

/// The program arena and hierarchy oracle
pub use crate::Program;

/// IR construction API
pub use crate::ir::{BodyBuilder, ProgramBuilder};

/// Core IR handles and data
pub use crate::ir::{
    BinaryOp, CallKind, ClassId, Exp, FieldId, MethodFlags, MethodId, PrimType, Stmt, StmtId,
    Type, TypeId, VarId,
};

// ================================================================================================
// Graphs
// ================================================================================================

/// Intra-procedural control-flow graphs
pub use crate::cfg::{Cfg, CfgEdgeKind, CfgNode};

/// Call graphs and class-hierarchy analysis
pub use crate::callgraph::{CallEdge, CallGraph, ChaBuilder};

/// The interprocedural control-flow graph
pub use crate::icfg::{Icfg, IcfgEdge, IcfgEdgeKind};

// ================================================================================================
// Dataflow Analyses
// ================================================================================================

/// The intra-procedural framework and solver
pub use crate::dataflow::{DataflowAnalysis, DataflowResult, DataflowSolver, Direction, SetFact};

/// The bundled analyses
pub use crate::dataflow::{
    ConstantPropagation, CpFact, DeadCodeDetection, InterConstantPropagation, InterSolver,
    LiveVariableAnalysis, Value,
};

// ================================================================================================
// Pointer Analysis and Taint
// ================================================================================================

/// Pointer analysis entry points and results
pub use crate::pta::{selector_by_name, PointerAnalysis, PointsToSet, PtaResult};

/// Taint configuration and flows
pub use crate::taint::{TaintConfig, TaintFlow};

// ================================================================================================
// Configuration
// ================================================================================================

/// Analysis configuration and the results store
pub use crate::config::{AnalysisConfig, AnalysisOptions, ResultsStore};
