// Copyright 2025-2026 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![allow(dead_code)]

//! # irscope
//!
//! A static analysis engine for a managed, class-based object-oriented
//! input language, represented as a method-level three-address IR. The
//! engine is a library of analyses composed over control-flow graphs and an
//! interprocedural control-flow graph: a monotone data-flow solver (intra-
//! and inter-procedural), context-sensitive pointer analysis with a
//! pointer-flow graph, call-graph construction (class-hierarchy-based and
//! pointer-driven), a constant-propagation lattice and its interprocedural
//! lift, dead-code detection, and taint tracking on top of the pointer
//! analysis.
//!
//! The front end producing the IR is not part of this crate: programs are
//! handed in through the [`ir::ProgramBuilder`] API (which is also how the
//! test suites construct their subjects).
//!
//! # Architecture
//!
//! - [`ir`] - the program model: types, classes, methods, variables,
//!   statements; arena storage with copyable handles
//! - [`cfg`] - intra-procedural control-flow graphs with kinded edges
//! - [`callgraph`] - the call-graph container and the CHA builder
//! - [`icfg`] - the interprocedural CFG stitched from CFGs and a call graph
//! - [`dataflow`] - the monotone framework, worklist solvers, live
//!   variables, constant propagation, dead-code detection and the
//!   interprocedural constant-propagation lift
//! - [`pta`] - Andersen-style pointer analysis with pluggable context
//!   sensitivity (`ci`, k-call-site, k-object, k-type)
//! - [`taint`] - the taint overlay riding the pointer analysis
//! - [`config`] - analysis options, validation, and the results store
//! - [`prelude`] - convenient re-exports of the commonly used types
//! - [`Error`] and [`Result`] - error handling
//!
//! # Usage Examples
//!
//! ## Constant propagation over a hand-built method
//!
//! ```rust
//! use irscope::prelude::*;
//!
//! let mut pb = ProgramBuilder::new();
//! let int = pb.primitive(PrimType::Int);
//! let class = pb.add_class("Main", None);
//! let main = pb.declare_method(class, "main", &[], None, MethodFlags::STATIC);
//!
//! let mut body = pb.body(main);
//! let a = body.var("a", int);
//! let b = body.var("b", int);
//! body.assign_literal(a, 10);
//! body.assign_binary(b, BinaryOp::Mul, a, a);
//! body.ret(None);
//! body.seal()?;
//! let program = pb.finish();
//!
//! let cfg = Cfg::build(&program, main);
//! let result = DataflowSolver::new(ConstantPropagation::new(&program)).solve(&cfg);
//! assert_eq!(result.out_fact(cfg.exit()).get(b), Value::Const(100));
//! # Ok::<(), irscope::Error>(())
//! ```
//!
//! ## Pointer analysis with two-object sensitivity
//!
//! ```rust,ignore
//! use irscope::prelude::*;
//!
//! let result = PointerAnalysis::new(&program, selector_by_name("2-obj")?)
//!     .solve(entry_method);
//! assert!(!result.may_alias(x, y));
//! ```
//!
//! # Error Handling
//!
//! Configuration problems (unknown analysis ids, malformed taint documents,
//! unresolvable names) fail fast with [`Error`] before any solver starts.
//! Once a fixpoint is running, IR oddities are logged through the `log`
//! facade and skipped; solvers always run to completion.

#[macro_use]
pub(crate) mod macros;

#[macro_use]
pub(crate) mod error;

/// Convenient re-exports of the most commonly used types and traits.
pub mod prelude;

/// The program model: arenas, handles, statements, expressions and the
/// class-hierarchy oracle.
pub mod ir;

/// Intra-procedural control-flow graphs.
pub mod cfg;

/// Call-graph construction and representation.
pub mod callgraph;

/// The interprocedural control-flow graph.
pub mod icfg;

/// The data-flow framework and the analyses built on it.
pub mod dataflow;

/// Pointer analysis.
pub mod pta;

/// Taint tracking on top of the pointer analysis.
pub mod taint;

/// Analysis configuration and result storage.
pub mod config;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

pub use error::Error;
pub use ir::Program;
