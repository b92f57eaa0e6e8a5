//! Intra-procedural control-flow graph construction and analysis.
//!
//! The CFG has one node per statement plus synthetic entry and exit nodes.
//! Edges carry a [`CfgEdgeKind`] so clients can distinguish branch outcomes
//! (dead-code detection folds constant guards by following only the matching
//! kind). Node indices are plain `usize` handles into the graph's arenas;
//! nodes and edges are never removed once inserted.

mod edge;
mod graph;

pub use edge::{CfgEdge, CfgEdgeKind};
pub use graph::{Cfg, CfgNode};
