//! Tessera Graph - Dependency tracking and incremental evaluation
//!
//! Nodes are identified by `slotmap` keys owned elsewhere; the graph only
//! tracks registration, dependency edges, and which nodes are dirty in each
//! evaluation direction.

mod branch;
mod graph;

pub use branch::PrunedBranch;
pub use graph::{DependencyGraph, EvaluationReport, GraphDirection};
