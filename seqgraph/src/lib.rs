//! Sequence-graph, path, and graph-iterator primitives for variation-graph seed finding.
//!
//! This crate owns the data the rest of the workspace indexes and traverses: the immutable
//! [`graph::Graph`] itself, the [`path::Path`]/[`path_set::PathSet`] types used to name walks
//! through it, and the [`iter`] module's BFS/DFS/haplotyper graph iterators that generate those
//! walks.

pub mod bitvector;
pub mod direction;
pub mod error;
pub mod graph;
pub mod iter;
pub mod path;
pub mod path_set;
pub mod sequence;

pub use bitvector::RsBitVec;
pub use direction::{Direction, IndexKind, MatchingKind};
pub use error::{GraphError, Result};
pub use graph::{Edge, Graph, GraphBuilder, NodeId};
pub use path::{MicroPath, Path, PathKind};
pub use path_set::PathSet;
pub use sequence::{Base, Seq};
