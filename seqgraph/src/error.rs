//! Errors raised by graph, path and iterator contract violations.

use std::fmt::{self, Display, Formatter};

/// Everything that can go wrong while building or querying a [`Graph`](crate::graph::Graph),
/// [`Path`](crate::path::Path) or graph iterator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// The graph builder was given edges or ids that don't form a valid dense `[1,N]` id space.
    InvalidGraph(String),
    /// Two paths (or a path and a graph) that belong to different graphs were combined.
    MismatchedGraph,
    /// `rank`/`select`/`position_to_id`/`position_to_offset` called before `initialise`.
    Uninitialised,
    /// A path position was out of the path's base-pair length.
    PositionOutOfRange { pos: usize, len: usize },
    /// A path was extended by itself via `+=`.
    SelfExtend,
}

impl Display for GraphError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidGraph(reason) => write!(f, "invalid graph: {reason}"),
            Self::MismatchedGraph => {
                write!(f, "operation spans two paths/graphs that do not match")
            }
            Self::Uninitialised => write!(f, "path has not been initialised"),
            Self::PositionOutOfRange { pos, len } => {
                write!(f, "position {pos} is out of range for path of length {len}")
            }
            Self::SelfExtend => write!(f, "cannot extend a path with itself"),
        }
    }
}

impl std::error::Error for GraphError {}

pub type Result<T> = std::result::Result<T, GraphError>;
