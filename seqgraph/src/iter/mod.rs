//! Graph iterators: BFS, a branch-recording DFS ("Backtracker"), and the Haplotyper family that
//! generates distinct full-graph walks for path sampling.

mod backtracker;
mod bfs;
mod haplotyper;

pub use backtracker::Backtracker;
pub use bfs::Bfs;
pub use haplotyper::{Haplotyper, Patch};

use crate::graph::NodeId;

/// The capability shared by every graph iterator family: know where you are, know whether you're
/// done, and be able to step forward.
pub trait SequenceIter {
    /// The node the iterator currently sits at.
    fn current(&self) -> NodeId;
    /// Advances to the next node; returns `false` (and leaves the iterator at its last position)
    /// once the walk cannot be extended further.
    fn advance(&mut self) -> bool;
    /// True once `advance` has returned `false` and no further progress is possible.
    fn at_end(&self) -> bool;
    /// BFS level of the current position (0 at the start node); other families report the number
    /// of nodes visited so far along the current walk.
    fn level(&self) -> usize;
}
