//! The seed-finder's one output record.

use seqgraph::graph::NodeId;

/// Emitted exactly once per `(path-position, read-position)` pair at which the indexed graph
/// text and a read agree over `k` consecutive characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedHit {
    pub graph_node_id: NodeId,
    pub offset_in_node: usize,
    pub read_id: usize,
    pub offset_in_read: usize,
}
