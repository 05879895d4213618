//! Immutable sequence-graph with O(1) rank/id lookups, node-length and edge iteration.

use index_vec::{define_index_type, IndexVec};

use crate::error::{GraphError, Result};
use crate::sequence::Seq;

define_index_type! {
    /// Dense, 0-based index into [`Graph`]'s node storage. The graph's public `id_to_rank`
    /// contract is 1-based (`rank_to_id`/`id_to_rank` operate on `NodeId = rank + 1`); `NodeId`
    /// is the 0-based storage index used internally and by every other module in this crate.
    pub struct NodeId = u32;
}

/// A directed edge endpoint, referencing the 0-based [`NodeId`] of the other node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Edge(pub NodeId);

#[derive(Debug, Clone)]
struct NodeRecord {
    sequence: Seq,
    successors: Vec<Edge>,
    predecessors: Vec<Edge>,
}

/// An immutable, node-labelled directed graph loaded once at startup and never mutated
/// thereafter. Ids are dense in `[0, node_count)`; rank reflects the (stable) load order, so
/// `rank_to_id`/`id_to_rank` are the identity over that dense space.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: IndexVec<NodeId, NodeRecord>,
    total_loci: usize,
    max_node_length: usize,
}

impl Graph {
    pub fn builder() -> GraphBuilder {
        GraphBuilder::default()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn max_node_rank(&self) -> usize {
        self.nodes.len().saturating_sub(1)
    }

    /// Total number of bases summed over all nodes.
    pub fn total_loci(&self) -> usize {
        self.total_loci
    }

    pub fn max_node_length(&self) -> usize {
        self.max_node_length
    }

    pub fn rank_to_id(&self, rank: usize) -> NodeId {
        NodeId::from_raw(rank as u32)
    }

    pub fn id_to_rank(&self, id: NodeId) -> usize {
        id.raw() as usize
    }

    fn node(&self, id: NodeId) -> Result<&NodeRecord> {
        self.nodes
            .get(id)
            .ok_or_else(|| GraphError::InvalidGraph(format!("no such node id {id:?}")))
    }

    pub fn node_length(&self, id: NodeId) -> usize {
        self.nodes[id].sequence.len()
    }

    pub fn node_sequence(&self, id: NodeId) -> &Seq {
        &self.nodes[id].sequence
    }

    pub fn edges_from(&self, id: NodeId) -> &[Edge] {
        &self.nodes[id].successors
    }

    pub fn edges_to(&self, id: NodeId) -> &[Edge] {
        &self.nodes[id].predecessors
    }

    pub fn has_edges_from(&self, id: NodeId) -> bool {
        !self.edges_from(id).is_empty()
    }

    pub fn is_branch(&self, id: NodeId) -> bool {
        self.edges_from(id).len() > 1
    }

    pub fn is_merge(&self, id: NodeId) -> bool {
        self.edges_to(id).len() > 1
    }
}

/// Accumulates nodes and edges, validating dense ids and edge targets before producing an
/// immutable [`Graph`]. This is the ambient construction-time validation the core's `Graph`
/// contract assumes ("ids are dense in `[1,N]`... edges reference valid ids") but doesn't name
/// as its own step.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    nodes: IndexVec<NodeId, NodeRecord>,
}

impl GraphBuilder {
    /// Appends a new node with the given sequence, returning its assigned id. Node ids are
    /// assigned in call order, which becomes the graph's rank order.
    pub fn add_node(&mut self, sequence: Seq) -> Result<NodeId> {
        if sequence.is_empty() {
            return Err(GraphError::InvalidGraph(
                "node sequence must have length >= 1".into(),
            ));
        }
        Ok(self.nodes.push(NodeRecord {
            sequence,
            successors: Vec::new(),
            predecessors: Vec::new(),
        }))
    }

    pub fn add_edge(&mut self, from: NodeId, to: NodeId) -> Result<()> {
        let node_count = self.nodes.len();
        if from.raw() as usize >= node_count || to.raw() as usize >= node_count {
            return Err(GraphError::InvalidGraph(format!(
                "edge {from:?} -> {to:?} references a node id outside [0, {node_count})"
            )));
        }
        self.nodes[from].successors.push(Edge(to));
        self.nodes[to].predecessors.push(Edge(from));
        Ok(())
    }

    pub fn build(self) -> Result<Graph> {
        if self.nodes.is_empty() {
            return Err(GraphError::InvalidGraph("graph has no nodes".into()));
        }
        let total_loci = self.nodes.iter().map(|n| n.sequence.len()).sum();
        let max_node_length = self.nodes.iter().map(|n| n.sequence.len()).max().unwrap_or(0);
        log::debug!(
            "built graph with {} nodes, {} total loci, max node length {}",
            self.nodes.len(),
            total_loci,
            max_node_length
        );
        Ok(Graph {
            nodes: self.nodes,
            total_loci,
            max_node_length,
        })
    }
}
