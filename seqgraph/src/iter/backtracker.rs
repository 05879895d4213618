//! Depth-first graph iterator that records branch alternatives so the orchestrator can enumerate
//! every walk of bounded length starting at a given locus.

use std::sync::Arc;

use super::SequenceIter;
use crate::graph::{Graph, NodeId};

/// At every branching node, the non-chosen outgoing edges are pushed onto a stack of
/// `(branch_id, alt_target_id)` pairs so a later backtrack can replay them. Pre-increment
/// ([`SequenceIter::advance`]) always takes the first outgoing edge; [`Backtracker::backtrack`]
/// (pre-decrement) pops the stack and resumes from an alternative; [`Backtracker::reset_to_start`]
/// (post-decrement) rewinds the current position without touching the stack.
#[derive(Debug, Clone)]
pub struct Backtracker {
    graph: Arc<Graph>,
    start: NodeId,
    current: NodeId,
    depth: usize,
    stack: Vec<(NodeId, NodeId)>,
    stalled: bool,
}

impl Backtracker {
    pub fn begin(graph: Arc<Graph>, start: NodeId) -> Self {
        Self {
            graph,
            start,
            current: start,
            depth: 0,
            stack: Vec::new(),
            stalled: false,
        }
    }

    /// Pops the branch stack and resumes from the recorded alternative target, replaying the
    /// walk's other outgoing edge. Returns `false` once the stack is exhausted -- no further
    /// distinct walk exists from this starting locus.
    pub fn backtrack(&mut self) -> bool {
        match self.stack.pop() {
            Some((_, alt_target)) => {
                self.current = alt_target;
                self.stalled = false;
                true
            }
            None => false,
        }
    }

    /// Rewinds to the configured start without discarding recorded alternatives, so a caller can
    /// restart a new top-down pass while still eventually exhausting every branch.
    pub fn reset_to_start(&mut self) {
        self.current = self.start;
        self.depth = 0;
        self.stalled = false;
    }

    pub fn is_exhausted(&self) -> bool {
        self.stalled && self.stack.is_empty()
    }
}

impl SequenceIter for Backtracker {
    fn current(&self) -> NodeId {
        self.current
    }

    fn advance(&mut self) -> bool {
        let edges = self.graph.edges_from(self.current);
        if edges.is_empty() {
            self.stalled = true;
            return false;
        }
        for alt in &edges[1..] {
            self.stack.push((self.current, alt.0));
        }
        self.current = edges[0].0;
        self.depth += 1;
        true
    }

    fn at_end(&self) -> bool {
        self.is_exhausted()
    }

    fn level(&self) -> usize {
        self.depth
    }
}
