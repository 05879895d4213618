//! Breadth-first graph iterator with resume-from-lowest-unvisited-rank semantics.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use super::SequenceIter;
use crate::graph::{Graph, NodeId};

/// Classical BFS over a [`Graph`], keyed by node id (not by `(id, level)` -- a node is visited
/// at most once even if reachable by several paths). When the frontier empties but the graph
/// still has unvisited nodes (e.g. a disconnected component, or every source unreachable from
/// `start`), the iterator resumes from the lowest-rank unvisited node rather than stopping short.
#[derive(Debug, Clone)]
pub struct Bfs {
    graph: Arc<Graph>,
    queue: VecDeque<(NodeId, usize)>,
    visited: HashSet<NodeId>,
    lb_visited_rank: usize,
    current: (NodeId, usize),
    finished: bool,
}

impl Bfs {
    pub fn begin(graph: Arc<Graph>, start: NodeId) -> Self {
        let mut visited = HashSet::new();
        visited.insert(start);
        let mut queue = VecDeque::new();
        queue.push_back((start, 0));
        Self {
            graph,
            queue,
            visited,
            lb_visited_rank: 0,
            current: (start, 0),
            finished: false,
        }
    }

    /// Resumes from the lowest-rank node not yet visited, advancing `lb_visited_rank` past any
    /// nodes already seen. Returns `false` once every node in the graph has been visited.
    fn resume_from_unvisited(&mut self) -> bool {
        let node_count = self.graph.node_count();
        while self.lb_visited_rank < node_count {
            let id = self.graph.rank_to_id(self.lb_visited_rank);
            self.lb_visited_rank += 1;
            if self.visited.insert(id) {
                self.current = (id, 0);
                self.queue.push_back(self.current);
                return true;
            }
        }
        false
    }
}

impl SequenceIter for Bfs {
    fn current(&self) -> NodeId {
        self.current.0
    }

    fn advance(&mut self) -> bool {
        if self.finished {
            return false;
        }
        if self.queue.front().copied() == Some(self.current) {
            self.queue.pop_front();
        }
        let (cur_id, cur_level) = self.current;
        for edge in self.graph.edges_from(cur_id) {
            if self.visited.insert(edge.0) {
                self.queue.push_back((edge.0, cur_level + 1));
            }
        }
        if let Some(&next) = self.queue.front() {
            self.current = next;
            return true;
        }
        if self.resume_from_unvisited() {
            return true;
        }
        self.finished = true;
        false
    }

    fn at_end(&self) -> bool {
        self.finished
    }

    fn level(&self) -> usize {
        self.current.1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::tests::tiny_graph;

    #[test]
    fn visits_every_node_exactly_once() {
        let graph = Arc::new(tiny_graph());
        let mut iter = Bfs::begin(Arc::clone(&graph), NodeId::from_raw(0));
        let mut seen = vec![iter.current()];
        while iter.advance() {
            seen.push(iter.current());
        }
        assert_eq!(seen.len(), graph.node_count());
        let unique: HashSet<_> = seen.iter().collect();
        assert_eq!(unique.len(), graph.node_count());
    }

    #[test]
    fn level_is_nondecreasing_along_the_frontier() {
        let graph = Arc::new(tiny_graph());
        let mut iter = Bfs::begin(Arc::clone(&graph), NodeId::from_raw(0));
        let mut last_level = iter.level();
        while iter.advance() {
            assert!(iter.level() >= last_level);
            last_level = iter.level();
        }
    }
}
