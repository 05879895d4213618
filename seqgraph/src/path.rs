//! A walk through a [`Graph`]: an ordered sequence of node ids, with O(1) translation between a
//! base-pair position and the (node-rank, offset-in-node) pair that contains it.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use bit_vec::BitVec;

use crate::bitvector::RsBitVec;
use crate::direction::Direction;
use crate::error::{GraphError, Result};
use crate::graph::{Graph, NodeId};
use crate::sequence::Seq;

/// Which storage/mutation discipline a [`Path`] follows. All three share the same rank/select
/// and traversal behaviour once initialised; they differ only in which mutating operations are
/// permitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    /// Random-access sequence, `O(1)` amortised push-back only.
    Default,
    /// Double-ended: push/pop at both ends.
    Dynamic,
    /// Immutable once built; a compact path is never pushed or popped.
    Compact,
}

/// The node-break bitvector and its rank/select support, present only once [`Path::initialise`]
/// has been called. Rebuilt (never re-pointed) on every `initialise`, so a moved or cloned
/// `Path` never carries a stale self-reference (see the design note on self-referential data).
#[derive(Debug, Clone)]
struct Init {
    breaks: RsBitVec,
}

/// An ordered walk through a [`Graph`], created empty, mutated until [`Path::initialise`] is
/// called, then immutable and queryable. The path borrows its graph through a shared, immutable
/// handle (`Arc`) rather than a lifetime parameter or raw back-pointer: paths often outlive the
/// call that created them (stored in a [`crate::path_set::PathSet`], serialised, re-loaded), and
/// the graph itself is loaded once and never mutated, so shared ownership is the natural fit
/// the design notes suggest as an alternative to explicit borrowing.
#[derive(Debug, Clone)]
pub struct Path {
    graph: Arc<Graph>,
    kind: PathKind,
    nodes: VecDeque<NodeId>,
    node_set: HashSet<NodeId>,
    base_pair_len: usize,
    init: Option<Init>,
}

impl Path {
    pub fn new(graph: Arc<Graph>, kind: PathKind) -> Self {
        Self {
            graph,
            kind,
            nodes: VecDeque::new(),
            node_set: HashSet::new(),
            base_pair_len: 0,
            init: None,
        }
    }

    /// Builds an immutable [`PathKind::Compact`] path directly from a node sequence (e.g. one
    /// produced by a graph iterator), already initialised.
    pub fn compact_from(graph: Arc<Graph>, nodes: Vec<NodeId>) -> Result<Self> {
        let mut path = Self::new(graph, PathKind::Default);
        for id in nodes {
            path.add_node(id)?;
        }
        path.kind = PathKind::Compact;
        path.initialise();
        Ok(path)
    }

    pub fn kind(&self) -> PathKind {
        self.kind
    }

    pub fn graph(&self) -> &Arc<Graph> {
        &self.graph
    }

    /// Number of nodes in the path.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Total number of bases across the whole path.
    pub fn sequence_len(&self) -> usize {
        self.base_pair_len
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().copied()
    }

    /// The most recently added node, if any. Used by the Haplotyper family to find the node it
    /// should extend from without needing its own copy of the walk.
    pub fn last_node(&self) -> Option<NodeId> {
        self.nodes.back().copied()
    }

    fn same_graph(&self, other: &Path) -> bool {
        Arc::ptr_eq(&self.graph, &other.graph)
    }

    /// Appends `id`; `O(1)` amortised. Invalidates any previously built rank/select support.
    pub fn add_node(&mut self, id: NodeId) -> Result<()> {
        if self.kind == PathKind::Compact && self.init.is_some() {
            return Err(GraphError::InvalidGraph(
                "cannot mutate an already-built compact path".into(),
            ));
        }
        self.base_pair_len += self.graph.node_length(id);
        self.node_set.insert(id);
        self.nodes.push_back(id);
        self.init = None;
        Ok(())
    }

    /// Removes the last node. A no-op on an empty path. `Dynamic`-only in the source contract,
    /// but (matching the original) actually implemented for every kind.
    pub fn pop_back(&mut self) -> Option<NodeId> {
        let id = self.nodes.pop_back()?;
        self.base_pair_len -= self.graph.node_length(id);
        self.remove_from_set_if_last_occurrence(id);
        self.init = None;
        Some(id)
    }

    /// Removes the first node. Only valid for [`PathKind::Dynamic`] paths.
    pub fn pop_front(&mut self) -> Result<Option<NodeId>> {
        self.require_dynamic()?;
        let id = match self.nodes.pop_front() {
            Some(id) => id,
            None => return Ok(None),
        };
        self.base_pair_len -= self.graph.node_length(id);
        self.remove_from_set_if_last_occurrence(id);
        self.init = None;
        Ok(Some(id))
    }

    fn remove_from_set_if_last_occurrence(&mut self, id: NodeId) {
        if !self.nodes.contains(&id) {
            self.node_set.remove(&id);
        }
    }

    fn require_dynamic(&self) -> Result<()> {
        if self.kind != PathKind::Dynamic {
            return Err(GraphError::InvalidGraph(
                "operation is only valid for Dynamic paths".into(),
            ));
        }
        Ok(())
    }

    /// Pops nodes from the back until (and including) the node whose id is `node_id`, or just
    /// the single last node if `node_id` is `None`. Yields an empty path if `node_id` never
    /// occurs.
    pub fn trim_back(&mut self, node_id: Option<NodeId>) {
        while !self.is_empty() {
            let last = *self.nodes.back().unwrap();
            let found = match node_id {
                Some(target) => target == last,
                None => true,
            };
            self.pop_back();
            if found {
                break;
            }
        }
    }

    /// Pops nodes from the back while the path's length would still be `>= k` afterwards.
    pub fn trim_back_by_len(&mut self, k: usize) {
        while let Some(&last) = self.nodes.back() {
            if self.base_pair_len - self.graph.node_length(last) < k {
                break;
            }
            self.pop_back();
        }
    }

    /// Pops nodes from the front until (and including) `node_id`, or just the first node if
    /// `node_id` is `None`. `Dynamic`-only.
    pub fn trim_front(&mut self, node_id: Option<NodeId>) -> Result<()> {
        self.require_dynamic()?;
        while !self.is_empty() {
            let first = *self.nodes.front().unwrap();
            let found = match node_id {
                Some(target) => target == first,
                None => true,
            };
            self.pop_front()?;
            if found {
                break;
            }
        }
        Ok(())
    }

    /// `Dynamic`-only: pops nodes from the front while the path's length would still be `>= k`
    /// afterwards.
    pub fn trim_front_by_len(&mut self, k: usize) -> Result<()> {
        self.require_dynamic()?;
        while let Some(&first) = self.nodes.front() {
            if self.base_pair_len - self.graph.node_length(first) < k {
                break;
            }
            self.pop_front()?;
        }
        Ok(())
    }

    /// Builds the node-break bitvector and rank/select support. Idempotent; required before
    /// `rank`, `select`, `position_to_id`, `position_to_offset`.
    pub fn initialise(&mut self) {
        let mut bits = BitVec::from_elem(self.base_pair_len.max(1), false);
        let mut cumulative = 0usize;
        for &id in &self.nodes {
            cumulative += self.graph.node_length(id);
            if cumulative > 0 {
                bits.set(cumulative - 1, true);
            }
        }
        if self.base_pair_len == 0 {
            bits = BitVec::new();
        }
        self.init = Some(Init {
            breaks: RsBitVec::build(bits),
        });
    }

    fn init(&self) -> Result<&Init> {
        self.init.as_ref().ok_or(GraphError::Uninitialised)
    }

    fn check_pos(&self, pos: usize) -> Result<()> {
        if pos >= self.base_pair_len {
            return Err(GraphError::PositionOutOfRange {
                pos,
                len: self.base_pair_len,
            });
        }
        Ok(())
    }

    /// The 0-based index within the path's node sequence whose label contains `pos`.
    pub fn rank(&self, pos: usize) -> Result<usize> {
        self.check_pos(pos)?;
        Ok(self.init()?.breaks.rank1(pos) as usize)
    }

    /// The path-position at which the `r`-th node (0-based) starts.
    pub fn select(&self, r: usize) -> Result<usize> {
        let init = self.init()?;
        if r == 0 {
            return Ok(0);
        }
        Ok(1 + init.breaks.select1((r - 1) as u64) as usize)
    }

    pub fn position_to_id(&self, pos: usize) -> Result<NodeId> {
        let r = self.rank(pos)?;
        Ok(self.nodes[r])
    }

    pub fn position_to_offset(&self, pos: usize) -> Result<usize> {
        let r = self.rank(pos)?;
        let start = self.select(r)?;
        Ok(pos - start)
    }

    /// The concatenated path string. When `context > 0`, trims the first node to its last
    /// `min(context-1, node_length)` bases and the last node to its first `context-1` bases.
    pub fn sequence(&self, direction: Direction, context: usize) -> Seq {
        let n = self.nodes.len();
        let mut out = Seq::default();
        for (i, &id) in self.nodes.iter().enumerate() {
            let full = self.graph.node_sequence(id);
            let bases = if context == 0 {
                full.as_slice()
            } else if n == 1 {
                // Applying the first-node trim (keep last context-1 bases) and then the
                // last-node trim (keep first context-1 bases) of the same node collapses to
                // just the first trim: the second trim's budget is never smaller.
                full.suffix(context - 1)
            } else if i == 0 {
                full.suffix(context - 1)
            } else if i == n - 1 {
                full.prefix(context - 1)
            } else {
                full.as_slice()
            };
            out.extend(bases.iter().copied());
        }
        match direction {
            Direction::Forward => out,
            Direction::Reversed => out.as_slice().iter().rev().copied().collect(),
        }
    }

    /// O(1) membership test via the path's node-id set.
    pub fn contains(&self, id: NodeId) -> bool {
        self.node_set.contains(&id)
    }

    /// Order-preserving substring check: does `range` occur as a contiguous run within this
    /// path's node sequence?
    pub fn contains_subsequence(&self, range: &[NodeId]) -> bool {
        if range.is_empty() {
            return true;
        }
        if range.len() > self.nodes.len() {
            return false;
        }
        let nodes: Vec<NodeId> = self.nodes.iter().copied().collect();
        nodes.windows(range.len()).any(|w| w == range)
    }

    /// Appends all nodes of `other` to `self`. Forbidden between paths over mismatched graphs;
    /// self-extension via `+=` is rejected by the borrow checker (an `AddAssign` impl can't be
    /// called with `self` aliased as its own `&Path` argument).
    pub fn extend(&mut self, other: &Path) -> Result<()> {
        if !self.same_graph(other) {
            return Err(GraphError::MismatchedGraph);
        }
        for id in other.node_ids() {
            self.add_node(id)?;
        }
        Ok(())
    }

    /// The smallest and largest node id occurring in the path, used by
    /// [`crate::path_set::PathSet`] to restrict `covered_by` to a candidate range once sorted.
    pub fn id_bounds(&self) -> Option<(NodeId, NodeId)> {
        let mut ids = self.node_ids();
        let first = ids.next()?;
        let (mut lo, mut hi) = (first, first);
        for id in ids {
            lo = lo.min(id);
            hi = hi.max(id);
        }
        Some((lo, hi))
    }

}

/// A path reduced to just its node-id set, order discarded -- the Haplotyper's memory of
/// previously committed walks only needs coverage, not sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MicroPath {
    nodes: HashSet<NodeId>,
}

impl MicroPath {
    pub fn from_path(path: &Path) -> Self {
        Self {
            nodes: path.node_set.clone(),
        }
    }

    pub fn from_ids(ids: impl IntoIterator<Item = NodeId>) -> Self {
        Self {
            nodes: ids.into_iter().collect(),
        }
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl std::ops::AddAssign<&Path> for Path {
    fn add_assign(&mut self, rhs: &Path) {
        self.extend(rhs).expect("mismatched graphs in path +=");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::tests::tiny_graph;

    fn path_of(graph: &Arc<Graph>, ids: &[u32]) -> Path {
        let mut p = Path::new(Arc::clone(graph), PathKind::Default);
        for &id in ids {
            p.add_node(NodeId::from_raw(id)).unwrap();
        }
        p.initialise();
        p
    }

    #[test]
    fn position_round_trip() {
        let graph = Arc::new(tiny_graph());
        let path = path_of(&graph, &[0, 1, 8, 3, 9]);
        let seq = path.sequence(Direction::Forward, 0);
        for pos in 0..path.sequence_len() {
            let id = path.position_to_id(pos).unwrap();
            let off = path.position_to_offset(pos).unwrap();
            let expected = graph.node_sequence(id).as_slice()[off];
            assert_eq!(seq.as_slice()[pos], expected, "mismatch at pos {pos}");
        }
    }

    #[test]
    fn rank_select_are_inverse() {
        let graph = Arc::new(tiny_graph());
        let path = path_of(&graph, &[0, 1, 8]);
        for r in 0..path.len() {
            let start = path.select(r).unwrap();
            assert_eq!(path.rank(start).unwrap(), r);
        }
    }

    #[test]
    fn uninitialised_path_errors() {
        let graph = Arc::new(tiny_graph());
        let mut p = Path::new(Arc::clone(&graph), PathKind::Default);
        p.add_node(NodeId::from_raw(0)).unwrap();
        assert_eq!(p.rank(0), Err(GraphError::Uninitialised));
    }

    #[test]
    fn out_of_range_position_errors() {
        let graph = Arc::new(tiny_graph());
        let path = path_of(&graph, &[0]);
        assert!(path.rank(1000).is_err());
    }

    #[test]
    fn dynamic_pop_front_only_for_dynamic_kind() {
        let graph = Arc::new(tiny_graph());
        let mut default_path = path_of(&graph, &[0, 1]);
        assert!(default_path.pop_front().is_err());

        let mut dyn_path = Path::new(Arc::clone(&graph), PathKind::Dynamic);
        dyn_path.add_node(NodeId::from_raw(0)).unwrap();
        dyn_path.add_node(NodeId::from_raw(1)).unwrap();
        assert_eq!(
            dyn_path.pop_front().unwrap(),
            Some(NodeId::from_raw(0))
        );
    }

    #[test]
    fn trim_back_to_node_id() {
        let graph = Arc::new(tiny_graph());
        let mut path = path_of(&graph, &[0, 1, 8, 3, 9]);
        path.trim_back(Some(NodeId::from_raw(8)));
        assert_eq!(
            path.node_ids().collect::<Vec<_>>(),
            vec![NodeId::from_raw(0), NodeId::from_raw(1)]
        );
    }

    #[test]
    fn trim_back_by_len_keeps_at_least_k_bases() {
        let graph = Arc::new(tiny_graph());
        // node lengths: 0 -> 8, 1 -> 1, 8 -> 22
        let mut path = path_of(&graph, &[0, 1, 8]);
        path.trim_back_by_len(9);
        assert_eq!(path.node_ids().collect::<Vec<_>>(), vec![NodeId::from_raw(0), NodeId::from_raw(1)]);
        assert!(path.sequence_len() >= 9);
    }

    #[test]
    fn trim_front_is_dynamic_only() {
        let graph = Arc::new(tiny_graph());
        let mut default_path = path_of(&graph, &[0, 1]);
        assert!(default_path.trim_front(None).is_err());

        let mut dyn_path = Path::new(Arc::clone(&graph), PathKind::Dynamic);
        dyn_path.add_node(NodeId::from_raw(0)).unwrap();
        dyn_path.add_node(NodeId::from_raw(1)).unwrap();
        dyn_path.add_node(NodeId::from_raw(8)).unwrap();
        dyn_path.trim_front(Some(NodeId::from_raw(1))).unwrap();
        assert_eq!(dyn_path.node_ids().collect::<Vec<_>>(), vec![NodeId::from_raw(8)]);
    }

    #[test]
    fn trim_front_by_len_keeps_at_least_k_bases() {
        let graph = Arc::new(tiny_graph());
        let mut dyn_path = Path::new(Arc::clone(&graph), PathKind::Dynamic);
        for id in [0, 1, 8] {
            dyn_path.add_node(NodeId::from_raw(id)).unwrap();
        }
        dyn_path.trim_front_by_len(22).unwrap();
        assert_eq!(dyn_path.node_ids().collect::<Vec<_>>(), vec![NodeId::from_raw(8)]);
        assert!(dyn_path.sequence_len() >= 22);
    }

    #[test]
    fn kind_reports_the_construction_time_discipline() {
        let graph = Arc::new(tiny_graph());
        assert_eq!(path_of(&graph, &[0]).kind(), PathKind::Default);
        assert_eq!(Path::new(Arc::clone(&graph), PathKind::Dynamic).kind(), PathKind::Dynamic);
    }

    #[test]
    fn micro_path_from_path_matches_its_node_set() {
        let graph = Arc::new(tiny_graph());
        let path = path_of(&graph, &[0, 1, 8]);
        let micro = MicroPath::from_path(&path);
        assert!(micro.contains(NodeId::from_raw(1)));
        assert!(!micro.contains(NodeId::from_raw(3)));
        assert_eq!(micro.len(), 3);
    }

    #[test]
    fn context_trims_extremal_nodes_only() {
        let graph = Arc::new(tiny_graph());
        let path = path_of(&graph, &[0, 1, 8]); // lengths 8, 1, 22
        let full = path.sequence(Direction::Forward, 0);
        let trimmed = path.sequence(Direction::Forward, 4); // context-1 = 3
        assert_eq!(trimmed.len(), 3 + 1 + 3);
        assert_eq!(
            trimmed.to_string(),
            full.to_string()[5..5 + 3 + 1 + 3].to_string()
        );
    }

    #[test]
    fn extend_rejects_mismatched_graphs() {
        let graph_a = Arc::new(tiny_graph());
        let graph_b = Arc::new(tiny_graph());
        let mut a = path_of(&graph_a, &[0]);
        let b = path_of(&graph_b, &[1]);
        assert_eq!(a.extend(&b), Err(GraphError::MismatchedGraph));
    }

    #[test]
    fn contains_subsequence_is_order_preserving() {
        let graph = Arc::new(tiny_graph());
        let path = path_of(&graph, &[0, 1, 8, 3, 9]);
        assert!(path.contains_subsequence(&[1, 8, 3].map(NodeId::from_raw)));
        assert!(!path.contains_subsequence(&[8, 1].map(NodeId::from_raw)));
        assert!(!path.contains_subsequence(&[1, 3].map(NodeId::from_raw)));
    }
}
