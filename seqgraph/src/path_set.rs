//! An unordered-then-sortable collection of [`Path`]s, with coverage queries that exploit sort
//! order to avoid scanning every stored path.

use crate::graph::NodeId;
use crate::path::{MicroPath, Path};

/// Owns a vector of [`Path`]s plus a `sorted-by-min-node-id` flag. Once sorted, `covered_by`
/// restricts itself to the sub-range of paths whose id range could possibly overlap the query,
/// per the min-id/max-id bracketing described in the path-index contract.
#[derive(Debug, Default)]
pub struct PathSet {
    paths: Vec<Path>,
    sorted: bool,
}

impl PathSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `path` and clears the `sorted` flag, even if the set happened to remain sorted.
    pub fn push_back(&mut self, path: Path) {
        self.paths.push(path);
        self.sorted = false;
    }

    /// Orders the stored paths by `min(node_ids)` ascending.
    pub fn sort(&mut self) {
        self.paths.sort_by_key(|p| p.id_bounds().map(|(lo, _)| lo));
        self.sorted = true;
    }

    pub fn is_sorted(&self) -> bool {
        self.sorted
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.paths.iter()
    }

    /// The candidate sub-range `[0, ub)` once sorted: every path whose min-id could still be
    /// `<= q_max` sorts before `ub`. A final `max-id >= q_min` filter (the "tie-breaking" linear
    /// scan the contract calls for) is applied by the caller over that range.
    fn candidate_range(&self, q_max: NodeId) -> &[Path] {
        debug_assert!(self.sorted);
        let ub = self
            .paths
            .partition_point(|p| p.id_bounds().is_some_and(|(lo, _)| lo <= q_max));
        &self.paths[..ub]
    }

    /// True iff some stored path contains `query` as an order-preserving contiguous run of node
    /// ids (the Default/Dynamic coverage check).
    pub fn covered_by(&self, query: &[NodeId]) -> bool {
        if query.is_empty() {
            return true;
        }
        let q_min = *query.iter().min().unwrap();
        let q_max = *query.iter().max().unwrap();
        let candidates: &[Path] = if self.sorted {
            self.candidate_range(q_max)
        } else {
            &self.paths
        };
        candidates
            .iter()
            .filter(|p| p.id_bounds().is_some_and(|(_, hi)| hi >= q_min))
            .any(|p| p.contains_subsequence(query))
    }

    /// True iff some stored path's node set is a superset of `query`'s node set, ignoring order
    /// (the Micro-path coverage check).
    pub fn covered_by_micro(&self, query: &MicroPath) -> bool {
        self.paths.iter().any(|p| {
            // A Micro query has no ordering to key a range restriction on; fall back to a full
            // scan regardless of `sorted`, matching the set-inclusion semantics in the contract.
            query_is_subset_of_path(query, p)
        })
    }
}

fn query_is_subset_of_path(query: &MicroPath, path: &Path) -> bool {
    // `MicroPath` only exposes membership, not iteration, so route the check through the path's
    // own node ids rather than reaching into `query`'s private set.
    path.node_ids().count() >= query.len()
        && path
            .node_ids()
            .filter(|id| query.contains(*id))
            .count()
            == query.len()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::graph::tests::tiny_graph;
    use crate::graph::Graph;
    use crate::path::PathKind;

    fn path_of(graph: &Arc<Graph>, ids: &[u32]) -> Path {
        let mut p = Path::new(Arc::clone(graph), PathKind::Default);
        for &id in ids {
            p.add_node(NodeId::from_raw(id)).unwrap();
        }
        p.initialise();
        p
    }

    #[test]
    fn push_back_clears_sorted_flag() {
        let graph = Arc::new(tiny_graph());
        let mut set = PathSet::new();
        set.push_back(path_of(&graph, &[0, 1]));
        set.sort();
        assert!(set.is_sorted());
        set.push_back(path_of(&graph, &[2]));
        assert!(!set.is_sorted());
    }

    #[test]
    fn covered_by_matches_contiguous_order_preserving_subrange() {
        let graph = Arc::new(tiny_graph());
        let mut set = PathSet::new();
        set.push_back(path_of(&graph, &[0, 1, 8, 3, 9]));
        set.push_back(path_of(&graph, &[0, 2, 8, 4, 9]));
        set.sort();

        let ids = |xs: &[u32]| -> Vec<NodeId> { xs.iter().map(|&x| NodeId::from_raw(x)).collect() };
        assert!(set.covered_by(&ids(&[1, 8, 3])));
        assert!(set.covered_by(&ids(&[2, 8, 4])));
        assert!(!set.covered_by(&ids(&[1, 8, 4])));
        assert!(!set.covered_by(&ids(&[8, 1])));
    }

    #[test]
    fn covered_by_micro_ignores_order() {
        let graph = Arc::new(tiny_graph());
        let mut set = PathSet::new();
        set.push_back(path_of(&graph, &[0, 1, 8, 3, 9]));

        let covered = MicroPath::from_ids([3, 1, 8].map(NodeId::from_raw));
        let not_covered = MicroPath::from_ids([3, 1, 14].map(NodeId::from_raw));
        assert!(set.covered_by_micro(&covered));
        assert!(!set.covered_by_micro(&not_covered));
    }

    #[test]
    fn empty_query_is_always_covered() {
        let set = PathSet::new();
        assert!(set.covered_by(&[]));
    }
}
