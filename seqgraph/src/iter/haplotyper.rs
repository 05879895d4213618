//! Generates distinct full-graph walks ("haplotypes") and, in patch mode, short covering walks
//! over currently-uncovered k-mer windows.

use std::sync::Arc;

use rand::Rng;

use crate::error::Result;
use crate::graph::{Edge, Graph, NodeId};
use crate::path::{Path, PathKind};

/// A short walk produced by [`Haplotyper::get_uniq_patches`], covering at least one
/// previously-uncovered length-k window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patch {
    pub nodes: Vec<NodeId>,
}

/// Drives a single [`Path`] ([`PathKind::Dynamic`]) forward one node at a time, preferring edges
/// that extend the walk's suffix in a way no previously committed walk ends with. Falls back to
/// the least-covered neighbour, then to a uniform random choice among ties.
///
/// Committed walks are kept as full node-id sequences rather than the order-discarding
/// [`crate::path::MicroPath`] the coverage-query surface otherwise uses: the novelty test below
/// is a suffix comparison, which needs the walk's order, not just its node set.
#[derive(Debug, Clone)]
pub struct Haplotyper<R: Rng> {
    graph: Arc<Graph>,
    start: NodeId,
    current: Path,
    committed: Vec<Vec<NodeId>>,
    setback: usize,
    rng: R,
    random_mode: bool,
}

impl<R: Rng> Haplotyper<R> {
    pub fn begin(graph: Arc<Graph>, start: NodeId, rng: R) -> Result<Self> {
        let mut current = Path::new(Arc::clone(&graph), PathKind::Dynamic);
        current.add_node(start)?;
        Ok(Self {
            graph,
            start,
            current,
            committed: Vec::new(),
            setback: 0,
            rng,
            random_mode: false,
        })
    }

    /// A Haplotyper variant that ignores novelty/coverage entirely and chooses uniformly at
    /// random among outgoing edges, with no memory of previously committed walks.
    pub fn random(graph: Arc<Graph>, start: NodeId, rng: R) -> Result<Self> {
        let mut h = Self::begin(graph, start, rng)?;
        h.random_mode = true;
        Ok(h)
    }

    pub fn current_walk(&self) -> &Path {
        &self.current
    }

    pub fn committed_count(&self) -> usize {
        self.committed.len()
    }

    fn recent_suffix(&self, len: usize) -> Vec<NodeId> {
        let ids: Vec<NodeId> = self.current.node_ids().collect();
        let cut = ids.len().saturating_sub(len);
        ids[cut..].to_vec()
    }

    fn is_suffix_of_any_committed(&self, candidate: &[NodeId]) -> bool {
        self.committed.iter().any(|w| w.ends_with(candidate))
    }

    fn coverage(&self, id: NodeId) -> usize {
        self.committed.iter().filter(|w| w.contains(&id)).count()
    }

    /// `edges` is an owned copy (`Edge` is `Copy`), not a borrow into `self.graph`: `pick_edge`
    /// needs `&mut self` for `self.rng`, which would otherwise alias a live borrow of the edge
    /// slice returned by `self.graph.edges_from`.
    fn pick_edge(&mut self, edges: &[Edge]) -> NodeId {
        if self.setback > 1 {
            for edge in edges {
                let mut candidate = self.recent_suffix(self.setback - 1);
                candidate.push(edge.0);
                if !self.is_suffix_of_any_committed(&candidate) {
                    return edge.0;
                }
            }
        }
        let min_coverage = edges.iter().map(|e| self.coverage(e.0)).min().unwrap();
        let tied: Vec<NodeId> = edges
            .iter()
            .filter(|e| self.coverage(e.0) == min_coverage)
            .map(|e| e.0)
            .collect();
        if tied.len() == 1 {
            tied[0]
        } else {
            tied[self.rng.gen_range(0..tied.len())]
        }
    }

    /// Extends the walk by one node. Returns `false` when the current node has no outgoing
    /// edges (the walk has reached a sink).
    pub fn advance(&mut self) -> Result<bool> {
        let current_id = self.current.last_node().expect("walk always has >= 1 node");
        let edges: Vec<Edge> = self.graph.edges_from(current_id).to_vec();
        if edges.is_empty() {
            return Ok(false);
        }
        let chosen = if self.random_mode {
            edges[self.rng.gen_range(0..edges.len())].0
        } else {
            self.pick_edge(&edges)
        };
        self.current.add_node(chosen)?;
        Ok(true)
    }

    /// Commits the current walk to the visited-walk memory and starts a fresh walk at `start`.
    /// Updates the setback window per the doubling-like schedule: `s = n` if `n == 0` or odd,
    /// else `s = n + 1`, where `n` is the number of committed walks after this one.
    fn commit(&mut self) -> Result<()> {
        let ids: Vec<NodeId> = self.current.node_ids().collect();
        self.committed.push(ids);
        let n = self.committed.len();
        self.setback = if n == 0 || n % 2 == 1 { n } else { n + 1 };
        self.current = Path::new(Arc::clone(&self.graph), PathKind::Dynamic);
        self.current.add_node(self.start)?;
        Ok(())
    }

    /// Drives the walk to a sink node, discards it if it duplicates an already-committed walk
    /// and retries up to `tries` times, then commits and returns the node sequence. Best-effort:
    /// returns a duplicate rather than looping forever once the combinatorial space is
    /// exhausted.
    pub fn get_uniq_full_haplotype(&mut self, tries: usize) -> Result<Vec<NodeId>> {
        let tries = tries.max(1);
        let mut last_attempt = Vec::new();
        for attempt in 0..tries {
            self.current = Path::new(Arc::clone(&self.graph), PathKind::Dynamic);
            self.current.add_node(self.start)?;
            while self.advance()? {}
            let walk: Vec<NodeId> = self.current.node_ids().collect();
            let is_duplicate = self.committed.iter().any(|w| *w == walk);
            if !is_duplicate {
                self.commit()?;
                return Ok(walk);
            }
            last_attempt = walk;
            if attempt + 1 == tries {
                break;
            }
        }
        self.commit()?;
        Ok(last_attempt)
    }

    /// Generates short covering patches: walks through the graph driven by the same first
    /// committed-compatible heuristic used by `advance` (always the lowest-index outgoing edge
    /// would be too weak a test of novelty, so patch mode drives via `pick_edge`/`random`
    /// exactly like a normal haplotype walk, but starts and stops a patch based on a sliding
    /// length-k frontier's novelty rather than running to a sink).
    pub fn get_uniq_patches(&mut self, k: usize) -> Result<Vec<Patch>> {
        let safety_bound = self.graph.node_count().saturating_mul(4).max(16);
        let mut walk: Vec<NodeId> = vec![self.start];
        let mut patches: Vec<Patch> = Vec::new();
        let mut ranges: Vec<(usize, usize)> = Vec::new();
        let mut in_patch = false;
        let mut patch_start = 0usize;

        loop {
            let frontier_start = walk.len().saturating_sub(k);
            let frontier = &walk[frontier_start..];
            let novel = !self
                .committed
                .iter()
                .any(|w| contains_subsequence(w, frontier));

            if novel && !in_patch {
                in_patch = true;
                patch_start = frontier_start;
            } else if !novel && in_patch {
                in_patch = false;
                push_patch(&mut patches, &mut ranges, &walk, patch_start, walk.len(), k);
            }

            let current_id = *walk.last().unwrap();
            let edges: Vec<Edge> = self.graph.edges_from(current_id).to_vec();
            if edges.is_empty() || walk.len() >= safety_bound {
                break;
            }
            let chosen = if self.random_mode {
                edges[self.rng.gen_range(0..edges.len())].0
            } else {
                self.pick_edge(&edges)
            };
            walk.push(chosen);
        }

        if in_patch {
            push_patch(&mut patches, &mut ranges, &walk, patch_start, walk.len(), k);
        }

        for patch in &patches {
            self.committed.push(patch.nodes.clone());
        }
        Ok(patches)
    }
}

fn contains_subsequence(haystack: &[NodeId], needle: &[NodeId]) -> bool {
    if needle.is_empty() {
        return true;
    }
    if needle.len() > haystack.len() {
        return false;
    }
    haystack.windows(needle.len()).any(|w| w == needle)
}

/// Records a new patch spanning `walk[start..end]`, merging it into the previous patch if the
/// gap between them is shorter than `k`.
fn push_patch(
    patches: &mut Vec<Patch>,
    ranges: &mut Vec<(usize, usize)>,
    walk: &[NodeId],
    start: usize,
    end: usize,
    k: usize,
) {
    if let Some(&(prev_start, prev_end)) = ranges.last() {
        if start.saturating_sub(prev_end) < k {
            *ranges.last_mut().unwrap() = (prev_start, end);
            *patches.last_mut().unwrap() = Patch {
                nodes: walk[prev_start..end].to_vec(),
            };
            return;
        }
    }
    ranges.push((start, end));
    patches.push(Patch {
        nodes: walk[start..end].to_vec(),
    });
}
