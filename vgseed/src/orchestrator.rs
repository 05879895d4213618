//! Ties path sampling, indexing, cross-matching and extension together into one per-session
//! driver.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use seqgraph::direction::IndexKind;
use seqgraph::graph::{Graph, NodeId};
use seqgraph::iter::{Backtracker, Bfs, Haplotyper, SequenceIter};
use seqgraph::path::Path;
use seqgraph::path_set::PathSet;
use vgseed_utils::{FrontierItem, RunningAverage};

use crate::config::{Config, Query};
use crate::error::{Result, SeedFinderError};
use crate::hit::SeedHit;
use crate::kmer_matcher::cross_match;
use crate::path_index::{PathIndex, PathIndexBuilder};
use crate::persist;
use crate::reads_index::ReadsIndex;
use crate::traverser::traverse_bfs;

/// Progress/result callback payload for [`Orchestrator::run`]/[`Orchestrator::run_parallel`].
#[derive(Debug, Clone)]
pub enum Update {
    Hit(SeedHit),
    Progress { loci_processed: usize, loci_total: usize, hits_emitted: usize, frontier_size: usize },
    Complete,
}

/// Drives one seed-finding session over a fixed graph: samples paths, builds the path-index,
/// picks starting loci, and cross-matches/extends against a caller-supplied reads index.
pub struct Orchestrator {
    graph: Arc<Graph>,
    config: Config,
    query: Query,
    paths: PathSet,
    path_index: Option<PathIndex>,
    starting_loci: Vec<(NodeId, usize)>,
    /// Average number of nodes per sampled walk, recorded as each walk is committed -- the
    /// concrete "single `Stats` sink per orchestrator" this crate carries.
    stats: RunningAverage,
}

impl Orchestrator {
    pub fn new(graph: Arc<Graph>, config: Config, query: Query) -> Self {
        Self {
            graph,
            config,
            query,
            paths: PathSet::new(),
            path_index: None,
            starting_loci: Vec::new(),
            stats: RunningAverage::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn starting_loci(&self) -> &[(NodeId, usize)] {
        &self.starting_loci
    }

    pub fn average_walk_len(&self) -> f64 {
        self.stats.get()
    }

    /// Samples up to `n` walks from the graph using a Haplotyper seeded from `query.rng_seed`.
    /// `patched` selects patch mode (window `context_len`) over full-haplotype mode.
    pub fn pick_paths(&mut self, n: usize, patched: bool, context_len: usize) -> Result<()> {
        let start = self.graph.rank_to_id(0);
        let rng = ChaCha8Rng::seed_from_u64(self.query.rng_seed);
        let mut hap = Haplotyper::begin(Arc::clone(&self.graph), start, rng)?;
        let max_attempts = n.saturating_mul(4).max(16);
        let mut attempts = 0;

        if patched {
            let window = context_len.max(1);
            while self.paths.len() < n && attempts < max_attempts {
                attempts += 1;
                let patches = hap.get_uniq_patches(window)?;
                if patches.is_empty() {
                    break;
                }
                for patch in patches {
                    if self.paths.len() >= n {
                        break;
                    }
                    self.stats.record(patch.nodes.len() as u64);
                    let path = Path::compact_from(Arc::clone(&self.graph), patch.nodes)?;
                    self.paths.push_back(path);
                }
            }
        } else {
            while self.paths.len() < n && attempts < max_attempts {
                attempts += 1;
                let walk = hap.get_uniq_full_haplotype(8)?;
                self.stats.record(walk.len() as u64);
                let path = Path::compact_from(Arc::clone(&self.graph), walk)?;
                self.paths.push_back(path);
            }
        }
        self.paths.sort();
        Ok(())
    }

    /// Adopts already-sampled walks directly (e.g. paths recovered from a persisted path-index),
    /// bypassing `pick_paths`.
    pub fn adopt_paths(&mut self, paths: impl IntoIterator<Item = Path>) {
        for path in paths {
            self.paths.push_back(path);
        }
        self.paths.sort();
    }

    /// Builds the path-index over the currently sampled walks.
    pub fn index_paths(&mut self) -> Result<()> {
        let mut builder = PathIndexBuilder::new(
            self.query.direction,
            IndexKind::EnhancedSuffixArray,
            self.query.context,
        )?;
        for path in self.paths.iter() {
            builder.add_path(path.clone())?;
        }
        self.path_index = Some(builder.build());
        Ok(())
    }

    pub fn path_index(&self) -> Option<&PathIndex> {
        self.path_index.as_ref()
    }

    /// Tracks, across one candidate walk, enough bookkeeping to reconstruct the walk after a
    /// `Backtracker::backtrack` call -- the native iterator only exposes the *current* node, not
    /// the branch point a backtrack resumed from, so a parallel mirror stack of "walk length at
    /// the time of each branch" is kept here and popped in lockstep with the iterator's own
    /// alternative stack.
    fn walk_is_uncovered_from(&self, start: NodeId, k: usize) -> bool {
        let mut iter = Backtracker::begin(Arc::clone(&self.graph), start);
        let mut walk: Vec<NodeId> = vec![start];
        let mut mirror_stack: Vec<usize> = Vec::new();

        let walk_len_bp = |w: &[NodeId]| -> usize { w.iter().map(|&id| self.graph.node_length(id)).sum() };

        loop {
            while walk_len_bp(&walk) < k {
                let before = iter.current();
                let out_degree = self.graph.edges_from(before).len();
                if !iter.advance() {
                    break;
                }
                if out_degree > 1 {
                    for _ in 0..out_degree - 1 {
                        mirror_stack.push(walk.len());
                    }
                }
                walk.push(iter.current());
            }

            if walk_len_bp(&walk) >= k && !self.paths.covered_by(&walk) {
                return true;
            }

            if !iter.backtrack() {
                return false;
            }
            let truncate_len = mirror_stack.pop().unwrap_or(0);
            walk.truncate(truncate_len);
            walk.push(iter.current());
        }
    }

    /// Adds every node-start locus from which some length-`>= k` walk is not already a sub-walk
    /// of any sampled path. Operates at node granularity (offset `0`): the backtracker this
    /// enumerates alternatives with is itself node-granular, so sub-node starting offsets are
    /// not explored as separate loci here.
    pub fn add_uncovered_loci(&mut self) -> Result<()> {
        let k = self.query.k;
        for rank in 0..self.graph.node_count() {
            let node_id = self.graph.rank_to_id(rank);
            if self.walk_is_uncovered_from(node_id, k) {
                self.starting_loci.push((node_id, 0));
            }
        }
        Ok(())
    }

    /// Adds one locus every `step` base pairs, counted along a BFS traversal of the whole graph.
    pub fn add_all_loci(&mut self, step: usize) -> Result<()> {
        let step = step.max(1);
        let start = self.graph.rank_to_id(0);
        let mut iter = Bfs::begin(Arc::clone(&self.graph), start);
        let mut base_count = 0usize;
        loop {
            let id = iter.current();
            let len = self.graph.node_length(id);
            for offset in 0..len {
                if base_count % step == 0 {
                    self.starting_loci.push((id, offset));
                }
                base_count += 1;
            }
            if !iter.advance() {
                break;
            }
        }
        Ok(())
    }

    /// Cross-matches `reads` against the path-index, translating each hit's path-side position
    /// back to `(node_id, offset_in_node)`.
    pub fn seeds_on_paths(&self, reads: &ReadsIndex, mut on_hit: impl FnMut(SeedHit)) -> Result<()> {
        let path_index = self.path_index.as_ref().ok_or(SeedFinderError::IndexNotBuilt)?;
        let mut translate_err = None;
        cross_match(reads.esa(), path_index.esa(), self.query.k, |raw| {
            let Some((read_idx, offset_in_read)) = reads.locate(raw.pos1) else { return };
            match (path_index.position_to_id(raw.pos2), path_index.position_to_offset(raw.pos2)) {
                (Ok(graph_node_id), Ok(offset_in_node)) => on_hit(SeedHit {
                    graph_node_id,
                    offset_in_node,
                    read_id: read_idx,
                    offset_in_read,
                }),
                (Err(e), _) | (_, Err(e)) => {
                    translate_err.get_or_insert(e);
                }
            };
        });
        match translate_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    pub fn save_starts(&self, prefix: &str) -> Result<()> {
        persist::save_starts(prefix, self.query.k, self.query.step, &self.starting_loci)
    }

    pub fn open_starts(&mut self, prefix: &str) -> Result<()> {
        let (k, step, loci) = persist::open_starts(prefix)?;
        if k != self.query.k || step != self.query.step {
            return Err(SeedFinderError::BadFormat(format!(
                "starting-loci file was built for k={k}, step={step}, but this session uses k={}, step={}",
                self.query.k, self.query.step
            )));
        }
        self.starting_loci = loci;
        Ok(())
    }

    /// Unimplemented: no distance index is built in this crate. Always reports "unknown", per
    /// the contract's fallback.
    pub fn distance_between(&self, _a: (NodeId, usize), _b: (NodeId, usize)) -> Option<bool> {
        None
    }

    /// Blocks the calling thread, running `traverse` from every starting locus and delivering
    /// `Update::Hit`/`Update::Progress`/`Update::Complete` to `update`. Checks `abort` between
    /// loci and stops early if it's set. Loci are drawn off a `FrontierItem`-ordered queue (by
    /// declaration order, `best_first::search`'s own tie-break) rather than a plain slice walk,
    /// so `Update::Progress`'s `frontier_size` reports the outstanding queue depth exactly.
    pub fn run(&self, reads: &ReadsIndex, abort: &AtomicBool, mut update: impl FnMut(Update)) {
        let total = self.starting_loci.len();
        let mut hits_emitted = 0usize;
        let mut processed = 0usize;
        let mut frontier: BinaryHeap<FrontierItem<(NodeId, usize), Reverse<usize>>> = self
            .starting_loci
            .iter()
            .enumerate()
            .map(|(i, &locus)| FrontierItem::new(locus, Reverse(i)))
            .collect();

        while let Some(next) = frontier.pop() {
            if abort.load(Ordering::Relaxed) {
                break;
            }
            traverse_bfs(&self.graph, reads, next.item, self.query.k, self.query.matching, |hit| {
                hits_emitted += 1;
                update(Update::Hit(hit));
            });
            processed += 1;
            update(Update::Progress {
                loci_processed: processed,
                loci_total: total,
                hits_emitted,
                frontier_size: frontier.len(),
            });
        }
        update(Update::Complete);
    }

    /// Parallel equivalent of [`Self::run`]: shards `starting_loci` across
    /// `config.resolved_thread_count()` worker threads, each with its own traverser but sharing
    /// the (immutable) graph, path-index and reads-index by reference -- the shared-read-only /
    /// local-write split the concurrency model calls for. Updates are funneled back to the
    /// calling thread through a channel so `update` is only ever called from one place.
    pub fn run_parallel(&self, reads: &ReadsIndex, abort: &AtomicBool, mut update: impl FnMut(Update)) {
        let thread_count = self.config.resolved_thread_count().max(1);
        let total = self.starting_loci.len();
        if total == 0 {
            update(Update::Complete);
            return;
        }
        let chunk_size = total.div_ceil(thread_count).max(1);
        let (tx, rx) = std::sync::mpsc::channel::<SeedHit>();

        std::thread::scope(|scope| {
            for chunk in self.starting_loci.chunks(chunk_size) {
                let tx = tx.clone();
                let graph = &self.graph;
                let k = self.query.k;
                let matching = self.query.matching;
                scope.spawn(move || {
                    for &locus in chunk {
                        if abort.load(Ordering::Relaxed) {
                            return;
                        }
                        traverse_bfs(graph, reads, locus, k, matching, |hit| {
                            let _ = tx.send(hit);
                        });
                    }
                });
            }
            drop(tx);
            let mut hits_emitted = 0usize;
            for hit in rx {
                hits_emitted += 1;
                update(Update::Hit(hit));
            }
            update(Update::Progress { loci_processed: total, loci_total: total, hits_emitted, frontier_size: 0 });
        });
        update(Update::Complete);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seqgraph::direction::{Direction, MatchingKind};
    use seqgraph::sequence::Seq;

    fn linear_graph() -> Graph {
        let mut b = Graph::builder();
        b.add_node(Seq::parse("ACGTACGT")).unwrap();
        b.add_node(Seq::parse("GGCCTTAA")).unwrap();
        b.add_node(Seq::parse("TTGGCCAA")).unwrap();
        b.add_edge(NodeId::from_raw(0), NodeId::from_raw(1)).unwrap();
        b.add_edge(NodeId::from_raw(1), NodeId::from_raw(2)).unwrap();
        b.build().unwrap()
    }

    fn orchestrator() -> Orchestrator {
        let graph = Arc::new(linear_graph());
        let mut query = Query::new(4, 7);
        query.direction = Direction::Forward;
        query.matching = MatchingKind::Exact;
        Orchestrator::new(graph, Config::default(), query)
    }

    #[test]
    fn pick_paths_and_index_round_trip_positions() {
        let mut orch = orchestrator();
        orch.pick_paths(2, false, 4).unwrap();
        assert!(!orch.paths.is_empty());
        orch.index_paths().unwrap();
        assert!(orch.path_index().is_some());
    }

    #[test]
    fn add_all_loci_respects_the_step() {
        let mut orch = orchestrator();
        orch.add_all_loci(4).unwrap();
        assert!(!orch.starting_loci.is_empty());
    }

    #[test]
    fn save_and_open_starts_round_trip() {
        let mut orch = orchestrator();
        orch.add_all_loci(3).unwrap();
        let dir = std::env::temp_dir().join(format!("vgseed_starts_test_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let prefix = dir.join("starts").to_string_lossy().into_owned();
        orch.save_starts(&prefix).unwrap();

        let mut reopened = orchestrator();
        reopened.query.step = 3;
        reopened.open_starts(&prefix).unwrap();
        assert_eq!(reopened.starting_loci, orch.starting_loci);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn run_reaches_complete_with_no_loci() {
        let orch = orchestrator();
        let reads = ReadsIndex::build(&[crate::reads_index::Read {
            id: "r0".into(),
            sequence: Seq::parse("ACGT"),
        }]);
        let abort = AtomicBool::new(false);
        let mut updates = Vec::new();
        orch.run(&reads, &abort, |u| updates.push(u));
        assert!(matches!(updates.last(), Some(Update::Complete)));
    }
}
