//! Extends a starting locus into graph walks of length exactly `k`, matched in lock-step against
//! a reads suffix tree.

use std::collections::VecDeque;

use seqgraph::direction::MatchingKind;
use seqgraph::graph::{Graph, NodeId};

use crate::hit::SeedHit;
use crate::index::{code, FineIter};
use crate::reads_index::ReadsIndex;

/// One in-flight candidate walk: a suffix-tree position paired with where in the graph it has
/// gotten to so far. `start_locus` never changes; it's what a successful walk's hit reports.
#[derive(Clone)]
struct Frontier<'a> {
    iter: FineIter<'a>,
    mismatches_remaining: usize,
    node_id: NodeId,
    offset_in_node: usize,
    consumed: usize,
    start_locus: (NodeId, usize),
}

/// Consumes characters from `frontier.node_id`'s sequence starting at `offset_in_node`,
/// descending the suffix tree one character at a time, until the node is exhausted, the walk
/// reaches length `k`, or the mismatch budget runs out. Emits hits (one per read occurrence)
/// through `on_hit` the instant `k` is reached. Returns `Some(frontier)` if the walk should keep
/// growing (node exhausted, still under budget, not yet at `k`), `None` if it's finished (hit
/// emitted or budget exhausted).
fn compute<'a>(
    graph: &Graph,
    reads: &ReadsIndex,
    mut frontier: Frontier<'a>,
    k: usize,
    mut on_hit: impl FnMut(SeedHit),
) -> Option<Frontier<'a>> {
    let node_seq = graph.node_sequence(frontier.node_id);
    let node_len = node_seq.len();

    while frontier.offset_in_node < node_len && frontier.consumed < k {
        let base = node_seq.as_slice()[frontier.offset_in_node];
        let is_n = base.is_n();
        let descended = !is_n && frontier.iter.go_down(code(base));

        if !descended {
            if frontier.mismatches_remaining == 0 {
                return None;
            }
            frontier.mismatches_remaining -= 1;
            if frontier.mismatches_remaining == 0 || !frontier.iter.go_down_unconstrained() {
                return None;
            }
        }

        frontier.offset_in_node += 1;
        frontier.consumed += 1;

        if frontier.consumed == k {
            if frontier.mismatches_remaining > 0 {
                for &occ in frontier.iter.occurrences() {
                    if let Some((read_idx, offset_in_read)) = reads.locate(occ) {
                        on_hit(SeedHit {
                            graph_node_id: frontier.start_locus.0,
                            offset_in_node: frontier.start_locus.1,
                            read_id: read_idx,
                            offset_in_read,
                        });
                    }
                }
            }
            return None;
        }
    }
    Some(frontier)
}

/// Enumerates outgoing edges once a frontier has consumed its whole node: the first edge keeps
/// the (single) frontier alive in place, the rest are pushed as independent clones. No outgoing
/// edges silently drops the walk.
fn advance<'a>(graph: &Graph, frontier: Frontier<'a>) -> Vec<Frontier<'a>> {
    let edges = graph.edges_from(frontier.node_id);
    edges
        .iter()
        .map(|e| Frontier {
            iter: frontier.iter.clone(),
            mismatches_remaining: frontier.mismatches_remaining,
            node_id: e.0,
            offset_in_node: 0,
            consumed: frontier.consumed,
            start_locus: frontier.start_locus,
        })
        .collect()
}

fn run_one_step<'a>(
    graph: &Graph,
    reads: &ReadsIndex,
    frontier: Frontier<'a>,
    k: usize,
    on_hit: &mut impl FnMut(SeedHit),
) -> Vec<Frontier<'a>> {
    match compute(graph, reads, frontier, k, &mut *on_hit) {
        None => Vec::new(),
        Some(f) if f.offset_in_node >= graph.node_sequence(f.node_id).len() => advance(graph, f),
        Some(f) => vec![f],
    }
}

fn initial_frontier<'a>(
    reads: &'a ReadsIndex,
    start_locus: (NodeId, usize),
    matching: MatchingKind,
) -> Frontier<'a> {
    Frontier {
        iter: FineIter::new(reads.esa()),
        mismatches_remaining: matching.max_mismatches() + 1,
        node_id: start_locus.0,
        offset_in_node: start_locus.1,
        consumed: 0,
        start_locus,
    }
}

/// Breadth-first schedule: every live frontier is processed once per round, producing the next
/// round's frontier set in a batch.
pub fn traverse_bfs(
    graph: &Graph,
    reads: &ReadsIndex,
    start_locus: (NodeId, usize),
    k: usize,
    matching: MatchingKind,
    mut on_hit: impl FnMut(SeedHit),
) {
    let mut queue = VecDeque::new();
    queue.push_back(initial_frontier(reads, start_locus, matching));
    while let Some(frontier) = queue.pop_front() {
        for next in run_one_step(graph, reads, frontier, k, &mut on_hit) {
            queue.push_back(next);
        }
    }
}

/// Depth-first schedule: a single frontier is driven to completion (hit, death, or a branch
/// pushing the rest of its siblings) before any alternative is explored.
pub fn traverse_dfs(
    graph: &Graph,
    reads: &ReadsIndex,
    start_locus: (NodeId, usize),
    k: usize,
    matching: MatchingKind,
    mut on_hit: impl FnMut(SeedHit),
) {
    let mut stack = vec![initial_frontier(reads, start_locus, matching)];
    while let Some(frontier) = stack.pop() {
        for next in run_one_step(graph, reads, frontier, k, &mut on_hit) {
            stack.push(next);
        }
    }
}
