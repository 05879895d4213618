//! Property-based tests for the position/context contracts (Properties 1 and 2) and the
//! cross-matcher's completeness and N-exclusion contracts (Properties 4 and 5), over small
//! randomly generated graphs and texts.

use std::sync::Arc;

use quickcheck_macros::quickcheck;

use seqgraph::direction::Direction;
use seqgraph::graph::{Graph, NodeId};
use seqgraph::path::Path;
use seqgraph::sequence::Seq;

use vgseed::kmer_matcher::cross_match_dfs;
use vgseed::{Esa, PathIndexBuilder};

fn base_char(x: u8) -> char {
    ["A", "C", "G", "T"][(x % 4) as usize].chars().next().unwrap()
}

fn base_char_with_n(x: u8) -> char {
    ["A", "C", "G", "T", "N"][(x % 5) as usize].chars().next().unwrap()
}

fn random_seq(seed: &[u8], len: usize, alphabet: impl Fn(u8) -> char) -> String {
    (0..len.max(1))
        .map(|i| alphabet(seed.get(i % seed.len().max(1)).copied().unwrap_or(0).wrapping_add(i as u8)))
        .collect()
}

/// Property 1 -- position-to-node round trip: for every initialised path position `p`,
/// `graph.node_sequence(path.position_to_id(p))[path.position_to_offset(p)] == path.sequence()[p]`.
#[quickcheck]
fn position_to_node_round_trip(node_count: u8, seed: u8) -> bool {
    let node_count = (node_count % 5) as usize + 1;
    let mut b = Graph::builder();
    for i in 0..node_count {
        let len = (seed as usize + i * 3) % 4 + 1;
        let seq_str = random_seq(&[seed, i as u8], len, base_char);
        b.add_node(Seq::parse(&seq_str)).unwrap();
    }
    for i in 0..node_count.saturating_sub(1) {
        b.add_edge(NodeId::from_raw(i as u32), NodeId::from_raw(i as u32 + 1)).unwrap();
    }
    let graph = Arc::new(b.build().unwrap());
    let walk: Vec<NodeId> = (0..node_count as u32).map(NodeId::from_raw).collect();
    let path = Path::compact_from(Arc::clone(&graph), walk).unwrap();

    let text = path.sequence(Direction::Forward, 0);
    if text.is_empty() {
        return true;
    }
    (0..text.len()).all(|pos| {
        let id = path.position_to_id(pos).unwrap();
        let offset = path.position_to_offset(pos).unwrap();
        graph.node_sequence(id).as_slice()[offset] == text.as_slice()[pos]
    })
}

/// Property 2 -- context-shift correctness: every indexed position resolves to a node the owning
/// path actually contains, at an offset within that node's length, whose base matches the path's
/// own (possibly context-trimmed) sequence at that position.
#[quickcheck]
fn context_shift_correctness(node_count: u8, context: u8, seed: u8) -> bool {
    let node_count = (node_count % 4) as usize + 2;
    let context = (context % 5) as usize;
    let mut b = Graph::builder();
    for i in 0..node_count {
        let len = (seed as usize + i * 5) % 6 + 2;
        let seq_str = random_seq(&[seed, i as u8, 7], len, base_char);
        b.add_node(Seq::parse(&seq_str)).unwrap();
    }
    for i in 0..node_count.saturating_sub(1) {
        b.add_edge(NodeId::from_raw(i as u32), NodeId::from_raw(i as u32 + 1)).unwrap();
    }
    let graph = Arc::new(b.build().unwrap());
    let walk: Vec<NodeId> = (0..node_count as u32).map(NodeId::from_raw).collect();
    let path = Path::compact_from(Arc::clone(&graph), walk).unwrap();

    let mut builder = PathIndexBuilder::new(Direction::Forward, seqgraph::direction::IndexKind::EnhancedSuffixArray, context).unwrap();
    builder.add_path(path.clone()).unwrap();
    let index = builder.build();

    let expected_text = path.sequence(Direction::Forward, context);
    if expected_text.is_empty() {
        return true;
    }
    (0..expected_text.len()).all(|pos| {
        let id = match index.position_to_id(pos) {
            Ok(id) => id,
            Err(_) => return false,
        };
        let offset = match index.position_to_offset(pos) {
            Ok(o) => o,
            Err(_) => return false,
        };
        path.contains(id)
            && offset < graph.node_length(id)
            && graph.node_sequence(id).as_slice()[offset] == expected_text.as_slice()[pos]
    })
}

/// Property 4 -- k-mer completeness: the cross-matcher emits exactly one hit per agreeing
/// `(p1, p2)` pair for every shared k-mer, checked against a brute-force double loop.
#[quickcheck]
fn cross_match_agrees_with_brute_force(seed1: u8, seed2: u8, len1: u8, len2: u8, k: u8) -> bool {
    let len1 = (len1 % 12) as usize + 1;
    let len2 = (len2 % 12) as usize + 1;
    let k = (k % 5) as usize + 1;
    let text1 = random_seq(&[seed1], len1, base_char);
    let text2 = random_seq(&[seed2], len2, base_char);

    let esa1 = Esa::build(&Seq::parse(&text1));
    let esa2 = Esa::build(&Seq::parse(&text2));
    let mut hits: Vec<(usize, usize)> = Vec::new();
    cross_match_dfs(&esa1, &esa2, k, |h| hits.push((h.pos1, h.pos2)));
    hits.sort_unstable();
    hits.dedup();

    let bytes1: Vec<char> = text1.chars().collect();
    let bytes2: Vec<char> = text2.chars().collect();
    let mut expected: Vec<(usize, usize)> = Vec::new();
    if k <= bytes1.len() && k <= bytes2.len() {
        for p1 in 0..=bytes1.len() - k {
            for p2 in 0..=bytes2.len() - k {
                if bytes1[p1..p1 + k] == bytes2[p2..p2 + k] {
                    expected.push((p1, p2));
                }
            }
        }
    }
    expected.sort_unstable();
    expected.dedup();

    hits == expected
}

/// Property 5 -- no emitted hit's matched window contains an `N`, even when both texts are
/// generated over the full `{A,C,G,T,N}` alphabet.
#[quickcheck]
fn no_n_in_any_hit_window(seed1: u8, seed2: u8, len1: u8, len2: u8, k: u8) -> bool {
    let len1 = (len1 % 14) as usize + 1;
    let len2 = (len2 % 14) as usize + 1;
    let k = (k % 5) as usize + 1;
    let text1 = random_seq(&[seed1], len1, base_char_with_n);
    let text2 = random_seq(&[seed2], len2, base_char_with_n);

    let esa1 = Esa::build(&Seq::parse(&text1));
    let esa2 = Esa::build(&Seq::parse(&text2));
    let mut ok = true;
    cross_match_dfs(&esa1, &esa2, k, |h| {
        let w1 = &text1[h.pos1..(h.pos1 + k).min(text1.len())];
        let w2 = &text2[h.pos2..(h.pos2 + k).min(text2.len())];
        if w1.len() < k || w2.len() < k || w1.contains('N') || w2.contains('N') {
            ok = false;
        }
    });
    ok
}
