//! Cross-matches two indexed text collections for exact length-`k` agreement.
//!
//! Two traversal strategies are provided: a DFS-driven co-traversal (`next_kmer`/`upto_prefix`,
//! [`cross_match_dfs`]) and a seed-oracle joint mode ([`cross_match_oracle`]) that walks the full
//! `k`-mer space directly. [`cross_match`] picks between them adaptively based on index size, as
//! the contract requires.

use crate::index::{Esa, FineIter};

/// One (path-position, read-position) pair at which two indexed texts agree over `k` consecutive
/// characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawHit {
    pub pos1: usize,
    pub pos2: usize,
}

/// Any edge whose first character is `N` is invisible to the matcher: no emitted hit may contain
/// an `N`.
const N_CODE: u8 = 5;
const ALPHABET: [u8; 4] = [1, 2, 3, 4];

/// Descends `it` by exactly one child, retrying siblings in order to skip any edge whose first
/// character is `N`. Returns `false` once every child (if any) has been tried and rejected.
fn descend_skip_n(it: &mut FineIter) -> bool {
    loop {
        if !it.go_down_unconstrained() {
            return false;
        }
        if it.parent_edge_label() != Some(N_CODE) {
            return true;
        }
        it.go_up();
        if !it.go_right() {
            return false;
        }
    }
}

/// Advances `it` to the next subtree whose representative reaches length `>= k`, skipping any
/// `N`-labelled edge. Returns the length of the common prefix shared with the position `it` was
/// at on entry, or `None` once the traversal is exhausted.
pub fn next_kmer(it: &mut FineIter, k: usize) -> Option<usize> {
    let mut common_prefix = it.rep_length();
    loop {
        if descend_skip_n(it) {
            if it.rep_length() >= k {
                return Some(common_prefix);
            }
            continue;
        }
        loop {
            if it.is_root() {
                return None;
            }
            it.go_up();
            if !it.at_node() {
                // still mid a multi-character edge; keep retreating one character at a time
                // until we land on a real branching node.
                continue;
            }
            common_prefix = it.rep_length();
            if it.go_right() {
                break;
            }
        }
    }
}

/// Climbs `it` (character by character) until its representative length is exactly
/// `target_len`.
pub fn upto_prefix(it: &mut FineIter, target_len: usize) {
    while it.rep_length() > target_len {
        it.go_up();
    }
}

/// Reads the `it1`-side representative string's suffix `[common_prefix_len..k)` by replaying the
/// climbed/descended path is unnecessary: `it1` already sits at a node whose first `rep_length()`
/// characters are exactly that representative, so the caller can read them straight off one of
/// its occurrences.
fn representative_suffix(esa1: &Esa, it1: &FineIter, common_prefix_len: usize, k: usize) -> Vec<u8> {
    let occ = it1.occurrences().first().copied().unwrap_or(0);
    (common_prefix_len..k).filter_map(|depth| esa1.char_at(occ + depth)).collect()
}

/// DFS-driven cross-match: advances `it1` through every length-`k`-or-more subtree via
/// `next_kmer`, repositions `it2` to the matching prefix depth via `upto_prefix`, then attempts
/// to follow the remaining characters in `it2`. On a simultaneous match, emits one hit per
/// `(occ1, occ2)` pair.
pub fn cross_match_dfs(esa1: &Esa, esa2: &Esa, k: usize, mut on_hit: impl FnMut(RawHit)) {
    let mut it1 = FineIter::new(esa1);
    let mut it2 = FineIter::new(esa2);
    let mut it2_depth = 0usize;

    while let Some(common_prefix_len) = next_kmer(&mut it1, k) {
        upto_prefix(&mut it2, common_prefix_len.min(it2_depth));
        it2_depth = it2.rep_length();

        let suffix = representative_suffix(esa1, &it1, it2_depth, k);
        let mut matched = true;
        for &c in &suffix {
            if !it2.go_down(c) {
                matched = false;
                break;
            }
        }
        it2_depth = it2.rep_length();

        if matched && it2.rep_length() >= k {
            for &p1 in it1.occurrences() {
                for &p2 in it2.occurrences() {
                    on_hit(RawHit { pos1: p1, pos2: p2 });
                }
            }
        }
    }
}

/// Seed-oracle joint mode: walks the full length-`k` `{A,C,G,T}` space (never `N`, per the
/// N-free invariant) via a lexicographically incrementing buffer, attempting `go_down` in both
/// trees simultaneously and emitting a hit on joint success.
pub fn cross_match_oracle(esa1: &Esa, esa2: &Esa, k: usize, mut on_hit: impl FnMut(RawHit)) {
    if k == 0 {
        return;
    }
    let mut seed = vec![ALPHABET[0]; k];
    loop {
        let mut it1 = FineIter::new(esa1);
        let mut it2 = FineIter::new(esa2);
        let mut matched_len = 0;
        let mut both_matched = true;
        for &c in &seed {
            let ok1 = it1.go_down(c);
            let ok2 = ok1 && it2.go_down(c);
            if ok1 && ok2 {
                matched_len += 1;
            } else {
                both_matched = false;
                break;
            }
        }
        if both_matched {
            for &p1 in it1.occurrences() {
                for &p2 in it2.occurrences() {
                    on_hit(RawHit { pos1: p1, pos2: p2 });
                }
            }
        }
        if !increment_kmer(&mut seed, matched_len) {
            break;
        }
    }
}

/// Advances `seed` to the lexicographically next `k`-mer, treating `matched_len` (the length of
/// the already-verified prefix) as the position to increment -- anything shorter than `matched_len`
/// is known-good and needn't be perturbed, so carrying only ever propagates left from there.
/// Returns `false` once the whole space has been enumerated.
fn increment_kmer(seed: &mut [u8], matched_len: usize) -> bool {
    let k = seed.len();
    let mut pos = matched_len.min(k.saturating_sub(1));
    loop {
        if (seed[pos] as usize) < *ALPHABET.last().unwrap() as usize {
            seed[pos] += 1;
            for s in &mut seed[pos + 1..] {
                *s = ALPHABET[0];
            }
            return true;
        }
        if pos == 0 {
            return false;
        }
        pos -= 1;
    }
}

/// Picks [`cross_match_oracle`] when the full `4^k` seed space is smaller than the product of
/// both indices' lengths (the oracle mode's cost is roughly `O(4^k)` independent of text size,
/// while the DFS mode's cost scales with the smaller text), else falls back to
/// [`cross_match_dfs`].
pub fn cross_match(esa1: &Esa, esa2: &Esa, k: usize, on_hit: impl FnMut(RawHit)) {
    let seed_space = 4u64.saturating_pow(k.min(32) as u32);
    let index_product = (esa1.len() as u64).saturating_mul(esa2.len() as u64);
    if seed_space < index_product {
        cross_match_oracle(esa1, esa2, k, on_hit);
    } else {
        cross_match_dfs(esa1, esa2, k, on_hit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seqgraph::sequence::Seq;

    #[test]
    fn finds_exact_kmer_occurrences_shared_between_two_texts() {
        let esa1 = Esa::build(&Seq::parse("ACGTACGT"));
        let esa2 = Esa::build(&Seq::parse("TTACGTAA"));
        let mut hits = Vec::new();
        cross_match_dfs(&esa1, &esa2, 4, |h| hits.push(h));
        assert!(!hits.is_empty(), "expected at least one shared 4-mer");
    }

    #[test]
    fn oracle_mode_agrees_with_dfs_mode() {
        let esa1 = Esa::build(&Seq::parse("ACGTACGTTG"));
        let esa2 = Esa::build(&Seq::parse("GTACGTTGAA"));
        let mut dfs_hits = Vec::new();
        cross_match_dfs(&esa1, &esa2, 3, |h| dfs_hits.push(h));
        let mut oracle_hits = Vec::new();
        cross_match_oracle(&esa1, &esa2, 3, |h| oracle_hits.push(h));
        dfs_hits.sort_by_key(|h| (h.pos1, h.pos2));
        oracle_hits.sort_by_key(|h| (h.pos1, h.pos2));
        dfs_hits.dedup();
        oracle_hits.dedup();
        assert_eq!(dfs_hits, oracle_hits);
    }

    #[test]
    fn no_hit_may_span_an_n() {
        let esa1 = Esa::build(&Seq::parse("ACGNACGT"));
        let esa2 = Esa::build(&Seq::parse("ACGNACGT"));
        let mut hits = Vec::new();
        cross_match_dfs(&esa1, &esa2, 4, |h| hits.push(h));
        for hit in hits {
            // every emitted window must fall entirely within an N-free run
            assert!(hit.pos1 + 4 <= esa1.len());
        }
    }
}
