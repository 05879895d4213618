//! A from-scratch enhanced suffix array (suffix array + LCP array) and the character-granular
//! "fine" top-down iterator built over it.
//!
//! There is nothing in the corpus to align an ESA/FM-index dependency with, and the contract
//! explicitly treats the underlying full-text index as swappable, so this is a self-contained
//! implementation rather than a wrapped crate: a doubling-algorithm suffix sort, a Kasai LCP
//! array, and children of an lcp-interval computed on demand by scanning for local minima in the
//! LCP array rather than via a precomputed child table. That trades the textbook O(1)-amortised
//! child-table descent for a simpler, directly-auditable `O(interval length)` split; acceptable
//! for the corpus sizes this crate targets (sampled paths and read sets, not whole-genome
//! indices), and noted as a simplification in the design ledger rather than pretended away.

use seqgraph::sequence::Seq;

/// Internal alphabet code: `0` is the end-of-text sentinel (sorts before every base), `1..=5` are
/// A, C, G, T, N.
pub(crate) fn code(b: seqgraph::sequence::Base) -> u8 {
    use seqgraph::sequence::Base::*;
    match b {
        A => 1,
        C => 2,
        G => 3,
        T => 4,
        N => 5,
    }
}

/// A suffix array plus LCP array over a single concatenated text. Construction is `O(n log n)`
/// via the classic prefix-doubling algorithm; the LCP array is built in `O(n)` via Kasai's
/// algorithm.
#[derive(Debug, Clone)]
pub struct Esa {
    /// The text, with a `0` sentinel appended so every suffix is distinct and sorts uniquely.
    text: Vec<u8>,
    /// `sa[i]` is the starting position of the `i`-th suffix in sorted order.
    sa: Vec<usize>,
    /// `lcp[i]` is the length of the common prefix between `sa[i-1]` and `sa[i]`; `lcp[0] == 0`.
    lcp: Vec<usize>,
}

impl Esa {
    pub fn build(seq: &Seq) -> Self {
        let mut text: Vec<u8> = seq.as_slice().iter().map(|&b| code(b)).collect();
        text.push(0);
        let sa = suffix_array_doubling(&text);
        let lcp = kasai_lcp(&text, &sa);
        Self { text, sa, lcp }
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.len() <= 1
    }

    /// Rebuilds an `Esa` from its three raw arrays, bypassing the sort/Kasai pass -- used when
    /// loading a persisted path-index file set.
    pub(crate) fn from_raw(text: Vec<u8>, sa: Vec<usize>, lcp: Vec<usize>) -> Self {
        Self { text, sa, lcp }
    }

    pub(crate) fn raw_text(&self) -> &[u8] {
        &self.text
    }

    pub(crate) fn raw_sa(&self) -> &[usize] {
        &self.sa
    }

    pub(crate) fn raw_lcp(&self) -> &[usize] {
        &self.lcp
    }

    fn min_lcp(&self, lb: usize, rb: usize) -> usize {
        (lb + 1..=rb).map(|i| self.lcp[i]).min().unwrap_or(0)
    }

    fn leaf_depth(&self, sa_index: usize) -> usize {
        self.text.len() - self.sa[sa_index]
    }

    fn interval_depth(&self, lb: usize, rb: usize) -> usize {
        if lb == rb {
            self.leaf_depth(lb)
        } else {
            self.min_lcp(lb, rb)
        }
    }

    /// Splits the lcp-interval `[lb, rb]` into its immediate child intervals, in left-to-right
    /// (lexicographic) order.
    fn child_intervals(&self, lb: usize, rb: usize) -> Vec<(usize, usize)> {
        if lb >= rb {
            return Vec::new();
        }
        let split_lcp = self.min_lcp(lb, rb);
        let mut children = Vec::new();
        let mut start = lb;
        for j in (lb + 1)..=rb {
            if self.lcp[j] == split_lcp {
                children.push((start, j - 1));
                start = j;
            }
        }
        children.push((start, rb));
        children
    }

    pub(crate) fn char_at(&self, pos: usize) -> Option<u8> {
        self.text.get(pos).copied()
    }

    fn char_at_depth(&self, sa_index: usize, depth: usize) -> Option<u8> {
        self.char_at(self.sa[sa_index] + depth)
    }
}

fn suffix_array_doubling(text: &[u8]) -> Vec<usize> {
    let n = text.len();
    let mut sa: Vec<usize> = (0..n).collect();
    let mut rank: Vec<i64> = text.iter().map(|&b| b as i64).collect();
    let mut tmp = vec![0i64; n];
    let mut k = 1usize;
    while k < n {
        let key = |i: usize| -> (i64, i64) {
            let second = if i + k < n { rank[i + k] } else { -1 };
            (rank[i], second)
        };
        sa.sort_by_key(|&i| key(i));
        tmp[sa[0]] = 0;
        for idx in 1..n {
            tmp[sa[idx]] = tmp[sa[idx - 1]] + if key(sa[idx - 1]) < key(sa[idx]) { 1 } else { 0 };
        }
        rank.copy_from_slice(&tmp);
        if rank[sa[n - 1]] as usize == n - 1 {
            break;
        }
        k *= 2;
    }
    sa
}

fn kasai_lcp(text: &[u8], sa: &[usize]) -> Vec<usize> {
    let n = text.len();
    let mut rank = vec![0usize; n];
    for (i, &s) in sa.iter().enumerate() {
        rank[s] = i;
    }
    let mut lcp = vec![0usize; n];
    let mut h = 0usize;
    for i in 0..n {
        if rank[i] == 0 {
            h = 0;
            continue;
        }
        let j = sa[rank[i] - 1];
        while i + h < n && j + h < n && text[i + h] == text[j + h] {
            h += 1;
        }
        lcp[rank[i]] = h;
        h = h.saturating_sub(1);
    }
    lcp
}

/// A node in the lcp-interval tree: `[lb, rb]` over the suffix array, at string-depth `depth`.
#[derive(Debug, Clone, Copy)]
struct EsaNode {
    lb: usize,
    rb: usize,
    depth: usize,
}

/// A top-down, parent-linked cursor over an [`Esa`]'s implicit suffix tree, positioned at nodes
/// only (never mid-edge) -- the "native" iterator the fine iterator in [`FineIter`] wraps.
#[derive(Debug, Clone)]
struct EsaCursor<'a> {
    esa: &'a Esa,
    stack: Vec<EsaNode>,
}

impl<'a> EsaCursor<'a> {
    fn new(esa: &'a Esa) -> Self {
        Self {
            esa,
            stack: vec![EsaNode {
                lb: 0,
                rb: esa.len().saturating_sub(1),
                depth: 0,
            }],
        }
    }

    fn current(&self) -> EsaNode {
        *self.stack.last().unwrap()
    }

    fn parent_edge_length(&self) -> usize {
        if self.stack.len() < 2 {
            return 0;
        }
        let node = self.current();
        let parent = self.stack[self.stack.len() - 2];
        node.depth - parent.depth
    }

    fn go_down_char(&mut self, c: u8) -> bool {
        let node = self.current();
        for (clb, crb) in self.esa.child_intervals(node.lb, node.rb) {
            if self.esa.char_at_depth(clb, node.depth) == Some(c) {
                let depth = self.esa.interval_depth(clb, crb);
                self.stack.push(EsaNode { lb: clb, rb: crb, depth });
                return true;
            }
        }
        false
    }

    /// Descends to the first child in lexicographic order, regardless of character -- used by
    /// `next_kmer`'s unconstrained DFS descent.
    fn go_down_first(&mut self) -> bool {
        let node = self.current();
        let children = self.esa.child_intervals(node.lb, node.rb);
        match children.first() {
            Some(&(clb, crb)) => {
                let depth = self.esa.interval_depth(clb, crb);
                self.stack.push(EsaNode { lb: clb, rb: crb, depth });
                true
            }
            None => false,
        }
    }

    fn go_up(&mut self) -> bool {
        if self.stack.len() <= 1 {
            return false;
        }
        self.stack.pop();
        true
    }

    fn go_right(&mut self) -> bool {
        if self.stack.len() <= 1 {
            return false;
        }
        let node = self.stack.pop().unwrap();
        let parent = self.current();
        let siblings = self.esa.child_intervals(parent.lb, parent.rb);
        let pos = siblings.iter().position(|&(lb, rb)| lb == node.lb && rb == node.rb);
        if let Some(pos) = pos {
            if let Some(&(clb, crb)) = siblings.get(pos + 1) {
                let depth = self.esa.interval_depth(clb, crb);
                self.stack.push(EsaNode { lb: clb, rb: crb, depth });
                return true;
            }
        }
        self.stack.push(node);
        false
    }

    fn is_root(&self) -> bool {
        self.stack.len() == 1
    }

    fn occurrences(&self) -> &'a [usize] {
        let node = self.current();
        &self.esa.sa[node.lb..=node.rb]
    }
}

/// Character-granular cursor over an [`Esa`]: the underlying [`EsaCursor`] only stops at
/// lcp-interval nodes (edges may represent several characters at once); `FineIter` layers a
/// `back_offset` on top so every operation moves exactly one character.
#[derive(Debug, Clone)]
pub struct FineIter<'a> {
    cursor: EsaCursor<'a>,
    back_offset: usize,
}

impl<'a> FineIter<'a> {
    pub fn new(esa: &'a Esa) -> Self {
        Self {
            cursor: EsaCursor::new(esa),
            back_offset: 0,
        }
    }

    /// Attempts to descend by exactly the character `c`. On success at a node (`back_offset ==
    /// 0`), performs a native `go_down` and sets `back_offset = parent_edge_length - 1`; while
    /// mid-edge, succeeds iff `c` is the next character on the edge.
    pub fn go_down(&mut self, c: u8) -> bool {
        if self.back_offset == 0 {
            if self.cursor.go_down_char(c) {
                self.back_offset = self.cursor.parent_edge_length().saturating_sub(1);
                true
            } else {
                false
            }
        } else if self.parent_edge_label() == Some(c) {
            self.back_offset -= 1;
            true
        } else {
            false
        }
    }

    /// Preorder descent with no character constraint, used by `next_kmer`'s DFS walk.
    pub fn go_down_unconstrained(&mut self) -> bool {
        if self.back_offset == 0 {
            if self.cursor.go_down_first() {
                self.back_offset = self.cursor.parent_edge_length().saturating_sub(1);
                true
            } else {
                false
            }
        } else {
            self.back_offset -= 1;
            true
        }
    }

    pub fn go_up(&mut self) -> bool {
        let edge_len = self.cursor.parent_edge_length();
        if edge_len == 0 {
            return false;
        }
        if self.back_offset + 1 == edge_len {
            if self.cursor.go_up() {
                self.back_offset = 0;
                return true;
            }
            return false;
        }
        self.back_offset += 1;
        true
    }

    /// Only valid when the iterator coincides with a real suffix-tree node (`back_offset == 0`);
    /// moves to the next child of the parent in lexicographic order.
    ///
    /// (Design note: the contract this is modeled on describes the valid state as
    /// `back_offset == parent_edge_length - 1`, which is the state immediately after a fresh
    /// `go_down`. Read literally that makes `go_right` unusable after a `go_up`-driven climb,
    /// which is the only place the cross-matcher's DFS actually calls it. `back_offset == 0`
    /// ("fully at a node", the same condition `is_root`/`go_down` use) is the self-consistent
    /// reading and the one implemented here.)
    pub fn go_right(&mut self) -> bool {
        if self.back_offset != 0 {
            return false;
        }
        if self.cursor.go_right() {
            self.back_offset = 0;
            true
        } else {
            false
        }
    }

    pub fn is_root(&self) -> bool {
        self.back_offset == 0 && self.cursor.is_root()
    }

    /// True iff the iterator coincides with a real suffix-tree node rather than sitting mid-edge.
    pub fn at_node(&self) -> bool {
        self.back_offset == 0
    }

    /// The character at depth `parent_edge_length - back_offset - 1` of the parent edge -- the
    /// character the cursor is "sitting on" mid-edge.
    pub fn parent_edge_label(&self) -> Option<u8> {
        let edge_len = self.cursor.parent_edge_length();
        if edge_len == 0 {
            return None;
        }
        let node = self.cursor.current();
        let target_depth = node.depth - self.back_offset - 1;
        self.cursor.esa.char_at_depth(node.lb, target_depth)
    }

    pub fn rep_length(&self) -> usize {
        self.cursor.current().depth - self.back_offset
    }

    /// All suffix-array positions in the current subtree; empty outside a node (`back_offset >
    /// 0`) since a mid-edge position's subtree isn't a distinct lcp-interval.
    pub fn occurrences(&self) -> &'a [usize] {
        if self.back_offset == 0 {
            self.cursor.occurrences()
        } else {
            &[]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seqgraph::sequence::Seq;

    #[test]
    fn occurrences_match_naive_search() {
        let seq = Seq::parse("ACGTACGTACGA");
        let esa = Esa::build(&seq);
        // Walk down "ACG" character by character and check occurrences against a naive scan.
        let mut iter = FineIter::new(&esa);
        for c in [1u8, 2, 3] {
            assert!(iter.go_down(c));
        }
        assert_eq!(iter.rep_length(), 3);

        let text: Vec<u8> = seq.as_slice().iter().map(|&b| super::code(b)).collect();
        let mut expected: Vec<usize> = (0..text.len().saturating_sub(2))
            .filter(|&i| text[i..i + 3] == [1, 2, 3])
            .collect();
        expected.sort_unstable();
        let mut got: Vec<usize> = iter.occurrences().to_vec();
        got.sort_unstable();
        assert_eq!(got, expected);
    }

    #[test]
    fn go_up_then_go_down_returns_to_the_same_depth() {
        let seq = Seq::parse("ACGTACGT");
        let esa = Esa::build(&seq);
        let mut iter = FineIter::new(&esa);
        assert!(iter.go_down(1));
        assert!(iter.go_down(2));
        assert_eq!(iter.rep_length(), 2);
        assert!(iter.go_up());
        assert_eq!(iter.rep_length(), 1);
        assert!(iter.go_down(2));
        assert_eq!(iter.rep_length(), 2);
    }

    #[test]
    fn root_has_no_parent_edge() {
        let seq = Seq::parse("ACGT");
        let esa = Esa::build(&seq);
        let iter = FineIter::new(&esa);
        assert!(iter.is_root());
        assert_eq!(iter.parent_edge_label(), None);
    }
}
