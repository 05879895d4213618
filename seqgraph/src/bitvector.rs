//! A succinct bitvector with O(1) rank and select, built over [`bit_vec::BitVec`] storage.
//!
//! Used by [`Path`](crate::path) for its node-break bitvector: a 1-bit marks the last base of
//! each node in the path's concatenated sequence, and rank/select give the O(1) mapping between
//! a path-local base offset and (node-rank-within-path, offset-in-node).
//!
//! The rank/select support is rebuilt from scratch every time [`RsBitVec::build`] is called
//! rather than lazily re-pointed at a moved bitvector, so a `Path` that owns an `RsBitVec` by
//! value never has a dangling internal reference: clone and move are both just a memcpy of
//! plain data, with no pointer to re-bind.

use bit_vec::BitVec;

const BLOCK_BITS: usize = 64;
/// Build a select sample every this many set bits, so select never has to scan more than this
/// many 1-bits linearly within a block once it has landed near the answer.
const SELECT_SAMPLE_RATE: usize = 64;

#[derive(Debug, Clone, Default)]
pub struct RsBitVec {
    bits: BitVec,
    /// Cumulative popcount *before* each 64-bit block, i.e. `block_rank[i]` is the number of set
    /// bits in blocks `[0, i)`.
    block_rank: Vec<u64>,
    /// `select_samples[i]` is the bit-position of the `(i * SELECT_SAMPLE_RATE)`-th set bit
    /// (0-indexed among set bits).
    select_samples: Vec<u64>,
    total_ones: u64,
}

impl RsBitVec {
    /// Build rank/select support over `bits`. `bits` is moved in, not referenced, so there is no
    /// self-reference to invalidate on move.
    pub fn build(bits: BitVec) -> Self {
        let num_blocks = bits.len().div_ceil(BLOCK_BITS);
        let mut block_rank = Vec::with_capacity(num_blocks + 1);
        let mut select_samples = Vec::new();
        let mut running = 0u64;
        let mut ones_seen = 0u64;

        for block_idx in 0..num_blocks {
            block_rank.push(running);
            let start = block_idx * BLOCK_BITS;
            let end = (start + BLOCK_BITS).min(bits.len());
            for bit_pos in start..end {
                if bits[bit_pos] {
                    if ones_seen % SELECT_SAMPLE_RATE as u64 == 0 {
                        select_samples.push(bit_pos as u64);
                    }
                    ones_seen += 1;
                    running += 1;
                }
            }
        }
        block_rank.push(running);

        Self {
            bits,
            block_rank,
            select_samples,
            total_ones: running,
        }
    }

    pub fn count_ones(&self) -> u64 {
        self.total_ones
    }

    /// Number of set bits in `[0, pos)`. `rank(len()) == count_ones()`.
    pub fn rank1(&self, pos: usize) -> u64 {
        debug_assert!(pos <= self.bits.len());
        let block_idx = pos / BLOCK_BITS;
        let mut count = self.block_rank[block_idx];
        let block_start = block_idx * BLOCK_BITS;
        for bit_pos in block_start..pos {
            if self.bits[bit_pos] {
                count += 1;
            }
        }
        count
    }

    /// The bit-position of the `n`-th set bit (0-indexed). Panics if `n >= count_ones()`.
    pub fn select1(&self, n: u64) -> usize {
        assert!(n < self.total_ones, "select1 index out of range");
        let sample_idx = (n / SELECT_SAMPLE_RATE as u64) as usize;
        let mut pos = self.select_samples[sample_idx] as usize;
        // `select_samples[sample_idx]` is itself the position of a set bit, and the number of
        // set bits strictly before it is exactly `sample_idx * SELECT_SAMPLE_RATE`.
        let mut ones_seen = sample_idx as u64 * SELECT_SAMPLE_RATE as u64;
        loop {
            if self.bits[pos] {
                if ones_seen == n {
                    return pos;
                }
                ones_seen += 1;
            }
            pos += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bv_from_str(s: &str) -> BitVec {
        let mut bv = BitVec::from_elem(s.len(), false);
        for (i, c) in s.chars().enumerate() {
            if c == '1' {
                bv.set(i, true);
            }
        }
        bv
    }

    #[test]
    fn rank_basic() {
        let rs = RsBitVec::build(bv_from_str("0010010001"));
        assert_eq!(rs.rank1(0), 0);
        assert_eq!(rs.rank1(3), 1);
        assert_eq!(rs.rank1(4), 1);
        assert_eq!(rs.rank1(7), 2);
        assert_eq!(rs.rank1(10), 3);
    }

    #[test]
    fn select_basic() {
        let rs = RsBitVec::build(bv_from_str("0010010001"));
        assert_eq!(rs.select1(0), 2);
        assert_eq!(rs.select1(1), 5);
        assert_eq!(rs.select1(2), 9);
    }

    #[test]
    fn rank_select_round_trip_over_many_blocks() {
        let len = 10_000;
        let bits: Vec<bool> = (0..len).map(|i| i % 7 == 0).collect();
        let mut bv = BitVec::from_elem(len, false);
        for (i, &b) in bits.iter().enumerate() {
            bv.set(i, b);
        }
        let rs = RsBitVec::build(bv);
        let ones: Vec<usize> = bits
            .iter()
            .enumerate()
            .filter(|(_, &b)| b)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(rs.count_ones() as usize, ones.len());
        for (n, &pos) in ones.iter().enumerate() {
            assert_eq!(rs.select1(n as u64), pos);
            assert_eq!(rs.rank1(pos + 1), (n + 1) as u64);
        }
    }
}
