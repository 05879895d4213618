//! A compressed suffix index over an in-memory batch of reads (`6`, "Reads input").
//!
//! Reads arrive as a batch of `{id, sequence}` pairs (quality is not part of the matching
//! contract and is dropped at ingestion); they're concatenated into a single text with a
//! boundary table, and indexed the same way a path-index's trimmed text is.

use seqgraph::sequence::Seq;

use crate::index::Esa;

/// One read's sequence plus the identifier seed hits should report.
#[derive(Debug, Clone)]
pub struct Read {
    pub id: String,
    pub sequence: Seq,
}

/// A suffix-indexed batch of reads, with `locate` translating a concatenated-text position back
/// to `(read_index, offset_in_read)`.
pub struct ReadsIndex {
    ids: Vec<String>,
    boundaries: Vec<usize>,
    esa: Esa,
}

impl ReadsIndex {
    pub fn build(reads: &[Read]) -> Self {
        let mut concatenated = Seq::default();
        let mut boundaries = Vec::with_capacity(reads.len() + 1);
        let mut ids = Vec::with_capacity(reads.len());
        boundaries.push(0usize);
        for read in reads {
            concatenated.extend(read.sequence.as_slice().iter().copied());
            boundaries.push(concatenated.len());
            ids.push(read.id.clone());
        }
        let esa = Esa::build(&concatenated);
        Self { ids, boundaries, esa }
    }

    pub fn esa(&self) -> &Esa {
        &self.esa
    }

    pub fn read_count(&self) -> usize {
        self.ids.len()
    }

    pub fn read_id(&self, read_idx: usize) -> Option<&str> {
        self.ids.get(read_idx).map(String::as_str)
    }

    /// Maps a concatenated-text position to `(read_idx, offset_in_read)`.
    pub fn locate(&self, text_pos: usize) -> Option<(usize, usize)> {
        let read_idx = self.boundaries.partition_point(|&b| b <= text_pos).checked_sub(1)?;
        let start = *self.boundaries.get(read_idx)?;
        let end = *self.boundaries.get(read_idx + 1)?;
        if text_pos >= end {
            return None;
        }
        Some((read_idx, text_pos - start))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locate_maps_positions_back_to_their_owning_read() {
        let reads = vec![
            Read { id: "r1".into(), sequence: Seq::parse("ACGT") },
            Read { id: "r2".into(), sequence: Seq::parse("TTGGCC") },
        ];
        let index = ReadsIndex::build(&reads);
        assert_eq!(index.locate(0), Some((0, 0)));
        assert_eq!(index.locate(3), Some((0, 3)));
        assert_eq!(index.locate(4), Some((1, 0)));
        assert_eq!(index.locate(9), Some((1, 5)));
    }

    #[test]
    fn read_id_reports_the_original_identifier() {
        let reads = vec![Read { id: "only".into(), sequence: Seq::parse("AC") }];
        let index = ReadsIndex::build(&reads);
        assert_eq!(index.read_id(0), Some("only"));
        assert_eq!(index.read_id(1), None);
    }
}
