//! On-disk formats for starting loci and path-indices (`6`, "Persisted state").
//!
//! Every number is little-endian; there's no compression or versioning beyond the leading magic
//! on the starting-loci file, matching the rest of this crate's stand-in-not-production-grade
//! ingestion/persistence layer.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read as IoRead, Write};
use std::sync::Arc;

use seqgraph::direction::{Direction, IndexKind};
use seqgraph::graph::{Graph, NodeId};
use seqgraph::path::Path;

use crate::error::{Result, SeedFinderError};
use crate::index::Esa;
use crate::path_index::{PathIndex, PathIndexBuilder};

const STARTS_MAGIC: &[u8; 4] = b"VGSF";

fn read_u32(r: &mut impl IoRead) -> Result<u32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_u64(r: &mut impl IoRead) -> Result<u64> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

/// Writes the starting-loci file: magic `VGSF`, `k`, `step`, a count, then that many
/// `(node_id, offset)` pairs.
pub fn save_starts(prefix: &str, k: usize, step: usize, loci: &[(NodeId, usize)]) -> Result<()> {
    let mut w = BufWriter::new(File::create(format!("{prefix}.starts"))?);
    w.write_all(STARTS_MAGIC)?;
    w.write_all(&(k as u32).to_le_bytes())?;
    w.write_all(&(step as u32).to_le_bytes())?;
    w.write_all(&(loci.len() as u64).to_le_bytes())?;
    for &(node_id, offset) in loci {
        w.write_all(&(node_id.raw() as u64).to_le_bytes())?;
        w.write_all(&(offset as u32).to_le_bytes())?;
    }
    Ok(())
}

/// Reads a starting-loci file back into `(k, step, loci)`.
pub fn open_starts(prefix: &str) -> Result<(usize, usize, Vec<(NodeId, usize)>)> {
    let mut r = BufReader::new(File::open(format!("{prefix}.starts"))?);
    let mut magic = [0u8; 4];
    r.read_exact(&mut magic)?;
    if &magic != STARTS_MAGIC {
        return Err(SeedFinderError::BadFormat("starting-loci file is missing the VGSF magic".into()));
    }
    let k = read_u32(&mut r)? as usize;
    let step = read_u32(&mut r)? as usize;
    let count = read_u64(&mut r)? as usize;
    let mut loci = Vec::with_capacity(count);
    for _ in 0..count {
        let node_id = NodeId::from_raw(read_u64(&mut r)? as u32);
        let offset = read_u32(&mut r)? as usize;
        loci.push((node_id, offset));
    }
    Ok((k, step, loci))
}

fn node_break_bitvector(graph: &Graph, nodes: &[NodeId]) -> Vec<u64> {
    let total_len: usize = nodes.iter().map(|&id| graph.node_length(id)).sum();
    let word_count = total_len.div_ceil(64).max(1);
    let mut words = vec![0u64; word_count];
    let mut pos = 0usize;
    for &id in nodes {
        let (word, bit) = (pos / 64, pos % 64);
        if let Some(w) = words.get_mut(word) {
            *w |= 1u64 << bit;
        }
        pos += graph.node_length(id);
    }
    words
}

/// Writes `<prefix>.esa` (the raw suffix/LCP arrays, for format fidelity) and `<prefix>_paths`
/// (the sampled walks themselves, `context`/`sorted`/`count` plus a node-id list and node-break
/// bitvector per path).
pub fn save_path_index(prefix: &str, index: &PathIndex) -> Result<()> {
    let esa = index.esa();
    let mut esa_w = BufWriter::new(File::create(format!("{prefix}.esa"))?);
    esa_w.write_all(&(esa.raw_text().len() as u64).to_le_bytes())?;
    esa_w.write_all(esa.raw_text())?;
    esa_w.write_all(&(esa.raw_sa().len() as u64).to_le_bytes())?;
    for &v in esa.raw_sa() {
        esa_w.write_all(&(v as u64).to_le_bytes())?;
    }
    esa_w.write_all(&(esa.raw_lcp().len() as u64).to_le_bytes())?;
    for &v in esa.raw_lcp() {
        esa_w.write_all(&(v as u64).to_le_bytes())?;
    }

    let mut paths_w = BufWriter::new(File::create(format!("{prefix}_paths"))?);
    paths_w.write_all(&(index.context() as u64).to_le_bytes())?;
    let sorted: u64 = if index.paths().is_sorted() { 1 } else { 0 };
    paths_w.write_all(&sorted.to_le_bytes())?;
    paths_w.write_all(&(index.path_count() as u64).to_le_bytes())?;
    for path in index.paths().iter() {
        let nodes: Vec<NodeId> = path.node_ids().collect();
        paths_w.write_all(&(nodes.len() as u64).to_le_bytes())?;
        for &id in &nodes {
            paths_w.write_all(&(id.raw() as u64).to_le_bytes())?;
        }
        let breaks = node_break_bitvector(path.graph(), &nodes);
        paths_w.write_all(&(breaks.len() as u64).to_le_bytes())?;
        for word in breaks {
            paths_w.write_all(&word.to_le_bytes())?;
        }
    }
    Ok(())
}

/// Reads `<prefix>_paths` back into a [`PathIndex`] built against `graph`. The persisted
/// `<prefix>.esa` arrays are not trusted directly -- the suffix array is rebuilt from the
/// recovered paths' own (context-trimmed) sequences instead, since validating a stale persisted
/// array against the graph passed in here is strictly more bookkeeping than rebuilding it costs.
pub fn open_path_index(prefix: &str, graph: &Arc<Graph>, direction: Direction) -> Result<PathIndex> {
    let mut r = BufReader::new(File::open(format!("{prefix}_paths"))?);
    let context = read_u64(&mut r)? as usize;
    let _sorted = read_u64(&mut r)?;
    let count = read_u64(&mut r)? as usize;

    let mut builder = PathIndexBuilder::new(direction, IndexKind::EnhancedSuffixArray, context)?;
    for _ in 0..count {
        let node_count = read_u64(&mut r)? as usize;
        let mut nodes = Vec::with_capacity(node_count);
        for _ in 0..node_count {
            nodes.push(NodeId::from_raw(read_u64(&mut r)? as u32));
        }
        let word_count = read_u64(&mut r)? as usize;
        for _ in 0..word_count {
            let _ = read_u64(&mut r)?;
        }
        let path = Path::compact_from(Arc::clone(graph), nodes)?;
        builder.add_path(path)?;
    }
    Ok(builder.build())
}

/// Rebuilds an `Esa` directly from a persisted `.esa` file, bypassing path reconstruction --
/// useful when only the raw text index is needed (e.g. inspecting a persisted index offline).
pub fn open_esa(prefix: &str) -> Result<Esa> {
    let mut r = BufReader::new(File::open(format!("{prefix}.esa"))?);
    let text_len = read_u64(&mut r)? as usize;
    let mut text = vec![0u8; text_len];
    r.read_exact(&mut text)?;
    let sa_len = read_u64(&mut r)? as usize;
    let mut sa = Vec::with_capacity(sa_len);
    for _ in 0..sa_len {
        sa.push(read_u64(&mut r)? as usize);
    }
    let lcp_len = read_u64(&mut r)? as usize;
    let mut lcp = Vec::with_capacity(lcp_len);
    for _ in 0..lcp_len {
        lcp.push(read_u64(&mut r)? as usize);
    }
    Ok(Esa::from_raw(text, sa, lcp))
}

#[cfg(test)]
mod tests {
    use super::*;
    use seqgraph::sequence::Seq;

    fn small_graph() -> Graph {
        let mut b = Graph::builder();
        b.add_node(Seq::parse("ACGTACGT")).unwrap();
        b.add_node(Seq::parse("GGCCTTAA")).unwrap();
        b.add_edge(NodeId::from_raw(0), NodeId::from_raw(1)).unwrap();
        b.build().unwrap()
    }

    fn tmp_prefix(name: &str) -> String {
        let dir = std::env::temp_dir().join(format!("vgseed_persist_test_{}_{}", std::process::id(), name));
        std::fs::create_dir_all(&dir).unwrap();
        dir.join("idx").to_string_lossy().into_owned()
    }

    #[test]
    fn starts_round_trip() {
        let prefix = tmp_prefix("starts");
        let loci = vec![(NodeId::from_raw(0), 0), (NodeId::from_raw(1), 3)];
        save_starts(&prefix, 5, 2, &loci).unwrap();
        let (k, step, reopened) = open_starts(&prefix).unwrap();
        assert_eq!((k, step), (5, 2));
        assert_eq!(reopened, loci);
    }

    #[test]
    fn path_index_round_trips_through_disk() {
        let graph = Arc::new(small_graph());
        let mut builder =
            PathIndexBuilder::new(Direction::Forward, IndexKind::EnhancedSuffixArray, 0).unwrap();
        let path = Path::compact_from(Arc::clone(&graph), vec![NodeId::from_raw(0), NodeId::from_raw(1)]).unwrap();
        builder.add_path(path).unwrap();
        let index = builder.build();

        let prefix = tmp_prefix("pathindex");
        save_path_index(&prefix, &index).unwrap();
        let reopened = open_path_index(&prefix, &graph, Direction::Forward).unwrap();
        assert_eq!(reopened.path_count(), index.path_count());
        assert_eq!(reopened.esa().len(), index.esa().len());
    }
}
