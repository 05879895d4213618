//! Stand-in parsers for the two external inputs this crate needs: a minimal line-oriented graph
//! format, and a FASTQ-lite reads format (`6`, "Graph input"/"Reads input").
//!
//! Neither claims to implement a real VG/GFA/XG reader or the full FASTQ grammar -- both are
//! narrow enough to build fixtures, tests and CLI input from, with the same
//! `seqgraph::graph::Graph`/[`crate::reads_index::Read`] construction contract a real reader
//! would target.

pub mod graph {
    use std::collections::HashMap;
    use std::io::BufRead;

    use seqgraph::graph::{Graph, NodeId};
    use seqgraph::sequence::Seq;

    use crate::error::{Result, SeedFinderError};

    /// Parses the line format:
    /// ```text
    /// # comment
    /// N <id> <DNA-string>
    /// E <from-id> <to-id>
    /// ```
    /// `<id>` is an arbitrary external identifier (not necessarily 0-based or contiguous);
    /// it's remapped to the [`NodeId`] the underlying builder assigns, in declaration order.
    /// Every `E` line's endpoints must have been declared by an earlier `N` line.
    pub fn parse(r: impl BufRead) -> Result<Graph> {
        let mut builder = Graph::builder();
        let mut external_ids: HashMap<String, NodeId> = HashMap::new();
        let mut pending_edges: Vec<(String, String, usize)> = Vec::new();

        for (lineno, line) in r.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut parts = line.split_whitespace();
            match parts.next() {
                Some("N") => {
                    let id = parts.next().ok_or_else(|| bad_line(lineno, line))?;
                    let seq = parts.next().ok_or_else(|| bad_line(lineno, line))?;
                    let node_id = builder.add_node(Seq::parse(seq))?;
                    external_ids.insert(id.to_string(), node_id);
                }
                Some("E") => {
                    let from = parts.next().ok_or_else(|| bad_line(lineno, line))?;
                    let to = parts.next().ok_or_else(|| bad_line(lineno, line))?;
                    pending_edges.push((from.to_string(), to.to_string(), lineno));
                }
                _ => return Err(bad_line(lineno, line)),
            }
        }

        for (from, to, lineno) in pending_edges {
            let from_id = *external_ids
                .get(&from)
                .ok_or_else(|| SeedFinderError::BadFormat(format!("line {}: unknown node id {from:?}", lineno + 1)))?;
            let to_id = *external_ids
                .get(&to)
                .ok_or_else(|| SeedFinderError::BadFormat(format!("line {}: unknown node id {to:?}", lineno + 1)))?;
            builder.add_edge(from_id, to_id)?;
        }

        builder.build().map_err(Into::into)
    }

    fn bad_line(lineno: usize, line: &str) -> SeedFinderError {
        SeedFinderError::BadFormat(format!("line {}: malformed graph line {line:?}", lineno + 1))
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn parses_a_small_linear_graph() {
            let text = "# comment\nN 0 ACGT\nN 1 TTGG\nE 0 1\n";
            let graph = parse(text.as_bytes()).unwrap();
            assert_eq!(graph.node_count(), 2);
            assert!(graph.has_edges_from(NodeId::from_raw(0)));
        }

        #[test]
        fn non_sequential_external_ids_are_remapped() {
            let text = "N n7 AAAA\nN n2 CCCC\nE n7 n2\n";
            let graph = parse(text.as_bytes()).unwrap();
            assert_eq!(graph.node_count(), 2);
            assert!(graph.has_edges_from(NodeId::from_raw(0)));
        }

        #[test]
        fn edge_to_undeclared_node_is_an_error() {
            let text = "N 0 ACGT\nE 0 1\n";
            assert!(parse(text.as_bytes()).is_err());
        }
    }
}

pub mod reads {
    use std::io::BufRead;

    use seqgraph::sequence::Seq;

    use crate::error::{Result, SeedFinderError};
    use crate::reads_index::Read;

    /// One parsed FASTQ record. `quality` is retained but not consumed by any matching
    /// algorithm in this crate.
    #[derive(Debug, Clone)]
    pub struct FastqRecord {
        pub id: String,
        pub sequence: Seq,
        pub quality: String,
    }

    impl From<FastqRecord> for Read {
        fn from(r: FastqRecord) -> Self {
            Read { id: r.id, sequence: r.sequence }
        }
    }

    /// Parses the common 4-line-record FASTQ shape: `@id`, sequence, `+` (optionally followed by
    /// a repeated id, ignored), quality. Blank trailing lines are tolerated; anything else is a
    /// format error.
    pub fn parse(r: impl BufRead) -> Result<Vec<FastqRecord>> {
        let mut lines = r.lines();
        let mut records = Vec::new();

        loop {
            let Some(header) = lines.next() else { break };
            let header = header?;
            if header.trim().is_empty() {
                continue;
            }
            let id = header
                .strip_prefix('@')
                .ok_or_else(|| SeedFinderError::BadFormat(format!("expected '@id' header, got {header:?}")))?
                .to_string();

            let seq_line = lines
                .next()
                .ok_or_else(|| SeedFinderError::BadFormat("truncated FASTQ record: missing sequence line".into()))??;
            let plus_line = lines
                .next()
                .ok_or_else(|| SeedFinderError::BadFormat("truncated FASTQ record: missing '+' line".into()))??;
            if !plus_line.starts_with('+') {
                return Err(SeedFinderError::BadFormat(format!("expected '+' separator, got {plus_line:?}")));
            }
            let quality = lines
                .next()
                .ok_or_else(|| SeedFinderError::BadFormat("truncated FASTQ record: missing quality line".into()))??;

            records.push(FastqRecord { id, sequence: Seq::parse(&seq_line), quality });
        }
        Ok(records)
    }

}
