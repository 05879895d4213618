//! Variation-graph seed finder: samples paths through a [`seqgraph::Graph`], indexes them, and
//! cross-matches reads against that index to produce seed hits.

pub mod config;
pub mod error;
pub mod hit;
pub mod index;
pub mod ingest;
pub mod kmer_matcher;
pub mod orchestrator;
pub mod path_index;
pub mod persist;
pub mod reads_index;
pub mod traverser;

pub use config::{Config, Query};
pub use error::{Result, SeedFinderError};
pub use hit::SeedHit;
pub use index::{Esa, FineIter};
pub use kmer_matcher::{cross_match, cross_match_dfs, cross_match_oracle, next_kmer, upto_prefix, RawHit};
pub use orchestrator::{Orchestrator, Update};
pub use path_index::{PathIndex, PathIndexBuilder};
pub use reads_index::{Read, ReadsIndex};
pub use traverser::{traverse_bfs, traverse_dfs};
