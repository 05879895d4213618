//! The TOML run-spec a `vgseed` invocation is driven by: everything a [`vgseed::Config`] and
//! [`vgseed::Query`] need, plus the file paths the CLI itself is responsible for.

use std::path::{Path, PathBuf};

use anyhow::Context;
use seqgraph::direction::{Direction, MatchingKind};
use serde::Deserialize;
use vgseed::{Config, Query};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectionSpec {
    Forward,
    Reversed,
}

impl From<DirectionSpec> for Direction {
    fn from(d: DirectionSpec) -> Self {
        match d {
            DirectionSpec::Forward => Direction::Forward,
            DirectionSpec::Reversed => Direction::Reversed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchingSpec {
    Exact,
    Approx,
}

impl From<MatchingSpec> for MatchingKind {
    fn from(m: MatchingSpec) -> Self {
        match m {
            MatchingSpec::Exact => MatchingKind::Exact,
            MatchingSpec::Approx => MatchingKind::Approx,
        }
    }
}

/// A TOML run-spec, parsed directly into this struct -- no intermediate AST, since this crate's
/// parameters are flat enough not to need one.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunSpec {
    /// Path to a `vgseed::ingest::graph`-format file.
    pub graph: PathBuf,
    /// Path to a FASTQ-lite reads file; required by `find-seeds`, ignored by the other
    /// subcommands.
    pub reads: Option<PathBuf>,
    pub k: usize,
    #[serde(default)]
    pub step: Option<usize>,
    #[serde(default)]
    pub context: Option<usize>,
    #[serde(default = "default_direction")]
    pub direction: DirectionSpec,
    #[serde(default = "default_num_paths")]
    pub num_paths: usize,
    #[serde(default)]
    pub patched: bool,
    #[serde(default = "default_matching")]
    pub matching: MatchingSpec,
    #[serde(default = "default_rng_seed")]
    pub rng_seed: u64,
    #[serde(default)]
    pub thread_limit: Option<usize>,
    /// Path prefix used for every persisted artifact this run writes or reads.
    pub out_prefix: PathBuf,
}

fn default_direction() -> DirectionSpec {
    DirectionSpec::Forward
}

fn default_num_paths() -> usize {
    16
}

fn default_matching() -> MatchingSpec {
    MatchingSpec::Exact
}

fn default_rng_seed() -> u64 {
    0
}

impl RunSpec {
    pub fn read_from_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading run-spec {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parsing run-spec {}", path.display()))
    }

    pub fn query(&self) -> Query {
        let mut query = Query::new(self.k, self.rng_seed);
        query.step = self.step.unwrap_or(self.k);
        query.context = self.context.unwrap_or(self.k);
        query.direction = self.direction.into();
        query.num_paths = self.num_paths;
        query.patched = self.patched;
        query.matching = self.matching.into();
        query
    }

    pub fn config(&self) -> Config {
        let mut config = Config::default();
        config.thread_limit = self.thread_limit;
        config
    }
}
