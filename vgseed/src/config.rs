//! Run configuration for a seed-finding session: resource limits plus the parameters that shape
//! (without changing the *correctness* of) path sampling and matching.

use seqgraph::direction::{Direction, MatchingKind};
use sysinfo::SystemExt;

/// Resource and concurrency limits, independent of what a particular query asks for: a thread
/// limit defaulting to physical core count, and a memory ceiling defaulting to a fraction of what
/// `sysinfo` reports available.
#[derive(Debug, Clone)]
pub struct Config {
    /// Number of worker threads used for parallel orchestration. If `None`, uses the number of
    /// physical CPU cores (ignoring hyper-threading), matching `num_cpus::get_physical`.
    pub thread_limit: Option<usize>,
    /// The maximum number of bytes of heap memory the orchestrator's sampling and indexing
    /// passes are allowed to use. Defaults to 80% of available memory.
    pub mem_limit: usize,
    /// Upper bound on the number of sampled paths a single `pick_paths` call will keep, guarding
    /// against an unbounded sampling budget blowing past `mem_limit` before the first check.
    pub max_paths: usize,
}

impl Default for Config {
    fn default() -> Self {
        let ideal_mem_limit = if sysinfo::System::IS_SUPPORTED {
            (sysinfo::System::new_all().available_memory() as f32 * 0.8) as u64
        } else {
            5_000_000_000u64
        };
        let pointer_size_limit = (usize::MAX as u64).saturating_sub(500_000_000);
        let mem_limit: usize = ideal_mem_limit
            .min(pointer_size_limit)
            .try_into()
            .expect("memory limit should fit into usize");

        Self {
            thread_limit: None,
            mem_limit,
            max_paths: 10_000,
        }
    }
}

impl Config {
    /// The number of worker threads to actually use: `thread_limit` if set, else the number of
    /// physical cores.
    pub fn resolved_thread_count(&self) -> usize {
        self.thread_limit.unwrap_or_else(|| num_cpus::get_physical().max(1))
    }
}

/// The parameters of a single seed-finding query: everything that changes *what* gets searched
/// for, as opposed to [`Config`]'s resource limits.
#[derive(Debug, Clone)]
pub struct Query {
    /// Seed (exact-match window) length.
    pub k: usize,
    /// Step size used by `add_all_loci`.
    pub step: usize,
    /// Path-index context: how many bases of the extremal nodes are trimmed from the stored
    /// text, `0` meaning no trimming.
    pub context: usize,
    /// Direction the paths-index text is stored in.
    pub direction: Direction,
    /// Number of walks `pick_paths` should sample.
    pub num_paths: usize,
    /// Whether `pick_paths` should use patch mode (vs. full-haplotype mode).
    pub patched: bool,
    /// Matching strategy used by the traverser.
    pub matching: MatchingKind,
    /// Seed for the `Random` haplotyper and any other PRNG-driven sampling; never sourced from
    /// `thread_rng()` so that a query is exactly reproducible given the same seed.
    pub rng_seed: u64,
}

impl Query {
    pub fn new(k: usize, rng_seed: u64) -> Self {
        Self {
            k,
            step: k,
            context: k,
            direction: Direction::Forward,
            num_paths: 16,
            patched: false,
            matching: MatchingKind::Exact,
            rng_seed,
        }
    }
}
