//! `vgseed`: sample/index graph paths, compute starting loci, and cross-match/extend reads
//! against them, all driven by a TOML run-spec.

mod spec;

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use anyhow::Context;
use structopt::StructOpt;

use vgseed::{ingest, persist, Orchestrator, Read, ReadsIndex};

use crate::spec::RunSpec;

#[derive(Debug, StructOpt)]
#[structopt(name = "vgseed", about = "Variation-graph seed finder")]
struct Opts {
    #[structopt(subcommand)]
    command: Command,
}

#[derive(Debug, StructOpt)]
enum Command {
    /// Samples paths from the graph and writes a path-index to `<out_prefix>.esa`/`_paths`.
    BuildIndex {
        #[structopt(long, parse(from_os_str))]
        spec: PathBuf,
    },
    /// Computes starting loci (uncovered-by-any-sampled-walk, plus step-sampled) and writes them
    /// to `<out_prefix>.starts`. Requires a path-index already built at the same prefix (run
    /// `build-index` first), since coverage is checked against its sampled walks.
    BuildStarts {
        #[structopt(long, parse(from_os_str))]
        spec: PathBuf,
    },
    /// Loads a persisted path-index and/or starting-loci file, cross-matches and extends a read
    /// set against them, and prints one line per seed hit.
    FindSeeds {
        #[structopt(long, parse(from_os_str))]
        spec: PathBuf,
    },
    /// Parses a graph file and prints a small connectivity summary.
    DumpSubgraph {
        #[structopt(long, parse(from_os_str))]
        graph: PathBuf,
    },
}

fn load_reads(path: &std::path::Path) -> anyhow::Result<ReadsIndex> {
    let file = File::open(path).with_context(|| format!("opening reads file {}", path.display()))?;
    let records = ingest::reads::parse(BufReader::new(file))?;
    let reads: Vec<Read> = records.into_iter().map(Read::from).collect();
    Ok(ReadsIndex::build(&reads))
}

fn load_graph(path: &std::path::Path) -> anyhow::Result<Arc<seqgraph::Graph>> {
    let file = File::open(path).with_context(|| format!("opening graph file {}", path.display()))?;
    Ok(Arc::new(ingest::graph::parse(BufReader::new(file))?))
}

fn print_hit(out: &mut impl Write, reads: &ReadsIndex, hit: vgseed::SeedHit) {
    let read_id = reads.read_id(hit.read_id).unwrap_or("?");
    let _ = writeln!(
        out,
        "{}\t{}\t{}\t{}",
        hit.graph_node_id.raw(),
        hit.offset_in_node,
        read_id,
        hit.offset_in_read
    );
}

fn build_index(spec_path: &std::path::Path) -> anyhow::Result<()> {
    let spec = RunSpec::read_from_file(spec_path)?;
    let graph = load_graph(&spec.graph)?;
    let mut orch = Orchestrator::new(graph, spec.config(), spec.query());
    orch.pick_paths(spec.num_paths, spec.patched, spec.context.unwrap_or(spec.k))?;
    orch.index_paths()?;
    let index = orch.path_index().context("path-index was just built and must be present")?;
    let prefix = spec.out_prefix.to_string_lossy();
    persist::save_path_index(&prefix, index)?;
    log::info!("wrote path-index with {} paths to {prefix}", index.path_count());
    Ok(())
}

fn build_starts(spec_path: &std::path::Path) -> anyhow::Result<()> {
    let spec = RunSpec::read_from_file(spec_path)?;
    let graph = load_graph(&spec.graph)?;
    let prefix = spec.out_prefix.to_string_lossy();
    let direction = spec.direction.into();
    let index = persist::open_path_index(&prefix, &graph, direction)
        .with_context(|| format!("loading path-index at prefix {prefix} (run build-index first)"))?;

    let mut orch = Orchestrator::new(Arc::clone(&graph), spec.config(), spec.query());
    orch.adopt_paths(index.paths().iter().cloned());
    orch.add_uncovered_loci()?;
    if let Some(step) = spec.step {
        orch.add_all_loci(step)?;
    }
    orch.save_starts(&prefix)?;
    log::info!("wrote {} starting loci to {prefix}.starts", orch.starting_loci().len());
    Ok(())
}

fn find_seeds(spec_path: &std::path::Path) -> anyhow::Result<()> {
    let spec = RunSpec::read_from_file(spec_path)?;
    let graph = load_graph(&spec.graph)?;
    let reads_path = spec.reads.clone().context("find-seeds requires a `reads` path in the run-spec")?;
    let reads = load_reads(&reads_path)?;

    let prefix = spec.out_prefix.to_string_lossy();
    let direction = spec.direction.into();
    let mut orch = Orchestrator::new(Arc::clone(&graph), spec.config(), spec.query());

    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let mut hits_emitted = 0usize;

    if let Ok(index) = persist::open_path_index(&prefix, &graph, direction) {
        orch.adopt_paths(index.paths().iter().cloned());
        orch.index_paths()?;
        orch.seeds_on_paths(&reads, |hit| {
            hits_emitted += 1;
            print_hit(&mut out, &reads, hit);
        })?;
    }

    if orch.open_starts(&prefix).is_ok() {
        let abort = AtomicBool::new(false);
        orch.run_parallel(&reads, &abort, |update| match update {
            vgseed::Update::Hit(hit) => {
                hits_emitted += 1;
                print_hit(&mut out, &reads, hit);
            }
            vgseed::Update::Progress { loci_processed, loci_total, frontier_size, .. } => {
                log::info!("{loci_processed}/{loci_total} starting loci processed, {frontier_size} queued");
            }
            vgseed::Update::Complete => {}
        });
    }

    log::info!("emitted {hits_emitted} seed hits");
    Ok(())
}

fn dump_subgraph(graph_path: &std::path::Path) -> anyhow::Result<()> {
    let graph = load_graph(graph_path)?;
    println!("nodes: {}", graph.node_count());
    println!("total loci: {}", graph.total_loci());
    let branches = (0..graph.node_count())
        .map(|r| graph.rank_to_id(r))
        .filter(|&id| graph.is_branch(id))
        .count();
    let merges = (0..graph.node_count())
        .map(|r| graph.rank_to_id(r))
        .filter(|&id| graph.is_merge(id))
        .count();
    println!("branch nodes: {branches}");
    println!("merge nodes: {merges}");
    Ok(())
}

fn main() -> anyhow::Result<()> {
    simple_logger::SimpleLogger::new().init().ok();
    let opts = Opts::from_args();
    match opts.command {
        Command::BuildIndex { spec } => build_index(&spec),
        Command::BuildStarts { spec } => build_starts(&spec),
        Command::FindSeeds { spec } => find_seeds(&spec),
        Command::DumpSubgraph { graph } => dump_subgraph(&graph),
    }
}
