//! Small utilities shared between `seqgraph`, `vgseed` and the CLI.

mod frontier;
pub mod stats;

pub use frontier::FrontierItem;
pub use stats::RunningAverage;
