//! Engine module: CLI, digests, metrics and progress reporting

pub mod arg_parser;
pub mod cli;
pub mod digest;
pub mod metrics;
pub mod progress;

// Re-export commonly used items
pub use arg_parser::Cli;
pub use cli::{build_opts, handle_run};
pub use digest::{HashAlgorithm, StreamDigest, digest_reader};
pub use metrics::{Counters, Metrics, NoopMetrics, StatsSnapshot};
