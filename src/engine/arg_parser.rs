use clap::Parser;
use std::path::PathBuf;

use crate::engine::digest::HashAlgorithm;

/// Checksum files, reading them sequentially and hashing in parallel.
#[derive(Clone, Debug, Parser)]
#[command(name = "seekmin")]
#[command(
    about = "Print checksums like md5sum, reading files sequentially and hashing them in parallel."
)]
pub struct Cli {
    /// Files to hash. When none are given, filenames are read from stdin, one per line.
    #[arg(value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// File read block size in bytes. Small blocks use buffer memory more efficiently; large blocks may read faster.
    #[arg(long, value_parser = clap::value_parser!(usize))]
    pub block_size: Option<usize>,

    /// Maximum number of blocks buffered across all files. Larger values let reads run further ahead of hashing.
    #[arg(long, value_parser = clap::value_parser!(usize))]
    pub max_blocks: Option<usize>,

    /// Reader threads. Keep at 1 for strictly sequential disk access.
    #[arg(long, short = 'r', value_parser = clap::value_parser!(usize))]
    pub readers: Option<usize>,

    /// Hasher threads. Default: available parallelism.
    #[arg(long, short = 'j', value_parser = clap::value_parser!(usize))]
    pub hashers: Option<usize>,

    /// Files read ahead of the hashers (work queue bound).
    #[arg(long, value_parser = clap::value_parser!(usize))]
    pub queue_cap: Option<usize>,

    /// Filenames on stdin are NUL-delimited (use with `find -print0`).
    #[arg(long, short = 'z', num_args = 0..=1, require_equals = true, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub null: Option<bool>,

    /// Digest algorithm.
    #[arg(long, short = 'a', value_enum)]
    pub algorithm: Option<HashAlgorithm>,

    /// Verbose output.
    #[arg(long, short = 'v', num_args = 0..=1, require_equals = true, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub verbose: Option<bool>,

    /// Print read/hash counters as JSON on stderr when done.
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub stats: Option<bool>,

    /// Show a counter of hashed files on stderr.
    #[arg(long, short = 'p', num_args = 0..=1, require_equals = true, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub progress: Option<bool>,
}
