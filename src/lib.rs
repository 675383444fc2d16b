//! seekmin: checksum files with sequential reads and parallel hashing.
//!
//! A small reader pool copies each file into a [`bpipe`] buffered pipe backed by a bounded
//! [`BufferPool`](bpipe::BufferPool); a hasher pool drains the pipes concurrently. Bounded
//! queues and the pool cap memory and stall readers when hashing falls behind.

pub mod bpipe;
pub mod engine;
pub mod pipeline;
pub mod types;
pub mod utils;

/// Re-export types for API
pub use engine::digest::HashAlgorithm;
pub use types::*;

use log::debug;
use std::path::PathBuf;
use std::sync::Arc;

use crate::engine::metrics::NoopMetrics;
use crate::pipeline::{CollectingSink, FilenameSource, run_pipeline};

/// Result alias used by public seekmin API
pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// Hash `paths` with `opts` and return the digests (in completion order) plus run totals.
///
/// Files that cannot be opened or read are logged and counted in [`RunSummary::failed`];
/// they never abort the run. For streaming output or metrics use
/// [`run_pipeline`](crate::pipeline::run_pipeline) with your own sink.
pub fn checksum_files(paths: Vec<PathBuf>, opts: &Opts) -> Result<(Vec<HashRecord>, RunSummary)> {
    debug!(
        "{} CONFIG:{:#?}",
        env!("CARGO_PKG_NAME").to_uppercase(),
        opts
    );
    let sink = Arc::new(CollectingSink::new());
    let summary = run_pipeline(
        opts,
        FilenameSource::Paths(paths),
        sink.clone(),
        Arc::new(NoopMetrics),
    )?;
    Ok((sink.digests(), summary))
}
