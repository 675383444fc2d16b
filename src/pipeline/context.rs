//! Pipeline context: work items, bounded queues and the thread handles of a running pipeline.

use crossbeam_channel::{Receiver, Sender, bounded};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::JoinHandle;

use crate::bpipe::{BufferPool, PipeReader};
use crate::engine::metrics::Metrics;
use crate::engine::progress::ProgressBar;
use crate::pipeline::completion::{CompletionBarrier, PendingToken};
use crate::pipeline::sink::ResultSink;
use crate::types::{Opts, RunSummary};

/// A filename accepted by the feeder, with its completion token.
#[derive(Debug)]
pub struct PendingFile {
    pub path: PathBuf,
    pub token: PendingToken,
}

/// Reader half of a file's pipe, published to the hashers.
/// Exactly one per accepted filename that could be opened.
pub struct ItemToHash {
    pub reader: PipeReader,
    pub path: PathBuf,
    pub token: PendingToken,
}

/// Shared state every worker needs.
#[derive(Clone)]
pub struct WorkerContext {
    pub pool: Arc<BufferPool>,
    pub metrics: Arc<dyn Metrics>,
    pub sink: Arc<dyn ResultSink>,
    pub opts: Arc<Opts>,
    pub tally: Arc<RunTally>,
    pub progress: Option<ProgressBar>,
}

/// Per-run outcome counts, bumped by workers before they drop a file's token.
#[derive(Debug, Default)]
pub struct RunTally {
    hashed: AtomicUsize,
    failed: AtomicUsize,
}

impl RunTally {
    pub fn hashed(&self) {
        self.hashed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn summary(&self) -> RunSummary {
        let hashed = self.hashed.load(Ordering::Relaxed);
        let failed = self.failed.load(Ordering::Relaxed);
        RunSummary {
            files: hashed + failed,
            hashed,
            failed,
        }
    }
}

/// Filename queue (feeder → readers) and work queue (readers → hashers). Both bounded:
/// a full queue blocks the sender, an empty one blocks the receiver.
pub struct PipelineChannels {
    pub filename_tx: Sender<PendingFile>,
    pub filename_rx: Receiver<PendingFile>,
    pub work_tx: Sender<ItemToHash>,
    pub work_rx: Receiver<ItemToHash>,
    pub barrier: Arc<CompletionBarrier>,
}

pub fn create_pipeline_channels(opts: &Opts) -> PipelineChannels {
    let (filename_tx, filename_rx) = bounded::<PendingFile>(opts.filename_queue_cap);
    let (work_tx, work_rx) = bounded::<ItemToHash>(opts.queue_cap);
    PipelineChannels {
        filename_tx,
        filename_rx,
        work_tx,
        work_rx,
        barrier: CompletionBarrier::new(),
    }
}

/// Handles for a started pipeline. Feed through `filename_tx`, then
/// [`shutdown_pipeline_handles`](crate::pipeline::shutdown_pipeline_handles).
pub struct PipelineHandles {
    pub filename_tx: Sender<PendingFile>,
    pub barrier: Arc<CompletionBarrier>,
    pub tally: Arc<RunTally>,
    pub progress: Option<ProgressBar>,
    pub reader_handles: Vec<JoinHandle<()>>,
    pub hasher_handles: Vec<JoinHandle<()>>,
}
