use anyhow::{Result, anyhow};
use log::{debug, warn};
use std::sync::Arc;

use crate::bpipe::BufferPool;
use crate::engine::metrics::Metrics;
use crate::engine::progress::{create_counter, finish_counter};
use crate::pipeline;
use crate::pipeline::context::{PendingFile, RunTally, WorkerContext};
use crate::pipeline::sink::ResultSink;
use crate::pipeline::source::FilenameSource;
use crate::types::{Opts, RunSummary};

/// Build the buffer pool and start the fixed reader and hasher pools.
/// Returns handles; caller feeds `filename_tx` and then calls [`shutdown_pipeline_handles`].
pub fn start_pipeline(
    opts: &Opts,
    sink: Arc<dyn ResultSink>,
    metrics: Arc<dyn Metrics>,
) -> Result<pipeline::PipelineHandles> {
    opts.validate()?;
    debug!(
        "buffer pool: {} x {} bytes ({} bytes max); {} readers, {} hashers, work queue {}",
        opts.max_blocks,
        opts.block_size,
        opts.max_buffer_bytes(),
        opts.readers,
        opts.hashers,
        opts.queue_cap
    );

    let pool = BufferPool::with_metrics(opts.block_size, opts.max_blocks, Arc::clone(&metrics));
    let channels = pipeline::create_pipeline_channels(opts);
    let tally = Arc::new(RunTally::default());
    let progress = opts.progress.then(|| create_counter("Hashed"));

    let ctx = WorkerContext {
        pool,
        metrics,
        sink,
        opts: Arc::new(opts.clone()),
        tally: Arc::clone(&tally),
        progress: progress.clone(),
    };

    let hasher_handles = pipeline::spawn_hasher_workers(channels.work_rx, &ctx, opts.hashers);
    let reader_handles = pipeline::spawn_reader_workers(
        channels.filename_rx,
        &channels.work_tx,
        &ctx,
        opts.readers,
    );

    // Dropping the last sender closes the work queue once readers exit, so hashers exit.
    drop(channels.work_tx);

    Ok(pipeline::PipelineHandles {
        filename_tx: channels.filename_tx,
        barrier: channels.barrier,
        tally,
        progress,
        reader_handles,
        hasher_handles,
    })
}

/// Feed every name from `source`, counting each on the barrier before it is queued.
/// Returns the number of names fed. Blocks while the filename queue is full.
pub fn feed_filenames(
    handles: &pipeline::PipelineHandles,
    source: FilenameSource,
) -> Result<usize> {
    let mut fed = 0_usize;
    for name in source.names() {
        let path = name.map_err(|e| anyhow!("reading filenames: {}", e))?;
        let token = handles.barrier.add();
        handles
            .filename_tx
            .send(PendingFile { path, token })
            .map_err(|_| anyhow!("filename queue closed: all reader threads exited"))?;
        fed += 1;
    }
    Ok(fed)
}

/// Close the filename queue, wait for every fed file to complete, then join readers and hashers.
/// Every fed file ends up either hashed or failed, so the summary's `files` is their sum.
pub fn shutdown_pipeline_handles(handles: pipeline::PipelineHandles) -> Result<RunSummary> {
    let pipeline::PipelineHandles {
        filename_tx,
        barrier,
        tally,
        progress,
        reader_handles,
        hasher_handles,
    } = handles;

    drop(filename_tx);
    barrier.wait();

    for h in reader_handles {
        h.join().map_err(|_| anyhow!("reader thread panicked"))?;
    }
    for h in hasher_handles {
        h.join().map_err(|_| anyhow!("hasher thread panicked"))?;
    }

    let summary = tally.summary();
    debug!("all {} files complete", summary.files);
    if let Some(pb) = &progress {
        finish_counter(pb, summary.files);
    }
    Ok(summary)
}

/// Main orchestrator: filenames → readers (sequential I/O) → pipes → hashers → `sink`.
/// Returns once every fed file has produced a digest or a failure.
pub fn run_pipeline(
    opts: &Opts,
    source: FilenameSource,
    sink: Arc<dyn ResultSink>,
    metrics: Arc<dyn Metrics>,
) -> Result<RunSummary> {
    let handles = start_pipeline(opts, sink, metrics)?;
    let fed = feed_filenames(&handles, source);
    if let Err(e) = &fed {
        warn!("stopped feeding filenames: {}", e);
    }
    // Drain what was already fed even when feeding failed part way.
    let summary = shutdown_pipeline_handles(handles)?;
    fed?;
    Ok(summary)
}
