//! Hasher workers: drain published pipes through a digest and emit results.

use crossbeam_channel::Receiver;
use log::error;
use std::thread::{self, JoinHandle};

use crate::engine::digest::digest_reader;
use crate::engine::progress::update_progress_bar;
use crate::pipeline::context::{ItemToHash, WorkerContext};
use crate::types::HashRecord;

/// Single hasher: take items until every reader has dropped its sender.
fn hasher_worker_loop(work_rx: Receiver<ItemToHash>, ctx: WorkerContext) {
    while let Ok(item) = work_rx.recv() {
        hash_item(item, &ctx);
        if let Some(pb) = &ctx.progress {
            update_progress_bar(pb, 1);
        }
    }
}

pub fn spawn_hasher_workers(
    work_rx: Receiver<ItemToHash>,
    ctx: &WorkerContext,
    num_threads: usize,
) -> Vec<JoinHandle<()>> {
    (0..num_threads)
        .map(|_| {
            let work_rx = work_rx.clone();
            let ctx = ctx.clone();
            thread::spawn(move || hasher_worker_loop(work_rx, ctx))
        })
        .collect()
}

/// Hash one published pipe to end of stream. Emits a digest or a failure, then completes
/// the item's token. Returns true on success.
pub fn hash_item(item: ItemToHash, ctx: &WorkerContext) -> bool {
    let ItemToHash {
        reader,
        path,
        token,
    } = item;

    ctx.metrics.hasher_started();
    let result = digest_reader(ctx.opts.algorithm, reader, ctx.opts.block_size, |n| {
        ctx.metrics.bytes_hashed(n as u64)
    });
    let ok = match result {
        Ok((digest, bytes)) => {
            ctx.sink.digest(&HashRecord {
                digest,
                path,
                bytes,
            });
            ctx.tally.hashed();
            true
        }
        Err(e) => {
            error!("Failed hashing {}: {}", path.display(), e);
            ctx.metrics.file_failed();
            ctx.sink.failure(&path, &e.to_string());
            ctx.tally.failed();
            false
        }
    };
    ctx.metrics.hasher_done();
    // Output is written before the barrier can see this file as done.
    drop(token);
    ok
}
