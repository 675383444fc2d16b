//! Reader workers: open each file, publish its pipe, then copy the file into the pipe.
//!
//! With one reader, physical reads happen strictly in sequence, which keeps seeks down on
//! spinning disks. Hashing of the same file overlaps the copy because the pipe is published
//! before the first byte is read.

use crossbeam_channel::{Receiver, SendError, Sender};
use log::{debug, error};
use std::fs::File;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crate::bpipe::buffered_pipe;
use crate::pipeline::context::{ItemToHash, PendingFile, WorkerContext};

/// Single reader: take filenames until the filename queue closes.
fn reader_worker_loop(
    filename_rx: Receiver<PendingFile>,
    work_tx: Sender<ItemToHash>,
    ctx: WorkerContext,
) {
    while let Ok(file) = filename_rx.recv() {
        read_file(file, &work_tx, &ctx);
    }
    drop(work_tx);
}

/// Spawn `num_threads` readers. Caller must drop its own `work_tx` afterwards so hashers exit
/// once every reader has finished.
pub fn spawn_reader_workers(
    filename_rx: Receiver<PendingFile>,
    work_tx: &Sender<ItemToHash>,
    ctx: &WorkerContext,
    num_threads: usize,
) -> Vec<JoinHandle<()>> {
    (0..num_threads)
        .map(|_| {
            let filename_rx = filename_rx.clone();
            let work_tx = work_tx.clone();
            let ctx = ctx.clone();
            thread::spawn(move || reader_worker_loop(filename_rx, work_tx, ctx))
        })
        .collect()
}

/// Process one filename. The token is either handed to the hasher inside the item or
/// dropped here on open failure.
pub fn read_file(file: PendingFile, work_tx: &Sender<ItemToHash>, ctx: &WorkerContext) {
    let PendingFile { path, token } = file;

    let src = match File::open(&path) {
        Ok(f) => f,
        Err(e) => {
            error!("{}: open failed: {}", path.display(), e);
            ctx.metrics.file_failed();
            ctx.tally.failed();
            ctx.sink.failure(&path, &e.to_string());
            return;
        }
    };

    let (reader, mut writer) = buffered_pipe(&ctx.pool);
    let item = ItemToHash {
        reader,
        path: path.clone(),
        token,
    };
    if let Err(SendError(item)) = work_tx.send(item) {
        error!("{}: work queue closed, not hashed", path.display());
        ctx.metrics.file_failed();
        ctx.tally.failed();
        ctx.sink.failure(&path, "work queue closed");
        writer.close();
        drop(item);
        return;
    }

    let start = Instant::now();
    match writer.read_from(src) {
        Ok(bytes) => {
            let elapsed = start.elapsed();
            ctx.metrics.file_read(bytes, elapsed);
            debug!("read {} ({} bytes in {:?})", path.display(), bytes, elapsed);
            writer.close();
        }
        Err(e) => {
            error!("Failed reading file {}: {}", path.display(), e);
            writer.close_with_error(e);
        }
    }
}
