//! Where hasher results go.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::types::HashRecord;

/// Receives one call per file taken by a hasher or rejected by a reader. Called concurrently
/// from worker threads, in completion order.
pub trait ResultSink: Send + Sync {
    fn digest(&self, record: &HashRecord);
    fn failure(&self, path: &Path, error: &str);
}

/// Writes `<hex>  <filename>` lines. Failures are left to the log.
pub struct WriterSink<W: Write + Send> {
    out: Mutex<W>,
}

impl<W: Write + Send> WriterSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: Write + Send> ResultSink for WriterSink<W> {
    fn digest(&self, record: &HashRecord) {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        // Line-at-a-time so concurrent hashers never interleave within a line.
        if let Err(e) = writeln!(out, "{}", record.line()).and_then(|()| out.flush()) {
            log::error!("Failed writing digest for {}: {}", record.path.display(), e);
        }
    }

    fn failure(&self, _path: &Path, _error: &str) {}
}

/// Keeps every result in memory (lib callers and tests).
#[derive(Debug, Default)]
pub struct CollectingSink {
    digests: Mutex<Vec<HashRecord>>,
    failures: Mutex<Vec<(PathBuf, String)>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn digests(&self) -> Vec<HashRecord> {
        self.digests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn failures(&self) -> Vec<(PathBuf, String)> {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ResultSink for CollectingSink {
    fn digest(&self, record: &HashRecord) {
        self.digests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record.clone());
    }

    fn failure(&self, path: &Path, error: &str) {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((path.to_path_buf(), error.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writer_sink_prints_md5sum_lines() {
        let sink = WriterSink::new(Vec::new());
        sink.digest(&HashRecord {
            digest: "abc123".to_string(),
            path: PathBuf::from("dir/file.txt"),
            bytes: 3,
        });
        sink.failure(Path::new("missing"), "not found");
        let out = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(out, "abc123  dir/file.txt\n");
    }
}
