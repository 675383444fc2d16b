//! Public types for the seekmin API and pipeline.

use anyhow::{Result, bail};
use serde::Deserialize;
use std::path::PathBuf;

use crate::engine::digest::HashAlgorithm;
use crate::utils::config::{BufferConsts, QueueCaps, WorkerThreadLimits};

/// Separator between filenames when names are read from a stream.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Delimiter {
    #[default]
    Newline,
    /// NUL byte, for use with `find -print0`.
    Nul,
}

impl Delimiter {
    pub fn byte(self) -> u8 {
        match self {
            Delimiter::Newline => b'\n',
            Delimiter::Nul => 0,
        }
    }
}

/// One successfully hashed file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HashRecord {
    /// Lowercase hex digest.
    pub digest: String,
    pub path: PathBuf,
    /// Bytes fed through the digest.
    pub bytes: u64,
}

impl HashRecord {
    /// Canonical `md5sum` output line, without the trailing newline.
    pub fn line(&self) -> String {
        format!("{}  {}", self.digest, self.path.display())
    }
}

/// Totals for one pipeline run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Filenames accepted by the feeder.
    pub files: usize,
    /// Files that produced a digest.
    pub hashed: usize,
    /// Files that failed to open, read or hash.
    pub failed: usize,
}

/// Full pipeline options (CLI, settings file and lib).
#[derive(Clone, Debug)]
pub struct Opts {
    /// Bytes per pooled buffer.
    pub block_size: usize,
    /// Maximum buffers outstanding across all pipes.
    pub max_blocks: usize,
    /// Reader pool size. One reader keeps disk access strictly sequential.
    pub readers: usize,
    /// Hasher pool size.
    pub hashers: usize,
    /// Capacity of the queue of published pipes.
    pub queue_cap: usize,
    /// Capacity of the queue of filenames waiting for a reader.
    pub filename_queue_cap: usize,
    /// Filename separator when reading names from a stream.
    pub delimiter: Delimiter,
    pub algorithm: HashAlgorithm,
    /// Debug logging.
    pub verbose: bool,
    /// Dump a JSON stats snapshot to stderr when the run ends.
    pub stats: bool,
    /// Show a progress counter of hashed files.
    pub progress: bool,
}

impl Default for Opts {
    fn default() -> Self {
        let limits = WorkerThreadLimits::current();
        Opts {
            block_size: BufferConsts::BLOCK_SIZE,
            max_blocks: BufferConsts::MAX_BLOCKS,
            readers: limits.readers,
            hashers: limits.hashers,
            queue_cap: QueueCaps::WORK_QUEUE,
            filename_queue_cap: QueueCaps::FILENAME_QUEUE,
            delimiter: Delimiter::default(),
            algorithm: HashAlgorithm::default(),
            verbose: false,
            stats: false,
            progress: false,
        }
    }
}

impl Opts {
    /// Reject sizes and counts that would make the pipeline unable to progress.
    pub fn validate(&self) -> Result<()> {
        let checks = [
            ("block_size", self.block_size),
            ("max_blocks", self.max_blocks),
            ("readers", self.readers),
            ("hashers", self.hashers),
            ("queue_cap", self.queue_cap),
            ("filename_queue_cap", self.filename_queue_cap),
        ];
        for (name, value) in checks {
            if value == 0 {
                bail!("{} must be greater than zero", name);
            }
        }
        // A published pipe only drains once a hasher takes it, so a reader beyond the
        // hasher count can block on the pool while every hasher waits on an open pipe.
        if self.readers > self.hashers {
            bail!(
                "readers ({}) must not exceed hashers ({})",
                self.readers,
                self.hashers
            );
        }
        Ok(())
    }

    /// Peak bytes the buffer pool may hold.
    pub fn max_buffer_bytes(&self) -> usize {
        self.block_size.saturating_mul(self.max_blocks)
    }
}
