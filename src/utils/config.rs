//! Application configuration constants.
//! Defaults and buffer sizing in one place.

use std::sync::OnceLock;

// ---- Package / paths (from CARGO_PKG_NAME, cached) ----

/// Package-derived names: built once from `CARGO_PKG_NAME`, then cached.
pub struct PackagePaths {
    pkg_name: &'static str,
    config_filename: String,
}

static PACKAGE_PATHS: OnceLock<PackagePaths> = OnceLock::new();

impl PackagePaths {
    /// Build and cache names from `CARGO_PKG_NAME`. Called once on first use.
    pub fn get() -> &'static PackagePaths {
        PACKAGE_PATHS.get_or_init(|| {
            let pkg = env!("CARGO_PKG_NAME");
            PackagePaths {
                pkg_name: pkg,
                config_filename: format!(".{pkg}.toml"),
            }
        })
    }

    pub fn pkg_name(&self) -> &'static str {
        self.pkg_name
    }

    /// Optional settings file looked up in the working directory (e.g. `.seekmin.toml`).
    pub fn config_filename(&self) -> &str {
        &self.config_filename
    }
}

// ---- Buffer pool ----

/// Buffer pool sizing. `block_size * max_blocks` is the peak pipe memory for a run.
pub struct BufferConsts;

impl BufferConsts {
    /// Bytes per pooled buffer. 64 KB.
    pub const BLOCK_SIZE: usize = 64 * 1024;
    /// Maximum number of pooled buffers outstanding at once.
    pub const MAX_BLOCKS: usize = 1024;
}

// ---- Worker threads ----

/// Reader/hasher pool sizes.
/// Use [`WorkerThreadLimits::current()`] to fill `hashers` from rayon; readers stay at one so disk access is sequential.
#[derive(Clone, Copy, Debug)]
pub struct WorkerThreadLimits {
    /// Reader threads (sequential file I/O).
    pub readers: usize,
    /// Hasher threads (CPU-bound digest work).
    pub hashers: usize,
}

impl Default for WorkerThreadLimits {
    fn default() -> Self {
        Self {
            readers: Self::READER_THREADS,
            hashers: Self::FLOOR_HASHER_THREADS,
        }
    }
}

impl WorkerThreadLimits {
    pub const READER_THREADS: usize = 1;
    pub const FLOOR_HASHER_THREADS: usize = 2;

    /// Build limits with `hashers` set from `rayon::current_num_threads()` (never below the floor).
    pub fn current() -> Self {
        Self {
            hashers: rayon::current_num_threads().max(Self::FLOOR_HASHER_THREADS),
            ..Self::default()
        }
    }
}

// ---- Queues ----

/// Bounded queue capacities between the feeder, readers and hashers.
pub struct QueueCaps;

impl QueueCaps {
    /// Published pipes waiting for a hasher. Full queue stalls readers.
    pub const WORK_QUEUE: usize = 64;
    /// Filenames waiting for a reader. Full queue stalls the feeder.
    pub const FILENAME_QUEUE: usize = 1024;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn package_paths_follow_crate_name() {
        let paths = PackagePaths::get();
        assert_eq!(paths.pkg_name(), "seekmin");
        assert_eq!(paths.config_filename(), ".seekmin.toml");
    }

    #[test]
    fn default_readers_never_exceed_hashers() {
        let limits = WorkerThreadLimits::current();
        assert!(limits.readers <= limits.hashers);
    }
}
