//! Process counters for reads, hashing and buffer usage.
//!
//! Components take an `Arc<dyn Metrics>` at construction instead of touching globals, so
//! tests can run with [`NoopMetrics`] or inspect a private [`Counters`].

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Increment operations called by the pool, readers and hashers.
pub trait Metrics: Send + Sync {
    /// One file fully copied into its pipe.
    fn file_read(&self, bytes: u64, elapsed: Duration);
    fn file_failed(&self);
    fn hasher_started(&self);
    fn hasher_done(&self);
    fn bytes_hashed(&self, bytes: u64);
    fn buffer_acquired(&self, size: usize);
    fn buffer_released(&self, size: usize);
}

/// Discards everything.
#[derive(Debug, Default)]
pub struct NoopMetrics;

impl Metrics for NoopMetrics {
    fn file_read(&self, _bytes: u64, _elapsed: Duration) {}
    fn file_failed(&self) {}
    fn hasher_started(&self) {}
    fn hasher_done(&self) {}
    fn bytes_hashed(&self, _bytes: u64) {}
    fn buffer_acquired(&self, _size: usize) {}
    fn buffer_released(&self, _size: usize) {}
}

/// Atomic counters. Names in [`StatsSnapshot`] follow the historical `/debug/vars` keys.
#[derive(Debug)]
pub struct Counters {
    birth: Instant,
    read_files: AtomicU64,
    read_bytes: AtomicU64,
    read_time_ns: AtomicU64,
    failed_files: AtomicU64,
    hasher_start: AtomicU64,
    hasher_done: AtomicU64,
    hashed_bytes: AtomicU64,
    // Gauges; released never exceeds acquired.
    buffers_acquired: AtomicU64,
    buffers_released: AtomicU64,
    bytes_acquired: AtomicU64,
    bytes_released: AtomicU64,
}

impl Default for Counters {
    fn default() -> Self {
        Self {
            birth: Instant::now(),
            read_files: AtomicU64::new(0),
            read_bytes: AtomicU64::new(0),
            read_time_ns: AtomicU64::new(0),
            failed_files: AtomicU64::new(0),
            hasher_start: AtomicU64::new(0),
            hasher_done: AtomicU64::new(0),
            hashed_bytes: AtomicU64::new(0),
            buffers_acquired: AtomicU64::new(0),
            buffers_released: AtomicU64::new(0),
            bytes_acquired: AtomicU64::new(0),
            bytes_released: AtomicU64::new(0),
        }
    }
}

/// Point-in-time copy of [`Counters`], serialisable for `--stats`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub seekmin_read_files: u64,
    pub seekmin_read_bytes: u64,
    pub seekmin_read_time: u64,
    pub seekmin_failed_files: u64,
    pub seekmin_hasher_start: u64,
    pub seekmin_hasher_done: u64,
    pub seekmin_hashed_bytes: u64,
    /// Buffers currently outstanding.
    pub bufman_buffers: u64,
    /// Bytes of buffer capacity currently outstanding.
    pub bufman_bytes: u64,
    /// Nanoseconds since the counters were created.
    pub uptime: u64,
}

impl Counters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let get = |c: &AtomicU64| c.load(Ordering::Relaxed);
        StatsSnapshot {
            seekmin_read_files: get(&self.read_files),
            seekmin_read_bytes: get(&self.read_bytes),
            seekmin_read_time: get(&self.read_time_ns),
            seekmin_failed_files: get(&self.failed_files),
            seekmin_hasher_start: get(&self.hasher_start),
            seekmin_hasher_done: get(&self.hasher_done),
            seekmin_hashed_bytes: get(&self.hashed_bytes),
            bufman_buffers: get(&self.buffers_acquired)
                .saturating_sub(get(&self.buffers_released)),
            bufman_bytes: get(&self.bytes_acquired).saturating_sub(get(&self.bytes_released)),
            uptime: self.birth.elapsed().as_nanos() as u64,
        }
    }

    /// Snapshot as pretty JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.snapshot())
    }
}

impl Metrics for Counters {
    fn file_read(&self, bytes: u64, elapsed: Duration) {
        self.read_files.fetch_add(1, Ordering::Relaxed);
        self.read_bytes.fetch_add(bytes, Ordering::Relaxed);
        self.read_time_ns
            .fetch_add(elapsed.as_nanos() as u64, Ordering::Relaxed);
    }

    fn file_failed(&self) {
        self.failed_files.fetch_add(1, Ordering::Relaxed);
    }

    fn hasher_started(&self) {
        self.hasher_start.fetch_add(1, Ordering::Relaxed);
    }

    fn hasher_done(&self) {
        self.hasher_done.fetch_add(1, Ordering::Relaxed);
    }

    fn bytes_hashed(&self, bytes: u64) {
        self.hashed_bytes.fetch_add(bytes, Ordering::Relaxed);
    }

    fn buffer_acquired(&self, size: usize) {
        self.buffers_acquired.fetch_add(1, Ordering::Relaxed);
        self.bytes_acquired.fetch_add(size as u64, Ordering::Relaxed);
    }

    fn buffer_released(&self, size: usize) {
        self.buffers_released.fetch_add(1, Ordering::Relaxed);
        self.bytes_released.fetch_add(size as u64, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_tracks_outstanding_buffers() {
        let c = Counters::new();
        c.buffer_acquired(100);
        c.buffer_acquired(100);
        c.buffer_released(100);
        let s = c.snapshot();
        assert_eq!(s.bufman_buffers, 1);
        assert_eq!(s.bufman_bytes, 100);
    }

    #[test]
    fn json_uses_debug_var_names() {
        let c = Counters::new();
        c.file_read(42, Duration::from_nanos(7));
        let json = c.to_json().unwrap();
        assert!(json.contains("\"seekmin_read_bytes\": 42"));
        assert!(json.contains("\"seekmin_read_time\": 7"));
        assert!(json.contains("\"uptime\""));
    }
}
