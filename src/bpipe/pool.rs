//! Bounded pool of fixed-capacity byte buffers.
//!
//! At most `capacity` buffers are outstanding at any time; [`BufferPool::acquire`] blocks
//! until one is released. Released buffers go on a freelist and are reused, so a run never
//! allocates more than `capacity * buffer_size` bytes of buffer storage.
//!
//! Release is RAII: dropping a [`PooledBuf`] returns it. [`BufferPool::release`] is the same
//! operation spelled out. Ownership makes double release impossible.

use std::io::{self, Read};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use crate::engine::metrics::{Metrics, NoopMetrics};

#[derive(Debug, Default)]
struct PoolState {
    free: Vec<Vec<u8>>,
    outstanding: usize,
    peak: usize,
}

/// Fixed-capacity, blocking buffer pool. Share via `Arc<BufferPool>`.
pub struct BufferPool {
    buffer_size: usize,
    capacity: usize,
    state: Mutex<PoolState>,
    cv: Condvar,
    metrics: Arc<dyn Metrics>,
}

impl std::fmt::Debug for BufferPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferPool")
            .field("buffer_size", &self.buffer_size)
            .field("capacity", &self.capacity)
            .field("outstanding", &self.outstanding())
            .finish_non_exhaustive()
    }
}

impl BufferPool {
    /// Pool of `capacity` buffers of `buffer_size` bytes, without instrumentation.
    ///
    /// # Panics
    ///
    /// Panics if either argument is 0.
    pub fn new(buffer_size: usize, capacity: usize) -> Arc<Self> {
        Self::with_metrics(buffer_size, capacity, Arc::new(NoopMetrics))
    }

    /// Like [`BufferPool::new`], reporting acquire/release to `metrics`.
    pub fn with_metrics(buffer_size: usize, capacity: usize, metrics: Arc<dyn Metrics>) -> Arc<Self> {
        assert!(buffer_size > 0, "BufferPool buffer_size must be > 0");
        assert!(capacity > 0, "BufferPool capacity must be > 0");
        Arc::new(Self {
            buffer_size,
            capacity,
            state: Mutex::new(PoolState::default()),
            cv: Condvar::new(),
            metrics,
        })
    }

    /// Lock state with poison recovery; release runs in Drop and must not panic.
    fn lock(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Buffers acquired and not yet released. A snapshot; may be stale.
    pub fn outstanding(&self) -> usize {
        self.lock().outstanding
    }

    /// Bytes of buffer capacity currently outstanding.
    pub fn outstanding_bytes(&self) -> usize {
        self.outstanding() * self.buffer_size
    }

    /// Highest `outstanding()` value observed since creation.
    pub fn peak_outstanding(&self) -> usize {
        self.lock().peak
    }

    /// Take a buffer, blocking while `capacity` buffers are outstanding. No timeout.
    pub fn acquire(self: &Arc<Self>) -> PooledBuf {
        let mut st = self.lock();
        while st.outstanding >= self.capacity {
            st = self.cv.wait(st).unwrap_or_else(PoisonError::into_inner);
        }
        self.take(st)
    }

    /// Take a buffer only if one is available right now.
    pub fn try_acquire(self: &Arc<Self>) -> Option<PooledBuf> {
        let st = self.lock();
        if st.outstanding >= self.capacity {
            return None;
        }
        Some(self.take(st))
    }

    fn take(self: &Arc<Self>, mut st: MutexGuard<'_, PoolState>) -> PooledBuf {
        st.outstanding += 1;
        st.peak = st.peak.max(st.outstanding);
        let reused = st.free.pop();
        drop(st);

        let data = reused.unwrap_or_else(|| Vec::with_capacity(self.buffer_size));
        self.metrics.buffer_acquired(self.buffer_size);
        PooledBuf {
            data,
            pos: 0,
            pool: Arc::clone(self),
        }
    }

    /// Return a buffer to the pool. Equivalent to dropping it.
    pub fn release(&self, buf: PooledBuf) {
        debug_assert!(
            std::ptr::eq(self, Arc::as_ptr(&buf.pool)),
            "buffer released to a pool it was not acquired from"
        );
        drop(buf);
    }

    fn put_back(&self, mut data: Vec<u8>) {
        data.clear();
        let mut st = self.lock();
        debug_assert!(st.outstanding > 0, "BufferPool over-release");
        st.outstanding = st.outstanding.saturating_sub(1);
        st.free.push(data);
        drop(st);
        self.cv.notify_one();
        self.metrics.buffer_released(self.buffer_size);
    }
}

/// A buffer on loan from a [`BufferPool`]. Holds written bytes plus a read cursor.
pub struct PooledBuf {
    data: Vec<u8>,
    pos: usize,
    pool: Arc<BufferPool>,
}

impl std::fmt::Debug for PooledBuf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledBuf")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .finish()
    }
}

impl PooledBuf {
    /// Pool buffer size; the most bytes this buffer will hold.
    pub fn capacity(&self) -> usize {
        self.pool.buffer_size
    }

    /// Unread bytes.
    pub fn len(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Unread bytes as a slice.
    pub fn as_slice(&self) -> &[u8] {
        &self.data[self.pos..]
    }

    /// Fill from `src` until the buffer is full or `src` reports end of input.
    ///
    /// Bytes read before an error are kept; check [`PooledBuf::len`] after an `Err`.
    pub fn fill_from<R: Read + ?Sized>(&mut self, src: &mut R) -> io::Result<usize> {
        let cap = self.capacity();
        let start = self.data.len();
        self.data.resize(cap, 0);
        let mut filled = start;
        let result = loop {
            if filled == cap {
                break Ok(());
            }
            match src.read(&mut self.data[filled..]) {
                Ok(0) => break Ok(()),
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => break Err(e),
            }
        };
        self.data.truncate(filled);
        result.map(|()| filled - start)
    }

    /// Copy unread bytes into `out`, advancing the cursor. Returns bytes copied.
    pub fn read_into(&mut self, out: &mut [u8]) -> usize {
        let n = self.len().min(out.len());
        out[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        n
    }
}

impl Drop for PooledBuf {
    fn drop(&mut self) {
        self.pool.put_back(std::mem::take(&mut self.data));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn acquire_returns_empty_buffer_with_pool_capacity() {
        let pool = BufferPool::new(16, 2);
        let buf = pool.acquire();
        assert!(buf.is_empty());
        assert_eq!(buf.capacity(), 16);
        assert_eq!(pool.outstanding(), 1);
        assert_eq!(pool.outstanding_bytes(), 16);
    }

    #[test]
    fn try_acquire_fails_at_capacity() {
        let pool = BufferPool::new(8, 2);
        let a = pool.try_acquire().unwrap();
        let _b = pool.try_acquire().unwrap();
        assert!(pool.try_acquire().is_none());
        pool.release(a);
        assert!(pool.try_acquire().is_some());
    }

    #[test]
    fn released_buffer_is_reused_and_cleared() {
        let pool = BufferPool::new(8, 1);
        let mut buf = pool.acquire();
        buf.fill_from(&mut &b"abc"[..]).unwrap();
        assert_eq!(buf.as_slice(), b"abc");
        drop(buf);
        let buf = pool.acquire();
        assert!(buf.is_empty());
        assert_eq!(pool.peak_outstanding(), 1);
    }

    #[test]
    fn acquire_blocks_until_release() {
        let pool = BufferPool::new(8, 1);
        let held = pool.acquire();
        let p = Arc::clone(&pool);
        let waiter = thread::spawn(move || {
            let _buf = p.acquire();
        });
        thread::sleep(Duration::from_millis(50));
        assert!(!waiter.is_finished());
        drop(held);
        waiter.join().unwrap();
        assert_eq!(pool.outstanding(), 0);
    }

    #[test]
    fn fill_from_stops_at_capacity() {
        let pool = BufferPool::new(4, 1);
        let mut buf = pool.acquire();
        let mut src = &b"abcdef"[..];
        assert_eq!(buf.fill_from(&mut src).unwrap(), 4);
        assert_eq!(buf.as_slice(), b"abcd");
        assert_eq!(src, b"ef");

        let mut out = [0u8; 3];
        assert_eq!(buf.read_into(&mut out), 3);
        assert_eq!(&out, b"abc");
        assert_eq!(buf.len(), 1);
    }

    #[test]
    #[should_panic(expected = "capacity must be > 0")]
    fn zero_capacity_panics() {
        let _ = BufferPool::new(8, 0);
    }
}
