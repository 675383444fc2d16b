//! Single-producer/single-consumer byte pipe backed by pooled buffers.
//!
//! ```text
//!   PipeWriter ──▶ [VecDeque<PooledBuf>] ──▶ PipeReader
//!                  ├── writer acquires a buffer per fill (blocks when pool is exhausted)
//!                  ├── reader blocks while the queue is empty and the pipe is open
//!                  ├── reader releases each buffer once drained
//!                  └── close / close_with_error / writer drop → terminal state
//! ```
//!
//! The mutex guards only the queue structure and the terminal state. A buffer is filled by
//! the writer before it is queued and drained by the reader after it is dequeued, so the
//! bytes themselves are never shared.

use std::collections::VecDeque;
use std::io::{self, ErrorKind, Read, Write};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use super::pool::{BufferPool, PooledBuf};

/// Writer error kept for the reader. The first read that reaches it gets the original;
/// later reads get a copy with the same kind and message.
struct Failure {
    kind: ErrorKind,
    message: String,
    original: Option<io::Error>,
}

impl Failure {
    fn new(err: io::Error) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
            original: Some(err),
        }
    }

    fn take_error(&mut self) -> io::Error {
        self.original
            .take()
            .unwrap_or_else(|| io::Error::new(self.kind, self.message.clone()))
    }
}

enum Terminal {
    Open,
    Eof,
    Failed(Failure),
}

struct PipeState {
    pending: VecDeque<PooledBuf>,
    terminal: Terminal,
    reader_gone: bool,
}

struct Shared {
    pool: Arc<BufferPool>,
    state: Mutex<PipeState>,
    cv: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, PipeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn wait<'a>(&self, guard: MutexGuard<'a, PipeState>) -> MutexGuard<'a, PipeState> {
        self.cv.wait(guard).unwrap_or_else(PoisonError::into_inner)
    }

    /// Set the terminal state once and wake the reader. Later calls are ignored.
    fn finish(&self, terminal: Terminal) {
        let mut st = self.lock();
        if matches!(st.terminal, Terminal::Open) {
            st.terminal = terminal;
        }
        drop(st);
        self.cv.notify_all();
    }
}

/// Create a pipe whose buffers come from `pool`.
pub fn buffered_pipe(pool: &Arc<BufferPool>) -> (PipeReader, PipeWriter) {
    let shared = Arc::new(Shared {
        pool: Arc::clone(pool),
        state: Mutex::new(PipeState {
            pending: VecDeque::new(),
            terminal: Terminal::Open,
            reader_gone: false,
        }),
        cv: Condvar::new(),
    });
    (
        PipeReader {
            shared: Arc::clone(&shared),
            current: None,
        },
        PipeWriter {
            shared,
            closed: false,
        },
    )
}

/// Writing half. Appends whole buffers; closing consumes it.
pub struct PipeWriter {
    shared: Arc<Shared>,
    closed: bool,
}

impl PipeWriter {
    /// Copy `src` into the pipe until it is exhausted, one pooled buffer at a time.
    ///
    /// Each buffer is filled to capacity (or to end of input) before it is queued, so
    /// prefer this over `io::copy` which would queue one small buffer per chunk.
    /// A final empty buffer is released unused. On a read error, bytes read so far are
    /// queued, the error becomes the pipe's terminal state and is also returned. A later
    /// `close` does not clear it.
    pub fn read_from<R: Read>(&mut self, mut src: R) -> io::Result<u64> {
        let mut total = 0u64;
        loop {
            let mut buf = self.shared.pool.acquire();
            let filled = buf.fill_from(&mut src);
            let n = buf.len();
            let short = n < buf.capacity();
            if n == 0 {
                drop(buf);
            } else {
                total += n as u64;
                self.push(buf)?;
            }
            match filled {
                Err(e) => return Err(self.fail(e)),
                // A short fill means the source hit end of input.
                Ok(_) if short => return Ok(total),
                Ok(_) => {}
            }
        }
    }

    /// Store a copy of `err` as the terminal state and hand the original back.
    fn fail(&self, err: io::Error) -> io::Error {
        let stored = io::Error::new(err.kind(), err.to_string());
        self.shared.finish(Terminal::Failed(Failure::new(stored)));
        err
    }

    fn push(&self, buf: PooledBuf) -> io::Result<()> {
        let mut st = self.shared.lock();
        if st.reader_gone {
            return Err(io::Error::new(ErrorKind::BrokenPipe, "pipe reader dropped"));
        }
        st.pending.push_back(buf);
        drop(st);
        self.shared.cv.notify_one();
        Ok(())
    }

    /// Signal end of stream. A blocked reader wakes and sees EOF once the queue drains.
    pub fn close(mut self) {
        self.closed = true;
        self.shared.finish(Terminal::Eof);
    }

    /// Signal failure. The reader receives `err` after draining queued bytes.
    pub fn close_with_error(mut self, err: io::Error) {
        self.closed = true;
        self.shared.finish(Terminal::Failed(Failure::new(err)));
    }
}

impl Write for PipeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        self.read_from(buf).map(|n| n as usize)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for PipeWriter {
    fn drop(&mut self) {
        if !self.closed {
            self.shared.finish(Terminal::Failed(Failure::new(io::Error::new(
                ErrorKind::UnexpectedEof,
                "pipe writer dropped without close",
            ))));
        }
    }
}

/// Reading half. Drains queued buffers in write order and releases them to the pool.
pub struct PipeReader {
    shared: Arc<Shared>,
    // Dequeued buffer being drained; only this half touches it.
    current: Option<PooledBuf>,
}

impl PipeReader {
    /// Next queued buffer. With `block`, waits while the pipe is open and empty and
    /// returns the writer's error if it failed; without it, returns `None` instead.
    fn next_buffer(&mut self, block: bool) -> io::Result<Option<PooledBuf>> {
        let mut st = self.shared.lock();
        loop {
            if let Some(buf) = st.pending.pop_front() {
                return Ok(Some(buf));
            }
            if !block {
                return Ok(None);
            }
            match &mut st.terminal {
                Terminal::Open => {}
                Terminal::Eof => return Ok(None),
                Terminal::Failed(failure) => return Err(failure.take_error()),
            }
            st = self.shared.wait(st);
        }
    }
}

impl Read for PipeReader {
    /// Blocks only until at least one byte (or the terminal state) is available, then
    /// returns as many bytes as are already queued.
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        let mut cum = 0;
        while cum < out.len() {
            if self.current.is_none() {
                match self.next_buffer(cum == 0)? {
                    Some(buf) => self.current = Some(buf),
                    None => break,
                }
            }
            if let Some(buf) = self.current.as_mut() {
                cum += buf.read_into(&mut out[cum..]);
                if buf.is_empty() {
                    // Drained: dropping releases it to the pool.
                    self.current = None;
                }
            }
        }
        Ok(cum)
    }
}

impl Drop for PipeReader {
    fn drop(&mut self) {
        let mut st = self.shared.lock();
        st.reader_gone = true;
        let pending = std::mem::take(&mut st.pending);
        drop(st);
        drop(pending);
    }
}
