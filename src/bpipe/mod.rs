//! Buffered pipe: pooled buffers plus a single-producer/single-consumer byte stream.

pub mod pipe;
pub mod pool;

pub use pipe::{PipeReader, PipeWriter, buffered_pipe};
pub use pool::{BufferPool, PooledBuf};
