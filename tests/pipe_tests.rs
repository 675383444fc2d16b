//! Buffered pipe tests: round trips across chunk sizes, ordering, close and buffer reclamation.

use seekmin::bpipe::{BufferPool, buffered_pipe};
use std::io::{self, Read, Write};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

const STREAM: &[u8] = b"some io.Reader stream to be read\n";

/// Write `data` in `write_chunk` pieces on one thread while reading `read_chunk` at a time on this one.
fn round_trip(
    data: &[u8],
    block_size: usize,
    max_blocks: usize,
    write_chunk: usize,
    read_chunk: usize,
) -> Vec<u8> {
    let pool = BufferPool::new(block_size, max_blocks);
    let (mut r, mut w) = buffered_pipe(&pool);
    let src = data.to_vec();
    let writer = thread::spawn(move || {
        for chunk in src.chunks(write_chunk) {
            w.write_all(chunk).unwrap();
        }
        w.close();
    });

    let mut out = Vec::new();
    let mut buf = vec![0u8; read_chunk];
    loop {
        let n = r.read(&mut buf).unwrap();
        if n == 0 {
            break;
        }
        assert!(n <= read_chunk);
        out.extend_from_slice(&buf[..n]);
    }
    writer.join().unwrap();
    assert!(pool.peak_outstanding() <= max_blocks);
    assert_eq!(pool.outstanding(), 0);
    out
}

#[test]
fn test_new_pipe() {
    let pool = BufferPool::new(100, 4);
    let (_r, w) = buffered_pipe(&pool);
    w.close();
    assert_eq!(pool.outstanding(), 0);
}

#[test]
fn test_read_write_large_read_large_write() {
    assert_eq!(round_trip(STREAM, 100, 4, 8, 8), STREAM);
}

#[test]
fn test_read_write_small_read_large_write() {
    assert_eq!(round_trip(STREAM, 100, 4, 8, 2), STREAM);
}

#[test]
fn test_read_write_large_read_small_write() {
    assert_eq!(round_trip(STREAM, 100, 4, 2, 8), STREAM);
}

#[test]
fn test_read_write_small_read_small_write() {
    assert_eq!(round_trip(STREAM, 100, 4, 2, 2), STREAM);
}

#[test]
fn test_ordering_across_buffer_boundaries() {
    // Buffers smaller than either chunk size, and a single-buffer pool.
    let data: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
    assert_eq!(round_trip(&data, 3, 1, 8, 2), data);
    assert_eq!(round_trip(&data, 3, 1, 2, 8), data);
    assert_eq!(round_trip(&data, 7, 2, 1000, 13), data);
}

#[test]
fn test_empty_stream() {
    assert!(round_trip(b"", 16, 1, 4, 4).is_empty());
}

#[test]
fn test_serial_write_then_read_with_io_copy() {
    let pool = BufferPool::new(16, 64);
    let (mut r, mut w) = buffered_pipe(&pool);
    let n = io::copy(&mut &STREAM[..], &mut w).unwrap();
    assert_eq!(n, STREAM.len() as u64);
    w.close();

    let mut out = Vec::new();
    let n = io::copy(&mut r, &mut out).unwrap();
    assert_eq!(n, STREAM.len() as u64);
    assert_eq!(out, STREAM);
}

#[test]
fn test_read_from_fills_whole_buffers() {
    let pool = BufferPool::new(8, 16);
    let (_r, mut w) = buffered_pipe(&pool);
    let data = vec![9u8; 20];
    assert_eq!(w.read_from(&data[..]).unwrap(), 20);
    // 8 + 8 + 4 bytes: three buffers queued, nothing wasted on tiny fills.
    assert_eq!(pool.outstanding(), 3);
    w.close();
}

#[test]
fn test_close_wakes_blocked_reader_with_eof() {
    let pool = BufferPool::new(16, 2);
    let (mut r, w) = buffered_pipe(&pool);
    let (tx, rx) = mpsc::channel();
    let reader = thread::spawn(move || {
        let mut buf = [0u8; 8];
        let first = r.read(&mut buf).unwrap();
        let second = r.read(&mut buf).unwrap();
        tx.send((first, second)).unwrap();
    });
    thread::sleep(Duration::from_millis(50));
    w.close();
    let (first, second) = rx
        .recv_timeout(Duration::from_secs(10))
        .expect("reader hung after close");
    assert_eq!((first, second), (0, 0));
    reader.join().unwrap();
}

#[test]
fn test_read_after_close_returns_eof_immediately() {
    let pool = BufferPool::new(16, 2);
    let (mut r, w) = buffered_pipe(&pool);
    w.close();
    let mut buf = [0u8; 4];
    assert_eq!(r.read(&mut buf).unwrap(), 0);
}

#[test]
fn test_writer_error_reaches_reader() {
    struct FailingSource {
        sent: bool,
    }
    impl Read for FailingSource {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.sent {
                return Err(io::Error::other("device error"));
            }
            self.sent = true;
            buf[..3].copy_from_slice(b"abc");
            Ok(3)
        }
    }

    let pool = BufferPool::new(16, 4);
    let (mut r, mut w) = buffered_pipe(&pool);
    let err = w.read_from(FailingSource { sent: false }).unwrap_err();
    assert_eq!(err.to_string(), "device error");
    w.close_with_error(err);

    let mut out = Vec::new();
    let err = r.read_to_end(&mut out).unwrap_err();
    assert_eq!(out, b"abc");
    assert_eq!(err.to_string(), "device error");
    drop(r);
    assert_eq!(pool.outstanding(), 0);
}

#[test]
fn test_buffer_reclamation_bounded_by_capacity() {
    let capacity = 3;
    let block = 32;
    let pool = BufferPool::new(block, capacity);
    let data: Vec<u8> = (0..(2 * block) as u8).collect();

    for _ in 0..10 {
        let (mut r, mut w) = buffered_pipe(&pool);
        w.write_all(&data).unwrap();
        w.close();
        let mut out = Vec::new();
        r.read_to_end(&mut out).unwrap();
        assert_eq!(out, data);
        assert_eq!(pool.outstanding(), 0);
    }
    assert!(pool.peak_outstanding() <= capacity);
}

#[test]
fn test_concurrent_pipes_share_pool_within_capacity() {
    let capacity = 4;
    let pool = BufferPool::new(64, capacity);
    let data: Vec<u8> = (0..50_000u32).map(|i| (i % 253) as u8).collect();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let (mut r, mut w) = buffered_pipe(&pool);
            let src = data.clone();
            let writer = thread::spawn(move || {
                w.read_from(&src[..]).unwrap();
                w.close();
            });
            let reader = thread::spawn(move || {
                let mut out = Vec::new();
                r.read_to_end(&mut out).unwrap();
                out
            });
            (writer, reader)
        })
        .collect();

    for (writer, reader) in handles {
        writer.join().unwrap();
        assert_eq!(reader.join().unwrap(), data);
    }
    assert!(pool.peak_outstanding() <= capacity);
    assert_eq!(pool.outstanding(), 0);
}
