//! Streaming digests used by hasher workers.

use md5::{Digest, Md5};
use serde::Deserialize;
use std::io::{self, Read};

/// Digest algorithm for a run. Md5 matches `md5sum` output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    #[default]
    Md5,
    Blake3,
}

impl HashAlgorithm {
    /// Fresh accumulator for one file.
    pub fn hasher(self) -> Box<dyn StreamDigest> {
        match self {
            HashAlgorithm::Md5 => Box::new(Md5::new()),
            HashAlgorithm::Blake3 => Box::new(blake3::Hasher::new()),
        }
    }
}

/// Opaque streaming digest sink.
pub trait StreamDigest: Send {
    fn update(&mut self, data: &[u8]);
    /// Consume the accumulator and return the lowercase hex digest.
    fn finish_hex(self: Box<Self>) -> String;
}

impl StreamDigest for Md5 {
    fn update(&mut self, data: &[u8]) {
        Digest::update(self, data);
    }

    fn finish_hex(self: Box<Self>) -> String {
        format!("{:x}", self.finalize())
    }
}

impl StreamDigest for blake3::Hasher {
    fn update(&mut self, data: &[u8]) {
        blake3::Hasher::update(self, data);
    }

    fn finish_hex(self: Box<Self>) -> String {
        self.finalize().to_hex().to_string()
    }
}

/// Stream `reader` to end through a digest. Returns `(hex, bytes)`.
/// `on_chunk` sees each chunk length (used for hashed-bytes metrics).
pub fn digest_reader<R, F>(
    algorithm: HashAlgorithm,
    mut reader: R,
    scratch_len: usize,
    mut on_chunk: F,
) -> io::Result<(String, u64)>
where
    R: Read,
    F: FnMut(usize),
{
    let mut hasher = algorithm.hasher();
    let mut scratch = vec![0u8; scratch_len.max(1)];
    let mut total = 0u64;
    loop {
        let n = match reader.read(&mut scratch) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&scratch[..n]);
        on_chunk(n);
        total += n as u64;
    }
    Ok((hasher.finish_hex(), total))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn md5_of_hello() {
        let (hex, n) = digest_reader(HashAlgorithm::Md5, &b"hello\n"[..], 4, |_| {}).unwrap();
        assert_eq!(hex, "b1946ac92492d2347c6235b4d2611184");
        assert_eq!(n, 6);
    }

    #[test]
    fn md5_of_empty() {
        let (hex, n) = digest_reader(HashAlgorithm::Md5, &b""[..], 16, |_| {}).unwrap();
        assert_eq!(hex, "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(n, 0);
    }

    #[test]
    fn blake3_matches_one_shot() {
        let data = vec![7u8; 10_000];
        let (hex, _) = digest_reader(HashAlgorithm::Blake3, &data[..], 333, |_| {}).unwrap();
        assert_eq!(hex, blake3::hash(&data).to_hex().to_string());
    }

    #[test]
    fn chunk_callback_sums_to_total() {
        let data = vec![1u8; 1000];
        let mut seen = 0usize;
        let (_, n) = digest_reader(HashAlgorithm::Md5, &data[..], 64, |c| seen += c).unwrap();
        assert_eq!(seen as u64, n);
    }
}
