//! Filename sources: explicit paths, or delimited names on a byte stream.

use std::io::{self, BufRead};
use std::path::PathBuf;

use crate::types::Delimiter;

/// Where the feeder gets filenames.
pub enum FilenameSource {
    Paths(Vec<PathBuf>),
    Delimited {
        reader: Box<dyn BufRead>,
        delimiter: Delimiter,
    },
}

impl FilenameSource {
    /// Names from standard input.
    pub fn stdin(delimiter: Delimiter) -> Self {
        Self::delimited(io::stdin().lock(), delimiter)
    }

    pub fn delimited<R: BufRead + 'static>(reader: R, delimiter: Delimiter) -> Self {
        FilenameSource::Delimited {
            reader: Box::new(reader),
            delimiter,
        }
    }

    /// Explicit paths when given, otherwise standard input.
    pub fn from_args(paths: Vec<PathBuf>, delimiter: Delimiter) -> Self {
        if paths.is_empty() {
            Self::stdin(delimiter)
        } else {
            FilenameSource::Paths(paths)
        }
    }

    pub fn names(self) -> Box<dyn Iterator<Item = io::Result<PathBuf>>> {
        match self {
            FilenameSource::Paths(paths) => Box::new(paths.into_iter().map(Ok)),
            FilenameSource::Delimited { reader, delimiter } => Box::new(DelimitedNames {
                reader,
                delim: delimiter.byte(),
                done: false,
            }),
        }
    }
}

/// Splits a stream on a delimiter byte. Empty names are skipped; a final name without a
/// trailing delimiter is still yielded.
pub struct DelimitedNames<R> {
    reader: R,
    delim: u8,
    done: bool,
}

impl<R: BufRead> Iterator for DelimitedNames<R> {
    type Item = io::Result<PathBuf>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            let mut raw = Vec::new();
            match self.reader.read_until(self.delim, &mut raw) {
                Ok(0) => self.done = true,
                Ok(_) => {
                    if raw.last() == Some(&self.delim) {
                        raw.pop();
                    }
                    if !raw.is_empty() {
                        return Some(Ok(bytes_to_path(raw)));
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
        None
    }
}

#[cfg(unix)]
fn bytes_to_path(raw: Vec<u8>) -> PathBuf {
    use std::os::unix::ffi::OsStringExt;
    PathBuf::from(std::ffi::OsString::from_vec(raw))
}

#[cfg(not(unix))]
fn bytes_to_path(raw: Vec<u8>) -> PathBuf {
    PathBuf::from(String::from_utf8_lossy(&raw).into_owned())
}
