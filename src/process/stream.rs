//! Bounded reads over a child's output pipes.
//!
//! Each output channel is wrapped in an [`OutputReader`] that performs one
//! fixed-size read at a time. The reader travels inside the resulting event,
//! so at most one read per channel can ever be in flight: re-issuing a read
//! requires the reader back, and only the event consumer has it.

use std::fmt;
use std::io;

use tokio::io::{AsyncRead, AsyncReadExt};

/// Fixed buffer size for one bounded read.
pub const READ_CHUNK_BYTES: usize = 4096;

/// Which output pipe a reader drains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamSource {
    Stdout,
    Stderr,
}

impl fmt::Display for StreamSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamSource::Stdout => f.write_str("stdout"),
            StreamSource::Stderr => f.write_str("stderr"),
        }
    }
}

/// Outcome of one bounded read.
#[derive(Debug)]
pub enum StreamRead {
    /// Bytes arrived; the reader comes back with the event so the next read
    /// can be issued on the same channel.
    Chunk { text: String, reader: OutputReader },
    /// The channel is exhausted: clean end-of-stream (`error: None`) or a
    /// read failure. The reader is consumed either way.
    End {
        source: StreamSource,
        error: Option<io::Error>,
    },
}

/// One output channel plus the undecoded tail of the previous read.
///
/// Child output is treated as UTF-8 text. A multi-byte sequence can land
/// split across two reads; the incomplete tail is carried into the next
/// read's decode so concatenating chunk texts reproduces the child's byte
/// stream exactly. Invalid sequences decode to U+FFFD.
pub struct OutputReader {
    source: StreamSource,
    inner: Box<dyn AsyncRead + Send + Unpin>,
    carry: Vec<u8>,
}

impl OutputReader {
    pub fn new(source: StreamSource, reader: impl AsyncRead + Send + Unpin + 'static) -> Self {
        Self {
            source,
            inner: Box::new(reader),
            carry: Vec::new(),
        }
    }

    pub fn source(&self) -> StreamSource {
        self.source
    }

    /// Performs one bounded read, consuming the reader. It comes back inside
    /// [`StreamRead::Chunk`] if the channel may still produce data.
    pub async fn read_chunk(mut self) -> StreamRead {
        let mut buf = [0u8; READ_CHUNK_BYTES];
        match self.inner.read(&mut buf).await {
            Ok(0) => {
                if self.carry.is_empty() {
                    StreamRead::End {
                        source: self.source,
                        error: None,
                    }
                } else {
                    // The stream ended mid-sequence; flush the leftover as
                    // replacement text. The next read reports end-of-stream.
                    let text = String::from_utf8_lossy(&self.carry).into_owned();
                    self.carry.clear();
                    StreamRead::Chunk { text, reader: self }
                }
            }
            Ok(n) => {
                let text = self.decode(&buf[..n]);
                StreamRead::Chunk { text, reader: self }
            }
            Err(e) => StreamRead::End {
                source: self.source,
                error: Some(e),
            },
        }
    }

    /// Decodes `bytes` prefixed by any carried-over tail. An incomplete
    /// multi-byte sequence at the end is stashed for the next call; invalid
    /// bytes become U+FFFD.
    fn decode(&mut self, bytes: &[u8]) -> String {
        let mut input = std::mem::take(&mut self.carry);
        input.extend_from_slice(bytes);

        let mut out = String::with_capacity(input.len());
        let mut pos = 0;
        while pos < input.len() {
            match std::str::from_utf8(&input[pos..]) {
                Ok(valid) => {
                    out.push_str(valid);
                    pos = input.len();
                }
                Err(err) => {
                    let valid_len = err.valid_up_to();
                    if let Ok(valid) = std::str::from_utf8(&input[pos..pos + valid_len]) {
                        out.push_str(valid);
                    }
                    pos += valid_len;
                    match err.error_len() {
                        // Definitely invalid: replace and skip.
                        Some(bad) => {
                            out.push('\u{FFFD}');
                            pos += bad;
                        }
                        // Possibly the start of a sequence the next read
                        // completes: carry it over.
                        None => {
                            self.carry = input[pos..].to_vec();
                            return out;
                        }
                    }
                }
            }
        }
        out
    }
}

impl fmt::Debug for OutputReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputReader")
            .field("source", &self.source)
            .field("carry_len", &self.carry.len())
            .finish_non_exhaustive()
    }
}
