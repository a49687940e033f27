//! Incremental decoder for newline-delimited JSON bodies.
//!
//! The store streams one JSON document per line (`application/x-ndjson`), not
//! a JSON array. [`NdjsonDecoder`] is a pull-based iterator over any
//! [`BufRead`]: it reads one line per `next()` call and never holds more than
//! the current line in memory.
//!
//! ## Line Rules
//!
//! - Lines are split on `\n`; a trailing `\r` and surrounding whitespace
//!   (Unicode whitespace included, e.g. U+00A0) are trimmed.
//! - Lines that are empty after trimming are skipped (not an error).
//! - The last line is decoded even without a trailing newline.
//!
//! ## Failure Semantics
//!
//! - A line that is not valid JSON for `T` yields [`ClientError::Decode`] with
//!   the offending line; elements yielded before it stay valid.
//! - A read failure yields [`ClientError::Transport`].
//! - Either failure ends the sequence: the decoder is fused and cannot be
//!   restarted. Issue a fresh request to retry.
//!
//! ## Usage
//!
//! ```
//! use eventstore_events::NdjsonDecoder;
//! use serde_json::Value;
//!
//! let body = "{\"a\":1}\n\n{\"a\":2}\n";
//! let values: Vec<Value> = NdjsonDecoder::new(body.as_bytes())
//!     .collect::<Result<_, _>>()
//!     .unwrap();
//! assert_eq!(values.len(), 2);
//! ```

use std::io::{BufRead, BufReader, Read};
use std::iter::FusedIterator;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;

use eventstore_core::{ClientError, ClientResult};

/// Pull-based NDJSON decoder yielding one `T` per non-blank line.
pub struct NdjsonDecoder<R, T> {
    reader: R,
    line: Vec<u8>,
    line_number: usize,
    decoded: usize,
    finished: bool,
    _marker: PhantomData<fn() -> T>,
}

impl<R, T> NdjsonDecoder<R, T>
where
    R: BufRead,
    T: DeserializeOwned,
{
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: Vec::new(),
            line_number: 0,
            decoded: 0,
            finished: false,
            _marker: PhantomData,
        }
    }

    /// 1-based number of the last line read (blank lines included).
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Number of elements yielded so far.
    pub fn decoded(&self) -> usize {
        self.decoded
    }

    /// True once the body is exhausted or a failure was returned.
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl<Rd, T> NdjsonDecoder<BufReader<Rd>, T>
where
    Rd: Read,
    T: DeserializeOwned,
{
    /// Wrap an unbuffered reader (e.g. a response body).
    pub fn from_reader(reader: Rd) -> Self {
        Self::new(BufReader::new(reader))
    }
}

impl<R, T> Iterator for NdjsonDecoder<R, T>
where
    R: BufRead,
    T: DeserializeOwned,
{
    type Item = ClientResult<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        loop {
            self.line.clear();
            let read = match self.reader.read_until(b'\n', &mut self.line) {
                Ok(read) => read,
                Err(err) => {
                    self.finished = true;
                    tracing::debug!(
                        line_number = self.line_number,
                        error = %err,
                        "NDJSON body read failed"
                    );
                    return Some(Err(ClientError::transport(err)));
                }
            };

            if read == 0 {
                self.finished = true;
                tracing::debug!(
                    lines = self.line_number,
                    decoded = self.decoded,
                    "NDJSON body exhausted"
                );
                return None;
            }

            self.line_number += 1;
            let trimmed = trim_line(&self.line);
            if trimmed.is_empty() {
                continue;
            }

            return match serde_json::from_slice::<T>(trimmed) {
                Ok(value) => {
                    self.decoded += 1;
                    Some(Ok(value))
                }
                Err(source) => {
                    let text = String::from_utf8_lossy(trimmed).into_owned();
                    self.finished = true;
                    tracing::debug!(
                        line_number = self.line_number,
                        error = %source,
                        "malformed NDJSON line"
                    );
                    Some(Err(ClientError::decode(text, source)))
                }
            };
        }
    }
}

/// Trim Unicode whitespace when the line is valid UTF-8, ASCII whitespace otherwise.
fn trim_line(line: &[u8]) -> &[u8] {
    match std::str::from_utf8(line) {
        Ok(text) => text.trim().as_bytes(),
        Err(_) => line.trim_ascii(),
    }
}

impl<R, T> FusedIterator for NdjsonDecoder<R, T>
where
    R: BufRead,
    T: DeserializeOwned,
{
}

impl<R, T> core::fmt::Debug for NdjsonDecoder<R, T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("NdjsonDecoder")
            .field("line_number", &self.line_number)
            .field("decoded", &self.decoded)
            .field("finished", &self.finished)
            .finish()
    }
}
