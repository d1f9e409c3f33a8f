//! Tag tokenizer.
//!
//! Splits a byte stream at every `<`. Each token is the text that appeared
//! before the next `<`, so after trimming it reads `tagname>value` (or just
//! `tagname>`). Splitting on `>` is left to the state machine.

use std::io::{self, Read};

const READ_CHUNK: usize = 8 * 1024;

/// Longest token [`TagTokens`] buffers before giving up on the stream.
pub const MAX_TOKEN_LEN: usize = 64 * 1024;

/// Outcome of one [`scan_tag`] step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scan<'a> {
    /// `token` is complete; drop `advance` bytes (token plus delimiter) from the buffer.
    Token { advance: usize, token: &'a [u8] },
    /// No `<` buffered yet and the stream is not exhausted.
    NeedMore,
    /// End of stream and nothing left to emit.
    Done,
}

/// Pure split step over the buffered bytes.
pub fn scan_tag(data: &[u8], at_eof: bool) -> Scan<'_> {
    if at_eof && data.is_empty() {
        return Scan::Done;
    }
    if let Some(idx) = data.iter().position(|b| *b == b'<') {
        return Scan::Token {
            advance: idx + 1,
            token: &data[..idx],
        };
    }
    if at_eof {
        return Scan::Token {
            advance: data.len(),
            token: data,
        };
    }
    Scan::NeedMore
}

/// Lazy, forward-only sequence of tag tokens read from `R`.
///
/// Memory is bounded by the token limit ([`MAX_TOKEN_LEN`] unless set with
/// [`TagTokens::with_limit`]); a longer token is reported as an
/// [`io::ErrorKind::InvalidData`] error. Any error is yielded once and ends the
/// sequence.
pub struct TagTokens<R> {
    reader: R,
    buffer: Vec<u8>,
    pos: usize,
    /// Bytes after `pos` already known to hold no `<`.
    scanned: usize,
    max_token: usize,
    eof: bool,
    failed: bool,
}

impl<R: Read> TagTokens<R> {
    pub fn new(reader: R) -> Self {
        Self::with_limit(reader, MAX_TOKEN_LEN)
    }

    pub fn with_limit(reader: R, max_token: usize) -> Self {
        Self {
            reader,
            buffer: Vec::with_capacity(READ_CHUNK),
            pos: 0,
            scanned: 0,
            max_token,
            eof: false,
            failed: false,
        }
    }

    fn fill(&mut self) -> io::Result<()> {
        // Compact: drop consumed bytes before growing the buffer.
        if self.pos > 0 {
            self.buffer.drain(..self.pos);
            self.pos = 0;
        }

        let start = self.buffer.len();
        self.buffer.resize(start + READ_CHUNK, 0);
        loop {
            match self.reader.read(&mut self.buffer[start..]) {
                Ok(read) => {
                    self.buffer.truncate(start + read);
                    if read == 0 {
                        self.eof = true;
                    }
                    return Ok(());
                }
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => {
                    self.buffer.truncate(start);
                    return Err(err);
                }
            }
        }
    }

    fn fail(&mut self, err: io::Error) -> Option<io::Result<String>> {
        self.failed = true;
        Some(Err(err))
    }

    fn too_long(&self) -> io::Error {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("tag token longer than {} bytes", self.max_token),
        )
    }
}

impl<R: Read> Iterator for TagTokens<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        loop {
            let window = &self.buffer[self.pos..];
            // Only bytes read since the last miss are searched.
            let (advance, len) = match scan_tag(&window[self.scanned..], self.eof) {
                Scan::Token { advance, token } => {
                    (self.scanned + advance, self.scanned + token.len())
                }
                Scan::Done if self.scanned == 0 => return None,
                Scan::Done => (self.scanned, self.scanned),
                Scan::NeedMore => {
                    self.scanned = window.len();
                    if self.scanned > self.max_token {
                        let err = self.too_long();
                        return self.fail(err);
                    }
                    if let Err(err) = self.fill() {
                        return self.fail(err);
                    }
                    continue;
                }
            };

            if len > self.max_token {
                let err = self.too_long();
                return self.fail(err);
            }
            let text = String::from_utf8_lossy(&window[..len]).into_owned();
            self.pos += advance;
            self.scanned = 0;
            return Some(Ok(text));
        }
    }
}
