//! Byte-level reader beneath the header state machine and ASCII sample decoder.
//!
//! Two views of the same stream: raw bytes (magic, binary samples,
//! continuation look-ahead) and comment-filtered characters, where a `#`
//! starts a comment that is dropped through its terminating newline.

use std::io::{self, BufRead};

use log::warn;

use crate::error::{PnmError, read_error};

/// Default number of end-of-stream hits tolerated per session.
pub const DEFAULT_EOF_BUDGET: u32 = 100;

/// C `isspace` set: space, tab, newline, vertical tab, form feed, carriage return.
pub(crate) fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | 0x0b | 0x0c | b'\r')
}

pub(crate) struct Tokenizer<R> {
    inner: R,
    peeked: Option<u8>,
    eof_hits: u32,
    eof_budget: u32,
}

impl<R: BufRead> Tokenizer<R> {
    pub(crate) fn new(inner: R, eof_budget: u32) -> Self {
        Self {
            inner,
            peeked: None,
            eof_hits: 0,
            eof_budget,
        }
    }

    pub(crate) fn into_inner(self) -> R {
        self.inner
    }

    /// Push one byte back; the next raw or filtered read returns it first.
    pub(crate) fn unread(&mut self, b: u8) {
        debug_assert!(self.peeked.is_none());
        self.peeked = Some(b);
    }

    /// Next byte exactly as stored, `None` at end of stream.
    pub(crate) fn raw_byte(&mut self) -> Result<Option<u8>, PnmError> {
        if let Some(b) = self.peeked.take() {
            return Ok(Some(b));
        }
        loop {
            let first = match self.inner.fill_buf() {
                Ok(buf) => buf.first().copied(),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(PnmError::Io(e)),
            };
            if first.is_some() {
                self.inner.consume(1);
            }
            return Ok(first);
        }
    }

    /// Next character with `#` comments removed.
    ///
    /// `None` marks end of stream; each occurrence is logged and counted,
    /// and once the session budget is spent it becomes an error.
    pub(crate) fn next_char(&mut self) -> Result<Option<u8>, PnmError> {
        let mut in_comment = false;
        loop {
            let Some(b) = self.raw_byte()? else {
                self.note_eof()?;
                return Ok(None);
            };
            if b == b'#' {
                in_comment = true;
                continue;
            }
            if !in_comment {
                return Ok(Some(b));
            }
            if b == b'\n' {
                in_comment = false;
            }
        }
    }

    fn note_eof(&mut self) -> Result<(), PnmError> {
        self.eof_hits += 1;
        warn!(
            "unexpected end of stream ({} of {} tolerated)",
            self.eof_hits, self.eof_budget
        );
        if self.eof_hits > self.eof_budget {
            return Err(PnmError::UnexpectedEof);
        }
        Ok(())
    }

    /// Fill `buf` from the raw stream; a short read is an error.
    pub(crate) fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), PnmError> {
        let Some((first, rest)) = buf.split_first_mut() else {
            return Ok(());
        };
        match self.peeked.take() {
            Some(b) => {
                *first = b;
                self.inner.read_exact(rest).map_err(read_error)
            }
            None => self.inner.read_exact(buf).map_err(read_error),
        }
    }

    /// Read one whitespace-delimited decimal sample.
    ///
    /// The value wraps modulo `256^bytes_per_sample`, mirroring a
    /// big-endian accumulator of that width that carries between bytes
    /// and drops whatever leaves the top byte.
    pub(crate) fn read_ascii_sample(&mut self, bytes_per_sample: usize) -> Result<u32, PnmError> {
        let mask: u64 = if bytes_per_sample >= 4 {
            u64::from(u32::MAX)
        } else {
            (1u64 << (8 * bytes_per_sample)) - 1
        };
        let mut acc: u64 = 0;
        let mut in_digits = false;
        loop {
            let Some(c) = self.next_char()? else {
                if in_digits {
                    break;
                }
                return Err(PnmError::UnexpectedEof);
            };
            if is_space(c) {
                if in_digits {
                    break;
                }
                continue;
            }
            if !c.is_ascii_digit() {
                return Err(PnmError::InvalidData(format!(
                    "unexpected character {:?} in sample data",
                    c as char
                )));
            }
            in_digits = true;
            acc = (acc * 10 + u64::from(c - b'0')) & mask;
        }
        Ok(acc as u32)
    }

    /// Skip whitespace after an image and report whether another header follows.
    ///
    /// Uses raw reads. A `P` is kept for the next header parse; end of
    /// stream or any other byte means the stream is finished.
    pub(crate) fn another_image_follows(&mut self) -> Result<bool, PnmError> {
        loop {
            match self.raw_byte()? {
                None => return Ok(false),
                Some(b) if is_space(b) => continue,
                Some(b'P') => {
                    self.unread(b'P');
                    return Ok(true);
                }
                Some(b) => {
                    log::debug!("trailing byte {b:#04x} after image, treating as end of stream");
                    return Ok(false);
                }
            }
        }
    }
}
