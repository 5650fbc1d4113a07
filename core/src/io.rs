// Copyright 2017-2026 Peter Williams and collaborators
// Licensed under the MIT License.

/*!

Basic I/O helpers.

 */

use std::io;
use std::io::{Result, Write};

/// A writer that counts how many bytes have passed through it, so that the
/// stream can be padded out to a fixed boundary.
///
/// FITS files are made of 2880-byte records, so every header and data unit
/// has to be padded out to that boundary when it is written.
#[derive(Debug)]
pub struct AligningWriter<W: Write> {
    inner: W,
    offset: u64,
}

impl<W: Write> AligningWriter<W> {
    /// Create a new AligningWriter that wraps the argument *inner*.
    pub fn new(inner: W) -> Self {
        AligningWriter { inner, offset: 0 }
    }

    /// Consume this struct, returning the underlying inner writer.
    pub fn into_inner(self) -> W {
        self.inner
    }

    /// Return how many bytes we have written since this struct was created.
    ///
    /// Note that this offset is tracked internally. If you open a file, write
    /// some data, and *then* create an AligningWriter, the returned offset
    /// will refer to the number of bytes written since creation, not the
    /// actual file position as understood by the underlying OS.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Write copies of *fill* to ensure that the stream is aligned as
    /// specified.
    ///
    /// Returns whether the stream was already at the right alignment. When
    /// that is the case, no write is performed.
    pub fn pad_to(&mut self, alignment: usize, fill: u8) -> Result<bool> {
        if alignment == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "alignment must be nonzero",
            ));
        }

        let excess = (self.offset % alignment as u64) as usize;

        if excess == 0 {
            return Ok(true);
        }

        let buf = [fill; 256];
        let mut amount = alignment - excess;

        while amount > 0 {
            let n = amount.min(buf.len());
            self.inner.write_all(&buf[..n])?;
            self.offset += n as u64;
            amount -= n;
        }

        Ok(false)
    }
}

impl<W: Write> Write for AligningWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let result = self.inner.write(buf);

        if let Ok(n) = result {
            self.offset += n as u64;
        }

        result
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
