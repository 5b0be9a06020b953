//! Bounds-checked read position over a tile buffer.

use crate::error::{DecodeError, DecodeResult};

/// A read position over a borrowed byte slice.
///
/// All decode routines for one tile share a single cursor and advance it past
/// exactly the bytes they consume. Every read is checked here, so no decode
/// routine indexes the buffer directly.
///
/// Sub-cursors created with [`Cursor::split_off`] keep reporting absolute
/// offsets into the original buffer.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    data: &'a [u8],
    position: usize,
    base: usize,
}

impl<'a> Cursor<'a> {
    /// Create a cursor at the start of `data`.
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            position: 0,
            base: 0,
        }
    }

    /// Absolute offset of the next byte to be read.
    #[must_use]
    pub fn position(&self) -> usize {
        self.base + self.position
    }

    /// Number of bytes left to read.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    /// Whether every byte has been consumed.
    #[must_use]
    pub fn is_at_end(&self) -> bool {
        self.position == self.data.len()
    }

    /// Read one byte.
    pub fn read_u8(&mut self) -> DecodeResult<u8> {
        let byte = *self
            .data
            .get(self.position)
            .ok_or_else(|| self.out_of_bounds(1))?;
        self.position += 1;
        Ok(byte)
    }

    /// Read `len` bytes as a slice borrowed from the tile buffer.
    pub fn read_bytes(&mut self, len: usize) -> DecodeResult<&'a [u8]> {
        let end = self
            .position
            .checked_add(len)
            .filter(|&end| end <= self.data.len())
            .ok_or_else(|| self.out_of_bounds(len))?;
        let bytes = &self.data[self.position..end];
        self.position = end;
        Ok(bytes)
    }

    /// Consume the next `len` bytes and return a cursor restricted to them.
    ///
    /// Used to confine a stream decoder to the stream's declared byte length.
    pub fn split_off(&mut self, len: usize) -> DecodeResult<Cursor<'a>> {
        let base = self.position();
        let data = self.read_bytes(len)?;
        Ok(Cursor {
            data,
            position: 0,
            base,
        })
    }

    /// Fail unless the cursor has consumed all of its bytes.
    pub fn expect_end(&self, what: &str) -> DecodeResult<()> {
        if self.is_at_end() {
            Ok(())
        } else {
            Err(DecodeError::malformed(
                self.position(),
                format!("{} trailing bytes after {what}", self.remaining()),
            ))
        }
    }

    fn out_of_bounds(&self, needed: usize) -> DecodeError {
        DecodeError::BoundsViolation {
            offset: self.position(),
            needed,
            available: self.remaining(),
        }
    }
}
