//! Checked big-endian reads over a box payload.

use crate::{Error, Result};
use bytes::Buf;

/// Cursor over a box payload that fails with [`Error::BufferUnderflow`]
/// instead of panicking on short input.
#[derive(Debug, Clone)]
pub struct PayloadReader<'a> {
    buf: &'a [u8],
}

impl<'a> PayloadReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    /// Bytes left to read.
    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    fn ensure(&self, need: usize) -> Result<()> {
        if self.buf.remaining() < need {
            return Err(Error::BufferUnderflow {
                need,
                have: self.buf.remaining(),
            });
        }
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.ensure(1)?;
        Ok(self.buf.get_u8())
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        self.ensure(2)?;
        Ok(self.buf.get_u16())
    }

    pub fn read_u24(&mut self) -> Result<u32> {
        self.ensure(3)?;
        Ok(self.buf.get_uint(3) as u32)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        self.ensure(4)?;
        Ok(self.buf.get_u32())
    }

    pub fn read_u48(&mut self) -> Result<u64> {
        self.ensure(6)?;
        Ok(self.buf.get_uint(6))
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        self.ensure(8)?;
        Ok(self.buf.get_u64())
    }

    /// Read a 32-bit field for version 0 boxes, 64-bit otherwise.
    pub fn read_versioned(&mut self, version: u8) -> Result<u64> {
        if version == 1 {
            self.read_u64()
        } else {
            self.read_u32().map(u64::from)
        }
    }

    /// Read the version byte and 24-bit flags of a full box.
    pub fn read_full_box_header(&mut self) -> Result<(u8, u32)> {
        let word = self.read_u32()?;
        Ok(((word >> 24) as u8, word & 0x00FF_FFFF))
    }

    /// Borrow the next `len` bytes.
    pub fn read_slice(&mut self, len: usize) -> Result<&'a [u8]> {
        self.ensure(len)?;
        let (head, tail) = self.buf.split_at(len);
        self.buf = tail;
        Ok(head)
    }

    pub fn skip(&mut self, len: usize) -> Result<()> {
        self.ensure(len)?;
        self.buf.advance(len);
        Ok(())
    }

    /// Borrow everything that is left.
    pub fn rest(&mut self) -> &'a [u8] {
        let rest = self.buf;
        self.buf = &[];
        rest
    }
}
