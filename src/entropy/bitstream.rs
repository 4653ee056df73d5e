//! Bit level access to entropy coded data.
//!
//! Coded data is packed most significant bit first. A data byte equal to
//! `0xFF` is always followed by a stuffed `0x00` so that it cannot be taken
//! for the first half of a marker.
use crate::error::{Error, Result};

/// Packs bit fields into bytes, stuffing after every `0xFF`.
#[derive(Debug, Default)]
pub struct BitWriter {
    output: Vec<u8>,
    pending: u8,
    pending_bits: u8,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the low `count` bits of `value`, most significant first.
    pub fn write_bits(&mut self, value: u16, count: u8) {
        debug_assert!(count <= 16);
        for shift in (0..count).rev() {
            let bit = ((value >> shift) & 1) as u8;
            self.pending = (self.pending << 1) | bit;
            self.pending_bits += 1;
            if self.pending_bits == 8 {
                self.emit();
            }
        }
    }

    /// Pads the partial byte with 1-bits and emits it.
    pub fn flush(&mut self) {
        if self.pending_bits == 0 {
            return;
        }
        let padding = 8 - self.pending_bits;
        self.pending = (self.pending << padding) | ((1u8 << padding) - 1);
        self.emit();
    }

    /// Bytes emitted so far, stuffing included.
    pub fn len(&self) -> usize {
        self.output.len()
    }

    pub fn is_empty(&self) -> bool {
        self.output.is_empty() && self.pending_bits == 0
    }

    pub fn finish(mut self) -> Vec<u8> {
        self.flush();
        self.output
    }

    fn emit(&mut self) {
        self.output.push(self.pending);
        if self.pending == 0xFF {
            self.output.push(0x00);
        }
        self.pending = 0;
        self.pending_bits = 0;
    }
}

/// Result of a bit read: data bits, or the marker that ended the coded data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadBits {
    Bits(u16),
    Marker(u16),
}

/// Reads bit fields from coded data starting at a byte offset of a buffer.
#[derive(Debug)]
pub struct BitReader<'a> {
    data: &'a [u8],
    position: usize,
    pending: u8,
    pending_bits: u8,
}

impl<'a> BitReader<'a> {
    pub fn new(data: &'a [u8], position: usize) -> Self {
        Self {
            data,
            position,
            pending: 0,
            pending_bits: 0,
        }
    }

    /// Offset of the next unread byte.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Drops any bits left in the current byte.
    pub fn align(&mut self) {
        self.pending = 0;
        self.pending_bits = 0;
    }

    /// Reads `count` bits, 1 to 16. A marker can only be reported on a
    /// single bit read; anywhere else it is an error.
    pub fn read_bits(&mut self, count: u8) -> Result<ReadBits> {
        debug_assert!((1..=16).contains(&count));
        let mut value: u32 = 0;
        let mut needed = count;
        while needed > 0 {
            if self.pending_bits == 0 {
                if let Some(marker) = self.fill()? {
                    if count == 1 {
                        return Ok(ReadBits::Marker(marker));
                    }
                    return Err(Error::UnexpectedMarker {
                        marker,
                        offset: self.position - 2,
                    });
                }
            }
            let take = needed.min(self.pending_bits);
            let remaining = self.pending_bits - take;
            let bits = (u32::from(self.pending) >> remaining) & ((1u32 << take) - 1);
            value = (value << take) | bits;
            self.pending_bits = remaining;
            self.pending = (u32::from(self.pending) & ((1u32 << remaining) - 1)) as u8;
            needed -= take;
        }
        Ok(ReadBits::Bits(value as u16))
    }

    /// Reads `count` raw bits where a marker is never legal.
    pub fn read_raw(&mut self, count: u8) -> Result<u16> {
        match self.read_bits(count)? {
            ReadBits::Bits(value) => Ok(value),
            ReadBits::Marker(marker) => Err(Error::UnexpectedMarker {
                marker,
                offset: self.position - 2,
            }),
        }
    }

    /// Loads the next data byte, or returns the marker found in its place.
    fn fill(&mut self) -> Result<Option<u16>> {
        let byte = self.next_byte()?;
        if byte == 0xFF {
            let second = self.next_byte()?;
            if second != 0x00 {
                self.align();
                return Ok(Some(u16::from_be_bytes([byte, second])));
            }
        }
        self.pending = byte;
        self.pending_bits = 8;
        Ok(None)
    }

    fn next_byte(&mut self) -> Result<u8> {
        let byte = *self.data.get(self.position).ok_or(Error::TruncatedInput {
            offset: self.position,
            context: "coded data",
        })?;
        self.position += 1;
        Ok(byte)
    }
}
