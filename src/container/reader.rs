//! Big-endian field access over an in-memory stream.
use crate::container::{Expect, Marker};
use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn set_position(&mut self, position: usize) {
        self.position = position;
    }

    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    pub fn read_bytes(&mut self, len: usize, context: &'static str) -> Result<&'a [u8]> {
        let bytes = self
            .data
            .get(self.position..self.position + len)
            .ok_or(Error::TruncatedInput {
                offset: self.data.len().min(self.position),
                context,
            })?;
        self.position += len;
        Ok(bytes)
    }

    pub fn read_u8(&mut self, context: &'static str) -> Result<u8> {
        Ok(self.read_bytes(1, context)?[0])
    }

    pub fn read_u16(&mut self, context: &'static str) -> Result<u16> {
        let bytes = self.read_bytes(2, context)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    pub fn read_u32(&mut self, context: &'static str) -> Result<u32> {
        let bytes = self.read_bytes(4, context)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Reads a marker and checks it belongs to the `expected` class.
    pub fn read_marker(&mut self, expected: Expect) -> Result<Marker> {
        let offset = self.position;
        let code = self.read_u16("marker")?;
        Marker::from_code(code)
            .filter(|&marker| expected.accepts(marker))
            .ok_or(Error::InvalidMarker {
                expected,
                found: code,
                offset,
            })
    }

    /// Reads a segment length field and returns the payload size after it.
    pub fn read_length(&mut self, segment: &'static str) -> Result<usize> {
        let length = self.read_u16(segment)?;
        usize::from(length)
            .checked_sub(2)
            .ok_or(Error::InvalidSegment {
                segment,
                reason: "length field shorter than itself",
            })
    }
}
