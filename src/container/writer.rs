//! Big-endian output with an optional size limit.
use crate::container::Marker;
use crate::error::{Error, Result};

#[derive(Debug, Default)]
pub struct SegmentWriter {
    output: Vec<u8>,
    capacity: Option<usize>,
}

impl SegmentWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// A writer that fails once more than `capacity` bytes are written.
    pub fn with_capacity_limit(capacity: usize) -> Self {
        Self {
            output: Vec::new(),
            capacity: Some(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.output.len()
    }

    pub fn is_empty(&self) -> bool {
        self.output.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.output
    }

    pub fn put_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        let required = self.output.len() + bytes.len();
        if let Some(capacity) = self.capacity {
            if required > capacity {
                return Err(Error::BufferOverflow { capacity, required });
            }
        }
        self.output.extend_from_slice(bytes);
        Ok(())
    }

    pub fn put_u8(&mut self, value: u8) -> Result<()> {
        self.put_bytes(&[value])
    }

    pub fn put_u16(&mut self, value: u16) -> Result<()> {
        self.put_bytes(&value.to_be_bytes())
    }

    pub fn put_u32(&mut self, value: u32) -> Result<()> {
        self.put_bytes(&value.to_be_bytes())
    }

    pub fn put_marker(&mut self, marker: Marker) -> Result<()> {
        self.put_u16(marker.code())
    }

    /// Writes `marker` and the length field for a payload of `payload_len` bytes.
    pub fn put_segment_start(&mut self, marker: Marker, payload_len: usize) -> Result<()> {
        let length = u16::try_from(payload_len + 2).map_err(|_| Error::InvalidSegment {
            segment: marker.name(),
            reason: "payload longer than a segment can hold",
        })?;
        self.put_marker(marker)?;
        self.put_u16(length)
    }
}

#[cfg(test)]
mod tests {
    use super::SegmentWriter;
    use crate::container::Marker;
    use crate::error::Error;

    #[test]
    fn test_segment_start() {
        let mut writer = SegmentWriter::new();
        writer.put_segment_start(Marker::Sob, 1).unwrap();
        writer.put_u8(1).unwrap();
        assert_eq!(vec![0xFF, 0xA3, 0x00, 0x03, 0x01], writer.into_bytes());
    }

    #[test]
    fn test_capacity_limit() {
        let mut writer = SegmentWriter::with_capacity_limit(3);
        writer.put_u16(0xFFA0).unwrap();
        assert_eq!(
            Err(Error::BufferOverflow { capacity: 3, required: 4 }),
            writer.put_u16(0xFFA1)
        );
        assert_eq!(2, writer.len());
    }

    #[test]
    fn test_oversized_payload() {
        let mut writer = SegmentWriter::new();
        assert!(matches!(
            writer.put_segment_start(Marker::Com, 70_000),
            Err(Error::InvalidSegment { segment: "COM", .. })
        ));
    }
}
