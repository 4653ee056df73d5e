//! Frame header, block header, Huffman table and comment segments.
use crate::container::reader::ByteReader;
use crate::container::scaled;
use crate::container::writer::SegmentWriter;
use crate::container::Marker;
use crate::entropy::{
    CodeLengthSpec, HuffmanTable, MAX_CODE_LENGTH, MAX_HUFFMAN_TABLES, WSQ_ALPHABET,
};
use crate::error::{Error, Result};

const FRAME_HEADER_LEN: usize = 15;

/// Contents of the SOF segment.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameHeader {
    pub black: u8,
    pub white: u8,
    pub height: u16,
    pub width: u16,
    /// Mean that was subtracted from the pixels before the transform.
    pub m_shift: f32,
    /// Scale that was applied to the pixels before the transform.
    pub r_scale: f32,
    pub encoder: u8,
    pub software: u16,
}

impl FrameHeader {
    pub fn new(width: u16, height: u16, m_shift: f32, r_scale: f32) -> Self {
        Self {
            black: 0,
            white: 255,
            height,
            width,
            m_shift,
            r_scale,
            encoder: 0,
            software: 0,
        }
    }

    /// Reads the payload following an SOF marker.
    pub fn read(reader: &mut ByteReader<'_>) -> Result<Self> {
        reader.read_length("SOF")?;
        let black = reader.read_u8("SOF")?;
        let white = reader.read_u8("SOF")?;
        let height = reader.read_u16("SOF")?;
        let width = reader.read_u16("SOF")?;
        let m_shift = read_scaled_u16(reader, "SOF")?;
        let r_scale = read_scaled_u16(reader, "SOF")?;
        let encoder = reader.read_u8("SOF")?;
        let software = reader.read_u16("SOF")?;
        log::debug!("frame {width}x{height}, shift {m_shift}, scale {r_scale}");
        Ok(Self {
            black,
            white,
            height,
            width,
            m_shift,
            r_scale,
            encoder,
            software,
        })
    }

    pub fn write(&self, writer: &mut SegmentWriter) -> Result<()> {
        writer.put_segment_start(Marker::Sof, FRAME_HEADER_LEN)?;
        writer.put_u8(self.black)?;
        writer.put_u8(self.white)?;
        writer.put_u16(self.height)?;
        writer.put_u16(self.width)?;
        write_scaled_u16(writer, self.m_shift, "frame shift")?;
        write_scaled_u16(writer, self.r_scale, "frame scale")?;
        writer.put_u8(self.encoder)?;
        writer.put_u16(self.software)
    }
}

pub(crate) fn read_scaled_u16(reader: &mut ByteReader<'_>, context: &'static str) -> Result<f32> {
    let scale = reader.read_u8(context)?;
    let mantissa = reader.read_u16(context)?;
    Ok(scaled::decode(scale, u32::from(mantissa)))
}

pub(crate) fn write_scaled_u16(
    writer: &mut SegmentWriter,
    value: f32,
    field: &'static str,
) -> Result<()> {
    let (scale, mantissa) = scaled::encode_u16(value, field)?;
    writer.put_u8(scale)?;
    writer.put_u16(mantissa)
}

/// Reads the payload following an SOB marker: the table id of the block.
pub fn read_block_header(reader: &mut ByteReader<'_>) -> Result<u8> {
    reader.read_length("SOB")?;
    reader.read_u8("SOB")
}

pub fn write_block_header(writer: &mut SegmentWriter, table_id: u8) -> Result<()> {
    writer.put_segment_start(Marker::Sob, 1)?;
    writer.put_u8(table_id)
}

/// Huffman tables received so far, by id.
#[derive(Debug, Clone, Default)]
pub struct HuffmanSlots {
    slots: [Option<CodeLengthSpec>; MAX_HUFFMAN_TABLES],
}

impl HuffmanSlots {
    pub fn get(&self, table_id: u8) -> Option<&CodeLengthSpec> {
        self.slots.get(usize::from(table_id))?.as_ref()
    }

    pub fn is_defined(&self, table_id: u8) -> bool {
        self.get(table_id).is_some()
    }

    /// Stores a table; every id may be defined once per stream.
    pub fn define(&mut self, table_id: u8, spec: CodeLengthSpec) -> Result<()> {
        let slot = self
            .slots
            .get_mut(usize::from(table_id))
            .ok_or(Error::InvalidHuffmanTable {
                table_id,
                reason: "table id out of range",
            })?;
        if slot.is_some() {
            return Err(Error::TableRedefinition { table_id });
        }
        *slot = Some(spec);
        Ok(())
    }
}

/// Reads the payload following a DHT marker. One segment may carry
/// several tables back to back.
pub fn read_huffman_tables(
    reader: &mut ByteReader<'_>,
    slots: &mut HuffmanSlots,
) -> Result<Vec<u8>> {
    let mut remaining = reader.read_length("DHT")?;
    if remaining == 0 {
        return Err(Error::InvalidSegment {
            segment: "DHT",
            reason: "no table in segment",
        });
    }
    let mut defined = vec![];
    while remaining > 0 {
        let table_id = reader.read_u8("DHT")?;
        let mut bits = [0u8; MAX_CODE_LENGTH];
        bits.copy_from_slice(reader.read_bytes(MAX_CODE_LENGTH, "DHT")?);
        let count: usize = bits.iter().map(|&b| usize::from(b)).sum();
        if count > WSQ_ALPHABET {
            return Err(Error::InvalidHuffmanTable {
                table_id,
                reason: "more values than the alphabet holds",
            });
        }
        let values = reader.read_bytes(count, "DHT")?.to_vec();

        let table_len = 1 + MAX_CODE_LENGTH + count;
        remaining = remaining.checked_sub(table_len).ok_or(Error::InvalidSegment {
            segment: "DHT",
            reason: "tables overrun the segment length",
        })?;
        log::debug!("Huffman table {table_id} with {count} codes");
        slots.define(table_id, CodeLengthSpec { bits, values })?;
        defined.push(table_id);
    }
    Ok(defined)
}

/// Writes one DHT segment holding all of `tables`.
pub fn write_huffman_tables(writer: &mut SegmentWriter, tables: &[&HuffmanTable]) -> Result<()> {
    let payload_len = tables
        .iter()
        .map(|t| 1 + MAX_CODE_LENGTH + t.spec.values.len())
        .sum();
    writer.put_segment_start(Marker::Dht, payload_len)?;
    for table in tables {
        writer.put_u8(table.id)?;
        writer.put_bytes(&table.spec.bits)?;
        writer.put_bytes(&table.spec.values)?;
    }
    Ok(())
}

/// Reads the payload following a COM marker.
pub fn read_comment<'a>(reader: &mut ByteReader<'a>) -> Result<&'a [u8]> {
    let len = reader.read_length("COM")?;
    reader.read_bytes(len, "COM")
}

pub fn write_comment(writer: &mut SegmentWriter, text: &[u8]) -> Result<()> {
    writer.put_segment_start(Marker::Com, text.len())?;
    writer.put_bytes(text)
}

/// Steps over the payload of a segment that is not needed.
pub fn skip_segment(reader: &mut ByteReader<'_>, marker: Marker) -> Result<()> {
    if !marker.has_length() {
        return Ok(());
    }
    let len = reader.read_length(marker.name())?;
    reader.read_bytes(len, marker.name())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(bytes: &[u8]) -> ByteReader<'_> {
        ByteReader::new(bytes)
    }

    #[test]
    fn test_frame_header_layout() {
        let header = FrameHeader::new(500, 600, 128.0, 1.0);
        let mut writer = SegmentWriter::new();
        header.write(&mut writer).unwrap();
        let bytes = writer.into_bytes();
        assert_eq!(
            vec![
                0xFF, 0xA2, 0x00, 0x11, 0x00, 0xFF, 0x02, 0x58, 0x01, 0xF4, 0x02, 0x32, 0x00,
                0x04, 0x27, 0x10, 0x00, 0x00, 0x00
            ],
            bytes
        );
        let mut reader = payload(&bytes[2..]);
        assert_eq!(header, FrameHeader::read(&mut reader).unwrap());
    }

    #[test]
    fn test_frame_header_truncated() {
        let mut reader = payload(&[0x00, 0x11, 0x00, 0xFF, 0x02]);
        assert!(matches!(
            FrameHeader::read(&mut reader),
            Err(Error::TruncatedInput { offset: 4, .. })
        ));
    }

    #[test]
    fn test_block_header() {
        let mut writer = SegmentWriter::new();
        write_block_header(&mut writer, 1).unwrap();
        let bytes = writer.into_bytes();
        assert_eq!(1, read_block_header(&mut payload(&bytes[2..])).unwrap());
    }

    #[test]
    fn test_huffman_segment_with_two_tables() {
        let mut bits = [0u8; 16];
        bits[1] = 2;
        let first = HuffmanTable { id: 0, spec: CodeLengthSpec { bits, values: vec![3, 180] } };
        let second = HuffmanTable { id: 1, spec: CodeLengthSpec { bits, values: vec![7, 9] } };
        let mut writer = SegmentWriter::new();
        write_huffman_tables(&mut writer, &[&first, &second]).unwrap();
        let bytes = writer.into_bytes();
        assert_eq!(&[0x00u8, 2 + 2 * 19], &bytes[2..4]);

        let mut slots = HuffmanSlots::default();
        let defined = read_huffman_tables(&mut payload(&bytes[2..]), &mut slots).unwrap();
        assert_eq!(vec![0, 1], defined);
        assert_eq!(Some(&first.spec), slots.get(0));
        assert_eq!(Some(&second.spec), slots.get(1));
        assert!(!slots.is_defined(2));
    }

    #[test]
    fn test_huffman_redefinition() {
        let mut bits = [0u8; 16];
        bits[0] = 1;
        let table = HuffmanTable { id: 0, spec: CodeLengthSpec { bits, values: vec![1] } };
        let mut writer = SegmentWriter::new();
        write_huffman_tables(&mut writer, &[&table]).unwrap();
        let bytes = writer.into_bytes();

        let mut slots = HuffmanSlots::default();
        read_huffman_tables(&mut payload(&bytes[2..]), &mut slots).unwrap();
        assert_eq!(
            Err(Error::TableRedefinition { table_id: 0 }),
            read_huffman_tables(&mut payload(&bytes[2..]), &mut slots)
        );
    }

    #[test]
    fn test_huffman_table_id_out_of_range() {
        let mut slots = HuffmanSlots::default();
        assert!(matches!(
            slots.define(8, CodeLengthSpec::default()),
            Err(Error::InvalidHuffmanTable { table_id: 8, .. })
        ));
    }

    #[test]
    fn test_huffman_segment_length_mismatch() {
        // Declared length covers the table header but not its one value.
        let mut bytes = vec![0x00, 0x13, 0x00, 0x01];
        bytes.extend_from_slice(&[0; 15]);
        bytes.push(0x05);
        let mut slots = HuffmanSlots::default();
        assert!(matches!(
            read_huffman_tables(&mut payload(&bytes), &mut slots),
            Err(Error::InvalidSegment { segment: "DHT", .. })
        ));
    }

    #[test]
    fn test_comment() {
        let mut writer = SegmentWriter::new();
        write_comment(&mut writer, b"hello").unwrap();
        let bytes = writer.into_bytes();
        assert_eq!(&[0xFFu8, 0xA8, 0x00, 0x07], &bytes[..4]);
        assert_eq!(b"hello", read_comment(&mut payload(&bytes[2..])).unwrap());
    }

    #[test]
    fn test_skip_segment() {
        let bytes = [0x00, 0x04, 0xAA, 0xBB, 0xFF, 0xA1];
        let mut reader = payload(&bytes);
        skip_segment(&mut reader, Marker::Dqt).unwrap();
        assert_eq!(4, reader.position());
    }
}
