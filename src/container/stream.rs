//! Reading and writing whole WSQ streams.
use crate::container::reader::ByteReader;
use crate::container::segments::{
    read_block_header, read_comment, read_huffman_tables, skip_segment, write_block_header,
    write_comment, write_huffman_tables, FrameHeader, HuffmanSlots,
};
use crate::container::writer::SegmentWriter;
use crate::container::{Expect, Marker};
use crate::entropy::bitstream::BitReader;
use crate::entropy::block::{compress_block, decompress_block};
use crate::entropy::codes::{DecodeTable, EncodeTable};
use crate::entropy::HuffmanTable;
use crate::error::{Error, Result};
use crate::nistcom::NistCom;
use crate::quantization::{QuantizationTable, NUM_BLOCKS};
use crate::swt::TransformTable;

/// Tables and comments seen so far while reading a stream.
#[derive(Debug, Clone, Default)]
pub struct Tables {
    pub transform: Option<TransformTable>,
    pub quantization: Option<QuantizationTable>,
    pub huffman: HuffmanSlots,
    pub comments: Vec<Vec<u8>>,
}

impl Tables {
    /// Reads the payload of a table or comment segment.
    pub fn read_segment(&mut self, marker: Marker, reader: &mut ByteReader<'_>) -> Result<()> {
        match marker {
            Marker::Dtt => self.transform = Some(TransformTable::read(reader)?),
            Marker::Dqt => self.quantization = Some(QuantizationTable::read(reader)?),
            Marker::Dht => {
                read_huffman_tables(reader, &mut self.huffman)?;
            }
            Marker::Com => self.comments.push(read_comment(reader)?.to_vec()),
            _ => skip_segment(reader, marker)?,
        }
        Ok(())
    }
}

/// Position of one marker in a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentInfo {
    pub marker: Marker,
    pub offset: usize,
    /// Declared length, for markers that carry one.
    pub length: Option<u16>,
}

/// Where a block's coded bytes are and what they decoded to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockInfo {
    pub table_id: u8,
    pub offset: usize,
    pub coded_len: usize,
    pub coefficients: usize,
}

#[derive(Debug, Clone)]
pub struct DecodedStream {
    pub frame: FrameHeader,
    pub tables: Tables,
    pub blocks: Vec<Vec<i16>>,
    pub block_info: Vec<BlockInfo>,
    pub segments: Vec<SegmentInfo>,
}

/// Everything needed to write one image.
#[derive(Debug, Clone, PartialEq)]
pub struct CoefficientImage {
    pub frame: FrameHeader,
    pub transform: TransformTable,
    pub quantization: QuantizationTable,
    pub blocks: [Vec<i16>; NUM_BLOCKS],
}

struct Parser<'a> {
    reader: ByteReader<'a>,
    segments: Vec<SegmentInfo>,
}

impl<'a> Parser<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self {
            reader: ByteReader::new(data),
            segments: vec![],
        }
    }

    fn marker(&mut self, expected: Expect) -> Result<Marker> {
        let offset = self.reader.position();
        let marker = self.reader.read_marker(expected)?;
        let length = if marker.has_length() {
            self.reader.clone().read_u16(marker.name()).ok()
        } else {
            None
        };
        log::debug!("{marker} at offset {offset}, length {length:?}");
        self.segments.push(SegmentInfo {
            marker,
            offset,
            length,
        });
        Ok(marker)
    }

    /// Reads SOI and the tables before the frame header, then the header.
    fn frame(&mut self, tables: &mut Tables) -> Result<FrameHeader> {
        self.marker(Expect::Soi)?;
        loop {
            match self.marker(Expect::TablesOrSof)? {
                Marker::Sof => return FrameHeader::read(&mut self.reader),
                marker => tables.read_segment(marker, &mut self.reader)?,
            }
        }
    }
}

fn coefficient_capacity(frame: &FrameHeader) -> Result<usize> {
    let (width, height) = (usize::from(frame.width), usize::from(frame.height));
    if width == 0 || height == 0 {
        return Err(Error::InvalidDimensions { width, height });
    }
    Ok(width * height)
}

/// Parses a complete stream and decodes its three coefficient blocks.
pub fn read_stream(data: &[u8]) -> Result<DecodedStream> {
    let mut parser = Parser::new(data);
    let mut tables = Tables::default();
    let frame = parser.frame(&mut tables)?;
    let mut capacity = coefficient_capacity(&frame)?;

    let mut blocks = Vec::with_capacity(NUM_BLOCKS);
    let mut block_info = Vec::with_capacity(NUM_BLOCKS);
    let mut next = parser.marker(Expect::TablesOrSob)?;
    for block in 1..=NUM_BLOCKS {
        while next != Marker::Sob {
            tables.read_segment(next, &mut parser.reader)?;
            next = parser.marker(Expect::TablesOrSob)?;
        }
        let table_id = read_block_header(&mut parser.reader)?;
        let spec = tables
            .huffman
            .get(table_id)
            .ok_or(Error::UndefinedTableReference { table_id, block })?;
        let table = DecodeTable::new(table_id, spec)?;

        let start = parser.reader.position();
        let mut bits = BitReader::new(data, start);
        let mut coefficients = vec![];
        decompress_block(&mut bits, &table, &mut coefficients, capacity)?;
        capacity -= coefficients.len();
        // Step back so the marker that ended the coded bytes is read again.
        let end = bits.position().saturating_sub(2);
        parser.reader.set_position(end);
        log::debug!(
            "block {block}: {} coded bytes, {} coefficients, table {table_id}",
            end - start,
            coefficients.len()
        );
        block_info.push(BlockInfo {
            table_id,
            offset: start,
            coded_len: end - start,
            coefficients: coefficients.len(),
        });
        blocks.push(coefficients);

        let expected = if block < NUM_BLOCKS {
            Expect::TablesOrSob
        } else {
            Expect::CommentOrEoi
        };
        next = parser.marker(expected)?;
    }
    while next == Marker::Com {
        tables.read_segment(next, &mut parser.reader)?;
        next = parser.marker(Expect::CommentOrEoi)?;
    }
    if parser.reader.remaining() > 0 {
        log::debug!("{} bytes after EOI ignored", parser.reader.remaining());
    }

    Ok(DecodedStream {
        frame,
        tables,
        blocks,
        block_info,
        segments: parser.segments,
    })
}

/// Writes a complete stream. `comments` follow SOI in order; `capacity`
/// bounds the output length.
pub fn write_stream(
    image: &CoefficientImage,
    comments: &[&[u8]],
    capacity: Option<usize>,
) -> Result<Vec<u8>> {
    let mut writer = match capacity {
        Some(capacity) => SegmentWriter::with_capacity_limit(capacity),
        None => SegmentWriter::new(),
    };
    writer.put_marker(Marker::Soi)?;
    for comment in comments {
        write_comment(&mut writer, comment)?;
    }
    image.transform.write(&mut writer)?;
    image.quantization.write(&mut writer)?;
    image.frame.write(&mut writer)?;

    let [first, second, third] = &image.blocks;
    let first_table = HuffmanTable::for_blocks(0, &[first.as_slice()])?;
    write_huffman_tables(&mut writer, &[&first_table])?;
    write_block(&mut writer, &first_table, first)?;

    let shared_table = HuffmanTable::for_blocks(1, &[second.as_slice(), third.as_slice()])?;
    write_huffman_tables(&mut writer, &[&shared_table])?;
    write_block(&mut writer, &shared_table, second)?;
    write_block(&mut writer, &shared_table, third)?;

    writer.put_marker(Marker::Eoi)?;
    log::debug!("wrote {} bytes", writer.len());
    Ok(writer.into_bytes())
}

fn write_block(writer: &mut SegmentWriter, table: &HuffmanTable, block: &[i16]) -> Result<()> {
    let codes = EncodeTable::new(table.id, &table.spec)?;
    write_block_header(writer, table.id)?;
    let bytes = compress_block(block, &codes)?;
    log::debug!("block of {} coefficients into {} bytes", block.len(), bytes.len());
    writer.put_bytes(&bytes)
}

/// Width and height from the frame header, without decoding any block.
pub fn dimensions(data: &[u8]) -> Result<(usize, usize)> {
    let mut parser = Parser::new(data);
    let frame = parser.frame(&mut Tables::default())?;
    Ok((usize::from(frame.width), usize::from(frame.height)))
}

/// The first NISTCOM block found before the first SOB.
pub fn nistcom(data: &[u8]) -> Result<Option<NistCom>> {
    let mut reader = ByteReader::new(data);
    reader.read_marker(Expect::Soi)?;
    loop {
        match reader.read_marker(Expect::Any)? {
            Marker::Sob | Marker::Eoi => return Ok(None),
            Marker::Com => {
                let comment = read_comment(&mut reader)?;
                if NistCom::is_nistcom(comment) {
                    return NistCom::from_comment(comment).map(Some);
                }
            }
            marker => skip_segment(&mut reader, marker)?,
        }
    }
}

/// Scan resolution recorded in the stream's NISTCOM block.
pub fn ppi(data: &[u8]) -> Result<Option<i32>> {
    use crate::nistcom::MetadataStore;

    Ok(nistcom(data)?.and_then(|nistcom| nistcom.ppi()))
}

/// Copies `data` with a comment segment inserted after SOI and any
/// comments that directly follow it.
pub fn add_comment(data: &[u8], comment: &[u8]) -> Result<Vec<u8>> {
    if comment.is_empty() {
        return Err(Error::InvalidComment("empty comment".to_string()));
    }
    let mut reader = ByteReader::new(data);
    reader.read_marker(Expect::Soi)?;
    let mut insert_at = reader.position();
    while reader.read_marker(Expect::Any)? == Marker::Com {
        read_comment(&mut reader)?;
        insert_at = reader.position();
    }

    let mut writer = SegmentWriter::new();
    writer.put_bytes(&data[..insert_at])?;
    write_comment(&mut writer, comment)?;
    writer.put_bytes(&data[insert_at..])?;
    Ok(writer.into_bytes())
}
