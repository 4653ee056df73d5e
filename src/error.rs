//! Error type shared by every stage of the codec.
use thiserror::Error;

use crate::container::Expect;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("unexpected end of data at offset {offset} while reading {context}")]
    TruncatedInput { offset: usize, context: &'static str },

    #[error("expected {expected} at offset {offset}, found 0x{found:04X}")]
    InvalidMarker {
        expected: Expect,
        found: u16,
        offset: usize,
    },

    #[error("block {block} references undefined Huffman table {table_id}")]
    UndefinedTableReference { table_id: u8, block: usize },

    #[error("Huffman table {table_id} is defined more than once")]
    TableRedefinition { table_id: u8 },

    #[error("zero run of {run} does not fit the 16-bit run escape")]
    OversizedRun { run: u32 },

    #[error("Huffman code 0x{code:X} of length {length} is all ones")]
    NonCompliantCode { code: u16, length: u8 },

    #[error("encoded output needs {required} bytes, only {capacity} available")]
    BufferOverflow { capacity: usize, required: usize },

    #[error("invalid Huffman table {table_id}: {reason}")]
    InvalidHuffmanTable { table_id: u8, reason: &'static str },

    #[error("Huffman code lengths could not be limited to 16 bits")]
    CodeLengthOverflow,

    #[error("no Huffman code matches the bits before offset {offset}")]
    InvalidCode { offset: usize },

    #[error("invalid category {symbol} in coded data before offset {offset}")]
    InvalidCategory { symbol: u8, offset: usize },

    #[error("marker 0x{marker:04X} found inside raw bits at offset {offset}")]
    UnexpectedMarker { marker: u16, offset: usize },

    #[error("invalid {segment} segment: {reason}")]
    InvalidSegment {
        segment: &'static str,
        reason: &'static str,
    },

    #[error("{field} value {value} cannot be written as a scaled integer")]
    ValueOutOfRange { field: &'static str, value: f64 },

    #[error("invalid image dimensions {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("coded data holds more than the {capacity} coefficients of the image")]
    CoefficientOverflow { capacity: usize },

    #[error("stream has no {segment} table")]
    MissingTable { segment: &'static str },

    #[error("invalid NISTCOM comment: {0}")]
    InvalidComment(String),

    #[error("transform stage failed: {0}")]
    Transform(String),
}
