//! Module for encoding and decoding using Huffman Tables
//
// Quantized coefficients are coded as a sequence of categories (zero runs,
// escapes and biased literals). Each block of coefficients names one of up
// to eight Huffman tables; WSQ uses table 0 for the first block and table 1
// for the other two. Table contents are transmitted as 16 code length
// counts and the symbols in code order, from which both sides derive the
// same canonical codes.
pub mod bitstream;
pub mod block;
pub mod builder;
pub mod codes;

use crate::error::Result;

/// Longest code a table may assign.
pub const MAX_CODE_LENGTH: usize = 16;
/// Symbols 0 to 255 plus the reserved symbol 256.
pub const WSQ_ALPHABET: usize = 257;
/// Table ids run from 0 to 7.
pub const MAX_HUFFMAN_TABLES: usize = 8;

/// How many codes use each length, and the symbols in code order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeLengthSpec {
    pub bits: [u8; MAX_CODE_LENGTH],
    pub values: Vec<u8>,
}

impl CodeLengthSpec {
    pub fn code_count(&self) -> usize {
        self.bits.iter().map(|&b| usize::from(b)).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HuffmanTable {
    pub id: u8,
    pub spec: CodeLengthSpec,
}

impl HuffmanTable {
    /// Builds the table that codes all of `blocks`.
    pub fn for_blocks(id: u8, blocks: &[&[i16]]) -> Result<Self> {
        let frequencies = block::block_frequencies(blocks)?;
        let spec = builder::build_table(&frequencies)?;
        log::debug!("Huffman table {id}: {} codes", spec.code_count());
        Ok(Self { id, spec })
    }
}
