//! Category coding of one block of quantized coefficients.
//!
//! | symbol  | meaning                                     |
//! |---------|---------------------------------------------|
//! | 1-100   | that many zero coefficients                 |
//! | 101     | 8 raw bits, positive value beyond the table |
//! | 102     | 8 raw bits, magnitude of a negative value   |
//! | 103     | 16 raw bits, positive value                 |
//! | 104     | 16 raw bits, magnitude of a negative value  |
//! | 105     | 8 raw bits, zero run length                 |
//! | 106     | 16 raw bits, zero run length                |
//! | 107-254 | the value `symbol - 180`                    |
use crate::entropy::bitstream::{BitReader, BitWriter};
use crate::entropy::codes::{Decoded, DecodeTable, EncodeTable};
use crate::entropy::WSQ_ALPHABET;
use crate::error::{Error, Result};

/// Largest value coded directly by a literal symbol.
pub const MAX_COEFF: i32 = 74;
/// Smallest value coded directly by a literal symbol.
pub const MIN_COEFF: i32 = 1 - MAX_COEFF;
/// Longest zero run coded directly by its own symbol.
pub const MAX_ZERO_RUN: u32 = 100;
const LITERAL_BIAS: i32 = 180;
/// Zero runs are split before they outgrow the 16-bit escape.
const MAX_ESCAPED_RUN: u32 = 0xFFFF;

pub const POS_ESCAPE_8: u8 = 101;
pub const NEG_ESCAPE_8: u8 = 102;
pub const POS_ESCAPE_16: u8 = 103;
pub const NEG_ESCAPE_16: u8 = 104;
pub const RUN_ESCAPE_8: u8 = 105;
pub const RUN_ESCAPE_16: u8 = 106;

/// One coded event: a symbol and the raw bits that follow it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Category {
    pub symbol: u8,
    pub extra: Option<(u16, u8)>,
}

impl Category {
    fn plain(symbol: u8) -> Self {
        Self { symbol, extra: None }
    }

    fn escaped(symbol: u8, value: u16, bits: u8) -> Self {
        Self {
            symbol,
            extra: Some((value, bits)),
        }
    }
}

enum State {
    Coefficient,
    Run(u32),
}

/// Walks `block` and hands every category it needs, in stream order, to `emit`.
pub fn categorize(block: &[i16], mut emit: impl FnMut(Category) -> Result<()>) -> Result<()> {
    let mut state = State::Coefficient;
    for &value in block {
        state = match state {
            State::Coefficient if value == 0 => State::Run(1),
            State::Coefficient => {
                emit(literal(value))?;
                State::Coefficient
            }
            State::Run(run) if value == 0 && run < MAX_ESCAPED_RUN => State::Run(run + 1),
            State::Run(run) => {
                emit(zero_run(run)?)?;
                if value == 0 {
                    State::Run(1)
                } else {
                    emit(literal(value))?;
                    State::Coefficient
                }
            }
        };
    }
    if let State::Run(run) = state {
        emit(zero_run(run)?)?;
    }
    Ok(())
}

fn literal(value: i16) -> Category {
    let value = i32::from(value);
    if value > MAX_COEFF {
        if value > 0xFF {
            Category::escaped(POS_ESCAPE_16, value as u16, 16)
        } else {
            Category::escaped(POS_ESCAPE_8, value as u16, 8)
        }
    } else if value < MIN_COEFF {
        if value < -0xFF {
            Category::escaped(NEG_ESCAPE_16, (-value) as u16, 16)
        } else {
            Category::escaped(NEG_ESCAPE_8, (-value) as u16, 8)
        }
    } else {
        Category::plain((value + LITERAL_BIAS) as u8)
    }
}

fn zero_run(run: u32) -> Result<Category> {
    if run <= MAX_ZERO_RUN {
        Ok(Category::plain(run as u8))
    } else if run <= 0xFF {
        Ok(Category::escaped(RUN_ESCAPE_8, run as u16, 8))
    } else if run <= MAX_ESCAPED_RUN {
        Ok(Category::escaped(RUN_ESCAPE_16, run as u16, 16))
    } else {
        Err(Error::OversizedRun { run })
    }
}

/// Adds the symbol counts of `block` to `counts`.
pub fn count_block(block: &[i16], counts: &mut [u32]) -> Result<()> {
    categorize(block, |category| {
        counts[category.symbol as usize] += 1;
        Ok(())
    })
}

/// Symbol frequencies over several blocks sharing one table, reserved
/// symbol seeded with one.
pub fn block_frequencies(blocks: &[&[i16]]) -> Result<Vec<u32>> {
    let mut counts = vec![0u32; WSQ_ALPHABET];
    counts[WSQ_ALPHABET - 1] = 1;
    for block in blocks {
        count_block(block, &mut counts)?;
    }
    Ok(counts)
}

/// Codes `block` into whole, stuffed bytes.
pub fn compress_block(block: &[i16], table: &EncodeTable) -> Result<Vec<u8>> {
    let mut writer = BitWriter::new();
    categorize(block, |category| {
        let code = table
            .code(category.symbol)
            .ok_or(Error::InvalidHuffmanTable {
                table_id: table.table_id(),
                reason: "no code for a symbol of the block",
            })?;
        writer.write_bits(code.code, code.size);
        if let Some((value, bits)) = category.extra {
            writer.write_bits(value, bits);
        }
        Ok(())
    })?;
    let bytes = writer.finish();
    log::trace!("compressed {} coefficients into {} bytes", block.len(), bytes.len());
    Ok(bytes)
}

/// Decodes coefficients into `output` until a marker ends the coded data
/// and returns that marker. `capacity` bounds the total length of `output`.
pub fn decompress_block(
    reader: &mut BitReader<'_>,
    table: &DecodeTable,
    output: &mut Vec<i16>,
    capacity: usize,
) -> Result<u16> {
    loop {
        let symbol = match table.decode(reader)? {
            Decoded::Marker(marker) => return Ok(marker),
            Decoded::Symbol(symbol) => symbol,
        };
        let zeros = match symbol {
            1..=100 => usize::from(symbol),
            POS_ESCAPE_8 => {
                push(output, reader.read_raw(8)? as i16, capacity)?;
                continue;
            }
            NEG_ESCAPE_8 => {
                push(output, -(reader.read_raw(8)? as i16), capacity)?;
                continue;
            }
            POS_ESCAPE_16 => {
                push(output, reader.read_raw(16)? as i16, capacity)?;
                continue;
            }
            NEG_ESCAPE_16 => {
                push(output, (reader.read_raw(16)? as i16).wrapping_neg(), capacity)?;
                continue;
            }
            RUN_ESCAPE_8 => usize::from(reader.read_raw(8)?),
            RUN_ESCAPE_16 => usize::from(reader.read_raw(16)?),
            107..=254 => {
                push(output, (i32::from(symbol) - LITERAL_BIAS) as i16, capacity)?;
                continue;
            }
            _ => {
                return Err(Error::InvalidCategory {
                    symbol,
                    offset: reader.position(),
                })
            }
        };
        if output.len() + zeros > capacity {
            return Err(Error::CoefficientOverflow { capacity });
        }
        output.resize(output.len() + zeros, 0);
    }
}

fn push(output: &mut Vec<i16>, value: i16, capacity: usize) -> Result<()> {
    if output.len() >= capacity {
        return Err(Error::CoefficientOverflow { capacity });
    }
    output.push(value);
    Ok(())
}
