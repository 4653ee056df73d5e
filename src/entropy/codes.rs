//! Canonical code assignment and the lookup tables built from it.
use crate::entropy::bitstream::{BitReader, ReadBits};
use crate::entropy::{CodeLengthSpec, MAX_CODE_LENGTH};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HuffCode {
    pub code: u16,
    pub size: u8,
}

/// Code sizes in canonical order, one entry per code.
pub fn build_huffsizes(bits: &[u8; MAX_CODE_LENGTH]) -> Vec<u8> {
    bits.iter()
        .enumerate()
        .flat_map(|(i, &count)| std::iter::repeat((i + 1) as u8).take(count as usize))
        .collect()
}

/// Assigns consecutive codes within a size, shifting left whenever the size grows.
pub fn build_huffcodes(sizes: &[u8]) -> Vec<HuffCode> {
    let mut codes = Vec::with_capacity(sizes.len());
    let Some(&first) = sizes.first() else {
        return codes;
    };
    let mut code: u32 = 0;
    let mut current = first;
    for &size in sizes {
        while current < size {
            code <<= 1;
            current += 1;
        }
        codes.push(HuffCode {
            code: code as u16,
            size,
        });
        code += 1;
    }
    codes
}

/// Fails on the first code made only of 1-bits.
pub fn check_huffcodes(codes: &[HuffCode]) -> Result<()> {
    match codes
        .iter()
        .find(|c| u32::from(c.code) == (1u32 << c.size) - 1)
    {
        Some(c) => Err(Error::NonCompliantCode {
            code: c.code,
            length: c.size,
        }),
        None => Ok(()),
    }
}

/// Whether the counts of `bits` fit into the 16-bit code space.
pub fn fits_code_space(bits: &[u8; MAX_CODE_LENGTH]) -> bool {
    let used: u32 = bits
        .iter()
        .enumerate()
        .map(|(i, &count)| u32::from(count) << (MAX_CODE_LENGTH - 1 - i))
        .sum();
    used <= 1 << MAX_CODE_LENGTH
}

/// Scatters codes in canonical order into a table indexed by symbol.
pub fn build_huffcode_table(codes: &[HuffCode], values: &[u8]) -> Vec<HuffCode> {
    let mut table = vec![HuffCode::default(); 256];
    for (code, &value) in codes.iter().zip(values) {
        table[value as usize] = *code;
    }
    table
}

/// Per code length: first and last code, and where its symbols start.
/// Index 0 is unused; `max_code` is -1 for lengths without codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeIndex {
    pub min_code: [i32; MAX_CODE_LENGTH + 1],
    pub max_code: [i32; MAX_CODE_LENGTH + 1],
    pub value_ptr: [usize; MAX_CODE_LENGTH + 1],
}

impl DecodeIndex {
    pub fn new(bits: &[u8; MAX_CODE_LENGTH], codes: &[HuffCode]) -> Self {
        let mut index = DecodeIndex {
            min_code: [0; MAX_CODE_LENGTH + 1],
            max_code: [0; MAX_CODE_LENGTH + 1],
            value_ptr: [0; MAX_CODE_LENGTH + 1],
        };
        let mut next = 0;
        for length in 1..=MAX_CODE_LENGTH {
            let count = bits[length - 1] as usize;
            if count == 0 {
                index.max_code[length] = -1;
                continue;
            }
            index.value_ptr[length] = next;
            index.min_code[length] = i32::from(codes[next].code);
            next += count;
            index.max_code[length] = i32::from(codes[next - 1].code);
        }
        index
    }
}

/// Symbol to code lookup for the encoder.
#[derive(Debug, Clone)]
pub struct EncodeTable {
    table_id: u8,
    codes: Vec<HuffCode>,
}

impl EncodeTable {
    /// An all-ones code makes the table unusable for encoding.
    pub fn new(table_id: u8, spec: &CodeLengthSpec) -> Result<Self> {
        if !fits_code_space(&spec.bits) {
            return Err(Error::InvalidHuffmanTable {
                table_id,
                reason: "code counts overflow the code space",
            });
        }
        let codes = build_huffcodes(&build_huffsizes(&spec.bits));
        check_huffcodes(&codes)?;
        Ok(Self {
            table_id,
            codes: build_huffcode_table(&codes, &spec.values),
        })
    }

    pub fn table_id(&self) -> u8 {
        self.table_id
    }

    pub fn code(&self, symbol: u8) -> Option<HuffCode> {
        let code = self.codes[symbol as usize];
        (code.size > 0).then_some(code)
    }
}

/// Outcome of reading one code: a symbol, or the marker that ended the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoded {
    Symbol(u8),
    Marker(u16),
}

/// Code to symbol lookup for the decoder.
#[derive(Debug, Clone)]
pub struct DecodeTable {
    index: DecodeIndex,
    values: Vec<u8>,
}

impl DecodeTable {
    /// An all-ones code is only logged; such tables still decode.
    pub fn new(table_id: u8, spec: &CodeLengthSpec) -> Result<Self> {
        if !fits_code_space(&spec.bits) {
            return Err(Error::InvalidHuffmanTable {
                table_id,
                reason: "code counts overflow the code space",
            });
        }
        let codes = build_huffcodes(&build_huffsizes(&spec.bits));
        if codes.len() != spec.values.len() {
            return Err(Error::InvalidHuffmanTable {
                table_id,
                reason: "code count does not match value count",
            });
        }
        if let Err(err) = check_huffcodes(&codes) {
            log::warn!("Huffman table {table_id}: {err}; the image may still decode");
        }
        Ok(Self {
            index: DecodeIndex::new(&spec.bits, &codes),
            values: spec.values.clone(),
        })
    }

    /// Reads one code a bit at a time, longest match last.
    pub fn decode(&self, reader: &mut BitReader<'_>) -> Result<Decoded> {
        let mut code = match reader.read_bits(1)? {
            ReadBits::Bits(bit) => i32::from(bit),
            ReadBits::Marker(marker) => return Ok(Decoded::Marker(marker)),
        };
        let mut length = 1;
        while code > self.index.max_code[length] {
            length += 1;
            if length > MAX_CODE_LENGTH {
                return Err(Error::InvalidCode {
                    offset: reader.position(),
                });
            }
            match reader.read_bits(1)? {
                ReadBits::Bits(bit) => code = (code << 1) | i32::from(bit),
                ReadBits::Marker(marker) => return Ok(Decoded::Marker(marker)),
            }
        }
        let offset = code - self.index.min_code[length];
        usize::try_from(offset)
            .ok()
            .and_then(|offset| self.values.get(self.index.value_ptr[length] + offset))
            .map(|&symbol| Decoded::Symbol(symbol))
            .ok_or(Error::InvalidCode {
                offset: reader.position(),
            })
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::entropy::bitstream::BitWriter;

    fn spec(bits: &[(usize, u8)], values: Vec<u8>) -> CodeLengthSpec {
        let mut counts = [0u8; MAX_CODE_LENGTH];
        for &(length, count) in bits {
            counts[length - 1] = count;
        }
        CodeLengthSpec {
            bits: counts,
            values,
        }
    }

    #[test]
    fn test_build_huffsizes() {
        let spec = spec(&[(2, 1), (3, 2)], vec![1, 2, 3]);
        assert_eq!(vec![2, 3, 3], build_huffsizes(&spec.bits));
    }

    #[test]
    fn test_build_huffcodes_shifts_on_length_change() {
        let codes = build_huffcodes(&[2, 2, 3, 3, 5]);
        let actual: Vec<u16> = codes.iter().map(|c| c.code).collect();
        assert_eq!(vec![0b00, 0b01, 0b100, 0b101, 0b11000], actual);
    }

    #[test]
    fn test_build_huffcodes_empty() {
        assert!(build_huffcodes(&[]).is_empty());
    }

    #[test]
    fn test_check_huffcodes_finds_all_ones() {
        let codes = build_huffcodes(&[1, 1]);
        assert_eq!(
            Err(Error::NonCompliantCode { code: 1, length: 1 }),
            check_huffcodes(&codes)
        );
        assert!(check_huffcodes(&build_huffcodes(&[1, 2])).is_ok());
    }

    #[test]
    fn test_build_huffcode_table_scatters_by_value() {
        let codes = build_huffcodes(&[1, 2]);
        let table = build_huffcode_table(&codes, &[200, 7]);
        assert_eq!(HuffCode { code: 0, size: 1 }, table[200]);
        assert_eq!(HuffCode { code: 0b10, size: 2 }, table[7]);
        assert_eq!(0, table[0].size);
    }

    #[test]
    fn test_decode_index_marks_empty_lengths() {
        let spec = spec(&[(2, 1), (4, 2)], vec![9, 8, 7]);
        let codes = build_huffcodes(&build_huffsizes(&spec.bits));
        let index = DecodeIndex::new(&spec.bits, &codes);
        assert_eq!(-1, index.max_code[1]);
        assert_eq!(0, index.min_code[2]);
        assert_eq!(0, index.max_code[2]);
        assert_eq!(-1, index.max_code[3]);
        assert_eq!(0b0100, index.min_code[4]);
        assert_eq!(0b0101, index.max_code[4]);
        assert_eq!(1, index.value_ptr[4]);
    }

    #[test]
    fn test_encode_table_rejects_all_ones() {
        let spec = spec(&[(1, 2)], vec![3, 4]);
        assert!(matches!(
            EncodeTable::new(0, &spec),
            Err(Error::NonCompliantCode { .. })
        ));
    }

    #[test]
    fn test_encode_table_keeps_its_id() {
        let spec = spec(&[(2, 1)], vec![3]);
        assert_eq!(2, EncodeTable::new(2, &spec).unwrap().table_id());
    }

    #[test]
    fn test_decode_table_accepts_all_ones() {
        let spec = spec(&[(1, 2)], vec![3, 4]);
        let table = DecodeTable::new(0, &spec).unwrap();
        let data = [0b0100_0000];
        let mut reader = BitReader::new(&data, 0);
        assert_eq!(Decoded::Symbol(3), table.decode(&mut reader).unwrap());
        assert_eq!(Decoded::Symbol(4), table.decode(&mut reader).unwrap());
    }

    #[test]
    fn test_decode_table_rejects_overfull_lengths() {
        let spec = spec(&[(1, 3)], vec![1, 2, 3]);
        assert!(matches!(
            DecodeTable::new(1, &spec),
            Err(Error::InvalidHuffmanTable { table_id: 1, .. })
        ));
    }

    #[test]
    fn test_code_space_overflow_past_16_bits() {
        // Lengths 1 and 2 fill the code space; one more 16-bit code would
        // wrap around to code 0 when truncated to 16 bits.
        let spec = spec(&[(1, 1), (2, 2), (16, 1)], vec![1, 2, 3, 4]);
        assert!(!fits_code_space(&spec.bits));
        assert!(matches!(
            DecodeTable::new(0, &spec),
            Err(Error::InvalidHuffmanTable { table_id: 0, .. })
        ));
        assert!(matches!(
            EncodeTable::new(0, &spec),
            Err(Error::InvalidHuffmanTable { table_id: 0, .. })
        ));
        assert!(fits_code_space(&self::spec(&[(1, 1), (2, 2)], vec![1, 2, 3]).bits));
    }

    #[test]
    fn test_decode_reports_marker() {
        let spec = spec(&[(2, 3)], vec![1, 2, 3]);
        let table = DecodeTable::new(0, &spec).unwrap();
        let data = [0xFF, 0xA3];
        let mut reader = BitReader::new(&data, 0);
        assert_eq!(Decoded::Marker(0xFFA3), table.decode(&mut reader).unwrap());
    }

    /// Code length counts that satisfy the Kraft inequality with one code
    /// point left unused.
    fn valid_bits() -> impl Strategy<Value = [u8; MAX_CODE_LENGTH]> {
        prop::collection::vec(0u8..4, MAX_CODE_LENGTH).prop_map(|wanted| {
            let mut bits = [0u8; MAX_CODE_LENGTH];
            let mut free: u32 = 1 << MAX_CODE_LENGTH;
            for (length, &want) in wanted.iter().enumerate() {
                let weight = 1u32 << (MAX_CODE_LENGTH - 1 - length);
                let mut count = 0;
                while count < want && free > weight {
                    free -= weight;
                    count += 1;
                }
                bits[length] = count;
            }
            bits
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig { cases: 100, ..ProptestConfig::default() })]

        #[test]
        fn test_every_code_decodes_to_its_symbol(bits in valid_bits()) {
            let total: usize = bits.iter().map(|&b| b as usize).sum();
            prop_assume!(total > 0);
            let values: Vec<u8> = (0..total).map(|i| (i * 7 % 256) as u8).collect();
            let spec = CodeLengthSpec { bits, values: values.clone() };

            let codes = build_huffcodes(&build_huffsizes(&spec.bits));
            let mut writer = BitWriter::new();
            for code in &codes {
                writer.write_bits(code.code, code.size);
            }
            let data = writer.finish();

            let table = DecodeTable::new(0, &spec).unwrap();
            let mut reader = BitReader::new(&data, 0);
            for &value in &values {
                prop_assert_eq!(Decoded::Symbol(value), table.decode(&mut reader).unwrap());
            }
        }
    }
}
