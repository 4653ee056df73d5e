//! Module for (de)quantization in the WSQ
//!
//! Quantization is done outside this crate; the codec only carries its
//! parameters in the DQT segment and hands coefficient blocks across the
//! [`Quantizer`] interface.
use crate::container::reader::ByteReader;
use crate::container::segments::{read_scaled_u16, write_scaled_u16};
use crate::container::writer::SegmentWriter;
use crate::container::Marker;
use crate::error::Result;
use crate::swt::{Decomposition, FloatImage};

/// Subband slots in a DQT segment.
pub const MAX_SUBBANDS: usize = 64;
/// Subbands a WSQ decomposition produces.
pub const NUM_SUBBANDS: usize = 60;
/// Coefficient blocks per image.
pub const NUM_BLOCKS: usize = 3;

const SCALED_LEN: usize = 3;
const DEFAULT_BIN_CENTER: f32 = 0.44;

#[derive(Debug, Clone, PartialEq)]
pub struct QuantizationTable {
    pub bin_center: f32,
    /// Bin width per subband; zero marks a subband that was not coded.
    pub q_bin: [f32; MAX_SUBBANDS],
    /// Dead zone width per subband.
    pub z_bin: [f32; MAX_SUBBANDS],
}

impl Default for QuantizationTable {
    fn default() -> Self {
        Self {
            bin_center: DEFAULT_BIN_CENTER,
            q_bin: [0.0; MAX_SUBBANDS],
            z_bin: [0.0; MAX_SUBBANDS],
        }
    }
}

impl QuantizationTable {
    /// Reads the payload following a DQT marker.
    pub fn read(reader: &mut ByteReader<'_>) -> Result<Self> {
        reader.read_length("DQT")?;
        let mut table = QuantizationTable {
            bin_center: read_scaled_u16(reader, "DQT")?,
            ..Default::default()
        };
        for subband in 0..MAX_SUBBANDS {
            table.q_bin[subband] = read_scaled_u16(reader, "DQT")?;
            table.z_bin[subband] = read_scaled_u16(reader, "DQT")?;
        }
        log::debug!(
            "quantization table with {} coded subbands",
            table.q_bin.iter().filter(|&&q| q != 0.0).count()
        );
        Ok(table)
    }

    pub fn write(&self, writer: &mut SegmentWriter) -> Result<()> {
        writer.put_segment_start(Marker::Dqt, SCALED_LEN * (1 + 2 * MAX_SUBBANDS))?;
        if self.bin_center == DEFAULT_BIN_CENTER {
            // 0.44 as scale 2, mantissa 44.
            writer.put_bytes(&[2, 0, 44])?;
        } else {
            write_scaled_u16(writer, self.bin_center, "bin center")?;
        }
        for subband in 0..MAX_SUBBANDS {
            if subband < NUM_SUBBANDS && self.q_bin[subband] != 0.0 {
                write_scaled_u16(writer, self.q_bin[subband], "bin width")?;
                write_scaled_u16(writer, self.z_bin[subband], "dead zone width")?;
            } else {
                writer.put_bytes(&[0; 2 * SCALED_LEN])?;
            }
        }
        Ok(())
    }
}

/// Quantizer output: the three coefficient blocks and their parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantizedImage {
    pub blocks: [Vec<i16>; NUM_BLOCKS],
    pub table: QuantizationTable,
}

pub trait Quantizer {
    /// Quantizes a decomposition aiming at `bitrate` bits per pixel.
    fn quantize(&self, decomposition: &Decomposition, bitrate: f32) -> Result<QuantizedImage>;

    /// Rebuilds transform coefficients from the decoded blocks.
    fn dequantize(
        &self,
        blocks: &[Vec<i16>],
        table: &QuantizationTable,
        width: usize,
        height: usize,
    ) -> Result<FloatImage>;
}
