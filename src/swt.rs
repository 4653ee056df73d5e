//! Subband transform interface and the DTT segment describing its filters.
//!
//! The wavelet decomposition itself lives outside this crate. Implementors
//! of [`SubbandTransform`] receive the transform table that is written to,
//! or was read from, the stream.
use crate::container::reader::ByteReader;
use crate::container::scaled;
use crate::container::writer::SegmentWriter;
use crate::container::Marker;
use crate::error::{Error, Result};

pub mod filter;

use filter::{alternate_signs, Filter, Symmetry};

/// Bytes per stored tap: sign, scale and a 32-bit mantissa.
const TAP_LEN: usize = 6;

/// Analysis low-pass taps of the 9/7 filter bank.
const LOWPASS_9_7: [f32; 9] = [
    0.037_828_455_506_995_46,
    -0.023_849_465_019_38,
    -0.110_624_404_418_423_42,
    0.377_402_855_612_653_8,
    0.852_698_679_009_403_44,
    0.377_402_855_612_653_8,
    -0.110_624_404_418_423_42,
    -0.023_849_465_019_38,
    0.037_828_455_506_995_46,
];

/// Analysis high-pass taps of the 9/7 filter bank.
const HIGHPASS_9_7: [f32; 7] = [
    0.064_538_882_628_938_45,
    -0.040_689_417_609_558_44,
    -0.418_092_273_222_212_21,
    0.788_485_616_405_664_39,
    -0.418_092_273_222_212_21,
    -0.040_689_417_609_558_44,
    0.064_538_882_628_938_45,
];

/// Row-major transform coefficients.
#[derive(Debug, Clone, PartialEq)]
pub struct FloatImage {
    pub data: Vec<f32>,
    pub width: usize,
    pub height: usize,
}

/// Transform output together with the normalisation recorded in SOF.
#[derive(Debug, Clone, PartialEq)]
pub struct Decomposition {
    pub image: FloatImage,
    pub m_shift: f32,
    pub r_scale: f32,
}

/// Forward and inverse subband decomposition of 8-bit pixels.
pub trait SubbandTransform {
    fn forward(
        &self,
        pixels: &[u8],
        width: usize,
        height: usize,
        table: &TransformTable,
    ) -> Result<Decomposition>;

    fn inverse(&self, decomposition: &Decomposition, table: &TransformTable) -> Result<Vec<u8>>;
}

/// Analysis filter pair of the transform, as carried by the DTT segment.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformTable {
    lowpass: Filter<f32>,
    highpass: Filter<f32>,
}

impl Default for TransformTable {
    fn default() -> Self {
        Self {
            lowpass: Filter::from_taps(&LOWPASS_9_7),
            highpass: Filter::from_taps(&HIGHPASS_9_7),
        }
    }
}

impl TransformTable {
    /// Table for linear phase analysis filters given by all of their taps.
    pub fn new(lowpass: &[f32], highpass: &[f32]) -> Result<Self> {
        for taps in [lowpass, highpass] {
            if taps.is_empty() || taps.len() > usize::from(u8::MAX) {
                return Err(Error::InvalidSegment {
                    segment: "DTT",
                    reason: "filter length must be 1 to 255 taps",
                });
            }
        }
        Ok(Self {
            lowpass: Filter::from_taps(lowpass),
            highpass: Filter::from_taps(highpass),
        })
    }

    pub fn lowpass(&self) -> Vec<f32> {
        self.lowpass.taps(Symmetry::Symmetric)
    }

    /// Even length high-pass filters are antisymmetric.
    pub fn highpass(&self) -> Vec<f32> {
        match self.highpass {
            Filter::WSS(_) => self.highpass.taps(Symmetry::Symmetric),
            Filter::HSS(_) => self.highpass.taps(Symmetry::Antisymmetric),
        }
    }

    /// Synthesis low-pass and high-pass filters matching the analysis pair.
    pub fn synthesis(&self) -> (Vec<f32>, Vec<f32>) {
        let lowpass = alternate_signs(&self.highpass(), matches!(self.highpass, Filter::HSS(_)));
        let highpass = alternate_signs(&self.lowpass(), false);
        (lowpass, highpass)
    }

    /// Reads the payload following a DTT marker.
    pub fn read(reader: &mut ByteReader<'_>) -> Result<Self> {
        reader.read_length("DTT")?;
        let lowpass_len = usize::from(reader.read_u8("DTT")?);
        let highpass_len = usize::from(reader.read_u8("DTT")?);
        if lowpass_len == 0 || highpass_len == 0 {
            return Err(Error::InvalidSegment {
                segment: "DTT",
                reason: "empty filter",
            });
        }
        let lowpass = read_half(reader, lowpass_len)?;
        let highpass = read_half(reader, highpass_len)?;
        log::debug!("transform table with {lowpass_len}/{highpass_len} taps");
        Ok(Self {
            lowpass: Filter::from_half(lowpass, lowpass_len),
            highpass: Filter::from_half(highpass, highpass_len),
        })
    }

    pub fn write(&self, writer: &mut SegmentWriter) -> Result<()> {
        let halves = self.lowpass.half().len() + self.highpass.half().len();
        writer.put_segment_start(Marker::Dtt, 2 + halves * TAP_LEN)?;
        writer.put_u8(self.lowpass.len() as u8)?;
        writer.put_u8(self.highpass.len() as u8)?;
        for &tap in self.lowpass.half().iter().chain(self.highpass.half()) {
            let (negative, scale, mantissa) = scaled::encode_signed_u32(tap, "filter tap")?;
            writer.put_u8(u8::from(negative))?;
            writer.put_u8(scale)?;
            writer.put_u32(mantissa)?;
        }
        Ok(())
    }
}

fn read_half(reader: &mut ByteReader<'_>, len: usize) -> Result<Vec<f32>> {
    (0..(len + 1) / 2)
        .map(|_| {
            let sign = reader.read_u8("DTT")?;
            let scale = reader.read_u8("DTT")?;
            let tap = scaled::decode(scale, reader.read_u32("DTT")?);
            Ok(if sign != 0 { -tap } else { tap })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(expected: &[f32], actual: &[f32]) {
        assert_eq!(expected.len(), actual.len());
        for (e, a) in expected.iter().zip(actual) {
            assert!((e - a).abs() < 1e-6, "{e} != {a}");
        }
    }

    #[test]
    fn test_default_table_segment() {
        let mut writer = SegmentWriter::new();
        TransformTable::default().write(&mut writer).unwrap();
        let bytes = writer.into_bytes();
        assert_eq!(2 + 58, bytes.len());
        assert_eq!(&[0xFFu8, 0xA4, 0x00, 58, 9, 7], &bytes[..6]);

        let table = TransformTable::read(&mut ByteReader::new(&bytes[2..])).unwrap();
        assert_close(&LOWPASS_9_7, &table.lowpass());
        assert_close(&HIGHPASS_9_7, &table.highpass());
    }

    #[test]
    fn test_even_length_filters() {
        let table = TransformTable::new(&[0.5, 0.5], &[-0.5, 0.5]).unwrap();
        assert_eq!(vec![0.5, 0.5], table.lowpass());
        assert_eq!(vec![-0.5, 0.5], table.highpass());

        let mut writer = SegmentWriter::new();
        table.write(&mut writer).unwrap();
        let bytes = writer.into_bytes();
        let read = TransformTable::read(&mut ByteReader::new(&bytes[2..])).unwrap();
        assert_eq!(table, read);
    }

    #[test]
    fn test_synthesis_of_default_table() {
        let (lowpass, highpass) = TransformTable::default().synthesis();
        assert_eq!(7, lowpass.len());
        assert_eq!(9, highpass.len());
        assert_eq!(HIGHPASS_9_7[3], lowpass[3]);
        assert_eq!(-HIGHPASS_9_7[4], lowpass[4]);
        assert_eq!(LOWPASS_9_7[4], highpass[4]);
        assert_eq!(-LOWPASS_9_7[5], highpass[5]);
    }

    #[test]
    fn test_synthesis_of_haar_pair() {
        let table = TransformTable::new(&[0.5, 0.5], &[-0.5, 0.5]).unwrap();
        let (lowpass, highpass) = table.synthesis();
        assert_eq!(vec![-0.5, -0.5], lowpass);
        assert_eq!(vec![-0.5, 0.5], highpass);
    }

    #[test]
    fn test_truncated_table() {
        let bytes = [0x00, 0x3A, 0x09, 0x07, 0x00, 0x09];
        assert!(matches!(
            TransformTable::read(&mut ByteReader::new(&bytes)),
            Err(Error::TruncatedInput { .. })
        ));
    }

    #[test]
    fn test_rejects_empty_filter() {
        assert!(TransformTable::new(&[], &[1.0]).is_err());
    }
}
