//! Whole-image encoding and decoding around the external transform and
//! quantizer.
use crate::container::segments::FrameHeader;
use crate::container::stream::{self, CoefficientImage};
use crate::error::{Error, Result};
use crate::nistcom::{ImageAttributes, MetadataStore, NistCom};
use crate::quantization::Quantizer;
use crate::swt::{Decomposition, SubbandTransform, TransformTable};

/// Only 8-bit grayscale is supported.
pub const PIXEL_DEPTH: u8 = 8;

#[derive(Debug, Clone, PartialEq)]
pub struct EncoderOptions {
    /// Target bits per pixel, passed to the quantizer and recorded in NISTCOM.
    pub bitrate: f32,
    /// Scan resolution; recorded as -1 when unknown.
    pub ppi: Option<i32>,
    /// A NISTCOM block to merge the image attributes into, or free text
    /// for a comment segment of its own.
    pub comment: Option<String>,
    /// Fail with `BufferOverflow` instead of producing more bytes.
    pub max_output_len: Option<usize>,
}

impl Default for EncoderOptions {
    fn default() -> Self {
        Self {
            bitrate: 0.75,
            ppi: None,
            comment: None,
            max_output_len: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub pixels: Vec<u8>,
    pub width: usize,
    pub height: usize,
    pub depth: u8,
    pub ppi: Option<i32>,
}

fn check_dimensions(width: usize, height: usize) -> Result<(u16, u16)> {
    match (u16::try_from(width), u16::try_from(height)) {
        (Ok(w), Ok(h)) if w > 0 && h > 0 => Ok((w, h)),
        _ => Err(Error::InvalidDimensions { width, height }),
    }
}

pub fn encode<T, Q>(
    pixels: &[u8],
    width: usize,
    height: usize,
    transform: &T,
    quantizer: &Q,
    options: &EncoderOptions,
) -> Result<Vec<u8>>
where
    T: SubbandTransform,
    Q: Quantizer,
{
    let (frame_width, frame_height) = check_dimensions(width, height)?;
    if pixels.len() != width * height {
        return Err(Error::InvalidDimensions { width, height });
    }

    let table = TransformTable::default();
    let decomposition = transform.forward(pixels, width, height, &table)?;
    let quantized = quantizer.quantize(&decomposition, options.bitrate)?;
    log::debug!(
        "quantized into blocks of {}, {} and {} coefficients",
        quantized.blocks[0].len(),
        quantized.blocks[1].len(),
        quantized.blocks[2].len()
    );

    let (existing, free_text) = match options.comment.as_deref() {
        Some(text) if NistCom::is_nistcom(text.as_bytes()) => (Some(NistCom::parse(text)?), None),
        Some(text) => (None, Some(text)),
        None => (None, None),
    };
    let attributes = ImageAttributes {
        width,
        height,
        depth: PIXEL_DEPTH,
        ppi: options.ppi,
        lossy: true,
        bitrate: options.bitrate,
    };
    let nistcom = NistCom::for_wsq(existing, &attributes).format();
    let mut comments = vec![nistcom.as_bytes()];
    comments.extend(free_text.map(str::as_bytes));

    let image = CoefficientImage {
        frame: FrameHeader::new(
            frame_width,
            frame_height,
            decomposition.m_shift,
            decomposition.r_scale,
        ),
        transform: table,
        quantization: quantized.table,
        blocks: quantized.blocks,
    };
    stream::write_stream(&image, &comments, options.max_output_len)
}

pub fn decode<T, Q>(data: &[u8], transform: &T, quantizer: &Q) -> Result<DecodedImage>
where
    T: SubbandTransform,
    Q: Quantizer,
{
    let decoded = stream::read_stream(data)?;
    let table = decoded
        .tables
        .transform
        .ok_or(Error::MissingTable { segment: "DTT" })?;
    let quantization = decoded
        .tables
        .quantization
        .ok_or(Error::MissingTable { segment: "DQT" })?;
    let width = usize::from(decoded.frame.width);
    let height = usize::from(decoded.frame.height);

    let image = quantizer.dequantize(&decoded.blocks, &quantization, width, height)?;
    let decomposition = Decomposition {
        image,
        m_shift: decoded.frame.m_shift,
        r_scale: decoded.frame.r_scale,
    };
    let pixels = transform.inverse(&decomposition, &table)?;
    if pixels.len() != width * height {
        return Err(Error::Transform(format!(
            "inverse transform produced {} pixels for a {width}x{height} image",
            pixels.len()
        )));
    }

    Ok(DecodedImage {
        pixels,
        width,
        height,
        depth: PIXEL_DEPTH,
        ppi: stream::ppi(data)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quantization::{QuantizationTable, QuantizedImage};
    use crate::swt::FloatImage;

    struct Shift;

    impl SubbandTransform for Shift {
        fn forward(
            &self,
            pixels: &[u8],
            width: usize,
            height: usize,
            _table: &TransformTable,
        ) -> Result<Decomposition> {
            Ok(Decomposition {
                image: FloatImage {
                    data: pixels.iter().map(|&p| f32::from(p) - 128.0).collect(),
                    width,
                    height,
                },
                m_shift: 128.0,
                r_scale: 1.0,
            })
        }

        fn inverse(
            &self,
            decomposition: &Decomposition,
            _table: &TransformTable,
        ) -> Result<Vec<u8>> {
            Ok(decomposition
                .image
                .data
                .iter()
                .map(|&v| (v + decomposition.m_shift).round().clamp(0.0, 255.0) as u8)
                .collect())
        }
    }

    /// Rounds and splits the coefficients into three equal thirds.
    struct Thirds;

    impl Quantizer for Thirds {
        fn quantize(&self, decomposition: &Decomposition, _bitrate: f32) -> Result<QuantizedImage> {
            let values: Vec<i16> = decomposition
                .image
                .data
                .iter()
                .map(|&v| v.round() as i16)
                .collect();
            let third = values.len() / 3;
            let mut table = QuantizationTable::default();
            table.q_bin[0] = 1.0;
            Ok(QuantizedImage {
                blocks: [
                    values[..third].to_vec(),
                    values[third..2 * third].to_vec(),
                    values[2 * third..].to_vec(),
                ],
                table,
            })
        }

        fn dequantize(
            &self,
            blocks: &[Vec<i16>],
            _table: &QuantizationTable,
            width: usize,
            height: usize,
        ) -> Result<FloatImage> {
            Ok(FloatImage {
                data: blocks.concat().into_iter().map(f32::from).collect(),
                width,
                height,
            })
        }
    }

    fn pixels() -> Vec<u8> {
        (0..36u32).map(|i| (i * 7 % 256) as u8).collect()
    }

    #[test]
    fn test_encode_then_decode() {
        let options = EncoderOptions {
            ppi: Some(500),
            ..Default::default()
        };
        let bytes = encode(&pixels(), 6, 6, &Shift, &Thirds, &options).unwrap();
        let image = decode(&bytes, &Shift, &Thirds).unwrap();
        assert_eq!(pixels(), image.pixels);
        assert_eq!((6, 6, 8), (image.width, image.height, image.depth));
        assert_eq!(Some(500), image.ppi);
    }

    #[test]
    fn test_free_text_comment_gets_own_segment() {
        let options = EncoderOptions {
            comment: Some("scanned 2021".to_string()),
            ..Default::default()
        };
        let bytes = encode(&pixels(), 6, 6, &Shift, &Thirds, &options).unwrap();
        let decoded = stream::read_stream(&bytes).unwrap();
        assert_eq!(2, decoded.tables.comments.len());
        assert!(NistCom::is_nistcom(&decoded.tables.comments[0]));
        assert_eq!(b"scanned 2021".to_vec(), decoded.tables.comments[1]);
        assert_eq!(None, decode(&bytes, &Shift, &Thirds).unwrap().ppi);
    }

    #[test]
    fn test_nistcom_comment_is_merged() {
        let options = EncoderOptions {
            comment: Some("NIST_COM 2\nSD_ID 14".to_string()),
            ppi: Some(1000),
            ..Default::default()
        };
        let bytes = encode(&pixels(), 6, 6, &Shift, &Thirds, &options).unwrap();
        let nistcom = stream::nistcom(&bytes).unwrap().unwrap();
        assert_eq!(Some("14"), nistcom.get("SD_ID"));
        assert_eq!(Some("10"), nistcom.get("NIST_COM"));
        assert_eq!(Some(1000), nistcom.ppi());
        assert_eq!(1, stream::read_stream(&bytes).unwrap().tables.comments.len());
    }

    #[test]
    fn test_rejects_bad_dimensions() {
        let options = EncoderOptions::default();
        assert_eq!(
            Err(Error::InvalidDimensions { width: 6, height: 5 }),
            encode(&pixels(), 6, 5, &Shift, &Thirds, &options)
        );
        assert_eq!(
            Err(Error::InvalidDimensions { width: 0, height: 6 }),
            encode(&[], 0, 6, &Shift, &Thirds, &options)
        );
    }

    #[test]
    fn test_decode_without_transform_table() {
        let image = CoefficientImage {
            frame: FrameHeader::new(3, 1, 128.0, 1.0),
            transform: TransformTable::default(),
            quantization: QuantizationTable::default(),
            blocks: [vec![1], vec![2], vec![3]],
        };
        let bytes = stream::write_stream(&image, &[], None).unwrap();
        // Drop the 60 byte DTT segment that follows SOI.
        let mut without_dtt = bytes[..2].to_vec();
        without_dtt.extend_from_slice(&bytes[62..]);
        assert_eq!(
            Err(Error::MissingTable { segment: "DTT" }),
            decode(&without_dtt, &Shift, &Thirds)
        );
    }
}
