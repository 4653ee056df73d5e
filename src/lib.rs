//! Entropy coding and container format of the Wavelet Scalar Quantization
//! (WSQ) grayscale image codec.
//!
//! The wavelet transform and the quantizer are supplied by the caller
//! through [`SubbandTransform`] and [`Quantizer`]; this crate builds the
//! Huffman tables, codes the coefficient blocks and reads and writes the
//! marker segments around them.
pub mod codec;
pub mod container;
pub mod entropy;
pub mod error;
pub mod nistcom;
pub mod quantization;
pub mod swt;

pub use codec::{decode, encode, DecodedImage, EncoderOptions};
pub use container::stream::{add_comment, dimensions, nistcom, ppi, read_stream, write_stream};
pub use error::{Error, Result};
pub use nistcom::{MetadataStore, NistCom};
pub use quantization::{QuantizationTable, QuantizedImage, Quantizer};
pub use swt::{Decomposition, FloatImage, SubbandTransform, TransformTable};
