//! Floats stored as an unsigned mantissa and a decimal exponent,
//! `value = mantissa / 10^scale`.
use crate::error::{Error, Result};

/// Rebuilds a value, dividing by ten one step at a time in single precision.
pub fn decode(scale: u8, mantissa: u32) -> f32 {
    let mut value = mantissa as f32;
    for _ in 0..scale {
        value = (f64::from(value) / 10.0) as f32;
    }
    value
}

/// Largest mantissa precision for a value below `limit`: the value is
/// scaled up by tens until it reaches the limit, then backed off one step.
fn encode(value: f32, limit: f64, field: &'static str) -> Result<(u8, u32)> {
    if value == 0.0 {
        return Ok((0, 0));
    }
    let out_of_range = || Error::ValueOutOfRange {
        field,
        value: f64::from(value),
    };
    if value.is_nan() || value < 0.0 || f64::from(value) >= limit {
        return Err(out_of_range());
    }
    let mut scaled = value;
    let mut scale: u32 = 0;
    while f64::from(scaled) < limit {
        scaled *= 10.0;
        scale += 1;
    }
    let scale = u8::try_from(scale - 1).map_err(|_| out_of_range())?;
    let mantissa = (f64::from(scaled) / 10.0).round() as u32;
    Ok((scale, mantissa))
}

/// Encoding with a 16-bit mantissa, used by DQT and SOF.
pub fn encode_u16(value: f32, field: &'static str) -> Result<(u8, u16)> {
    let (scale, mantissa) = encode(value, f64::from(u16::MAX), field)?;
    Ok((scale, mantissa as u16))
}

/// Encoding with a 32-bit mantissa and a separate sign, used by DTT.
pub fn encode_signed_u32(value: f32, field: &'static str) -> Result<(bool, u8, u32)> {
    let negative = value < 0.0;
    let (scale, mantissa) = encode(value.abs(), f64::from(u32::MAX), field)?;
    Ok((negative, scale, mantissa))
}
