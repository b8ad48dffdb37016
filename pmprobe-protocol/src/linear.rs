//! PMBus linear number formats
//!
//! - linear11: `[15:11]` signed exponent N, `[10:0]` signed mantissa Y,
//!   value = Y * 2^N
//! - linear16: the whole word is a signed mantissa; the exponent is the
//!   low five bits of VOUT_MODE, read separately
//!
//! Everything here is pure. Fetching VOUT_MODE is the caller's job.

/// 2^exp
fn pow2(exp: i8) -> f32 {
    libm::ldexpf(1.0, i32::from(exp))
}

/// Sign-extend a 5-bit field
fn exponent5(raw: u8) -> i8 {
    let n = (raw & 0x1F) as i8;
    if n & 0x10 != 0 {
        n - 32
    } else {
        n
    }
}

/// Decode a linear11 word given as its two wire bytes
pub fn decode_linear11(lsb: u8, msb: u8) -> f32 {
    let raw = u16::from_le_bytes([lsb, msb]);
    let exponent = exponent5((raw >> 11) as u8);

    let y = (raw & 0x7FF) as i32;
    let mantissa = if y & 0x400 != 0 { y - 2048 } else { y };

    mantissa as f32 * pow2(exponent)
}

/// Decode a linear16 word with an exponent taken from VOUT_MODE
pub fn decode_linear16(raw: u16, exponent: i8) -> f32 {
    f32::from(raw as i16) * pow2(exponent)
}

/// Extract the linear16 exponent from a VOUT_MODE byte
///
/// Only the low five bits carry the exponent; 16..=31 stand for -16..=-1.
/// The mode bits `[7:5]` are ignored.
pub fn vout_mode_exponent(vout_mode: u8) -> i8 {
    exponent5(vout_mode)
}
