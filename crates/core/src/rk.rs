//! RK number decoding.
//!
//! RK is the packed 32-bit numeric encoding used by RK and MULRK cells:
//!
//! - bit 0: the value was multiplied by 100 before encoding
//! - bit 1: the payload is an integer (set) or the top of a double (clear)
//! - bits 2..31: payload
//!
//! Whether a value decodes to an integer or a float matters for rendering,
//! so the result keeps that distinction.

use serde::Serialize;
use std::fmt;

const RK_DIV_100: u32 = 0x1;
const RK_INTEGER: u32 = 0x2;

/// A decoded numeric cell value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Numeric {
    /// Whole number stored as an integer.
    Int(i64),
    /// Floating point number.
    Float(f64),
}

impl Numeric {
    /// The value as a double, whatever its encoding.
    pub fn as_f64(&self) -> f64 {
        match *self {
            Numeric::Int(i) => i as f64,
            Numeric::Float(f) => f,
        }
    }

    /// Whether the value came out of a floating point encoding.
    pub fn is_float(&self) -> bool {
        matches!(self, Numeric::Float(_))
    }
}

impl fmt::Display for Numeric {
    /// Integers as plain decimal, floats as the shortest decimal that
    /// round-trips (never in exponent notation).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Numeric::Int(i) => write!(f, "{}", i),
            Numeric::Float(v) => write!(f, "{}", v),
        }
    }
}

/// Decode a 32-bit RK value.
pub fn decode_rk(rk: u32) -> Numeric {
    let div_100 = rk & RK_DIV_100 != 0;

    if rk & RK_INTEGER == 0 {
        // Payload holds the upper 30 bits of an IEEE-754 double.
        let value = f64::from_bits(u64::from(rk >> 2) << 34);
        return Numeric::Float(if div_100 { value / 100.0 } else { value });
    }

    // Arithmetic shift keeps the sign of the 30-bit integer.
    let value = (rk as i32) >> 2;
    if div_100 {
        Numeric::Float(f64::from(value) / 100.0)
    } else {
        Numeric::Int(i64::from(value))
    }
}
