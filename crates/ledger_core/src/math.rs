//! Fixed-point helpers for the tick clock.
//!
//! Fractional tick time is accumulated in fixed point so that summing many
//! small frame deltas is exact and identical on every platform. Floats only
//! appear at the boundary, where host time enters the engine.

use fixed::types::I32F32;

/// Fixed-point number type used for accumulated tick fractions.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
pub type Fixed = I32F32;

/// `2^32`, the scale between a float and [`Fixed`]'s raw bits.
const FRAC_SCALE: f64 = 4_294_967_296.0;

/// Convert a float to [`Fixed`], rounding to the nearest representable value.
///
/// Non-finite input converts to zero; out-of-range input saturates.
#[must_use]
pub fn fixed_from_f64(value: f64) -> Fixed {
    if !value.is_finite() {
        return Fixed::ZERO;
    }
    Fixed::from_bits((value * FRAC_SCALE).round() as i64)
}

/// Convert [`Fixed`] back to a float.
#[must_use]
pub fn fixed_to_f64(value: Fixed) -> f64 {
    value.to_bits() as f64 / FRAC_SCALE
}

/// Serde support for fixed-point numbers.
///
/// Serializes fixed-point numbers as their raw bit representation (i64)
/// to preserve exact precision across serialization boundaries.
pub mod fixed_serde {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number as its raw bit representation.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_bits().serialize(serializer)
    }

    /// Deserialize a fixed-point number from its raw bit representation.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = i64::deserialize(deserializer)?;
        Ok(Fixed::from_bits(bits))
    }
}
