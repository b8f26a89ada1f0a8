//! Sign-magnitude fold of 16-bit sample bit patterns.
//!
//! Half floats reach the engine as raw bit patterns read as `i16`. Negative
//! half values have the top bit set and grow in magnitude as the pattern
//! shrinks, so `-32769 - v` flips them into a range that is monotonic with the
//! represented value. The fold is its own inverse.

use crate::constants::SIGN_MAGNITUDE_FOLD;

#[inline]
pub fn encode(v: i16) -> i32 {
    let v = v as i32;
    if v >= 0 { v } else { SIGN_MAGNITUDE_FOLD - v }
}

#[inline]
pub fn decode(u: i32) -> i16 {
    (if u >= 0 { u } else { SIGN_MAGNITUDE_FOLD - u }) as i16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_involution_all_values() {
        for v in i16::MIN..=i16::MAX {
            assert_eq!(decode(encode(v)), v, "value {v}");
        }
    }

    #[test]
    fn test_known_values() {
        assert_eq!(encode(0), 0);
        assert_eq!(encode(i16::MAX), 32767);
        assert_eq!(encode(-1), -32768);
        assert_eq!(encode(i16::MIN), -1);
    }

    #[test]
    fn test_monotonic_over_negative_halves() {
        // -0.0, -1.0, -2.0 as half bit patterns
        let neg_zero = half::f16::from_f32(-0.0).to_bits() as i16;
        let neg_one = half::f16::from_f32(-1.0).to_bits() as i16;
        let neg_two = half::f16::from_f32(-2.0).to_bits() as i16;

        assert!(encode(neg_zero) > encode(neg_one));
        assert!(encode(neg_one) > encode(neg_two));
        assert!(encode(neg_zero) < encode(0));
    }
}
