//! Float to 16-bit PCM conversion

use crate::domain::error::EncodeError;

/// Convert one float sample to signed 16-bit PCM.
///
/// Input saturates at ±1.0, so out-of-range values land on ±32767 instead of
/// wrapping. The scaled value is truncated toward zero with no dithering.
pub fn to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}

/// Reject samples that are not numbers.
///
/// Infinities are numbers and saturate like any other out-of-range value.
pub fn validate(samples: &[f32]) -> Result<(), EncodeError> {
    match samples.iter().position(|s| s.is_nan()) {
        Some(index) => Err(EncodeError::NonNumericSample { index }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_scale_maps_to_i16_max() {
        assert_eq!(to_i16(1.0), 32767);
        assert_eq!(to_i16(-1.0), -32767);
        assert_eq!(to_i16(0.0), 0);
    }

    #[test]
    fn out_of_range_saturates() {
        assert_eq!(to_i16(1.5), 32767);
        assert_eq!(to_i16(-7.0), -32767);
        assert_eq!(to_i16(f32::INFINITY), 32767);
        assert_eq!(to_i16(f32::NEG_INFINITY), -32767);
    }

    #[test]
    fn truncates_toward_zero() {
        // 0.5 * 32767 = 16383.5
        assert_eq!(to_i16(0.5), 16383);
        assert_eq!(to_i16(-0.5), -16383);
        // Anything below one step rounds to silence
        assert_eq!(to_i16(0.00003), 0);
        assert_eq!(to_i16(-0.00003), 0);
    }

    #[test]
    fn validate_flags_first_nan() {
        assert!(validate(&[0.0, 0.5, -1.0]).is_ok());
        assert_eq!(
            validate(&[0.0, f32::NAN, f32::NAN]),
            Err(EncodeError::NonNumericSample { index: 1 })
        );
    }

    #[test]
    fn validate_accepts_infinities() {
        assert!(validate(&[f32::INFINITY, f32::NEG_INFINITY]).is_ok());
    }
}
