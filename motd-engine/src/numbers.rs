//! Numeric conversion helpers centralizing safe numeric casts.

use num_traits::cast::cast;

/// Ceil a f64 and clamp it to the u32 range, returning 0 for non-finite values.
#[must_use]
pub fn ceil_f64_to_u32(value: f64) -> u32 {
    if !value.is_finite() {
        return 0;
    }
    let max = cast::<u32, f64>(u32::MAX).unwrap_or(f64::MAX);
    let clamped = value.clamp(0.0, max).ceil();
    cast::<f64, u32>(clamped).unwrap_or(0)
}

/// Clamp an i64 configuration value into `[min, u32::MAX]`.
#[must_use]
pub fn clamp_i64_to_u32(value: i64, min: u32) -> u32 {
    let clamped = value.clamp(i64::from(min), i64::from(u32::MAX));
    u32::try_from(clamped).unwrap_or(min)
}

/// Convert u32 to f64 losslessly.
#[must_use]
pub fn u32_to_f64(value: u32) -> f64 {
    f64::from(value)
}

/// Convert usize to f64; precision loss only above 2^53.
#[must_use]
pub fn usize_to_f64(value: usize) -> f64 {
    cast::<usize, f64>(value).unwrap_or(f64::MAX)
}

/// Floor a non-negative f64 into a usize, returning 0 for non-finite values.
#[must_use]
pub fn floor_f64_to_usize(value: f64) -> usize {
    if !value.is_finite() {
        return 0;
    }
    cast::<f64, usize>(value.max(0.0).floor()).unwrap_or(0)
}

/// Scale a `[0, 1]` intensity to an 8-bit color channel.
#[must_use]
pub fn unit_to_channel(value: f64) -> u32 {
    let unit = if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    };
    cast::<f64, u32>((unit * 255.0).round()).unwrap_or(0)
}

/// Reduce a u64 into an index below `len`; `len` must be non-zero.
#[must_use]
pub fn index_mod(value: u64, len: usize) -> usize {
    let len64 = u64::try_from(len).unwrap_or(u64::MAX).max(1);
    usize::try_from(value % len64).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ceil_clamps_and_handles_nan() {
        assert_eq!(ceil_f64_to_u32(1.2), 2);
        assert_eq!(ceil_f64_to_u32(5.0), 5);
        assert_eq!(ceil_f64_to_u32(f64::NAN), 0);
        assert_eq!(ceil_f64_to_u32(-3.5), 0);
        assert_eq!(ceil_f64_to_u32(f64::from(u32::MAX) * 4.0), u32::MAX);
    }

    #[test]
    fn clamp_respects_floor() {
        assert_eq!(clamp_i64_to_u32(-5, 0), 0);
        assert_eq!(clamp_i64_to_u32(0, 1), 1);
        assert_eq!(clamp_i64_to_u32(42, 1), 42);
        assert_eq!(clamp_i64_to_u32(i64::MAX, 0), u32::MAX);
    }

    #[test]
    fn channel_and_floor_conversions() {
        assert_eq!(unit_to_channel(0.5), 128);
        assert_eq!(unit_to_channel(1.7), 255);
        assert_eq!(unit_to_channel(f64::NAN), 0);
        assert_eq!(floor_f64_to_usize(5.99), 5);
        assert_eq!(floor_f64_to_usize(-1.0), 0);
        assert!((usize_to_f64(3) - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn index_mod_wraps() {
        assert_eq!(index_mod(7, 3), 1);
        assert_eq!(index_mod(u64::MAX, 1), 0);
    }
}
