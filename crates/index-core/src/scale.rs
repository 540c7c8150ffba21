//! Score helpers shared by every normalizer and the aggregator.
//!
//! All scores live on a 0-100 integer scale. Raw values are clamped first and
//! then truncated toward zero, so `29.9` becomes `29` and `-4.0` becomes `0`.
//! Values within `FLOAT_SLACK` below a whole number count as that number.

use crate::types::Score;

pub const MIN_SCORE: Score = 0;
pub const MAX_SCORE: Score = 100;

/// Absorbs binary float noise such as `56.99999999999999` before truncation.
pub const FLOAT_SLACK: f64 = 1e-9;

/// Clamp a raw value into `[0, 100]` and truncate it to an integer score.
pub fn clamp_score(raw: f64) -> Score {
    if raw.is_nan() {
        return MIN_SCORE;
    }
    (raw + FLOAT_SLACK)
        .clamp(MIN_SCORE as f64, MAX_SCORE as f64)
        .trunc() as Score
}

/// Compute the mean of a data slice.
pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

/// Fractional change from `from` to `to` (0.01 == +1%).
/// Returns `None` when the base is zero or either value is not finite.
pub fn fractional_change(from: f64, to: f64) -> Option<f64> {
    if !from.is_finite() || !to.is_finite() || from.abs() < f64::EPSILON {
        return None;
    }
    Some((to - from) / from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_then_truncates() {
        assert_eq!(clamp_score(29.9), 29);
        assert_eq!(clamp_score(-4.0), 0);
        assert_eq!(clamp_score(250.0), 100);
        assert_eq!(clamp_score(100.0), 100);
        assert_eq!(clamp_score(f64::NAN), 0);
        assert_eq!(clamp_score(f64::INFINITY), 100);
    }

    #[test]
    fn float_noise_below_a_whole_number_does_not_lose_a_point() {
        assert_eq!(clamp_score(0.57 * 100.0), 57);
        assert_eq!(clamp_score(6.999999999999999), 7);
        assert_eq!(clamp_score(6.99), 6);
        assert_eq!(clamp_score(-1e-12), 0);
    }

    #[test]
    fn mean_of_empty_slice_is_zero() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(mean(&[2.0, 4.0]), 3.0);
    }

    #[test]
    fn fractional_change_rejects_zero_base() {
        assert_eq!(fractional_change(0.0, 10.0), None);
        assert_eq!(fractional_change(f64::NAN, 10.0), None);
        assert_eq!(fractional_change(100.0, 95.0), Some(-0.05));
    }
}
