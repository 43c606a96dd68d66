//! Zero-crossing detection for difference series (MACD − signal,
//! HLC average − EMA30).
//!
//! direction[i] = sign(diff[i]) when it differs from sign(diff[i-1]),
//! otherwise NaN. The element before index 0 counts as zero, so a
//! non-zero first value always fires.

/// Three-valued sign: 1, -1, 0 for zero, NaN for NaN.
pub fn sign(v: f64) -> f64 {
    if v > 0.0 {
        1.0
    } else if v < 0.0 {
        -1.0
    } else if v == 0.0 {
        0.0
    } else {
        f64::NAN
    }
}

pub fn cross_direction(diff: &[f64]) -> Vec<f64> {
    let mut result = Vec::with_capacity(diff.len());
    let mut prev_sign = 0.0;
    for &d in diff {
        let s = sign(d);
        // NaN compares unequal to everything, so a NaN on either side fires
        // with the current sign (NaN when the current value is NaN).
        result.push(if s != prev_sign { s } else { f64::NAN });
        prev_sign = s;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_only_on_sign_change() {
        let diff = [0.5, 0.7, -0.2, -0.1, 0.3];
        let dir = cross_direction(&diff);
        assert_eq!(dir[0], 1.0);
        assert!(dir[1].is_nan());
        assert_eq!(dir[2], -1.0);
        assert!(dir[3].is_nan());
        assert_eq!(dir[4], 1.0);
    }

    #[test]
    fn leading_zero_does_not_fire() {
        let dir = cross_direction(&[0.0, 0.0, 2.0]);
        assert!(dir[0].is_nan());
        assert!(dir[1].is_nan());
        assert_eq!(dir[2], 1.0);
    }

    #[test]
    fn touching_zero_reports_zero() {
        let dir = cross_direction(&[1.0, 0.0, 1.0]);
        assert_eq!(dir[1], 0.0);
        assert_eq!(dir[2], 1.0);
    }

    #[test]
    fn sign_handles_zero_and_nan() {
        assert_eq!(sign(-0.0), 0.0);
        assert_eq!(sign(3.0), 1.0);
        assert!(sign(f64::NAN).is_nan());
    }
}
