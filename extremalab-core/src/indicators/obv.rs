//! On-Balance Volume (OBV).
//!
//! OBV[0] = volume[0]
//! OBV[t] = OBV[t-1] + volume[t] if price rose, − volume[t] if it fell,
//! unchanged otherwise. Single forward pass; order-dependent.

use super::{Indicator, PriceInput};
use crate::domain::Column;

#[derive(Debug, Clone, Copy, Default)]
pub struct Obv;

impl Indicator for Obv {
    fn column(&self) -> Column {
        Column::Obv
    }

    fn compute(&self, input: &PriceInput<'_>) -> Vec<f64> {
        let n = input.price.len().min(input.volume.len());
        let mut result = Vec::with_capacity(n);
        if n == 0 {
            return result;
        }

        let mut obv = input.volume[0];
        result.push(obv);
        for i in 1..n {
            let (prev, curr) = (input.price[i - 1], input.price[i]);
            if curr > prev {
                obv += input.volume[i];
            } else if curr < prev {
                obv -= input.volume[i];
            }
            result.push(obv);
        }
        result
    }
}

/// Shift a series so its minimum (ignoring NaN) is zero.
pub fn floor_at_zero(values: &[f64]) -> Vec<f64> {
    let min = values
        .iter()
        .copied()
        .filter(|v| !v.is_nan())
        .fold(f64::INFINITY, f64::min);
    if !min.is_finite() {
        return values.to_vec();
    }
    values.iter().map(|v| v - min).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obv(price: &[f64], volume: &[f64]) -> Vec<f64> {
        Obv.compute(&PriceInput { price, volume })
    }

    #[test]
    fn signed_volume_accumulates() {
        let result = obv(
            &[10.0, 11.0, 10.5, 10.5, 12.0],
            &[100.0, 50.0, 30.0, 999.0, 20.0],
        );
        assert_eq!(result, vec![100.0, 150.0, 120.0, 120.0, 140.0]);
    }

    #[test]
    fn empty_input() {
        assert!(obv(&[], &[]).is_empty());
    }

    #[test]
    fn floor_at_zero_preserves_differences() {
        let shifted = floor_at_zero(&[5.0, -3.0, 2.0]);
        assert_eq!(shifted, vec![8.0, 0.0, 5.0]);
    }

    #[test]
    fn floor_at_zero_ignores_nan() {
        let shifted = floor_at_zero(&[f64::NAN, 4.0, 2.0]);
        assert!(shifted[0].is_nan());
        assert_eq!(&shifted[1..], &[2.0, 0.0]);
    }
}
