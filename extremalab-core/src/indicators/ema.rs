//! Exponential Moving Average (EMA), causal recurrence form.
//!
//! EMA[0] = price[0]
//! EMA[t] = EMA[t-1] + alpha * (price[t] - EMA[t-1]),  alpha = 2 / (span + 1)
//! span = period * time multiplier. No bias adjustment: the value at t uses
//! only t and earlier, so it is safe for point-wise prediction.

use super::{Indicator, PriceInput, TimeMultiplier};
use crate::domain::Column;

#[derive(Debug, Clone)]
pub struct Ema {
    period: u32,
    span: usize,
}

impl Ema {
    pub fn new(period: u32, multiplier: TimeMultiplier) -> Self {
        assert!(period >= 1, "EMA period must be >= 1");
        Self {
            period,
            span: multiplier.bars(period),
        }
    }

    pub fn span(&self) -> usize {
        self.span
    }
}

impl Indicator for Ema {
    fn column(&self) -> Column {
        Column::Ema(self.period)
    }

    fn compute(&self, input: &PriceInput<'_>) -> Vec<f64> {
        ema_of_series(input.price, self.span)
    }
}

/// Compute the causal EMA of an arbitrary series.
///
/// Used directly for MACD and its signal line. A NaN input taints that bar
/// and every bar after it.
pub fn ema_of_series(values: &[f64], span: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if n == 0 || span == 0 {
        return result;
    }

    let alpha = 2.0 / (span as f64 + 1.0);
    let mut prev = values[0];
    if prev.is_nan() {
        return result;
    }
    result[0] = prev;

    for i in 1..n {
        let v = values[i];
        if v.is_nan() {
            return result;
        }
        // Written as an increment so a constant input stays exactly constant.
        prev += alpha * (v - prev);
        result[i] = prev;
    }

    result
}
