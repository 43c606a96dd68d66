//! Relative Strength Index (RSI).
//!
//! Simple rolling means (not Wilder smoothing) of gains and losses over
//! w = period × multiplier price changes.
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss)
//! Lookback: w (bars 0..w are NaN). avg_loss == 0 → RSI = 100.

use super::{Indicator, PriceInput, TimeMultiplier};
use crate::domain::Column;

#[derive(Debug, Clone)]
pub struct Rsi {
    window: usize,
}

impl Rsi {
    pub fn new(period: u32, multiplier: TimeMultiplier) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self {
            window: multiplier.bars(period),
        }
    }
}

impl Indicator for Rsi {
    fn column(&self) -> Column {
        Column::Rsi
    }

    fn compute(&self, input: &PriceInput<'_>) -> Vec<f64> {
        let price = input.price;
        let n = price.len();
        let w = self.window;
        let mut result = vec![f64::NAN; n];

        if n <= w {
            return result;
        }

        let mut gains = vec![0.0; n];
        let mut losses = vec![0.0; n];
        for i in 1..n {
            let delta = price[i] - price[i - 1];
            if delta.is_nan() {
                gains[i] = f64::NAN;
                losses[i] = f64::NAN;
            } else {
                gains[i] = delta.max(0.0);
                losses[i] = (-delta).max(0.0);
            }
        }

        // Each window is summed afresh rather than rolled, so a window with
        // no losses sums to exactly zero.
        for i in w..n {
            let window = (i + 1 - w)..=i;
            let avg_gain = gains[window.clone()].iter().sum::<f64>() / w as f64;
            let avg_loss = losses[window].iter().sum::<f64>() / w as f64;
            result[i] = compute_rsi(avg_gain, avg_loss);
        }

        result
    }
}

fn compute_rsi(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_gain.is_nan() || avg_loss.is_nan() {
        f64::NAN
    } else if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}
