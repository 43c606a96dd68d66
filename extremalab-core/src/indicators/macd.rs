//! Moving Average Convergence/Divergence.
//!
//! MACD = EMA(12) − EMA(26) of price; signal = EMA(9) of MACD; the cross
//! difference is MACD − signal and the cross direction marks its zero
//! crossings. All spans are day periods scaled by the time multiplier.

use super::cross::cross_direction;
use super::ema::ema_of_series;
use super::TimeMultiplier;

pub const FAST_PERIOD: u32 = 12;
pub const SLOW_PERIOD: u32 = 26;
pub const SIGNAL_PERIOD: u32 = 9;

#[derive(Debug, Clone)]
pub struct Macd {
    fast_span: usize,
    slow_span: usize,
    signal_span: usize,
}

/// The four MACD output series.
#[derive(Debug, Clone, PartialEq)]
pub struct MacdLines {
    pub macd: Vec<f64>,
    pub signal: Vec<f64>,
    pub cross_difference: Vec<f64>,
    pub cross_direction: Vec<f64>,
}

impl Macd {
    pub fn new(multiplier: TimeMultiplier) -> Self {
        Self {
            fast_span: multiplier.bars(FAST_PERIOD),
            slow_span: multiplier.bars(SLOW_PERIOD),
            signal_span: multiplier.bars(SIGNAL_PERIOD),
        }
    }

    pub fn compute(&self, price: &[f64]) -> MacdLines {
        let fast = ema_of_series(price, self.fast_span);
        let slow = ema_of_series(price, self.slow_span);
        let macd: Vec<f64> = fast.iter().zip(&slow).map(|(f, s)| f - s).collect();
        let signal = ema_of_series(&macd, self.signal_span);
        let cross_difference: Vec<f64> = macd.iter().zip(&signal).map(|(m, s)| m - s).collect();
        let cross_direction = cross_direction(&cross_difference);
        MacdLines {
            macd,
            signal,
            cross_difference,
            cross_direction,
        }
    }
}
