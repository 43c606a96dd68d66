//! Bar: one OHLCV sample.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// OHLCV bar for a single time step.
///
/// Volume is fractional: crypto venues report base-asset volume with decimals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// Returns true if any price or volume field is NaN or infinite.
    pub fn is_void(&self) -> bool {
        ![self.open, self.high, self.low, self.close, self.volume]
            .iter()
            .all(|v| v.is_finite())
    }

    /// Basic OHLCV sanity check: prices strictly positive, high >= low,
    /// high and low bound open/close, volume non-negative.
    ///
    /// Returns are computed as ratios of close prices, so a zero price
    /// must never reach the pipeline.
    pub fn is_sane(&self) -> bool {
        if self.is_void() {
            return false;
        }
        self.low > 0.0
            && self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.volume >= 0.0
    }

    /// Typical price: (high + low + close) / 3.
    pub fn hlc_average(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_bar() -> Bar {
        Bar {
            timestamp: NaiveDate::from_ymd_opt(2019, 1, 2)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            open: 100.0,
            high: 105.0,
            low: 98.0,
            close: 103.0,
            volume: 50_000.0,
        }
    }

    #[test]
    fn bar_is_sane() {
        assert!(sample_bar().is_sane());
    }

    #[test]
    fn bar_detects_void() {
        let mut bar = sample_bar();
        bar.volume = f64::NAN;
        assert!(bar.is_void());
        assert!(!bar.is_sane());
    }

    #[test]
    fn bar_detects_insane_high_low() {
        let mut bar = sample_bar();
        bar.high = 97.0;
        assert!(!bar.is_sane());
    }

    #[test]
    fn bar_rejects_non_positive_prices() {
        let mut bar = sample_bar();
        bar.open = 0.0;
        bar.low = 0.0;
        assert!(!bar.is_sane());

        let mut bar = sample_bar();
        bar.low = -1.0;
        assert!(!bar.is_sane());

        let zero = Bar {
            open: 0.0,
            high: 0.0,
            low: 0.0,
            close: 0.0,
            ..sample_bar()
        };
        assert!(!zero.is_void());
        assert!(!zero.is_sane());
    }

    #[test]
    fn hlc_average_is_typical_price() {
        assert!((sample_bar().hlc_average() - 102.0).abs() < 1e-12);
    }

    #[test]
    fn bar_serialization_roundtrip() {
        let bar = sample_bar();
        let json = serde_json::to_string(&bar).unwrap();
        let deser: Bar = serde_json::from_str(&json).unwrap();
        assert_eq!(bar, deser);
    }
}
