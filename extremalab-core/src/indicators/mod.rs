//! IndicatorEngine: HLC average, EMA family, MACD, EMA cross, RSI, OBV.
//!
//! Every indicator is a pure function of the price/volume columns and is
//! causal: the value at bar t depends only on bars 0..=t. Lookback periods
//! are expressed in days and scaled to bar counts by `TimeMultiplier`.
//!
//! Configuration is passed explicitly on every call; there is no ambient
//! price-field or time-scale state.

pub mod cross;
pub mod ema;
pub mod macd;
pub mod obv;
pub mod rsi;

pub use cross::cross_direction;
pub use ema::{ema_of_series, Ema};
pub use macd::{Macd, MacdLines};
pub use obv::{floor_at_zero, Obv};
pub use rsi::Rsi;

use crate::domain::{Bar, Column, TimeSeries};
use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// EMA period (days) compared against the HLC average for the EMA cross.
pub const EMA_CROSS_PERIOD: u32 = 30;

/// Leading bars (days) whose indicator values are considered warm-up.
pub const WARMUP_DAYS: usize = 30;

/// Scale factor from day-denominated periods to bar counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeMultiplier {
    #[default]
    Daily,
    Hourly,
}

impl TimeMultiplier {
    pub fn factor(self) -> usize {
        match self {
            TimeMultiplier::Daily => 1,
            TimeMultiplier::Hourly => 24,
        }
    }

    pub fn from_hourly(hourly: bool) -> Self {
        if hourly {
            TimeMultiplier::Hourly
        } else {
            TimeMultiplier::Daily
        }
    }

    /// Scale a day-denominated period to bars.
    pub fn bars(self, days: u32) -> usize {
        days as usize * self.factor()
    }
}

/// Which bar value the price-based indicators read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceField {
    #[default]
    Close,
    HlcAverage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorConfig {
    pub time_multiplier: TimeMultiplier,
    pub price_field: PriceField,
    /// EMA periods (days) to emit as `EMA<period>` columns. EMA30 is always
    /// computed because the EMA cross depends on it.
    pub ema_periods: Vec<u32>,
    pub rsi_period: u32,
    /// Shift OBV so its minimum is zero.
    pub obv_zero_floor: bool,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            time_multiplier: TimeMultiplier::Daily,
            price_field: PriceField::Close,
            ema_periods: vec![EMA_CROSS_PERIOD],
            rsi_period: 14,
            obv_zero_floor: false,
        }
    }
}

impl IndicatorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.rsi_period == 0 {
            return Err(PipelineError::InvalidConfiguration(
                "rsi_period must be > 0".into(),
            ));
        }
        if let Some(p) = self.ema_periods.iter().find(|p| **p == 0) {
            return Err(PipelineError::InvalidConfiguration(format!(
                "EMA period must be > 0, got {p}"
            )));
        }
        Ok(())
    }

    /// EMA periods to compute: configured ones plus the cross period,
    /// sorted and deduplicated.
    pub fn effective_ema_periods(&self) -> Vec<u32> {
        let mut periods = self.ema_periods.clone();
        periods.push(EMA_CROSS_PERIOD);
        periods.sort_unstable();
        periods.dedup();
        periods
    }

    /// Number of leading bars to trim before detection or inference.
    pub fn warmup_bars(&self) -> usize {
        WARMUP_DAYS * self.time_multiplier.factor()
    }
}

/// Borrowed price and volume inputs for a single indicator computation.
#[derive(Debug, Clone, Copy)]
pub struct PriceInput<'a> {
    pub price: &'a [f64],
    pub volume: &'a [f64],
}

/// Trait for single-column indicators.
///
/// `compute` returns a series of the same length as the input. Warm-up
/// values are NaN. No value at bar t may depend on data from bar t+1 or
/// later.
pub trait Indicator: Send + Sync {
    /// Column the output is stored under.
    fn column(&self) -> Column;

    fn compute(&self, input: &PriceInput<'_>) -> Vec<f64>;
}

/// Compute every indicator column onto `series`.
///
/// The EMA family with MACD, RSI and OBV are independent given the base
/// columns and run under `rayon::join`; columns are inserted only after all
/// joins complete. Fails with `DuplicateColumn` if run twice on one series.
pub fn compute_indicators(series: &mut TimeSeries, config: &IndicatorConfig) -> Result<()> {
    config.validate()?;

    let multiplier = config.time_multiplier;
    let hlc: Vec<f64> = series.bars().iter().map(Bar::hlc_average).collect();
    let closes;
    let price: &[f64] = match config.price_field {
        PriceField::Close => {
            closes = series.closes();
            &closes
        }
        PriceField::HlcAverage => &hlc,
    };
    let volume = series.volumes();
    let input = PriceInput {
        price,
        volume: &volume,
    };
    let periods = config.effective_ema_periods();

    let ((emas, macd), (rsi, obv)) = rayon::join(
        || {
            rayon::join(
                || {
                    periods
                        .iter()
                        .map(|&p| {
                            let ema = Ema::new(p, multiplier);
                            (ema.column(), ema.compute(&input))
                        })
                        .collect::<Vec<_>>()
                },
                || Macd::new(multiplier).compute(price),
            )
        },
        || {
            rayon::join(
                || Rsi::new(config.rsi_period, multiplier).compute(&input),
                || Obv.compute(&input),
            )
        },
    );

    let ema_cross_difference = {
        let ema_cross = emas
            .iter()
            .find(|(c, _)| *c == Column::Ema(EMA_CROSS_PERIOD))
            .map(|(_, v)| v.as_slice())
            .ok_or(PipelineError::MissingColumn(Column::Ema(EMA_CROSS_PERIOD)))?;
        hlc.iter()
            .zip(ema_cross)
            .map(|(h, e)| h - e)
            .collect::<Vec<f64>>()
    };
    let ema_cross_direction = cross_direction(&ema_cross_difference);
    let obv = if config.obv_zero_floor {
        floor_at_zero(&obv)
    } else {
        obv
    };

    series.insert_column(Column::HlcAverage, hlc)?;
    for (column, values) in emas {
        series.insert_column(column, values)?;
    }
    series.insert_column(Column::Macd, macd.macd)?;
    series.insert_column(Column::MacdSignal, macd.signal)?;
    series.insert_column(Column::MacdCrossDifference, macd.cross_difference)?;
    series.insert_column(Column::MacdCrossDirection, macd.cross_direction)?;
    series.insert_column(Column::EmaCrossDifference, ema_cross_difference)?;
    series.insert_column(Column::EmaCrossDirection, ema_cross_direction)?;
    series.insert_column(Column::Obv, obv)?;
    series.insert_column(Column::Rsi, rsi)?;

    debug!(
        bars = series.len(),
        ema_periods = ?periods,
        multiplier = multiplier.factor(),
        "indicators computed"
    );
    Ok(())
}

/// Create synthetic bars from close prices for testing.
///
/// open = previous close, high/low = ±1 around the body, volume = 1000,
/// one bar per day.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<Bar> {
    let base = chrono::NaiveDate::from_ymd_opt(2019, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                timestamp: base + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000.0,
            }
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
