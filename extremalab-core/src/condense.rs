//! RangeCondenser: affine rescaling of indicator columns into bounded
//! ranges so values are comparable across instruments and periods.
//!
//! The transform is fitted on a reference column and applied to the target.
//! Condensing rewrites the target in place, so a column derived from X must
//! be condensed against X before X itself is condensed.

use crate::domain::{Column, TimeSeries};
use crate::error::{PipelineError, Result};
use tracing::debug;

/// Finite `[min, max]` of a column, ignoring NaN.
fn finite_range(values: &[f64]) -> Option<(f64, f64)> {
    values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

fn reference_range(series: &TimeSeries, reference: Column) -> Result<(f64, f64)> {
    match finite_range(series.column(reference)?) {
        Some((lo, hi)) if hi > lo => Ok((lo, hi)),
        _ => Err(PipelineError::DegenerateRange { column: reference }),
    }
}

fn apply(series: &mut TimeSeries, column: Column, f: impl Fn(f64) -> f64) -> Result<()> {
    for v in series.column_mut(column)? {
        *v = f(*v);
    }
    Ok(())
}

/// Map the reference's `[min, max]` onto `[-1, 1]` and apply to `column`.
pub fn condense_symmetric(series: &mut TimeSeries, column: Column, reference: Column) -> Result<()> {
    series.column(column)?;
    let (lo, hi) = reference_range(series, reference)?;
    let mid = (hi + lo) / 2.0;
    let half = (hi - lo) / 2.0;
    apply(series, column, |v| (v - mid) / half)
}

/// Map the reference's `[min, max]` onto `[0, 100]` and apply to `column`.
pub fn condense_unsigned(series: &mut TimeSeries, column: Column, reference: Column) -> Result<()> {
    series.column(column)?;
    let (lo, hi) = reference_range(series, reference)?;
    let span = hi - lo;
    apply(series, column, |v| (v - lo) / span * 100.0)
}

/// Condense the pipeline's indicator columns in dependency order.
///
/// MACD family onto [-1, 1] (signal and cross difference fitted on the
/// original MACD range first), EMA cross difference onto [-1, 1], OBV onto
/// [0, 100]. Price columns stay in price units because the strategy filter
/// and accountant trade at them. RSI is already bounded.
pub fn condense_indicators(series: &mut TimeSeries) -> Result<()> {
    condense_symmetric(series, Column::MacdSignal, Column::Macd)?;
    condense_symmetric(series, Column::MacdCrossDifference, Column::Macd)?;
    condense_symmetric(series, Column::Macd, Column::Macd)?;
    condense_symmetric(
        series,
        Column::EmaCrossDifference,
        Column::EmaCrossDifference,
    )?;
    condense_unsigned(series, Column::Obv, Column::Obv)?;
    debug!(bars = series.len(), "indicator columns condensed");
    Ok(())
}
