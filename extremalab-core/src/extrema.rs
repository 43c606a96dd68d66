//! ExtremaDetector: local minima/maxima by symmetric window comparison.
//!
//! Bar i is a minimum iff value[i] <= every value in the n bars before it
//! and the n bars after it (>= for a maximum). Windows are clamped at the
//! series ends, so bars near either end are judged on the neighbours that
//! exist. Comparisons are inclusive: a flat run can register as both.
//!
//! Detection looks forward and is only meaningful on historical data
//! (training labels), never for live inference.

use crate::domain::{window, Column, Extremum, TimeSeries};
use crate::error::{PipelineError, Result};
use tracing::debug;

/// Window half-width used for training labels when none is configured.
pub const DEFAULT_WINDOW: usize = 20;

fn check_window(n: usize) -> Result<()> {
    if n == 0 {
        return Err(PipelineError::InvalidConfiguration(
            "extrema window must be > 0".into(),
        ));
    }
    Ok(())
}

fn local_extrema(values: &[f64], n: usize, holds: impl Fn(f64, f64) -> bool) -> Result<Vec<usize>> {
    check_window(n)?;
    let len = values.len();
    let indices = (0..len)
        .filter(|&i| {
            let v = values[i];
            values[window::backward(i, n)]
                .iter()
                .chain(&values[window::forward(i, n, len)])
                .all(|&other| holds(v, other))
        })
        .collect();
    Ok(indices)
}

/// Indices whose value is `<=` every value within `n` bars either side.
pub fn local_minima(values: &[f64], n: usize) -> Result<Vec<usize>> {
    local_extrema(values, n, |v, other| v <= other)
}

/// Indices whose value is `>=` every value within `n` bars either side.
pub fn local_maxima(values: &[f64], n: usize) -> Result<Vec<usize>> {
    local_extrema(values, n, |v, other| v >= other)
}

/// Write detector labels for `column` into the series' `Extrema` column.
///
/// Existing labels are replaced. Maxima are written after minima, so a
/// plateau bar that qualifies as both is labelled a maximum. Returns the
/// `(minima, maxima)` counts.
pub fn label_extrema(series: &mut TimeSeries, column: Column, n: usize) -> Result<(usize, usize)> {
    let values = series.column(column)?;
    let minima = local_minima(values, n)?;
    let maxima = local_maxima(values, n)?;

    let mut labels = vec![Extremum::None; series.len()];
    for &i in &minima {
        labels[i] = Extremum::Minimum;
    }
    for &i in &maxima {
        labels[i] = Extremum::Maximum;
    }
    series.set_extrema(labels)?;

    debug!(
        window = n,
        minima = minima.len(),
        maxima = maxima.len(),
        "extrema labelled"
    );
    Ok((minima.len(), maxima.len()))
}
