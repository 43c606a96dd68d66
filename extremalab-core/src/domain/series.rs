//! TimeSeries: ordered bars plus derived indicator columns and labels.
//!
//! Invariants:
//! - bar timestamps are strictly increasing (checked on construction)
//! - every column has exactly `len()` values; undefined values are NaN
//! - a column is inserted at most once; condensing rewrites it in place
//! - the `Extrema` label column always exists and defaults to `None`

use crate::domain::{Bar, Extremum};
use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Named derived column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Column {
    HlcAverage,
    /// EMA of the price field; the period is in days before time scaling.
    Ema(u32),
    Macd,
    MacdSignal,
    MacdCrossDifference,
    MacdCrossDirection,
    EmaCrossDifference,
    EmaCrossDirection,
    Obv,
    Rsi,
}

impl Column {
    pub fn name(&self) -> String {
        match self {
            Column::HlcAverage => "HLCAverage".to_string(),
            Column::Ema(period) => format!("EMA{period}"),
            Column::Macd => "MACD".to_string(),
            Column::MacdSignal => "MACDSignal".to_string(),
            Column::MacdCrossDifference => "MACDCrossDifference".to_string(),
            Column::MacdCrossDirection => "MACDCrossDirection".to_string(),
            Column::EmaCrossDifference => "EMACrossDifference".to_string(),
            Column::EmaCrossDirection => "EMACrossDirection".to_string(),
            Column::Obv => "OBV".to_string(),
            Column::Rsi => "RSI".to_string(),
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

#[derive(Debug, Clone, Default)]
pub struct TimeSeries {
    bars: Vec<Bar>,
    columns: BTreeMap<Column, Vec<f64>>,
    extrema: Vec<Extremum>,
}

impl TimeSeries {
    /// Build a series from time-ascending bars.
    ///
    /// Fails with `PreconditionViolation` on out-of-order or duplicate
    /// timestamps, or on bars carrying non-finite values.
    pub fn new(bars: Vec<Bar>) -> Result<Self> {
        if let Some(i) = bars.iter().position(Bar::is_void) {
            return Err(PipelineError::PreconditionViolation(format!(
                "bar {i} ({}) has non-finite fields",
                bars[i].timestamp
            )));
        }
        if let Some(w) = bars
            .windows(2)
            .position(|w| w[1].timestamp <= w[0].timestamp)
        {
            return Err(PipelineError::PreconditionViolation(format!(
                "timestamps not strictly increasing at bar {}: {} follows {}",
                w + 1,
                bars[w + 1].timestamp,
                bars[w].timestamp
            )));
        }
        let extrema = vec![Extremum::None; bars.len()];
        Ok(Self {
            bars,
            columns: BTreeMap::new(),
            extrema,
        })
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.volume).collect()
    }

    /// Insert a freshly computed column.
    pub fn insert_column(&mut self, column: Column, values: Vec<f64>) -> Result<()> {
        if values.len() != self.len() {
            return Err(PipelineError::LengthMismatch {
                what: column.name(),
                expected: self.len(),
                actual: values.len(),
            });
        }
        if self.columns.contains_key(&column) {
            return Err(PipelineError::DuplicateColumn(column));
        }
        self.columns.insert(column, values);
        Ok(())
    }

    pub fn has_column(&self, column: Column) -> bool {
        self.columns.contains_key(&column)
    }

    pub fn column(&self, column: Column) -> Result<&[f64]> {
        self.columns
            .get(&column)
            .map(Vec::as_slice)
            .ok_or(PipelineError::MissingColumn(column))
    }

    pub(crate) fn column_mut(&mut self, column: Column) -> Result<&mut [f64]> {
        self.columns
            .get_mut(&column)
            .map(Vec::as_mut_slice)
            .ok_or(PipelineError::MissingColumn(column))
    }

    /// Column keys in canonical order.
    pub fn column_names(&self) -> impl Iterator<Item = Column> + '_ {
        self.columns.keys().copied()
    }

    pub fn extrema(&self) -> &[Extremum] {
        &self.extrema
    }

    /// Overwrite every label.
    pub fn set_extrema(&mut self, labels: Vec<Extremum>) -> Result<()> {
        if labels.len() != self.len() {
            return Err(PipelineError::LengthMismatch {
                what: "Extrema".to_string(),
                expected: self.len(),
                actual: labels.len(),
            });
        }
        self.extrema = labels;
        Ok(())
    }

    pub fn set_label(&mut self, index: usize, label: Extremum) {
        self.extrema[index] = label;
    }

    /// Reset the given labels to `None`. Returns how many were non-zero.
    pub fn clear_labels(&mut self, indices: &[usize]) -> usize {
        let mut cleared = 0;
        for &i in indices {
            if self.extrema[i].is_signal() {
                cleared += 1;
            }
            self.extrema[i] = Extremum::None;
        }
        cleared
    }

    /// Positions carrying a non-zero label, in time order.
    pub fn signal_indices(&self) -> Vec<usize> {
        self.extrema
            .iter()
            .enumerate()
            .filter(|(_, e)| e.is_signal())
            .map(|(i, _)| i)
            .collect()
    }

    /// Drop the first `count` rows from bars, columns and labels.
    pub fn trim_front(&mut self, count: usize) {
        let count = count.min(self.len());
        self.bars.drain(..count);
        self.extrema.drain(..count);
        for values in self.columns.values_mut() {
            values.drain(..count);
        }
    }
}
