//! Classifier seam: the point-wise model that predicts extremum labels
//! from indicator features.
//!
//! The model itself lives outside this crate. The pipeline only fixes the
//! feature layout it is fed and the label encoding it must return.

use crate::domain::{Column, Extremum, TimeSeries};
use crate::error::Result;

/// Feature columns, in the order models are trained on.
pub const FEATURE_COLUMNS: [Column; 6] = [
    Column::HlcAverage,
    Column::Rsi,
    Column::EmaCrossDifference,
    Column::EmaCrossDirection,
    Column::MacdCrossDifference,
    Column::MacdCrossDirection,
];

/// Value substituted for undefined (NaN) features before inference.
pub const MISSING_SENTINEL: f64 = 0.0;

pub type FeatureRow = [f64; FEATURE_COLUMNS.len()];

/// Row-major feature table, one row per bar, NaN already replaced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureTable {
    rows: Vec<FeatureRow>,
}

impl FeatureTable {
    pub fn from_series(series: &TimeSeries) -> Result<Self> {
        let columns = FEATURE_COLUMNS
            .iter()
            .map(|c| series.column(*c))
            .collect::<Result<Vec<_>>>()?;

        let rows = (0..series.len())
            .map(|i| {
                let mut row = [MISSING_SENTINEL; FEATURE_COLUMNS.len()];
                for (slot, column) in row.iter_mut().zip(&columns) {
                    let v = column[i];
                    if !v.is_nan() {
                        *slot = v;
                    }
                }
                row
            })
            .collect();
        Ok(Self { rows })
    }

    pub fn from_rows(rows: Vec<FeatureRow>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[FeatureRow] {
        &self.rows
    }

    /// All values of one feature column, or `None` if it is not a feature.
    pub fn column(&self, column: Column) -> Option<Vec<f64>> {
        let idx = FEATURE_COLUMNS.iter().position(|c| *c == column)?;
        Some(self.rows.iter().map(|r| r[idx]).collect())
    }
}

/// A point-wise extremum classifier.
///
/// `predict` must return exactly one label per feature row; the pipeline
/// rejects any other length. The full prepared table is always passed, so
/// windowed classifiers may look at neighbouring rows.
pub trait Classifier: Send + Sync {
    fn name(&self) -> &str;

    fn predict(&self, features: &FeatureTable) -> Result<Vec<Extremum>>;
}
