//! Concrete classifiers.
//!
//! - `DetectorClassifier`: runs the extrema detector over the HLC average
//!   feature. It looks forward, so it is an oracle: useful for training
//!   data and smoke runs, never for live decisions.
//! - `LabelFileClassifier`: replays per-row predictions written by an
//!   external model (a CSV with an `Extrema` or `prediction` column).

use crate::config::{ClassifierConfig, PipelineConfig};
use crate::data_loader::LoadError;
use extremalab_core::classifier::{Classifier, FeatureTable};
use extremalab_core::domain::{Column, Extremum};
use extremalab_core::extrema::{local_maxima, local_minima};
use extremalab_core::{PipelineError, Result};
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct DetectorClassifier {
    window: usize,
}

impl DetectorClassifier {
    pub fn new(window: usize) -> Self {
        Self { window }
    }
}

impl Classifier for DetectorClassifier {
    fn name(&self) -> &str {
        "detector"
    }

    fn predict(&self, features: &FeatureTable) -> Result<Vec<Extremum>> {
        let prices = features
            .column(Column::HlcAverage)
            .ok_or(PipelineError::MissingColumn(Column::HlcAverage))?;
        let mut labels = vec![Extremum::None; prices.len()];
        for i in local_minima(&prices, self.window)? {
            labels[i] = Extremum::Minimum;
        }
        for i in local_maxima(&prices, self.window)? {
            labels[i] = Extremum::Maximum;
        }
        Ok(labels)
    }
}

/// Predictions loaded from disk, aligned to the end of the feature table.
///
/// A file longer than the table supplies its trailing rows, so one file
/// covering the whole series also serves `latest_signal`'s short tail.
#[derive(Debug, Clone)]
pub struct LabelFileClassifier {
    name: String,
    labels: Vec<Extremum>,
}

impl LabelFileClassifier {
    pub fn from_labels(name: impl Into<String>, labels: Vec<Extremum>) -> Self {
        Self {
            name: name.into(),
            labels,
        }
    }

    pub fn from_path(path: &Path) -> std::result::Result<Self, LoadError> {
        let content = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_csv_str(&path.display().to_string(), &content)
    }

    pub fn from_csv_str(name: &str, content: &str) -> std::result::Result<Self, LoadError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());
        let column = reader
            .headers()?
            .iter()
            .position(|h| {
                let h = h.to_ascii_lowercase();
                h == "extrema" || h == "prediction"
            })
            .ok_or(LoadError::MissingColumn("Extrema"))?;

        let mut labels = Vec::new();
        for (row, record) in reader.records().enumerate() {
            let record = record?;
            let value = record.get(column).unwrap_or_default();
            let label = value
                .parse::<f64>()
                .ok()
                .and_then(Extremum::from_f64)
                .ok_or_else(|| LoadError::InvalidLabel {
                    line: row + 2,
                    value: value.to_string(),
                })?;
            labels.push(label);
        }
        if labels.is_empty() {
            return Err(LoadError::Empty { skipped: 0 });
        }
        debug!(source = name, rows = labels.len(), "label file loaded");
        Ok(Self::from_labels(name, labels))
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl Classifier for LabelFileClassifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict(&self, features: &FeatureTable) -> Result<Vec<Extremum>> {
        let start = self
            .labels
            .len()
            .checked_sub(features.len())
            .ok_or_else(|| PipelineError::Classifier {
                name: self.name.clone(),
                reason: format!(
                    "file holds {} predictions, table has {} rows",
                    self.labels.len(),
                    features.len()
                ),
            })?;
        Ok(self.labels[start..].to_vec())
    }
}

/// Build the classifier a config asks for.
pub fn build_classifier(
    config: &PipelineConfig,
) -> std::result::Result<Box<dyn Classifier>, LoadError> {
    match &config.classifier {
        ClassifierConfig::Detector => Ok(Box::new(DetectorClassifier::new(config.extrema.window))),
        ClassifierConfig::LabelFile { path } => Ok(Box::new(LabelFileClassifier::from_path(path)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(prices: &[f64]) -> FeatureTable {
        FeatureTable::from_rows(prices.iter().map(|&p| [p, 0.0, 0.0, 0.0, 0.0, 0.0]).collect())
    }

    #[test]
    fn detector_labels_swings() {
        let features = table(&[10.0, 8.0, 6.0, 8.0, 10.0, 12.0, 10.0, 8.0, 6.0]);
        let labels = DetectorClassifier::new(2).predict(&features).unwrap();
        assert_eq!(labels[2], Extremum::Minimum);
        assert_eq!(labels[5], Extremum::Maximum);
        assert_eq!(labels[8], Extremum::Minimum);
        assert_eq!(labels[0], Extremum::Maximum);
        assert_eq!(labels[1], Extremum::None);
    }

    #[test]
    fn detector_rejects_zero_window() {
        let features = table(&[1.0, 2.0]);
        assert!(DetectorClassifier::new(0).predict(&features).is_err());
    }

    #[test]
    fn label_file_parses_integer_and_float_labels() {
        let csv = "timestamp,Extrema\n2019-01-01 00:00:00,-1\n2019-01-01 01:00:00,0.0\n2019-01-01 02:00:00,1\n";
        let classifier = LabelFileClassifier::from_csv_str("model", csv).unwrap();
        assert_eq!(classifier.len(), 3);
        let labels = classifier.predict(&table(&[1.0, 2.0, 3.0])).unwrap();
        assert_eq!(labels, vec![Extremum::Minimum, Extremum::None, Extremum::Maximum]);
    }

    #[test]
    fn label_file_aligns_to_table_end() {
        let classifier = LabelFileClassifier::from_labels(
            "model",
            vec![Extremum::Minimum, Extremum::None, Extremum::Maximum],
        );
        let labels = classifier.predict(&table(&[1.0, 2.0])).unwrap();
        assert_eq!(labels, vec![Extremum::None, Extremum::Maximum]);
    }

    #[test]
    fn label_file_shorter_than_table_fails() {
        let classifier = LabelFileClassifier::from_labels("model", vec![Extremum::None]);
        let err = classifier.predict(&table(&[1.0, 2.0])).unwrap_err();
        assert!(matches!(err, PipelineError::Classifier { .. }));
    }

    #[test]
    fn label_file_rejects_out_of_range_values() {
        let err = LabelFileClassifier::from_csv_str("model", "prediction\n0\n2\n").unwrap_err();
        assert!(matches!(err, LoadError::InvalidLabel { line: 3, .. }));
    }

    #[test]
    fn label_file_needs_label_column() {
        let err = LabelFileClassifier::from_csv_str("model", "a,b\n1,2\n").unwrap_err();
        assert!(matches!(err, LoadError::MissingColumn(_)));
    }
}
