//! Pipeline runner: wires together loading, preparation, classification
//! and accounting.
//!
//! Entry points:
//! - `load_data()`: resolves the bar source (CLI override, then config path).
//! - `prepare()`: indicators and warm-up trim, optionally with detector labels.
//!   Used by the `indicators` and `label` commands.
//! - `run_backtest()`: the full signal pipeline plus a latest-bar decision.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use extremalab_core::accounting::TxSummary;
use extremalab_core::domain::{Extremum, TimeSeries};
use extremalab_core::pipeline::{latest_signal, prepare_series, run_signals};
use extremalab_core::PipelineError;

use crate::classifiers::build_classifier;
use crate::config::{ConfigError, PipelineConfig};
use crate::data_loader::{load_bars_csv, DataSource, LoadError, LoadedBars};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),
    #[error("no bar source: set [data] path in the config or pass --data")]
    NoDataSource,
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete result of a single pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub run_id: String,
    pub config: PipelineConfig,
    pub source: DataSource,
    pub dataset_hash: String,
    pub start: String,
    pub end: String,
    pub bar_count: usize,
    pub warmup_bars: usize,
    pub classifier: String,
    pub predicted: usize,
    pub removed_by_validation: usize,
    pub removed_by_strategy: usize,
    pub trailing_buy_removed: bool,
    pub transactions: Vec<TxSummary>,
    pub final_profit_loss_pct: Option<f64>,
    /// Decision for the newest bar, judged on its trailing window only.
    pub latest_signal: Extremum,
}

/// Default schema version for serde deserialization of older JSON without the field.
fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl RunResult {
    pub fn has_synthetic(&self) -> bool {
        matches!(self.source, DataSource::Synthetic(_))
    }
}

/// Final labelled series alongside the run summary.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub result: RunResult,
    pub series: TimeSeries,
}

/// Load bars from `data_override` or the config's `[data] path`.
pub fn load_data(
    config: &PipelineConfig,
    data_override: Option<&Path>,
) -> Result<LoadedBars, RunError> {
    let path = data_override
        .or(config.data.path.as_deref())
        .ok_or(RunError::NoDataSource)?;
    Ok(load_bars_csv(path, &config.data)?)
}

/// Compute indicators and trim the warm-up region. With `label`, detector
/// ground-truth labels are written too.
pub fn prepare(
    config: &PipelineConfig,
    loaded: &LoadedBars,
    label: bool,
) -> Result<TimeSeries, RunError> {
    let series = TimeSeries::new(loaded.bars.clone())?;
    Ok(prepare_series(series, &config.prepare_config(label))?)
}

/// Run the full signal pipeline on loaded bars.
pub fn run_backtest(config: &PipelineConfig, loaded: &LoadedBars) -> Result<RunOutput, RunError> {
    let run_id = config.run_id()?;
    let classifier = build_classifier(config)?;
    let mut series = prepare(config, loaded, false)?;

    let signal_config = config.signal_config();
    let latest = latest_signal(&series, classifier.as_ref(), &signal_config.validator)?;
    let outcome = run_signals(&mut series, classifier.as_ref(), &signal_config)?;

    let start = series
        .bars()
        .first()
        .map(|b| b.timestamp.to_string())
        .unwrap_or_default();
    let end = series
        .bars()
        .last()
        .map(|b| b.timestamp.to_string())
        .unwrap_or_default();

    let result = RunResult {
        schema_version: SCHEMA_VERSION,
        run_id,
        config: config.clone(),
        source: loaded.source.clone(),
        dataset_hash: loaded.dataset_hash.clone(),
        start,
        end,
        bar_count: loaded.bars.len(),
        warmup_bars: config.indicator_config().warmup_bars(),
        final_profit_loss_pct: outcome.final_profit_loss(),
        classifier: outcome.classifier,
        predicted: outcome.predicted,
        removed_by_validation: outcome.removed_by_validation,
        removed_by_strategy: outcome.removed_by_strategy,
        trailing_buy_removed: outcome.trailing_buy_removed,
        transactions: outcome.transactions,
        latest_signal: latest,
    };
    info!(
        run_id = %result.run_id,
        trades = result.transactions.len(),
        profit_loss_pct = ?result.final_profit_loss_pct,
        latest = %result.latest_signal,
        "run complete"
    );

    Ok(RunOutput { result, series })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifiers::DetectorClassifier;
    use crate::synthetic::{generate_synthetic_bars, SyntheticSpec};
    use chrono::NaiveDate;
    use extremalab_core::classifier::{Classifier, FeatureTable};
    use extremalab_core::validation::{find_invalid, ValidatorConfig};

    fn synthetic(bars: usize) -> LoadedBars {
        generate_synthetic_bars(&SyntheticSpec {
            label: "runner".into(),
            start: NaiveDate::from_ymd_opt(2019, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            bars,
            hourly: true,
            start_price: 3500.0,
        })
    }

    #[test]
    fn missing_data_source_is_reported() {
        let err = load_data(&PipelineConfig::default(), None).unwrap_err();
        assert!(matches!(err, RunError::NoDataSource));
    }

    #[test]
    fn detector_backtest_on_synthetic_data() {
        let config = PipelineConfig::default();
        let output = run_backtest(&config, &synthetic(2000)).unwrap();
        let result = &output.result;

        assert_eq!(result.schema_version, SCHEMA_VERSION);
        assert_eq!(result.classifier, "detector");
        assert_eq!(result.warmup_bars, 720);
        assert_eq!(output.series.len(), 2000 - 720);
        assert!(result.has_synthetic());
        assert_eq!(result.transactions.len(), output.series.signal_indices().len());
        if let Some(pl) = result.final_profit_loss_pct {
            assert!(pl >= 0.0, "no-loss sells cannot lose: {pl}");
        }
    }

    #[test]
    fn short_data_is_insufficient() {
        let err = run_backtest(&PipelineConfig::default(), &synthetic(500)).unwrap_err();
        assert!(matches!(
            err,
            RunError::Pipeline(PipelineError::InsufficientData { .. })
        ));
    }

    #[test]
    fn prepare_with_labels_marks_extrema() {
        let series = prepare(&PipelineConfig::default(), &synthetic(1500), true).unwrap();
        assert!(!series.signal_indices().is_empty());
        let unlabelled = prepare(&PipelineConfig::default(), &synthetic(1500), false).unwrap();
        assert!(unlabelled.signal_indices().is_empty());
    }

    #[test]
    fn latest_signal_matches_full_validation_for_detector() {
        let config = PipelineConfig::default();
        let loaded = synthetic(1400);
        let detector = DetectorClassifier::new(config.extrema.window);
        let lenient = ValidatorConfig {
            k_neighbors: 0,
            max_conflicts: 0,
            search_distance: 26,
        };

        for n in (900..=1400).step_by(25) {
            let prefix = LoadedBars {
                bars: loaded.bars[..n].to_vec(),
                ..loaded.clone()
            };
            let series = prepare(&config, &prefix, false).unwrap();
            let features = FeatureTable::from_series(&series).unwrap();
            let predictions = detector.predict(&features).unwrap();
            let last = predictions.len() - 1;

            for validator in [lenient, config.validation] {
                let expected = if find_invalid(&predictions, &validator).contains(&last) {
                    Extremum::None
                } else {
                    predictions[last]
                };
                let latest = latest_signal(&series, &detector, &validator).unwrap();
                assert_eq!(latest, expected, "bars={n} validator={validator:?}");
            }
        }
    }
}
