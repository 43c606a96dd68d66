//! Signal pipeline driver.
//!
//! raw bars → indicators → warm-up trim → condense (optional)
//!   → detector labels (training only) → classifier → validate
//!   → alternate → end with sell → accountant
//!
//! Each stage runs once per series and any stage error aborts the run.

use crate::accounting::{final_profit_loss, summarize, TxSummary};
use crate::classifier::{Classifier, FeatureTable};
use crate::condense::condense_indicators;
use crate::domain::{Column, Extremum, TimeSeries};
use crate::error::{PipelineError, Result};
use crate::extrema::label_extrema;
use crate::indicators::{compute_indicators, IndicatorConfig};
use crate::strategy::{alternate, end_with_sell, StrategyConfig};
use crate::validation::{merge_predictions, validate, validate_latest, ValidatorConfig};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Column the strategy filter and accountant trade at.
pub const PRICE_COLUMN: Column = Column::HlcAverage;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrepareConfig {
    pub indicators: IndicatorConfig,
    pub condensed: bool,
    /// Detector window for training labels; `None` leaves labels empty.
    pub label_window: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SignalConfig {
    pub validator: ValidatorConfig,
    pub strategy: StrategyConfig,
}

/// What each signal stage did, plus the resulting trade trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineOutcome {
    pub classifier: String,
    pub predicted: usize,
    pub removed_by_validation: usize,
    pub removed_by_strategy: usize,
    pub trailing_buy_removed: bool,
    pub transactions: Vec<TxSummary>,
}

impl PipelineOutcome {
    pub fn final_profit_loss(&self) -> Option<f64> {
        final_profit_loss(&self.transactions)
    }
}

/// Compute indicators, trim the warm-up region, optionally condense, and
/// optionally write detector labels.
pub fn prepare_series(mut series: TimeSeries, config: &PrepareConfig) -> Result<TimeSeries> {
    compute_indicators(&mut series, &config.indicators)?;

    let warmup = config.indicators.warmup_bars();
    if series.len() <= warmup {
        return Err(PipelineError::InsufficientData {
            required: warmup,
            available: series.len(),
        });
    }
    series.trim_front(warmup);

    if config.condensed {
        condense_indicators(&mut series)?;
    }
    if let Some(window) = config.label_window {
        label_extrema(&mut series, PRICE_COLUMN, window)?;
    }

    debug!(
        bars = series.len(),
        warmup,
        condensed = config.condensed,
        "series prepared"
    );
    Ok(series)
}

fn predict(series: &TimeSeries, classifier: &dyn Classifier) -> Result<Vec<Extremum>> {
    let features = FeatureTable::from_series(series)?;
    let predictions = classifier.predict(&features)?;
    if predictions.len() != features.len() {
        return Err(PipelineError::LengthMismatch {
            what: format!("predictions from '{}'", classifier.name()),
            expected: features.len(),
            actual: predictions.len(),
        });
    }
    Ok(predictions)
}

/// Run classifier → validator → strategy filter → accountant on a prepared
/// series. The series' labels end up as the executed trade sequence.
pub fn run_signals(
    series: &mut TimeSeries,
    classifier: &dyn Classifier,
    config: &SignalConfig,
) -> Result<PipelineOutcome> {
    let predictions = predict(series, classifier)?;
    merge_predictions(series, predictions)?;
    let predicted = series.signal_indices().len();

    let removed_by_validation = validate(series, &config.validator);

    let prices = series.column(PRICE_COLUMN)?.to_vec();
    let removed_by_strategy = alternate(series, &prices, &config.strategy)?;
    let trailing_buy_removed = end_with_sell(series);

    let transactions = summarize(series, &prices)?;

    let outcome = PipelineOutcome {
        classifier: classifier.name().to_string(),
        predicted,
        removed_by_validation,
        removed_by_strategy,
        trailing_buy_removed,
        transactions,
    };
    info!(
        classifier = %outcome.classifier,
        predicted,
        removed_by_validation,
        removed_by_strategy,
        trades = outcome.transactions.len(),
        profit_loss_pct = ?outcome.final_profit_loss(),
        "signal pipeline finished"
    );
    Ok(outcome)
}

/// Point inference for the newest bar of a prepared series.
///
/// The whole series is classified, since windowed classifiers see
/// different neighbours on a truncated table. Only the trailing
/// `search_distance + 1` predictions are validated; the decision equals
/// what a full `run_signals` validation would make for that bar.
pub fn latest_signal(
    series: &TimeSeries,
    classifier: &dyn Classifier,
    validator: &ValidatorConfig,
) -> Result<Extremum> {
    let predictions = predict(series, classifier)?;
    let start = predictions
        .len()
        .saturating_sub(validator.search_distance + 1);
    Ok(validate_latest(&predictions[start..], validator))
}
