//! ExtremaLab Core: indicators, extremum labelling, signal filtering and
//! backtest accounting.
//!
//! This crate contains the signal pipeline:
//! - Domain types (bars, extremum labels, the column-oriented time series)
//! - Indicator engine (HLC average, EMA family, MACD, RSI, OBV)
//! - Range condenser and extremum detector
//! - Classifier seam and the validator/strategy filters applied to its output
//! - Backtest accountant and the pipeline driver tying the stages together

pub mod accounting;
pub mod classifier;
pub mod condense;
pub mod domain;
pub mod error;
pub mod extrema;
pub mod fingerprint;
pub mod indicators;
pub mod pipeline;
pub mod strategy;
pub mod validation;

pub use error::{PipelineError, Result};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: pipeline types can cross threads, so a runner can
    /// process several instruments in parallel.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        // Domain types
        require_send::<domain::Bar>();
        require_sync::<domain::Bar>();
        require_send::<domain::Extremum>();
        require_sync::<domain::Extremum>();
        require_send::<domain::TimeSeries>();
        require_sync::<domain::TimeSeries>();

        // Configs
        require_send::<indicators::IndicatorConfig>();
        require_sync::<indicators::IndicatorConfig>();
        require_send::<validation::ValidatorConfig>();
        require_sync::<validation::ValidatorConfig>();
        require_send::<strategy::StrategyConfig>();
        require_sync::<strategy::StrategyConfig>();
        require_send::<pipeline::PrepareConfig>();
        require_sync::<pipeline::PrepareConfig>();

        // Outputs
        require_send::<accounting::TxSummary>();
        require_sync::<accounting::TxSummary>();
        require_send::<pipeline::PipelineOutcome>();
        require_sync::<pipeline::PipelineOutcome>();
        require_send::<classifier::FeatureTable>();
        require_sync::<classifier::FeatureTable>();
        require_send::<PipelineError>();
        require_sync::<PipelineError>();
    }

    /// Classifiers are used behind `&dyn`, so the trait must stay object safe.
    #[test]
    fn classifier_is_object_safe() {
        fn _check_trait_object_builds(
            classifier: &dyn classifier::Classifier,
            features: &classifier::FeatureTable,
        ) -> Result<Vec<domain::Extremum>> {
            classifier.predict(features)
        }
    }
}
