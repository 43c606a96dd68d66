//! Serializable pipeline configuration, loaded from TOML.
//!
//! ```toml
//! [data]
//! path = "data/Coinbase_BTCUSD_1h.csv"
//! hourly = true
//! years = [2019]
//!
//! [indicators]
//! ema_periods = [30]
//! rsi_period = 14
//! obv_zero_floor = false
//! condensed = false
//!
//! [extrema]
//! window = 20
//!
//! [validation]
//! k_neighbors = 5
//! max_conflicts = 2
//! search_distance = 26
//!
//! [strategy]
//! sell_at_loss = false
//!
//! [classifier]
//! type = "label_file"
//! path = "predictions.csv"
//! ```
//!
//! Every section and field is optional; omitted values take the defaults
//! shown above (classifier defaults to `detector`).

use extremalab_core::extrema::DEFAULT_WINDOW;
use extremalab_core::fingerprint::config_hash;
use extremalab_core::indicators::{IndicatorConfig, PriceField, TimeMultiplier, EMA_CROSS_PERIOD};
use extremalab_core::pipeline::{PrepareConfig, SignalConfig};
use extremalab_core::strategy::StrategyConfig;
use extremalab_core::validation::ValidatorConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// Unique identifier for a pipeline configuration (content-addressable hash).
pub type RunId = String;

/// Errors from loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Complete configuration of one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub data: DataConfig,
    pub indicators: IndicatorsSection,
    pub extrema: ExtremaSection,
    pub validation: ValidatorConfig,
    pub strategy: StrategyConfig,
    pub classifier: ClassifierConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Bar CSV. Optional so a config can be paired with `--data` or
    /// synthetic bars.
    pub path: Option<PathBuf>,
    /// One bar per hour (periods scale by 24) rather than per day.
    pub hourly: bool,
    /// Keep only bars from these calendar years; empty keeps everything.
    pub years: Vec<i32>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: None,
            hourly: true,
            years: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorsSection {
    pub ema_periods: Vec<u32>,
    pub rsi_period: u32,
    pub obv_zero_floor: bool,
    pub condensed: bool,
}

impl Default for IndicatorsSection {
    fn default() -> Self {
        Self {
            ema_periods: vec![EMA_CROSS_PERIOD],
            rsi_period: 14,
            obv_zero_floor: false,
            condensed: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtremaSection {
    pub window: usize,
}

impl Default for ExtremaSection {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
        }
    }
}

/// Which classifier produces predictions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClassifierConfig {
    /// Detector labels replayed as predictions (oracle upper bound).
    #[default]
    Detector,

    /// Per-row predictions written by an external model.
    LabelFile { path: PathBuf },
}

impl PipelineConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: PipelineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.indicator_config()
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        if self.extrema.window == 0 {
            return Err(ConfigError::Invalid("extrema.window must be > 0".into()));
        }
        if self.validation.k_neighbors > self.validation.search_distance {
            warn!(
                k_neighbors = self.validation.k_neighbors,
                search_distance = self.validation.search_distance,
                "validation.k_neighbors exceeds search_distance; every label will be invalidated"
            );
        }
        if let Some(year) = self.data.years.iter().find(|y| !(1970..=9999).contains(*y)) {
            return Err(ConfigError::Invalid(format!("data.years: {year} out of range")));
        }
        Ok(())
    }

    /// Computes a deterministic hash ID for this configuration.
    ///
    /// Two runs with identical configs share a RunId.
    pub fn run_id(&self) -> Result<RunId, ConfigError> {
        config_hash(self)
            .map(|h| h.0)
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    pub fn time_multiplier(&self) -> TimeMultiplier {
        TimeMultiplier::from_hourly(self.data.hourly)
    }

    /// Indicator settings. The pipeline always reads the HLC average.
    pub fn indicator_config(&self) -> IndicatorConfig {
        IndicatorConfig {
            time_multiplier: self.time_multiplier(),
            price_field: PriceField::HlcAverage,
            ema_periods: self.indicators.ema_periods.clone(),
            rsi_period: self.indicators.rsi_period,
            obv_zero_floor: self.indicators.obv_zero_floor,
        }
    }

    /// Preparation settings; `label` adds detector ground-truth labels.
    pub fn prepare_config(&self, label: bool) -> PrepareConfig {
        PrepareConfig {
            indicators: self.indicator_config(),
            condensed: self.indicators.condensed,
            label_window: label.then_some(self.extrema.window),
        }
    }

    pub fn signal_config(&self) -> SignalConfig {
        SignalConfig {
            validator: self.validation,
            strategy: self.strategy,
        }
    }
}
