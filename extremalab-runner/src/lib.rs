//! ExtremaLab Runner: pipeline orchestration on top of `extremalab-core`.
//!
//! - TOML configuration with content-hashed run IDs
//! - Bar CSV loading and deterministic synthetic bars
//! - Concrete classifiers (detector oracle, replayed label files)
//! - Single-run backtest plus JSON, CSV and Markdown artifacts

pub mod classifiers;
pub mod config;
pub mod data_loader;
pub mod export;
pub mod runner;
pub mod synthetic;

pub use classifiers::{build_classifier, DetectorClassifier, LabelFileClassifier};
pub use config::{ClassifierConfig, ConfigError, PipelineConfig, RunId};
pub use data_loader::{load_bars_csv, parse_bars_csv, DataSource, LoadError, LoadedBars};
pub use runner::{load_data, prepare, run_backtest, RunError, RunOutput, RunResult, SCHEMA_VERSION};
pub use synthetic::{generate_synthetic_bars, SyntheticSpec};
