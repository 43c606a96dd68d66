//! End-to-end runner tests: CSV on disk, TOML config, backtest, artifacts,
//! and replaying exported labels through the label-file classifier.

use chrono::NaiveDate;
use extremalab_core::domain::Extremum;
use extremalab_runner::export::{export_series_csv, export_training_csv, save_artifacts};
use extremalab_runner::{
    generate_synthetic_bars, load_data, prepare, run_backtest, ClassifierConfig, DataSource,
    LoadedBars, PipelineConfig, RunError, SyntheticSpec,
};
use std::path::{Path, PathBuf};

fn synthetic(bars: usize) -> LoadedBars {
    generate_synthetic_bars(&SyntheticSpec {
        label: "BTCUSD".into(),
        start: NaiveDate::from_ymd_opt(2019, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap(),
        bars,
        hourly: true,
        start_price: 3700.0,
    })
}

/// Write bars in the cryptodatadownload layout: banner line, 12-hour
/// timestamps, newest first, asset and quote volume columns.
fn write_exchange_csv(dir: &Path, loaded: &LoadedBars) -> PathBuf {
    let mut out = String::from("https://www.CryptoDataDownload.com\n");
    out.push_str("Date,Symbol,Open,High,Low,Close,Volume BTC,Volume USD\n");
    for bar in loaded.bars.iter().rev() {
        out.push_str(&format!(
            "{},BTCUSD,{},{},{},{},{},{}\n",
            bar.timestamp.format("%Y-%m-%d %I-%p"),
            bar.open,
            bar.high,
            bar.low,
            bar.close,
            bar.volume,
            bar.volume * bar.close
        ));
    }
    let path = dir.join("Coinbase_BTCUSD_1h.csv");
    std::fs::write(&path, out).unwrap();
    path
}

fn write_config(dir: &Path, body: &str) -> PipelineConfig {
    let path = dir.join("extremalab.toml");
    std::fs::write(&path, body).unwrap();
    PipelineConfig::from_file(&path).unwrap()
}

#[test]
fn csv_file_round_trips_through_loader() {
    let dir = tempfile::tempdir().unwrap();
    let generated = synthetic(300);
    let csv = write_exchange_csv(dir.path(), &generated);

    let config = write_config(
        dir.path(),
        &format!("[data]\npath = {:?}\nhourly = true\n", csv.display().to_string()),
    );
    let loaded = load_data(&config, None).unwrap();

    assert_eq!(loaded.source, DataSource::Csv(csv));
    assert_eq!(loaded.bars, generated.bars);
    assert_eq!(loaded.dataset_hash, generated.dataset_hash);
    assert_eq!(loaded.skipped_rows, 0);
}

#[test]
fn data_override_wins_over_config_path() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_exchange_csv(dir.path(), &synthetic(50));
    let config = write_config(dir.path(), "[data]\npath = \"/nonexistent/bars.csv\"\n");

    assert!(matches!(
        load_data(&config, None).unwrap_err(),
        RunError::Data(_)
    ));
    let loaded = load_data(&config, Some(&csv)).unwrap();
    assert_eq!(loaded.bars.len(), 50);
}

#[test]
fn backtest_from_disk_writes_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_exchange_csv(dir.path(), &synthetic(2400));
    let config = write_config(
        dir.path(),
        "[validation]\nk_neighbors = 5\nmax_conflicts = 2\nsearch_distance = 26\n",
    );

    let loaded = load_data(&config, Some(&csv)).unwrap();
    let output = run_backtest(&config, &loaded).unwrap();
    let result = &output.result;

    assert_eq!(result.bar_count, 2400);
    assert!(!result.has_synthetic());
    assert!(!result.transactions.is_empty(), "oracle labels should trade");
    assert_eq!(result.transactions[0].extrema_type, Extremum::BUY);
    assert_eq!(
        result.transactions.last().unwrap().extrema_type,
        Extremum::SELL
    );
    for pair in result.transactions.windows(2) {
        assert_ne!(pair[0].extrema_type, pair[1].extrema_type);
    }

    let run_dir = save_artifacts(result, &output.series, &dir.path().join("runs")).unwrap();
    let manifest = std::fs::read_to_string(run_dir.join("manifest.json")).unwrap();
    assert!(manifest.contains(&result.run_id));
}

#[test]
fn exported_labels_replay_as_predictions() {
    let dir = tempfile::tempdir().unwrap();
    let loaded = synthetic(2000);
    let detector = PipelineConfig::default();

    let labelled = prepare(&detector, &loaded, true).unwrap();
    let labels_path = dir.path().join("labels.csv");
    std::fs::write(&labels_path, export_series_csv(&labelled).unwrap()).unwrap();

    let replay = PipelineConfig {
        classifier: ClassifierConfig::LabelFile { path: labels_path },
        ..PipelineConfig::default()
    };

    let from_detector = run_backtest(&detector, &loaded).unwrap().result;
    let from_file = run_backtest(&replay, &loaded).unwrap().result;

    assert_ne!(from_detector.run_id, from_file.run_id);
    assert_eq!(from_detector.predicted, from_file.predicted);
    assert_eq!(from_detector.transactions, from_file.transactions);
}

#[test]
fn training_table_matches_prepared_rows() {
    let loaded = synthetic(1500);
    let labelled = prepare(&PipelineConfig::default(), &loaded, true).unwrap();
    let csv = export_training_csv(&labelled).unwrap();

    assert_eq!(csv.lines().count(), labelled.len() + 1);
    let targets: Vec<&str> = csv
        .lines()
        .skip(1)
        .map(|l| l.rsplit(',').next().unwrap())
        .collect();
    assert!(targets.contains(&"-1"));
    assert!(targets.contains(&"1"));
}

#[test]
fn label_file_shorter_than_series_fails_run() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("short.csv");
    std::fs::write(&path, "prediction\n0\n-1\n1\n").unwrap();
    let config = PipelineConfig {
        classifier: ClassifierConfig::LabelFile { path },
        ..PipelineConfig::default()
    };

    let err = run_backtest(&config, &synthetic(1000)).unwrap_err();
    assert!(matches!(err, RunError::Pipeline(_)), "got {err}");
}
