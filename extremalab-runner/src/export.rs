//! Export: JSON, CSV and Markdown artifacts.
//!
//! - **JSON**: the `RunResult` manifest, schema-versioned
//! - **CSV**: raw bars, transaction summary, the full prepared series, and the
//!   training table (feature columns plus the `Extrema` target)
//! - **Markdown**: a single-run report
//!
//! Manifests with a newer `schema_version` than this build knows are
//! rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use extremalab_core::accounting::TxSummary;
use extremalab_core::classifier::{FeatureTable, FEATURE_COLUMNS};
use extremalab_core::domain::{Bar, TimeSeries};

use crate::runner::{RunResult, SCHEMA_VERSION};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ─── JSON export ────────────────────────────────────────────────────

pub fn export_json(result: &RunResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize RunResult to JSON")
}

/// Deserialize a `RunResult`, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<RunResult> {
    let result: RunResult =
        serde_json::from_str(json).context("failed to deserialize RunResult from JSON")?;
    if result.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            result.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(result)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Columns: timestamp, extrema_type, price, units_owned, portfolio_value,
/// profit_loss_pct
pub fn export_transactions_csv(rows: &[TxSummary]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "timestamp",
        "extrema_type",
        "price",
        "units_owned",
        "portfolio_value",
        "profit_loss_pct",
    ])?;

    for row in rows {
        wtr.write_record([
            &row.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            &row.extrema_type.to_string(),
            &format!("{:.6}", row.price),
            &format!("{:.8}", row.units_owned),
            &format!("{:.6}", row.portfolio_value),
            &format!("{:.4}", row.profit_loss_pct),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Raw OHLCV bars in the layout `parse_bars_csv` reads back.
pub fn export_bars_csv(bars: &[Bar]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["timestamp", "open", "high", "low", "close", "volume"])?;
    for bar in bars {
        wtr.write_record([
            &bar.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            &bar.open.to_string(),
            &bar.high.to_string(),
            &bar.low.to_string(),
            &bar.close.to_string(),
            &bar.volume.to_string(),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Bars, every derived column and the `Extrema` labels. Undefined values
/// are written as empty cells.
pub fn export_series_csv(series: &TimeSeries) -> Result<String> {
    let columns: Vec<_> = series.column_names().collect();
    let mut wtr = csv::Writer::from_writer(vec![]);

    let mut header: Vec<String> = ["timestamp", "open", "high", "low", "close", "volume"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    header.extend(columns.iter().map(|c| c.name()));
    header.push("Extrema".to_string());
    wtr.write_record(&header)?;

    let values = columns
        .iter()
        .map(|c| series.column(*c))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    for (i, bar) in series.bars().iter().enumerate() {
        let mut record = vec![
            bar.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            bar.open.to_string(),
            bar.high.to_string(),
            bar.low.to_string(),
            bar.close.to_string(),
            bar.volume.to_string(),
        ];
        record.extend(values.iter().map(|column| format_cell(column[i])));
        record.push(series.extrema()[i].to_string());
        wtr.write_record(&record)?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// The model-training table: feature columns in training order (NaN
/// already replaced by the missing sentinel) and the `Extrema` target.
pub fn export_training_csv(series: &TimeSeries) -> Result<String> {
    let features = FeatureTable::from_series(series)?;
    let mut wtr = csv::Writer::from_writer(vec![]);

    let mut header: Vec<String> = FEATURE_COLUMNS.iter().map(|c| c.name()).collect();
    header.push("Extrema".to_string());
    wtr.write_record(&header)?;

    for (row, label) in features.rows().iter().zip(series.extrema()) {
        let mut record: Vec<String> = row.iter().map(|v| v.to_string()).collect();
        record.push(label.to_string());
        wtr.write_record(&record)?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

fn format_cell(v: f64) -> String {
    if v.is_nan() {
        String::new()
    } else {
        v.to_string()
    }
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the artifact set for one run.
///
/// Creates `{run_id prefix}_{timestamp}/` under `output_dir` holding
/// `manifest.json`, `transactions.csv`, `series.csv` and `report.md`.
/// Returns the created directory.
pub fn save_artifacts(result: &RunResult, series: &TimeSeries, output_dir: &Path) -> Result<PathBuf> {
    let prefix: String = result.run_id.chars().take(12).collect();
    let dirname = format!("{}_{}", prefix, chrono::Local::now().format("%Y%m%d_%H%M%S"));
    let run_dir = output_dir.join(dirname);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    std::fs::write(run_dir.join("manifest.json"), export_json(result)?)?;
    std::fs::write(
        run_dir.join("transactions.csv"),
        export_transactions_csv(&result.transactions)?,
    )?;
    std::fs::write(run_dir.join("series.csv"), export_series_csv(series)?)?;
    std::fs::write(run_dir.join("report.md"), generate_report(result))?;

    Ok(run_dir)
}

/// Load a `RunResult` from an artifact directory's manifest.json.
pub fn load_artifacts(dir: &Path) -> Result<RunResult> {
    let manifest_path = dir.join("manifest.json");
    let json = std::fs::read_to_string(&manifest_path)
        .with_context(|| format!("failed to read {}", manifest_path.display()))?;
    import_json(&json)
}

// ─── Markdown report ────────────────────────────────────────────────

pub fn generate_report(result: &RunResult) -> String {
    let mut md = String::with_capacity(2048);

    md.push_str("# Signal Backtest Report\n\n");

    md.push_str("## Metadata\n\n");
    md.push_str("| Field | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Run ID | {} |\n", result.run_id));
    md.push_str(&format!("| Period | {} to {} |\n", result.start, result.end));
    md.push_str(&format!(
        "| Bars | {} ({} warmup) |\n",
        result.bar_count, result.warmup_bars
    ));
    md.push_str(&format!("| Classifier | {} |\n", result.classifier));
    md.push_str(&format!("| Dataset Hash | {} |\n", result.dataset_hash));
    if result.has_synthetic() {
        md.push_str("| Data | **SYNTHETIC** |\n");
    }
    md.push('\n');

    md.push_str("## Signal Funnel\n\n");
    md.push_str("| Stage | Labels |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Predicted | {} |\n", result.predicted));
    md.push_str(&format!(
        "| Removed by validation | {} |\n",
        result.removed_by_validation
    ));
    md.push_str(&format!(
        "| Removed by strategy | {} |\n",
        result.removed_by_strategy
    ));
    md.push_str(&format!(
        "| Trailing buy dropped | {} |\n",
        if result.trailing_buy_removed { "yes" } else { "no" }
    ));
    md.push_str(&format!("| Executed | {} |\n", result.transactions.len()));
    md.push('\n');

    md.push_str("## Result\n\n");
    match result.final_profit_loss_pct {
        Some(pl) => md.push_str(&format!("Final profit/loss: **{pl:+.2}%**\n\n")),
        None => md.push_str("No completed round trip.\n\n"),
    }
    md.push_str(&format!("Latest bar signal: `{}`\n\n", result.latest_signal));

    if !result.transactions.is_empty() {
        md.push_str("## Transactions\n\n");
        md.push_str("| Timestamp | Type | Price | Portfolio | P/L % |\n");
        md.push_str("| --- | --- | ---: | ---: | ---: |\n");
        for tx in &result.transactions {
            md.push_str(&format!(
                "| {} | {} | {:.2} | {:.2} | {:+.2} |\n",
                tx.timestamp.format(TIMESTAMP_FORMAT),
                if tx.extrema_type.as_i8() < 0 { "buy" } else { "sell" },
                tx.price,
                tx.portfolio_value,
                tx.profit_loss_pct
            ));
        }
    }

    md
}
