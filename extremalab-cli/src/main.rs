//! ExtremaLab CLI: indicator, labelling, backtest and synthetic data commands.
//!
//! Commands:
//! - `indicators`: compute indicator columns and write the prepared series
//! - `label`: add detector labels; optionally write the model-training table
//! - `backtest`: run the full signal pipeline and save artifacts
//! - `synth`: write deterministic synthetic bars as CSV

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use clap::{Args, Parser, Subcommand};
use extremalab_runner::export::{
    export_bars_csv, export_series_csv, export_training_csv, save_artifacts,
};
use extremalab_runner::{
    generate_synthetic_bars, load_data, prepare, run_backtest, LoadedBars, PipelineConfig,
    RunResult, SyntheticSpec,
};
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(
    name = "extremalab",
    about = "ExtremaLab CLI: extrema-labelling signal pipeline and backtester"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute indicators, trim the warm-up region and write the series as CSV.
    Indicators {
        #[command(flatten)]
        input: InputArgs,

        /// Output CSV. Defaults to stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Label local extrema with the detector.
    Label {
        #[command(flatten)]
        input: InputArgs,

        /// Write only the feature columns and the Extrema target.
        #[arg(long, default_value_t = false)]
        training: bool,

        /// Output CSV. Defaults to stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Run classifier, validation, strategy filter and accounting.
    Backtest {
        #[command(flatten)]
        input: InputArgs,

        /// Output directory for run artifacts.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,
    },
    /// Write synthetic OHLCV bars.
    Synth {
        /// Seed label; the same label always yields the same bars.
        #[arg(long, default_value = "SYNTH")]
        label: String,

        /// Number of bars.
        #[arg(long, default_value_t = 5000)]
        bars: usize,

        /// One bar per day instead of per hour.
        #[arg(long, default_value_t = false)]
        daily: bool,

        /// First timestamp (YYYY-MM-DD).
        #[arg(long, default_value = "2019-01-01")]
        start: String,

        /// Output CSV. Defaults to stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args)]
struct InputArgs {
    /// Path to a TOML config file. Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Bar CSV; overrides `[data] path` from the config.
    #[arg(long)]
    data: Option<PathBuf>,

    /// Use this many synthetic bars instead of a CSV.
    #[arg(long, conflicts_with = "data")]
    synthetic: Option<usize>,
}

impl InputArgs {
    fn load(&self) -> Result<(PipelineConfig, LoadedBars)> {
        let config = match &self.config {
            Some(path) => PipelineConfig::from_file(path)?,
            None => PipelineConfig::default(),
        };
        let loaded = match self.synthetic {
            Some(bars) => generate_synthetic_bars(&SyntheticSpec {
                label: "SYNTH".into(),
                start: parse_start("2019-01-01")?,
                bars,
                hourly: config.data.hourly,
                start_price: 3500.0,
            }),
            None => load_data(&config, self.data.as_deref())?,
        };
        Ok((config, loaded))
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    match cli.command {
        Commands::Indicators { input, output } => {
            let (config, loaded) = input.load()?;
            let series = prepare(&config, &loaded, false)?;
            write_output(output.as_deref(), &export_series_csv(&series)?)
        }
        Commands::Label {
            input,
            training,
            output,
        } => {
            let (config, loaded) = input.load()?;
            let series = prepare(&config, &loaded, true)?;
            let csv = if training {
                export_training_csv(&series)?
            } else {
                export_series_csv(&series)?
            };
            write_output(output.as_deref(), &csv)
        }
        Commands::Backtest { input, output_dir } => {
            let (config, loaded) = input.load()?;
            let output = run_backtest(&config, &loaded)?;
            print_summary(&output.result);

            let run_dir = save_artifacts(&output.result, &output.series, &output_dir)?;
            println!("Artifacts saved to: {}", run_dir.display());
            Ok(())
        }
        Commands::Synth {
            label,
            bars,
            daily,
            start,
            output,
        } => {
            if bars == 0 {
                bail!("--bars must be > 0");
            }
            let loaded = generate_synthetic_bars(&SyntheticSpec {
                label,
                start: parse_start(&start)?,
                bars,
                hourly: !daily,
                start_price: 3500.0,
            });
            write_output(output.as_deref(), &export_bars_csv(&loaded.bars)?)
        }
    }
}

fn init_logging(verbose: u8) -> Result<()> {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")
}

fn parse_start(raw: &str) -> Result<NaiveDateTime> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("invalid start date '{raw}' (expected YYYY-MM-DD)"))?
        .and_hms_opt(0, 0, 0)
        .context("midnight is always valid")
}

fn write_output(path: Option<&Path>, content: &str) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("Wrote {}", path.display());
        }
        None => print!("{content}"),
    }
    Ok(())
}

fn print_summary(result: &RunResult) {
    println!();
    println!("=== Backtest Result ===");
    println!("Run ID:         {}", result.run_id);
    println!("Period:         {} to {}", result.start, result.end);
    println!(
        "Bars:           {} ({} warmup)",
        result.bar_count, result.warmup_bars
    );
    println!("Classifier:     {}", result.classifier);
    println!();
    println!("--- Signals ---");
    println!("Predicted:      {}", result.predicted);
    println!("Invalidated:    {}", result.removed_by_validation);
    println!("Filtered:       {}", result.removed_by_strategy);
    println!("Transactions:   {}", result.transactions.len());
    println!();
    println!("--- Performance ---");
    match result.final_profit_loss_pct {
        Some(pl) => println!("Profit/Loss:    {pl:+.2}%"),
        None => println!("Profit/Loss:    n/a (no completed round trip)"),
    }
    println!("Latest Signal:  {}", result.latest_signal);
    if result.has_synthetic() {
        println!();
        println!("WARNING: Results based on SYNTHETIC data");
    }
    println!();
}
