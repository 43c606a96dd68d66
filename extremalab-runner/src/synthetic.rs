//! Synthetic bars for demos and tests.
//!
//! A seeded random walk with a slow cycle layered on top, so the detector
//! has swings to find. Clearly fake and tagged `DataSource::Synthetic`.

use crate::data_loader::{DataSource, LoadedBars};
use chrono::NaiveDateTime;
use extremalab_core::domain::Bar;
use extremalab_core::fingerprint::dataset_hash;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntheticSpec {
    /// Seed label; the same label always yields the same bars.
    pub label: String,
    pub start: NaiveDateTime,
    pub bars: usize,
    pub hourly: bool,
    pub start_price: f64,
}

/// Generate `spec.bars` bars, one per hour or per day.
pub fn generate_synthetic_bars(spec: &SyntheticSpec) -> LoadedBars {
    // Deterministic seed from the label
    let seed: [u8; 32] = *blake3::hash(spec.label.as_bytes()).as_bytes();
    let mut rng = StdRng::from_seed(seed);

    let step = if spec.hourly {
        chrono::Duration::hours(1)
    } else {
        chrono::Duration::days(1)
    };
    // one full cycle every ~10 days of bars
    let period = if spec.hourly { 240.0 } else { 10.0 };

    let mut bars = Vec::with_capacity(spec.bars);
    let mut drift = spec.start_price.max(1.0);
    let mut timestamp = spec.start;
    let mut previous_close = drift;

    for i in 0..spec.bars {
        let shock: f64 = rng.gen_range(-0.01..0.01);
        drift *= 1.0 + shock;
        let cycle = 1.0 + 0.05 * (std::f64::consts::TAU * i as f64 / period).sin();
        let close = drift * cycle;

        let open = previous_close;
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.004));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.004));
        let volume = rng.gen_range(5.0..500.0);

        bars.push(Bar {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        });
        previous_close = close;
        timestamp += step;
    }

    LoadedBars {
        dataset_hash: dataset_hash(&bars).0,
        bars,
        source: DataSource::Synthetic(spec.label.clone()),
        skipped_rows: 0,
        duplicate_rows: 0,
    }
}
