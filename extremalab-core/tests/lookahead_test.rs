//! Look-ahead contamination tests for the indicator engine and validator.
//!
//! Invariant: no indicator value or validation decision at bar t may depend
//! on data from bar t+1 or later.
//!
//! Method: compute on a truncated series (bars 0..100) and the full series
//! (bars 0..200). Assert bars 0..100 are identical between both runs. Any
//! difference means future data is leaking into past values.
//!
//! The condenser (global range) and the extrema detector (forward window)
//! are non-causal on purpose and are not covered here.

use chrono::NaiveDate;
use extremalab_core::domain::{Bar, Column, Extremum, TimeSeries};
use extremalab_core::indicators::{
    compute_indicators, Ema, Indicator, IndicatorConfig, Obv, PriceField, PriceInput, Rsi,
    TimeMultiplier,
};
use extremalab_core::validation::{find_invalid, ValidatorConfig};

/// Generate N bars of synthetic OHLCV data with realistic variation.
fn make_test_bars(n: usize) -> Vec<Bar> {
    let base = NaiveDate::from_ymd_opt(2019, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let mut bars = Vec::with_capacity(n);
    let mut price = 100.0;

    for i in 0..n {
        // Deterministic pseudo-random walk using a simple LCG
        let seed = (i as u64).wrapping_mul(6364136223846793005).wrapping_add(1);
        let change = ((seed % 200) as f64 - 100.0) * 0.05;
        price += change;
        price = price.max(10.0);

        let open = price - 0.5;
        let close = price + 0.3;
        bars.push(Bar {
            timestamp: base + chrono::Duration::hours(i as i64),
            open,
            high: open.max(close) + 2.0,
            low: open.min(close) - 2.0,
            close,
            volume: 1000.0 + (i as f64 * 100.0),
        });
    }

    bars
}

fn assert_prefix_equal(name: &str, truncated: &[f64], full: &[f64]) {
    for (i, (t, f)) in truncated.iter().zip(full).enumerate() {
        if t.is_nan() && f.is_nan() {
            continue;
        }
        assert!(
            !t.is_nan() && !f.is_nan(),
            "{name}: NaN mismatch at bar {i} (truncated={t}, full={f})"
        );
        assert!(
            (t - f).abs() < 1e-10,
            "{name}: look-ahead detected at bar {i}: truncated={t}, full={f}"
        );
    }
}

fn assert_no_lookahead(indicator: &dyn Indicator, full_bars: &[Bar], truncated_len: usize) {
    let price: Vec<f64> = full_bars.iter().map(|b| b.close).collect();
    let volume: Vec<f64> = full_bars.iter().map(|b| b.volume).collect();
    let full = indicator.compute(&PriceInput {
        price: &price,
        volume: &volume,
    });
    let truncated = indicator.compute(&PriceInput {
        price: &price[..truncated_len],
        volume: &volume[..truncated_len],
    });

    let name = indicator.column().name();
    assert_eq!(truncated.len(), truncated_len, "{name}: truncated length");
    assert_eq!(full.len(), full_bars.len(), "{name}: full length");
    assert_prefix_equal(&name, &truncated, &full[..truncated_len]);
}

#[test]
fn ema_has_no_lookahead() {
    let bars = make_test_bars(200);
    assert_no_lookahead(&Ema::new(30, TimeMultiplier::Daily), &bars, 100);
    assert_no_lookahead(&Ema::new(5, TimeMultiplier::Daily), &bars, 100);
}

#[test]
fn rsi_has_no_lookahead() {
    let bars = make_test_bars(200);
    assert_no_lookahead(&Rsi::new(14, TimeMultiplier::Daily), &bars, 100);
}

#[test]
fn obv_has_no_lookahead() {
    let bars = make_test_bars(200);
    assert_no_lookahead(&Obv, &bars, 100);
}

#[test]
fn every_engine_column_has_no_lookahead() {
    let bars = make_test_bars(200);
    let config = IndicatorConfig {
        time_multiplier: TimeMultiplier::Daily,
        price_field: PriceField::HlcAverage,
        ema_periods: vec![10, 30, 50],
        rsi_period: 14,
        obv_zero_floor: false,
    };

    let mut full = TimeSeries::new(bars.clone()).unwrap();
    compute_indicators(&mut full, &config).unwrap();
    let mut truncated = TimeSeries::new(bars[..100].to_vec()).unwrap();
    compute_indicators(&mut truncated, &config).unwrap();

    let columns: Vec<Column> = full.column_names().collect();
    assert_eq!(columns, truncated.column_names().collect::<Vec<_>>());
    for column in columns {
        assert_prefix_equal(
            &column.name(),
            truncated.column(column).unwrap(),
            &full.column(column).unwrap()[..100],
        );
    }
}

#[test]
fn validation_decisions_have_no_lookahead() {
    let labels: Vec<Extremum> = (0..200u64)
        .map(|i| match i.wrapping_mul(2862933555777941757) % 7 {
            0 => Extremum::Minimum,
            1 => Extremum::Maximum,
            _ => Extremum::None,
        })
        .collect();
    let config = ValidatorConfig {
        k_neighbors: 1,
        max_conflicts: 2,
        search_distance: 10,
    };

    let full: Vec<usize> = find_invalid(&labels, &config)
        .into_iter()
        .filter(|&i| i < 100)
        .collect();
    let truncated = find_invalid(&labels[..100], &config);
    assert_eq!(truncated, full);
}
