//! StrategyFilter: turns validated labels into a tradeable sequence.
//!
//! Two passes over the labels in time order:
//! 1. `alternate`: buys and sells must interleave starting with a buy. A
//!    label of the wrong type, or a sell below the last accepted buy when
//!    selling at a loss is disallowed, is deleted without advancing state.
//! 2. `end_with_sell`: a trailing unmatched buy is deleted so every
//!    position is closed and profit is realised.

use crate::domain::{Extremum, TimeSeries};
use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    /// Allow a sell priced below the buy it closes.
    pub sell_at_loss: bool,
}

/// Enforce buy/sell alternation over `series` labels, pricing each bar at
/// `prices`. Returns the number of labels deleted.
pub fn alternate(series: &mut TimeSeries, prices: &[f64], config: &StrategyConfig) -> Result<usize> {
    if prices.len() != series.len() {
        return Err(PipelineError::LengthMismatch {
            what: "strategy prices".to_string(),
            expected: series.len(),
            actual: prices.len(),
        });
    }

    let mut expected = Extremum::BUY;
    let mut last_buy_price = f64::NAN;
    let mut rejected = Vec::new();

    for i in series.signal_indices() {
        let label = series.extrema()[i];
        let price = prices[i];
        let loss_making_sell =
            !config.sell_at_loss && label == Extremum::SELL && price < last_buy_price;

        if label != expected || loss_making_sell {
            rejected.push(i);
            continue;
        }
        if label == Extremum::BUY {
            last_buy_price = price;
        }
        expected = label.opposite();
    }

    let removed = series.clear_labels(&rejected);
    debug!(removed, sell_at_loss = config.sell_at_loss, "alternation enforced");
    Ok(removed)
}

/// Delete the final label if it is a buy. Returns whether one was deleted.
///
/// Assumes `alternate` has already run.
pub fn end_with_sell(series: &mut TimeSeries) -> bool {
    match series.signal_indices().last() {
        Some(&i) if series.extrema()[i] == Extremum::BUY => {
            series.set_label(i, Extremum::None);
            true
        }
        _ => false,
    }
}
