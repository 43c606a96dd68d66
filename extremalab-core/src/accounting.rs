//! BacktestAccountant: replays an alternating buy/sell sequence into a
//! holdings and profit/loss trace.
//!
//! Every sale is fully reinvested at the next buy:
//! - first buy: units = 1, start = current = price
//! - later buy: units = current / price
//! - sell: current = price × units, units = 0
//!
//! profit_loss_pct = (current − start) / start × 100

use crate::domain::{Extremum, TimeSeries};
use crate::error::{PipelineError, Result};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One row per executed signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TxSummary {
    pub timestamp: NaiveDateTime,
    pub extrema_type: Extremum,
    pub price: f64,
    pub units_owned: f64,
    pub portfolio_value: f64,
    pub profit_loss_pct: f64,
}

/// Replay the labelled bars of `series`, pricing each at `prices`.
///
/// The labels must already alternate starting with a buy (see
/// `strategy::alternate`); anything else is a `PreconditionViolation`.
pub fn summarize(series: &TimeSeries, prices: &[f64]) -> Result<Vec<TxSummary>> {
    if prices.len() != series.len() {
        return Err(PipelineError::LengthMismatch {
            what: "accountant prices".to_string(),
            expected: series.len(),
            actual: prices.len(),
        });
    }

    let mut rows = Vec::new();
    let mut units: Option<f64> = None;
    let mut start_value = 0.0;
    let mut current_value = 0.0;
    let mut previous = Extremum::None;

    for i in series.signal_indices() {
        let label = series.extrema()[i];
        let price = prices[i];
        let timestamp = series.bars()[i].timestamp;

        if label == previous {
            return Err(PipelineError::PreconditionViolation(format!(
                "two consecutive {} signals at bar {i} ({timestamp})",
                if label == Extremum::BUY { "buy" } else { "sell" }
            )));
        }

        let owned = match (label, units) {
            (Extremum::Minimum, None) => {
                start_value = price;
                current_value = price;
                1.0
            }
            (Extremum::Minimum, Some(_)) => current_value / price,
            (Extremum::Maximum, Some(held)) => {
                current_value = price * held;
                0.0
            }
            _ => {
                return Err(PipelineError::PreconditionViolation(format!(
                    "first signal at bar {i} ({timestamp}) is a sell"
                )))
            }
        };
        units = Some(owned);
        previous = label;

        rows.push(TxSummary {
            timestamp,
            extrema_type: label,
            price,
            units_owned: owned,
            portfolio_value: current_value,
            profit_loss_pct: profit_loss_pct(current_value, start_value),
        });
    }

    Ok(rows)
}

fn profit_loss_pct(current: f64, start: f64) -> f64 {
    (current - start) / start * 100.0
}

/// Profit/loss of the last row, if any trades happened.
pub fn final_profit_loss(rows: &[TxSummary]) -> Option<f64> {
    rows.last().map(|r| r.profit_loss_pct)
}
