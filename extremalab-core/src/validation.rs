//! SignalValidator: prunes classifier labels that violate neighbour
//! density or conflict tolerance.
//!
//! For each labelled bar i with type t, the backward window
//! `[i - search_distance, i)` (clamped at 0, never forward) is inspected:
//! - more than `max_conflicts` bars labelled `-t` → invalid
//! - fewer than `k_neighbors` bars labelled `t` → invalid
//!
//! Decisions are taken against the unmodified labelling and applied as one
//! batch, so the result does not depend on scan order.

use crate::domain::{window, Extremum, TimeSeries};
use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    pub k_neighbors: usize,
    pub max_conflicts: usize,
    pub search_distance: usize,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            k_neighbors: 5,
            max_conflicts: 2,
            search_distance: 26,
        }
    }
}

/// Whether the label at `i` survives, judged on `labels[..i]`.
fn is_valid(labels: &[Extremum], i: usize, config: &ValidatorConfig) -> bool {
    let label = labels[i];
    let region = &labels[window::backward(i, config.search_distance)];
    let conflicts = region.iter().filter(|e| **e == label.opposite()).count();
    let same = region.iter().filter(|e| **e == label).count();
    conflicts <= config.max_conflicts && same >= config.k_neighbors
}

/// Indices of labelled bars that fail either check.
pub fn find_invalid(labels: &[Extremum], config: &ValidatorConfig) -> Vec<usize> {
    labels
        .iter()
        .enumerate()
        .filter(|(i, e)| e.is_signal() && !is_valid(labels, *i, config))
        .map(|(i, _)| i)
        .collect()
}

/// Validate the series' labels in place. Returns the number deleted.
pub fn validate(series: &mut TimeSeries, config: &ValidatorConfig) -> usize {
    let invalid = find_invalid(series.extrema(), config);
    let removed = series.clear_labels(&invalid);
    debug!(
        removed,
        k_neighbors = config.k_neighbors,
        max_conflicts = config.max_conflicts,
        search_distance = config.search_distance,
        "labels validated"
    );
    removed
}

/// Validate only the last label of `tail`.
///
/// Only the trailing `search_distance + 1` labels are consulted, so callers
/// may pass a bounded slice. Returns the label if it survives, otherwise
/// `Extremum::None`. This is the same decision a full `find_invalid` makes for that
/// bar on any series ending with the same window.
pub fn validate_latest(tail: &[Extremum], config: &ValidatorConfig) -> Extremum {
    let start = tail.len().saturating_sub(config.search_distance + 1);
    let tail = &tail[start..];
    match tail.last() {
        Some(&label) if label.is_signal() && is_valid(tail, tail.len() - 1, config) => label,
        _ => Extremum::None,
    }
}

/// Overwrite every label with the classifier's prediction (keyed on row
/// position). This is a full replacement, not a union with prior labels.
pub fn merge_predictions(series: &mut TimeSeries, predictions: Vec<Extremum>) -> Result<()> {
    if predictions.len() != series.len() {
        return Err(PipelineError::LengthMismatch {
            what: "classifier predictions".to_string(),
            expected: series.len(),
            actual: predictions.len(),
        });
    }
    series.set_extrema(predictions)
}
