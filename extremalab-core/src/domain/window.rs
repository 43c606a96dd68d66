//! Clamped index windows around a bar position.
//!
//! Windows never pad: a window that would run off either end of the series
//! is truncated to the elements that exist, and may be empty.

use std::ops::Range;

/// The `n` positions strictly before `i`: `[i-n, i)`, clamped at 0.
pub fn backward(i: usize, n: usize) -> Range<usize> {
    i.saturating_sub(n)..i
}

/// The `n` positions strictly after `i`: `(i, i+n]`, clamped at `len`.
pub fn forward(i: usize, n: usize, len: usize) -> Range<usize> {
    let start = (i + 1).min(len);
    let end = i.saturating_add(n).saturating_add(1).min(len);
    start..end
}
