//! Spike window: the stretch of samples around the peak bounded by the
//! template's nearest derivative zero-crossings.

use spyke_core::constants::{WINDOW_FALLBACK_AFTER, WINDOW_FALLBACK_BEFORE, WINDOW_PEAK_GUARD};

/// Central-difference derivative, one-sided at both ends.
pub fn derivative(data: &[f64]) -> Vec<f64> {
    let n = data.len();
    if n < 2 {
        return vec![0.0; n];
    }
    let mut d = vec![0.0; n];
    for i in 1..n - 1 {
        d[i] = (data[i + 1] - data[i - 1]) / 2.0;
    }
    d[0] = data[1] - data[0];
    d[n - 1] = data[n - 1] - data[n - 2];
    d
}

/// Indices where `data` is exactly zero or changes sign. A sign change is
/// reported at whichever of the two samples is negative.
pub fn zero_crossings(data: &[f64]) -> Vec<usize> {
    let mut ids: Vec<usize> = data
        .iter()
        .enumerate()
        .filter(|(_, &v)| v == 0.0)
        .map(|(i, _)| i)
        .collect();
    for i in 1..data.len() {
        let (prev, cur) = (data[i - 1], data[i]);
        if prev * cur < 0.0 {
            ids.push(if prev < 0.0 { i - 1 } else { i });
        }
    }
    ids.sort_unstable();
    ids.dedup();
    ids
}

/// Inclusive `(start, stop)` sample window for correlating against `template`.
pub fn spike_window(template: &[f64], center: usize) -> (usize, usize) {
    let last = template.len().saturating_sub(1);
    let crossings = zero_crossings(&derivative(template));

    let start = center
        .checked_sub(WINDOW_PEAK_GUARD)
        .and_then(|lo| crossings.iter().copied().filter(|&i| i < lo).max())
        .unwrap_or_else(|| center.saturating_sub(WINDOW_FALLBACK_BEFORE));
    let stop = crossings
        .iter()
        .copied()
        .find(|&i| i > center + WINDOW_PEAK_GUARD)
        .unwrap_or(center + WINDOW_FALLBACK_AFTER);

    let stop = stop.min(last);
    (start.min(stop), stop)
}
