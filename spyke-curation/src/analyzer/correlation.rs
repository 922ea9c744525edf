//! Pearson correlation of spikes against a template over the spike window.

use rayon::prelude::*;
use rustc_hash::FxHashMap;
use statrs::statistics::Statistics;

use super::window::spike_window;

/// Pearson correlation of two equally long series. NaN when either is constant.
pub fn pearson(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() || a.len() < 2 {
        return f64::NAN;
    }
    let cov = a.iter().population_covariance(b.iter());
    let sd_a = a.iter().population_std_dev();
    let sd_b = b.iter().population_std_dev();
    if sd_a == 0.0 || sd_b == 0.0 {
        return f64::NAN;
    }
    (cov / (sd_a * sd_b)).clamp(-1.0, 1.0)
}

/// Correlation of each snippet with `template` over the window centered on `center`.
pub fn windowed_correlations<S>(snippets: &[S], template: &[f64], center: usize) -> Vec<f64>
where
    S: AsRef<[f64]> + Sync,
{
    if template.is_empty() {
        return vec![f64::NAN; snippets.len()];
    }
    let (start, stop) = spike_window(template, center);
    let reference = &template[start..=stop];
    snippets
        .par_iter()
        .map(|snippet| {
            let snippet = snippet.as_ref();
            if snippet.len() <= stop {
                return f64::NAN;
            }
            pearson(&snippet[start..=stop], reference)
        })
        .collect()
}

/// Sample index of the largest absolute value; the first one on ties.
pub fn peak_index(snippet: &[f64]) -> Option<usize> {
    snippet
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (i, v)| match best {
            Some((_, b)) if v.abs() <= b => best,
            _ => Some((i, v.abs())),
        })
        .map(|(i, _)| i)
}

/// Most common per-spike peak index; ties go to the index seen first.
pub fn spike_center<S: AsRef<[f64]>>(snippets: &[S]) -> Option<usize> {
    let mut counts: FxHashMap<usize, (usize, usize)> = FxHashMap::default();
    for (order, snippet) in snippets.iter().enumerate() {
        if let Some(peak) = peak_index(snippet.as_ref()) {
            counts.entry(peak).or_insert((0, order)).0 += 1;
        }
    }
    counts
        .into_iter()
        .max_by(|a, b| a.1 .0.cmp(&b.1 .0).then(b.1 .1.cmp(&a.1 .1)))
        .map(|(peak, _)| peak)
}
