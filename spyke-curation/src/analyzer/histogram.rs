//! Correlation histogram over `[-1, 1]`.

/// Spike counts per correlation bin. Edges are `-1 + k·bin_size`; the last
/// bin is closed so a correlation of exactly 1 is counted.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationHistogram {
    counts: Vec<usize>,
    bin_size: f64,
}

impl CorrelationHistogram {
    /// Count `correlations`; non-finite values are skipped.
    pub fn new(correlations: &[f64], bin_size: f64) -> Self {
        let n_bins = ((2.0 / bin_size).round() as usize).max(1);
        let mut counts = vec![0; n_bins];
        for &r in correlations {
            if let Some(bin) = bin_index(r, bin_size, n_bins) {
                counts[bin] += 1;
            }
        }
        Self { counts, bin_size }
    }

    /// Bin a correlation falls into, or `None` when it is not finite.
    pub fn bin_of(&self, r: f64) -> Option<usize> {
        bin_index(r, self.bin_size, self.counts.len())
    }

    /// Lower edge of bin `k`; `edge(len())` is the upper end of the axis.
    pub fn edge(&self, k: usize) -> f64 {
        -1.0 + k as f64 * self.bin_size
    }

    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// First difference of the counts: `deriv[i] = counts[i+1] - counts[i]`.
    pub fn deriv(&self) -> Vec<i64> {
        self.counts
            .windows(2)
            .map(|w| w[1] as i64 - w[0] as i64)
            .collect()
    }
}

fn bin_index(r: f64, bin_size: f64, n_bins: usize) -> Option<usize> {
    if !r.is_finite() {
        return None;
    }
    let raw = ((r + 1.0) / bin_size).floor();
    Some(if raw <= 0.0 {
        0
    } else {
        (raw as usize).min(n_bins - 1)
    })
}
