//! Synthetic spike waveforms with prescribed template correlations.
//!
//! Every spike is `scale · (±template + β·u)` where `u` is supported on the
//! correlation window and orthogonal to both the constant vector and the
//! windowed template. Its Pearson correlation with the template is then
//! exactly the requested value. `u` is added with alternating sign so the
//! per-sample median of any set of spike pairs is the template itself.

use spyke_core::models::{QualityMetrics, Waveforms};

/// Samples per snippet.
pub const SNIPPET_LEN: usize = 40;

/// Peak sample of the template.
pub const PEAK: usize = 20;

/// Correlation window of the template: derivative zeros around the peak.
pub const WINDOW: (usize, usize) = (16, 24);

/// Perturbation over the window; sums to zero and is orthogonal to the template.
const PERTURBATION: [f64; 9] = [1.0, -1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, -1.0];

/// Negative-going spike template of unit amplitude scale 100.
pub fn template() -> Vec<f64> {
    let mut t = vec![0.0; SNIPPET_LEN];
    t[PEAK - 2] = -10.0;
    t[PEAK - 1] = -40.0;
    t[PEAK] = -100.0;
    t[PEAK + 1] = -40.0;
    t[PEAK + 2] = -10.0;
    t
}

fn population_std(values: &[f64]) -> f64 {
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64).sqrt()
}

/// One spike whose windowed correlation with `template()` is `r`.
///
/// `r` must be non-zero; `positive` picks the sign of the perturbation.
pub fn spike(r: f64, positive: bool, scale: f64) -> Vec<f64> {
    let t = template();
    let base = if r < 0.0 { -1.0 } else { 1.0 };
    let magnitude = r.abs().min(1.0);
    let window = &t[WINDOW.0..=WINDOW.1];
    let beta = if magnitude >= 1.0 {
        0.0
    } else {
        population_std(window) * (1.0 / (magnitude * magnitude) - 1.0).sqrt()
            / population_std(&PERTURBATION)
    };
    let sign = if positive { 1.0 } else { -1.0 };

    let mut out: Vec<f64> = t.iter().map(|v| base * v).collect();
    for (k, p) in PERTURBATION.iter().enumerate() {
        out[WINDOW.0 + k] += sign * beta * p;
    }
    out.iter().map(|v| v * scale).collect()
}

/// Center correlation of histogram bin `bin`.
pub fn bin_center(bin: usize, bin_size: f64) -> f64 {
    -1.0 + bin_size * (bin as f64 + 0.5)
}

/// Snippets of one channel plus the correlation each was built with.
#[derive(Debug, Clone)]
pub struct SyntheticChannel {
    pub snippets: Vec<Vec<f64>>,
    pub correlations: Vec<f64>,
}

impl SyntheticChannel {
    /// Indices of spikes whose correlation is below `edge`.
    pub fn below(&self, edge: f64) -> Vec<usize> {
        self.correlations
            .iter()
            .enumerate()
            .filter(|(_, &r)| r < edge)
            .map(|(i, _)| i)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.snippets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snippets.is_empty()
    }
}

/// Spikes laid out bin by bin in ascending order: `counts` pairs are
/// `(bin, count)` with even counts so perturbation signs balance.
pub fn from_histogram(counts: &[(usize, usize)], bin_size: f64, scale: f64) -> SyntheticChannel {
    let mut snippets = Vec::new();
    let mut correlations = Vec::new();
    for &(bin, count) in counts {
        let r = bin_center(bin, bin_size);
        for i in 0..count {
            snippets.push(spike(r, i % 2 == 0, scale));
            correlations.push(r);
        }
    }
    SyntheticChannel {
        snippets,
        correlations,
    }
}

/// `n` copies of the template: every correlation is 1.
pub fn clean(n: usize, scale: f64) -> SyntheticChannel {
    SyntheticChannel {
        snippets: vec![spike(1.0, true, scale); n],
        correlations: vec![1.0; n],
    }
}

/// `n` inverted templates: every correlation is -1.
pub fn anti_correlated(n: usize, scale: f64) -> SyntheticChannel {
    SyntheticChannel {
        snippets: vec![spike(-1.0, true, scale); n],
        correlations: vec![-1.0; n],
    }
}

/// Contiguous histogram with 14 populated bins, two bumps, and a valley at
/// bin 33 (bin size 0.05). Bins 26..=33 hold 2870 spikes, or 3000 when
/// `candidate_of_3000` is set.
pub fn bimodal_counts(candidate_of_3000: bool) -> Vec<(usize, usize)> {
    let first = if candidate_of_3000 { 150 } else { 20 };
    vec![
        (26, first),
        (27, 100),
        (28, 300),
        (29, 600),
        (30, 800),
        (31, 600),
        (32, 300),
        (33, 150),
        (34, 300),
        (35, 800),
        (36, 1500),
        (37, 1800),
        (38, 900),
        (39, 600),
    ]
}

/// Rising distribution with a derivative trough at bin 32 (bin size 0.05);
/// 1200 spikes sit in bins 29..=32.
pub fn troughed_counts() -> Vec<(usize, usize)> {
    vec![
        (29, 100),
        (30, 250),
        (31, 380),
        (32, 470),
        (33, 500),
        (34, 600),
        (35, 650),
        (36, 670),
        (37, 600),
        (38, 450),
        (39, 330),
    ]
}

/// Tight distribution in the last three bins (bin size 0.05), 5000 spikes.
pub fn unimodal_counts() -> Vec<(usize, usize)> {
    vec![(37, 500), (38, 1500), (39, 3000)]
}

/// Stack per-channel snippets into `Waveforms`.
///
/// # Panics
/// Panics if the channels hold different spike counts.
pub fn waveforms(channels: &[SyntheticChannel]) -> Waveforms {
    let per_channel: Vec<Vec<Vec<f64>>> = channels.iter().map(|c| c.snippets.clone()).collect();
    Waveforms::from_channels(&per_channel).expect("channels must hold the same spike count")
}

/// Metrics that send a unit past the metric classifier into analysis.
pub fn analyzable_metrics(spike_count: usize) -> QualityMetrics {
    QualityMetrics::complete(spike_count as f64, 0.95, 5.0, 0.01, 10.0)
}

/// Metrics of a unit with no refractory violations.
pub fn clean_metrics(spike_count: usize) -> QualityMetrics {
    QualityMetrics::complete(spike_count as f64, 0.95, 5.0, 0.01, 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pearson(a: &[f64], b: &[f64]) -> f64 {
        let n = a.len() as f64;
        let (ma, mb) = (a.iter().sum::<f64>() / n, b.iter().sum::<f64>() / n);
        let cov: f64 = a.iter().zip(b).map(|(x, y)| (x - ma) * (y - mb)).sum();
        let va: f64 = a.iter().map(|x| (x - ma).powi(2)).sum();
        let vb: f64 = b.iter().map(|y| (y - mb).powi(2)).sum();
        cov / (va * vb).sqrt()
    }

    #[test]
    fn spike_hits_requested_correlation() {
        let t = template();
        for r in [0.3, 0.475, 0.875, 0.975, -0.5] {
            for positive in [true, false] {
                let s = spike(r, positive, 2.0);
                let got = pearson(&s[WINDOW.0..=WINDOW.1], &t[WINDOW.0..=WINDOW.1]);
                assert!((got - r).abs() < 1e-9, "r={r} got={got}");
            }
        }
    }

    #[test]
    fn histogram_layout_is_ascending() {
        let channel = from_histogram(&troughed_counts(), 0.05, 1.0);
        assert_eq!(channel.len(), 5000);
        assert_eq!(channel.below(-1.0 + 0.05 * 33.0).len(), 1200);
    }
}
