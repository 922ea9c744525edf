//! `identify`: the per-(unit, channel) verdict.
//!
//! MUA decomposition runs as an explicit stack of `(spike subset, depth)`
//! frames. Every frame reports spike indices in the unit's own indexing,
//! and split levels stay disjoint: a deeper frame carves its spikes out of
//! the level above it.

use std::collections::BTreeSet;

use spyke_core::config::CurationConfig;
use spyke_core::constants::RECURSION_FLOOR_SPIKES;
use spyke_core::errors::CurationError;
use spyke_core::models::{median_of_snippets, Label};
use tracing::{debug, warn};

use super::classify::{classify, read_histogram, HistogramReading};
use super::correlation::windowed_correlations;
use super::histogram::CorrelationHistogram;

/// Tunables of the correlation analysis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalyzerParams {
    pub bin_size: f64,
    pub distribution_threshold: f64,
    pub recursive: bool,
}

impl AnalyzerParams {
    pub fn from_config(config: &CurationConfig) -> Self {
        Self {
            bin_size: config.effective_bin_size(),
            distribution_threshold: config.effective_distribution_threshold(),
            recursive: config.effective_recursive(),
        }
    }
}

impl Default for AnalyzerParams {
    fn default() -> Self {
        Self::from_config(&CurationConfig::default())
    }
}

/// Verdict of one channel. `split[d]` holds the spikes split out at
/// recursion depth `d`; `remove`, every split level, and the kept spikes
/// are pairwise disjoint.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelVerdict {
    pub label: Label,
    /// Cut bin of the top-level histogram.
    pub threshold: usize,
    pub remove: Vec<usize>,
    pub split: Vec<Vec<usize>>,
}

impl ChannelVerdict {
    fn unresolved(label: Label) -> Self {
        Self {
            label,
            threshold: 0,
            remove: Vec::new(),
            split: Vec::new(),
        }
    }
}

/// Analyze `snippets` (one per spike, this channel only) against
/// `template`, or against the per-sample median when none is given.
pub fn identify<S>(
    channel: usize,
    snippets: &[S],
    template: Option<&[f64]>,
    center: usize,
    params: &AnalyzerParams,
) -> ChannelVerdict
where
    S: AsRef<[f64]> + Sync,
{
    let top_template = match template {
        Some(t) => t.to_vec(),
        None => median_of(snippets, &(0..snippets.len()).collect::<Vec<_>>()),
    };

    decompose(channel, snippets.len(), params, |subset, depth| {
        let chosen: Vec<&[f64]> = subset.iter().map(|&i| snippets[i].as_ref()).collect();
        if depth == 0 {
            windowed_correlations(&chosen, &top_template, center)
        } else {
            windowed_correlations(&chosen, &median_of(snippets, subset), center)
        }
    })
}

fn median_of<S: AsRef<[f64]>>(snippets: &[S], subset: &[usize]) -> Vec<f64> {
    let chosen: Vec<Vec<f64>> = subset.iter().map(|&i| snippets[i].as_ref().to_vec()).collect();
    median_of_snippets(&chosen)
}

/// Decompose `n_spikes` spikes given a correlation source.
///
/// `correlate(subset, depth)` returns one correlation per spike of
/// `subset`, in order.
pub fn decompose<F>(
    channel: usize,
    n_spikes: usize,
    params: &AnalyzerParams,
    mut correlate: F,
) -> ChannelVerdict
where
    F: FnMut(&[usize], usize) -> Vec<f64>,
{
    let mut label = None;
    let mut threshold = 0;
    let mut remove: BTreeSet<usize> = BTreeSet::new();
    let mut levels: Vec<BTreeSet<usize>> = Vec::new();
    let mut frames: Vec<(Vec<usize>, usize)> = vec![((0..n_spikes).collect(), 0)];

    while let Some((subset, depth)) = frames.pop() {
        let correlations = correlate(&subset, depth);
        let hist = CorrelationHistogram::new(&correlations, params.bin_size);
        let floor = params.distribution_threshold * subset.len() as f64;

        let (gap, last_var, under_th) = match read_histogram(&hist, floor) {
            Ok(HistogramReading::Shaped {
                gap,
                last_var,
                under_th,
            }) => (gap, last_var, under_th),
            Ok(short_circuit) => {
                debug!(channel, depth, reading = ?short_circuit, "histogram short-circuit");
                if depth == 0 {
                    let label = match short_circuit {
                        HistogramReading::Noise => Label::Noise,
                        _ => Label::Raw,
                    };
                    return ChannelVerdict::unresolved(label);
                }
                continue;
            }
            Err(ambiguity) => {
                let error = CurationError::AmbiguousDistribution {
                    channel,
                    reason: ambiguity.0,
                };
                warn!(channel, depth, %error, "falling back to raw");
                if depth == 0 {
                    return ChannelVerdict::unresolved(Label::Raw);
                }
                continue;
            }
        };

        let below = |edge: f64| -> BTreeSet<usize> {
            subset
                .iter()
                .zip(&correlations)
                .filter(|(_, r)| r.is_finite() && **r < edge)
                .map(|(&i, _)| i)
                .collect()
        };

        let gap_remove = below(hist.edge(gap + 1));
        let (frame_label, poi) = classify(hist.counts(), under_th, last_var, &hist.deriv());
        if depth == 0 {
            label = Some(frame_label);
            threshold = poi;
        }
        debug!(channel, depth, label = %frame_label, poi, spikes = subset.len(), "frame verdict");

        let mut dropped = gap_remove;
        if frame_label == Label::Mua {
            let candidate: BTreeSet<usize> = below(hist.edge(last_var))
                .difference(&dropped)
                .copied()
                .collect();
            if depth > 0 {
                carve(&mut levels[depth - 1], &candidate);
            }
            if params.recursive && candidate.len() > RECURSION_FLOOR_SPIKES {
                frames.push((candidate.iter().copied().collect(), depth + 1));
            }
            if levels.len() <= depth {
                levels.resize_with(depth + 1, BTreeSet::new);
            }
            levels[depth] = candidate;
        } else {
            dropped.extend(below(hist.edge(poi)));
        }

        if depth > 0 {
            carve(&mut levels[depth - 1], &dropped);
        }
        remove.extend(dropped);
    }

    ChannelVerdict {
        label: label.unwrap_or(Label::Raw),
        threshold,
        remove: remove.into_iter().collect(),
        split: levels
            .into_iter()
            .map(|level| level.into_iter().collect())
            .collect(),
    }
}

fn carve(level: &mut BTreeSet<usize>, taken: &BTreeSet<usize>) {
    level.retain(|i| !taken.contains(i));
}
