//! Dense spike × sample × channel waveform snippets of one unit.

use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, Median};

/// Waveform snippets stored row-major as `[spike][sample][channel]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waveforms {
    n_spikes: usize,
    n_samples: usize,
    n_channels: usize,
    data: Vec<f64>,
}

impl Waveforms {
    /// Wrap a flat buffer. Returns `None` when the length does not match
    /// the declared shape.
    pub fn from_flat(
        n_spikes: usize,
        n_samples: usize,
        n_channels: usize,
        data: Vec<f64>,
    ) -> Option<Self> {
        (data.len() == n_spikes * n_samples * n_channels).then_some(Self {
            n_spikes,
            n_samples,
            n_channels,
            data,
        })
    }

    /// Build from per-channel snippets: `channels[c][spike][sample]`.
    ///
    /// Every channel must hold the same number of spikes and every snippet
    /// the same number of samples.
    pub fn from_channels(channels: &[Vec<Vec<f64>>]) -> Option<Self> {
        let n_channels = channels.len();
        let n_spikes = channels.first().map_or(0, Vec::len);
        let n_samples = channels
            .first()
            .and_then(|c| c.first())
            .map_or(0, Vec::len);
        let consistent = channels.iter().all(|c| {
            c.len() == n_spikes && c.iter().all(|snippet| snippet.len() == n_samples)
        });
        if !consistent {
            return None;
        }

        let mut data = vec![0.0; n_spikes * n_samples * n_channels];
        for (ch, snippets) in channels.iter().enumerate() {
            for (spike, snippet) in snippets.iter().enumerate() {
                for (sample, &value) in snippet.iter().enumerate() {
                    data[(spike * n_samples + sample) * n_channels + ch] = value;
                }
            }
        }
        Some(Self {
            n_spikes,
            n_samples,
            n_channels,
            data,
        })
    }

    pub fn n_spikes(&self) -> usize {
        self.n_spikes
    }

    pub fn n_samples(&self) -> usize {
        self.n_samples
    }

    pub fn n_channels(&self) -> usize {
        self.n_channels
    }

    pub fn get(&self, spike: usize, sample: usize, channel: usize) -> f64 {
        self.data[(spike * self.n_samples + sample) * self.n_channels + channel]
    }

    /// One snippet per spike on `channel`.
    pub fn channel_snippets(&self, channel: usize) -> Vec<Vec<f64>> {
        (0..self.n_spikes)
            .map(|spike| {
                (0..self.n_samples)
                    .map(|sample| self.get(spike, sample, channel))
                    .collect()
            })
            .collect()
    }

    /// Keep only the listed spikes, in the given order.
    pub fn select(&self, spikes: &[usize]) -> Self {
        let stride = self.n_samples * self.n_channels;
        let mut data = Vec::with_capacity(spikes.len() * stride);
        for &spike in spikes {
            data.extend_from_slice(&self.data[spike * stride..(spike + 1) * stride]);
        }
        Self {
            n_spikes: spikes.len(),
            n_samples: self.n_samples,
            n_channels: self.n_channels,
            data,
        }
    }

    /// Per-sample median across spikes on `channel`.
    pub fn median_template(&self, channel: usize) -> Vec<f64> {
        median_of_snippets(&self.channel_snippets(channel))
    }

    /// Peak absolute sample of each spike across all samples and channels.
    pub fn peak_amplitudes(&self) -> Vec<f64> {
        let stride = self.n_samples * self.n_channels;
        (0..self.n_spikes)
            .map(|spike| {
                self.data[spike * stride..(spike + 1) * stride]
                    .iter()
                    .fold(0.0_f64, |acc, v| acc.max(v.abs()))
            })
            .collect()
    }
}

/// Per-sample median of equally long snippets.
pub fn median_of_snippets(snippets: &[Vec<f64>]) -> Vec<f64> {
    let n_samples = snippets.first().map_or(0, Vec::len);
    (0..n_samples)
        .map(|sample| {
            let column: Vec<f64> = snippets.iter().map(|s| s[sample]).collect();
            Data::new(column).median()
        })
        .collect()
}
