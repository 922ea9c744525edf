//! Correlation distribution analyzer.
//!
//! Every spike of a unit is correlated with the unit's template on one
//! channel; the shape of the resulting histogram decides the channel's
//! label and which spikes are removed or split out.

pub mod classify;
pub mod correlation;
pub mod histogram;
pub mod identify;
pub mod window;

use spyke_core::models::{Channel, Label, UnitId};
use tracing::debug;

pub use identify::{decompose, identify, AnalyzerParams, ChannelVerdict};

/// Analyze one (unit, channel) pair and record the verdict as a `Channel`.
///
/// The channel center is the most common per-spike peak sample.
pub fn analyze_channel(
    unit_id: UnitId,
    channel_id: usize,
    snippets: &[Vec<f64>],
    template: Option<&[f64]>,
    params: &AnalyzerParams,
) -> Channel {
    let Some(center) = correlation::spike_center(snippets) else {
        return Channel::new(channel_id, unit_id, 0, Label::Raw);
    };

    let verdict = identify(channel_id, snippets, template, center, params);
    debug!(
        unit_id,
        channel = channel_id,
        label = %verdict.label,
        removed = verdict.remove.len(),
        split_levels = verdict.split.len(),
        "channel analyzed"
    );

    let mut channel = Channel::new(channel_id, unit_id, center, verdict.label);
    channel.threshold = verdict.threshold;
    channel.remove = verdict.remove;
    channel.split = verdict.split;
    channel
}
