//! Unit/channel aggregation: one unit-level verdict from per-channel ones.

use std::collections::BTreeSet;

use rustc_hash::FxHashMap;
use spyke_core::errors::{CurationError, CurationResult};
use spyke_core::models::{Channel, Label, Unit};

/// Fold the channel verdicts of `unit` into its label, `remove`, `split`,
/// and `center`.
///
/// If any channel is `mua`, the unit is `mua`: split levels are unioned
/// depth by depth, the innermost level owns a spike claimed by several
/// levels, and split wins over remove. Otherwise the main channel decides
/// the label and remove wins over split.
pub fn complete_from_channels(unit: &mut Unit, channels: &[Channel]) -> CurationResult<()> {
    if channels.is_empty() {
        return Err(CurationError::InvalidUnit {
            unit_id: unit.id,
            reason: "no analyzed channels".to_string(),
        });
    }

    let remove: BTreeSet<usize> = channels
        .iter()
        .flat_map(|c| c.remove.iter().copied())
        .collect();

    if channels.iter().any(|c| c.label == Label::Mua) {
        let depth = channels.iter().map(|c| c.split.len()).max().unwrap_or(0);
        let mut levels: Vec<BTreeSet<usize>> = (0..depth)
            .map(|d| {
                channels
                    .iter()
                    .filter_map(|c| c.split.get(d))
                    .flatten()
                    .copied()
                    .collect()
            })
            .collect();

        let mut deeper: BTreeSet<usize> = BTreeSet::new();
        for level in levels.iter_mut().rev() {
            level.retain(|i| !deeper.contains(i));
            deeper.extend(level.iter().copied());
        }

        unit.label = Some(Label::Mua);
        unit.remove = remove.difference(&deeper).copied().collect();
        unit.split = levels
            .into_iter()
            .map(|level| level.into_iter().collect())
            .collect();
    } else {
        let main = channels
            .iter()
            .find(|c| c.id == unit.main_ch)
            .ok_or_else(|| CurationError::InvalidUnit {
                unit_id: unit.id,
                reason: format!("main channel {} was not analyzed", unit.main_ch),
            })?;

        let split: Vec<usize> = channels
            .iter()
            .flat_map(|c| c.split.iter().flatten().copied())
            .collect::<BTreeSet<usize>>()
            .difference(&remove)
            .copied()
            .collect();

        unit.label = Some(main.label);
        unit.remove = remove.into_iter().collect();
        unit.split = if split.is_empty() { Vec::new() } else { vec![split] };
    }

    unit.center = majority_center(channels);
    Ok(())
}

/// Most common channel center; ties go to the one seen first.
fn majority_center(channels: &[Channel]) -> Option<usize> {
    let mut votes: FxHashMap<usize, (usize, usize)> = FxHashMap::default();
    for (order, channel) in channels.iter().enumerate() {
        votes.entry(channel.center).or_insert((0, order)).0 += 1;
    }
    votes
        .into_iter()
        .max_by(|a, b| a.1 .0.cmp(&b.1 .0).then(b.1 .1.cmp(&a.1 .1)))
        .map(|(center, _)| center)
}
