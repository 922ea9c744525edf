//! Split/merge executor: turns unit verdicts into sorting mutations.
//!
//! | label           | action                                              |
//! |-----------------|-----------------------------------------------------|
//! | clean, raw      | none                                                |
//! | noise           | delete the unit when `remove_noise_units` is set    |
//! | mua             | one multi-way split: good core, children, trash     |
//! | other, removals | two-way split: good core, trash                     |
//!
//! Mutations of one shank/probe group must run on a single thread, one
//! unit after another.

use spyke_core::config::CurationConfig;
use spyke_core::errors::{CurationError, CurationResult};
use spyke_core::models::{ChannelGroup, Label, Unit, UnitId, UnitTable};
use spyke_core::traits::ISortingMutator;
use tracing::{debug, info};

/// What the executor did to one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Execution {
    Untouched,
    Removed,
    Split { children: Vec<UnitId> },
}

/// Tally of one group's execution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupExecution {
    pub units_split: usize,
    pub units_removed: usize,
    pub children_created: usize,
}

/// Group index of every spike: 0 kept, `d + 1` for split level `d`,
/// and one past the last level for removed spikes (`1` outside `mua`).
pub fn index_vector(unit: &Unit) -> CurationResult<Vec<usize>> {
    let mut groups = vec![0usize; unit.spike_count];
    let mut assign = |spike: usize, group: usize| -> CurationResult<()> {
        let slot = groups
            .get_mut(spike)
            .ok_or(CurationError::SpikeIndexOutOfRange {
                unit_id: unit.id,
                spike,
                spike_count: unit.spike_count,
            })?;
        if *slot != 0 && *slot != group {
            return Err(CurationError::SpikeAssignmentConflict {
                unit_id: unit.id,
                spike,
                first: *slot,
                second: group,
            });
        }
        *slot = group;
        Ok(())
    };

    let removed_group = if unit.is_labeled(Label::Mua) {
        for (depth, level) in unit.split.iter().enumerate() {
            for &spike in level {
                assign(spike, depth + 1)?;
            }
        }
        unit.split.len() + 1
    } else {
        1
    };
    for &spike in &unit.remove {
        assign(spike, removed_group)?;
    }
    Ok(groups)
}

/// Apply the verdict of `unit_id` to `sorting` and record the children in `units`.
pub fn execute_unit<S>(
    sorting: &mut S,
    units: &mut UnitTable,
    unit_id: UnitId,
    config: &CurationConfig,
) -> CurationResult<Execution>
where
    S: ISortingMutator + ?Sized,
{
    let unit = units
        .get(unit_id)
        .cloned()
        .ok_or_else(|| CurationError::InvalidUnit {
            unit_id,
            reason: "not in the unit table".to_string(),
        })?;
    let label = unit.label.ok_or_else(|| CurationError::InvalidUnit {
        unit_id,
        reason: "unit has no label".to_string(),
    })?;

    match label {
        Label::Clean | Label::Raw => Ok(Execution::Untouched),
        Label::Noise => {
            if config.effective_remove_noise_units() {
                sorting.remove_unit(unit_id)?;
                units.remove(unit_id);
                debug!(unit_id, "noise unit removed");
                Ok(Execution::Removed)
            } else {
                Ok(Execution::Untouched)
            }
        }
        Label::Mua => split_unit(sorting, units, &unit, unit.split.len() + 2),
        _ if !unit.remove.is_empty() => split_unit(sorting, units, &unit, 2),
        _ => Ok(Execution::Untouched),
    }
}

fn split_unit<S>(
    sorting: &mut S,
    units: &mut UnitTable,
    unit: &Unit,
    n_groups: usize,
) -> CurationResult<Execution>
where
    S: ISortingMutator + ?Sized,
{
    let groups = index_vector(unit)?;
    let new_ids = sorting.allocate_unit_ids(n_groups);
    if new_ids.len() != n_groups {
        return Err(CurationError::InvalidUnit {
            unit_id: unit.id,
            reason: format!("requested {n_groups} unit ids, got {}", new_ids.len()),
        });
    }

    let mut sizes = vec![0usize; n_groups];
    for &g in &groups {
        sizes[g] += 1;
    }

    let created = sorting.split(unit.id, &groups, &new_ids)?;
    units.remove(unit.id);

    let last = n_groups - 1;
    for &child_id in &created {
        let Some(group) = new_ids.iter().position(|&id| id == child_id) else {
            continue;
        };
        let label = match group {
            0 => Label::Good,
            g if g == last => Label::Trash,
            _ => Label::Child,
        };
        units.insert(unit.child(child_id, sizes[group], label));
    }

    debug!(
        unit_id = unit.id,
        children = ?created,
        "unit split"
    );
    Ok(Execution::Split { children: created })
}

/// Execute every unit of `group` in ascending id order.
pub fn execute_group<S>(
    sorting: &mut S,
    units: &mut UnitTable,
    group: ChannelGroup,
    config: &CurationConfig,
) -> CurationResult<GroupExecution>
where
    S: ISortingMutator + ?Sized,
{
    let ids: Vec<UnitId> = units
        .iter()
        .filter(|u| u.channel_group() == group)
        .map(|u| u.id)
        .collect();

    let mut tally = GroupExecution::default();
    for unit_id in ids {
        match execute_unit(sorting, units, unit_id, config)? {
            Execution::Untouched => {}
            Execution::Removed => tally.units_removed += 1,
            Execution::Split { children } => {
                tally.units_split += 1;
                tally.children_created += children.len();
            }
        }
    }

    info!(
        group = %group,
        split = tally.units_split,
        removed = tally.units_removed,
        children = tally.children_created,
        "group executed"
    );
    Ok(tally)
}
