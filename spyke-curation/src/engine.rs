//! CurationEngine: the full curation run over one sorting.
//!
//! Phase 1: amplitude pre-filter → Phase 2: metric classification and
//! per-channel analysis → Phase 3: split/merge execution → Phase 4: trash
//! reassignment. Phases 3 and 4 run group by group; a failing group is
//! reported and the others continue.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use spyke_core::config::SpykeConfig;
use spyke_core::constants::VERSION;
use spyke_core::errors::{CurationError, CurationResult, SortingError};
use spyke_core::models::{ChannelGroup, Label, QualityMetrics, Unit, UnitId, UnitTable};
use spyke_core::traits::{ISortingMutator, ISortingSource};
use tracing::{debug, info, warn};

use crate::aggregator::complete_from_channels;
use crate::analyzer::{analyze_channel, AnalyzerParams};
use crate::classifier::classify_obvious_units;
use crate::executor::{execute_group, GroupExecution};
use crate::prefilter;
use crate::reassignment::{reassign_group, Reassignment};

/// A group whose execution or reassignment failed.
#[derive(Debug)]
pub struct GroupFailure {
    pub group: ChannelGroup,
    pub error: CurationError,
}

/// Result of classifying and analyzing every unit of a sorting.
#[derive(Debug)]
pub struct UnitAnalysis {
    pub units: UnitTable,
    /// First analysis failure of each group; its units are not in `units`.
    pub failures: Vec<GroupFailure>,
}

/// Counters of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CurationStats {
    /// Labels of the final unit table.
    pub label_counts: BTreeMap<Label, usize>,
    pub units_analyzed: usize,
    pub artifacts_removed: usize,
    pub children_created: usize,
    pub units_removed: usize,
    pub spikes_reassigned: usize,
}

/// Outcome of a curation run.
#[derive(Debug)]
pub struct CurationReport {
    pub units: UnitTable,
    pub group_failures: Vec<GroupFailure>,
    pub stats: CurationStats,
}

impl CurationReport {
    pub fn is_complete(&self) -> bool {
        self.group_failures.is_empty()
    }
}

/// The curation engine.
///
/// Holds the resolved configuration and a guard that allows one run at a
/// time.
pub struct CurationEngine {
    config: SpykeConfig,
    is_running: Arc<AtomicBool>,
}

impl CurationEngine {
    pub fn new(config: SpykeConfig) -> Self {
        Self {
            config,
            is_running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn config(&self) -> &SpykeConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::Relaxed)
    }

    /// Curate `sorting` in place and return the final unit table.
    ///
    /// Errors for which [`CurationError::is_run_fatal`] holds abort the run,
    /// as do failures to place a unit in a group and persistence errors.
    /// Any other error while analyzing, executing or reassigning a group is
    /// collected in `group_failures` and the remaining groups continue.
    pub fn run<S>(&self, sorting: &mut S) -> CurationResult<CurationReport>
    where
        S: ISortingSource + ISortingMutator,
    {
        if self
            .is_running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(CurationError::AlreadyRunning);
        }

        let result = self.run_phases(sorting);

        self.is_running.store(false, Ordering::SeqCst);
        result
    }

    fn run_phases<S>(&self, sorting: &mut S) -> CurationResult<CurationReport>
    where
        S: ISortingSource + ISortingMutator,
    {
        let started = Instant::now();
        let curation = &self.config.curation;
        let persistence = &self.config.persistence;
        let mut stats = CurationStats::default();
        info!(version = VERSION, "curation run started");

        // Phase 1: amplitude pre-filter.
        stats.artifacts_removed =
            prefilter::filter_all(sorting, curation.effective_amplitude_threshold())?;
        info!(spikes = stats.artifacts_removed, "Phase 1: amplitude artifacts removed");

        // Phase 2: classification and analysis, or a saved analysis.
        let saved = persistence.units_path.as_deref().filter(|p| p.exists());
        let (mut units, mut group_failures) = match saved {
            Some(path) => {
                let units = UnitTable::load_json(path)?;
                info!(path = %path.display(), units = units.len(), "Phase 2: reusing saved analysis");
                (units, Vec::new())
            }
            None => {
                let analysis = self.analyze_units(sorting)?;
                stats.units_analyzed = analysis.units.len();
                match &persistence.units_path {
                    Some(path) if analysis.failures.is_empty() => analysis.units.save_json(path)?,
                    Some(path) => {
                        warn!(path = %path.display(), "analysis incomplete, not saved");
                    }
                    None => {}
                }
                info!(
                    units = analysis.units.len(),
                    failed_groups = analysis.failures.len(),
                    duration_ms = started.elapsed().as_millis() as u64,
                    "Phase 2: units analyzed"
                );
                (analysis.units, analysis.failures)
            }
        };

        // Phases 3 and 4, one group at a time.
        let failed: BTreeSet<ChannelGroup> = group_failures.iter().map(|f| f.group).collect();
        for group in units.by_group().into_keys() {
            if failed.contains(&group) {
                debug!(group = %group, "skipped after analysis failure");
                continue;
            }
            match self.curate_group(sorting, &mut units, group) {
                Ok((execution, reassignment)) => {
                    stats.children_created += execution.children_created;
                    stats.units_removed += execution.units_removed;
                    stats.spikes_reassigned += reassignment.spikes_reassigned;
                }
                Err(error) if error.is_run_fatal() => return Err(error),
                Err(error) => {
                    warn!(group = %group, %error, "group curation failed");
                    group_failures.push(GroupFailure { group, error });
                }
            }
        }

        if let Some(path) = &persistence.final_units_path {
            units.save_json(path)?;
        }
        stats.label_counts = units.label_counts();
        info!(
            units = units.len(),
            children = stats.children_created,
            reassigned = stats.spikes_reassigned,
            failed_groups = group_failures.len(),
            duration_ms = started.elapsed().as_millis() as u64,
            "curation complete"
        );

        Ok(CurationReport {
            units,
            group_failures,
            stats,
        })
    }

    fn curate_group<S>(
        &self,
        sorting: &mut S,
        units: &mut UnitTable,
        group: ChannelGroup,
    ) -> CurationResult<(GroupExecution, Reassignment)>
    where
        S: ISortingSource + ISortingMutator,
    {
        let curation = &self.config.curation;
        let execution = execute_group(sorting, units, group, curation)?;
        debug!(group = %group, "Phase 3: executed");
        let reassignment =
            reassign_group(sorting, units, group, curation.effective_correlation_threshold())?;
        debug!(group = %group, "Phase 4: trash reassigned");
        Ok((execution, reassignment))
    }

    /// Classify every unit from its metrics and analyze the rest channel by
    /// channel. Reads the sorting only.
    ///
    /// A unit that fails after being placed fails its group; the other
    /// groups are still analyzed.
    pub fn analyze_units<S>(&self, sorting: &S) -> CurationResult<UnitAnalysis>
    where
        S: ISortingSource + ?Sized,
    {
        let ids = sorting.unit_ids();
        let metrics = ids
            .iter()
            .map(|&id| Ok((id, sorting.get_quality_metrics(id)?)))
            .collect::<CurationResult<Vec<(UnitId, QualityMetrics)>>>()?;
        let verdicts = classify_obvious_units(&metrics)?;

        let params = AnalyzerParams::from_config(&self.config.curation);
        let analyze = |id: &UnitId| {
            let obvious = verdicts.get(id).copied().flatten();
            analyze_unit(sorting, *id, obvious, &params)
        };
        let parallel = self.config.curation.effective_parallel();
        let analyzed: Vec<Result<Unit, GroupFailure>> = if parallel {
            ids.par_iter().map(analyze).collect::<CurationResult<_>>()?
        } else {
            ids.iter().map(analyze).collect::<CurationResult<_>>()?
        };

        let mut analyzed_units = Vec::with_capacity(analyzed.len());
        let mut failures: BTreeMap<ChannelGroup, CurationError> = BTreeMap::new();
        let mut failed_units = 0;
        for outcome in analyzed {
            match outcome {
                Ok(unit) => analyzed_units.push(unit),
                Err(failure) if failure.error.is_run_fatal() => return Err(failure.error),
                Err(GroupFailure { group, error }) => {
                    warn!(group = %group, %error, "unit analysis failed");
                    failed_units += 1;
                    failures.entry(group).or_insert(error);
                }
            }
        }

        let table: UnitTable = analyzed_units.into_iter().collect();
        if table.len() + failed_units != ids.len() {
            return Err(CurationError::UnitCountMismatch {
                expected: ids.len(),
                actual: table.len() + failed_units,
            });
        }
        Ok(UnitAnalysis {
            units: table,
            failures: failures
                .into_iter()
                .map(|(group, error)| GroupFailure { group, error })
                .collect(),
        })
    }
}

/// Channel with the largest absolute template extremum; the lowest id on ties.
pub fn main_channel<S>(sorting: &S, unit_id: UnitId) -> CurationResult<usize>
where
    S: ISortingSource + ?Sized,
{
    let mut best: Option<(usize, f64)> = None;
    for channel in sorting.channel_ids() {
        let peak = sorting
            .get_template(unit_id, channel)?
            .iter()
            .fold(0.0_f64, |acc, v| acc.max(v.abs()));
        if best.map_or(true, |(_, b)| peak > b) {
            best = Some((channel, peak));
        }
    }
    best.map(|(channel, _)| channel)
        .ok_or_else(|| CurationError::InvalidUnit {
            unit_id,
            reason: "sorting has no channels".to_string(),
        })
}

/// Place `unit_id` by its main channel, then analyze it. The outer error
/// means the unit could not be placed; the inner one fails its group.
fn analyze_unit<S>(
    sorting: &S,
    unit_id: UnitId,
    obvious: Option<Label>,
    params: &AnalyzerParams,
) -> CurationResult<Result<Unit, GroupFailure>>
where
    S: ISortingSource + ?Sized,
{
    let main_ch = main_channel(sorting, unit_id)?;
    let group = sorting.get_channel_group(main_ch)?;
    Ok(analyze_placed_unit(sorting, unit_id, main_ch, group, obvious, params)
        .map_err(|error| GroupFailure { group, error }))
}

/// Build the `Unit` record of a placed unit: verdict from `obvious` or from
/// per-channel analysis of its group.
fn analyze_placed_unit<S>(
    sorting: &S,
    unit_id: UnitId,
    main_ch: usize,
    group: ChannelGroup,
    obvious: Option<Label>,
    params: &AnalyzerParams,
) -> CurationResult<Unit>
where
    S: ISortingSource + ?Sized,
{
    if let Some(label) = obvious {
        let spike_count = sorting.get_spike_train(unit_id)?.len();
        debug!(unit_id, label = %label, "settled by metrics");
        return Ok(Unit::new(unit_id, spike_count, main_ch, group).with_label(label));
    }

    let waveforms = sorting.get_waveforms(unit_id)?;
    let mut unit = Unit::new(unit_id, waveforms.n_spikes(), main_ch, group);

    let mut channels = Vec::new();
    for channel in sorting.channel_ids() {
        if sorting.get_channel_group(channel)? != group {
            continue;
        }
        if channel >= waveforms.n_channels() {
            return Err(SortingError::UnknownChannel { channel }.into());
        }
        let template = sorting.get_template(unit_id, channel)?;
        let snippets = waveforms.channel_snippets(channel);
        channels.push(analyze_channel(unit_id, channel, &snippets, Some(&template), params));
    }

    complete_from_channels(&mut unit, &channels)?;
    debug!(
        unit_id,
        label = ?unit.label,
        removed = unit.remove.len(),
        split_levels = unit.split.len(),
        "unit analyzed"
    );
    Ok(unit)
}
