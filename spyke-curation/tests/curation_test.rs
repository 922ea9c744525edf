//! End-to-end curation runs over an in-memory sorting.

use spyke_core::config::{CurationConfig, SpykeConfig};
use spyke_core::errors::{CurationError, SortingError};
use spyke_core::models::{ChannelGroup, Label, QualityMetrics, UnitTable, Waveforms};
use spyke_core::traits::ISortingSource;
use spyke_curation::prefilter::remove_amplitude_artifacts;
use spyke_curation::CurationEngine;
use test_fixtures::synthetic::{self, SyntheticChannel};
use test_fixtures::{InMemorySorting, Mutation, SortedUnit};

const BIN: f64 = 0.05;

/// Channels 0 and 1 sit on shank 0, channels 2 and 3 on shank 1.
fn groups() -> Vec<ChannelGroup> {
    vec![
        ChannelGroup::new(0, 0),
        ChannelGroup::new(0, 0),
        ChannelGroup::new(0, 1),
        ChannelGroup::new(0, 1),
    ]
}

/// Unit 1: 5000 spikes, unimodal on channel 0 (largest), troughed on
/// channel 1. Unit 2: clean, main channel 2. Unit 3: too few spikes,
/// main channel 3.
fn scenario() -> InMemorySorting {
    let unit_1 = synthetic::waveforms(&[
        synthetic::from_histogram(&synthetic::unimodal_counts(), BIN, 2.0),
        synthetic::from_histogram(&synthetic::troughed_counts(), BIN, 1.0),
        synthetic::clean(5000, 0.5),
        synthetic::clean(5000, 0.5),
    ]);
    let unit_2 = synthetic::waveforms(&[
        synthetic::clean(200, 0.5),
        synthetic::clean(200, 0.5),
        synthetic::clean(200, 2.0),
        synthetic::clean(200, 0.5),
    ]);
    let unit_3 = synthetic::waveforms(&[
        synthetic::clean(100, 0.5),
        synthetic::clean(100, 0.5),
        synthetic::clean(100, 0.5),
        synthetic::clean(100, 2.0),
    ]);

    InMemorySorting::new(groups())
        .with_unit(1, SortedUnit::new(unit_1, synthetic::analyzable_metrics(5000)))
        .with_unit(2, SortedUnit::new(unit_2, synthetic::clean_metrics(200)))
        .with_unit(
            3,
            SortedUnit::new(unit_3, QualityMetrics::complete(100.0, 0.95, 5.0, 0.01, 2.0)),
        )
}

fn config(correlation_threshold: f64) -> SpykeConfig {
    SpykeConfig {
        curation: CurationConfig {
            bin_size: Some(BIN),
            correlation_threshold: Some(correlation_threshold),
            ..Default::default()
        },
        ..Default::default()
    }
}

#[test]
fn analysis_labels_every_unit() {
    let engine = CurationEngine::new(config(0.8));
    let analysis = engine.analyze_units(&scenario()).unwrap();
    assert!(analysis.failures.is_empty());
    let units = analysis.units;

    let unit = units.get(1).unwrap();
    assert_eq!(unit.main_ch, 0);
    assert_eq!(unit.channel_group(), ChannelGroup::new(0, 0));
    assert_eq!(unit.label, Some(Label::Good));
    assert_eq!(unit.remove, (0..1200).collect::<Vec<_>>());
    assert!(unit.split.is_empty());
    assert_eq!(unit.center, Some(synthetic::PEAK));

    assert_eq!(units.get(2).unwrap().label, Some(Label::Clean));
    assert_eq!(units.get(2).unwrap().main_ch, 2);
    assert_eq!(units.get(3).unwrap().label, Some(Label::Raw));
    assert_eq!(units.get(3).unwrap().channel_group(), ChannelGroup::new(0, 1));
}

#[test]
fn sequential_analysis_matches_parallel() {
    let mut sequential = config(0.8);
    sequential.curation.parallel = Some(false);
    let sorting = scenario();

    let a = CurationEngine::new(config(0.8)).analyze_units(&sorting).unwrap().units;
    let b = CurationEngine::new(sequential).analyze_units(&sorting).unwrap().units;
    assert_eq!(a, b);
}

#[test]
fn tail_spikes_stay_trash_under_a_strict_threshold() {
    let mut sorting = scenario();
    let report = CurationEngine::new(config(0.95)).run(&mut sorting).unwrap();
    assert!(report.is_complete());

    // unit 1 is retired; good core 4 and trash 5 replace it
    assert!(!report.units.contains(1));
    let good = report.units.get(4).unwrap();
    let trash = report.units.get(5).unwrap();
    assert_eq!((good.label, good.spike_count), (Some(Label::Good), 3800));
    assert_eq!((trash.label, trash.spike_count), (Some(Label::Trash), 1200));
    assert_eq!(good.mother, Some(1));
    assert_eq!(trash.main_ch, 0);

    assert_eq!(sorting.spike_count(4), Some(3800));
    assert_eq!(sorting.spike_count(5), Some(1200));
    assert_eq!(report.stats.children_created, 2);
    assert_eq!(report.stats.spikes_reassigned, 0);
}

#[test]
fn tail_spikes_return_to_the_good_core() {
    let mut sorting = scenario();
    let report = CurationEngine::new(config(0.8)).run(&mut sorting).unwrap();
    assert!(report.is_complete());

    assert_eq!(report.units.ids(), vec![2, 3, 4]);
    assert_eq!(report.units.get(4).unwrap().spike_count, 5000);
    assert_eq!(sorting.spike_count(4), Some(5000));
    assert_eq!(sorting.spike_count(5), None);
    assert_eq!(report.stats.spikes_reassigned, 1200);
    assert_eq!(report.stats.label_counts[&Label::Good], 1);

    assert_eq!(
        sorting.mutations(),
        &[
            Mutation::Split {
                unit_id: 1,
                created: vec![4, 5]
            },
            Mutation::Split {
                unit_id: 5,
                created: vec![6]
            },
            Mutation::Merge {
                unit_ids: vec![4, 6],
                new_id: 4
            },
        ]
    );
}

#[test]
fn noise_units_are_removed_when_configured() {
    let noisy_metrics = QualityMetrics::complete(5000.0, 0.95, 5.0, 0.01, 900.0);
    let mut sorting = scenario().with_unit(
        7,
        SortedUnit::new(
            synthetic::waveforms(&[
                synthetic::clean(10, 0.5),
                synthetic::clean(10, 0.5),
                synthetic::clean(10, 1.0),
                synthetic::clean(10, 0.5),
            ]),
            noisy_metrics,
        ),
    );
    let mut config = config(0.95);
    config.curation.remove_noise_units = Some(true);

    let report = CurationEngine::new(config).run(&mut sorting).unwrap();
    assert!(!report.units.contains(7));
    assert_eq!(sorting.spike_count(7), None);
    assert_eq!(report.stats.units_removed, 1);
}

#[test]
fn analysis_and_final_tables_are_persisted() {
    let dir = tempfile::TempDir::new().unwrap();
    let mut config = config(0.8);
    config.persistence.units_path = Some(dir.path().join("analysis/units.json"));
    config.persistence.final_units_path = Some(dir.path().join("final.json"));

    let first = CurationEngine::new(config.clone()).run(&mut scenario()).unwrap();
    assert_eq!(first.stats.units_analyzed, 3);
    let saved = UnitTable::load_json(&dir.path().join("analysis/units.json")).unwrap();
    assert_eq!(saved.get(1).unwrap().remove.len(), 1200);
    let written = UnitTable::load_json(&dir.path().join("final.json")).unwrap();
    assert_eq!(written, first.units);

    // a second run reuses the saved analysis
    let second = CurationEngine::new(config).run(&mut scenario()).unwrap();
    assert_eq!(second.stats.units_analyzed, 0);
    assert_eq!(second.units, first.units);
}

#[test]
fn missing_metric_aborts_the_run() {
    let mut metrics = synthetic::analyzable_metrics(10);
    metrics.presence_ratio = None;
    let mut sorting = scenario().with_unit(
        9,
        SortedUnit::new(
            synthetic::waveforms(&[
                synthetic::clean(10, 1.0),
                synthetic::clean(10, 1.0),
                synthetic::clean(10, 1.0),
                synthetic::clean(10, 1.0),
            ]),
            metrics,
        ),
    );

    let engine = CurationEngine::new(config(0.8));
    let err = engine.run(&mut sorting).unwrap_err();
    assert!(matches!(err, CurationError::MissingMetric { unit_id: 9, .. }));
    assert!(!engine.is_running());
    assert!(sorting.mutations().is_empty());
}

#[test]
fn waveform_failure_only_fails_its_own_shank() {
    let unit_9 = synthetic::waveforms(&[
        synthetic::clean(3000, 0.5),
        synthetic::clean(3000, 0.5),
        synthetic::clean(3000, 2.0),
        synthetic::clean(3000, 0.5),
    ]);
    let mut sorting = scenario()
        .with_unit(9, SortedUnit::new(unit_9, synthetic::analyzable_metrics(3000)))
        .with_unavailable_waveforms(9);

    let report = CurationEngine::new(config(0.8)).run(&mut sorting).unwrap();

    assert!(!report.is_complete());
    assert_eq!(report.group_failures.len(), 1);
    let failure = &report.group_failures[0];
    assert_eq!(failure.group, ChannelGroup::new(0, 1));
    assert!(matches!(
        failure.error,
        CurationError::Sorting(SortingError::WaveformUnavailable { unit_id: 9, .. })
    ));

    // shank 0 is still curated: unit 1 becomes good core 10 with its tail back
    assert!(!report.units.contains(1));
    assert_eq!(report.units.get(10).unwrap().spike_count, 5000);
    assert_eq!(sorting.spike_count(10), Some(5000));
    assert_eq!(report.stats.spikes_reassigned, 1200);

    // shank 1 is left as analyzed
    assert!(!report.units.contains(9));
    assert_eq!(sorting.spike_count(9), Some(3000));
    assert_eq!(report.units.get(2).unwrap().label, Some(Label::Clean));
}

#[test]
fn incomplete_analysis_is_not_saved() {
    let dir = tempfile::TempDir::new().unwrap();
    let mut config = config(0.8);
    config.persistence.units_path = Some(dir.path().join("units.json"));
    let unit_9 = synthetic::waveforms(&[
        synthetic::clean(3000, 0.5),
        synthetic::clean(3000, 0.5),
        synthetic::clean(3000, 2.0),
        synthetic::clean(3000, 0.5),
    ]);
    let mut sorting = scenario()
        .with_unit(9, SortedUnit::new(unit_9, synthetic::analyzable_metrics(3000)))
        .with_unavailable_waveforms(9);

    let report = CurationEngine::new(config).run(&mut sorting).unwrap();
    assert_eq!(report.group_failures.len(), 1);
    assert!(!dir.path().join("units.json").exists());
}

fn artifact_unit() -> SortedUnit {
    let mut spikes = SyntheticChannel {
        snippets: vec![synthetic::template(); 6],
        correlations: vec![1.0; 6],
    };
    spikes.snippets[1][synthetic::PEAK] = -9000.0;
    spikes.snippets[4][synthetic::PEAK] = 7000.0;
    let waveforms: Waveforms = synthetic::waveforms(&[spikes]);
    SortedUnit::new(waveforms, synthetic::clean_metrics(6))
}

#[test]
fn prefilter_drops_artifact_spikes_and_keeps_the_id() {
    let mut sorting = InMemorySorting::new(vec![ChannelGroup::default()]).with_unit(3, artifact_unit());

    let removed = remove_amplitude_artifacts(&mut sorting, 3, 5000.0).unwrap();
    assert_eq!(removed, 2);
    assert_eq!(sorting.spike_count(3), Some(4));
    assert_eq!(sorting.unit(3).unwrap().spike_train, vec![0, 2, 3, 5]);
    assert_eq!(sorting.unit_ids(), vec![3]);
}

#[test]
fn prefilter_is_a_no_op_below_threshold() {
    let mut sorting = InMemorySorting::new(vec![ChannelGroup::default()]).with_unit(3, artifact_unit());
    assert_eq!(remove_amplitude_artifacts(&mut sorting, 3, 10_000.0).unwrap(), 0);
    assert!(sorting.mutations().is_empty());
}
