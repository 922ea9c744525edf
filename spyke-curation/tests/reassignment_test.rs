//! Trash reassignment over an in-memory sorting.

use proptest::prelude::*;
use spyke_core::models::{ChannelGroup, Label, Unit, UnitId, UnitTable};
use spyke_curation::reassignment::{choose_destination, reassign_group};
use test_fixtures::synthetic::{self, PEAK};
use test_fixtures::{InMemorySorting, SortedUnit};

const BIN: f64 = 0.05;
const GROUP: ChannelGroup = ChannelGroup { probe: 0, shank: 0 };

fn sorted(channel: synthetic::SyntheticChannel) -> SortedUnit {
    let n = channel.len();
    SortedUnit::new(synthetic::waveforms(&[channel]), synthetic::clean_metrics(n))
}

fn unit(id: UnitId, spikes: usize, label: Label) -> Unit {
    let mut unit = Unit::new(id, spikes, 0, GROUP).with_label(label);
    unit.center = Some(PEAK);
    unit
}

#[test]
fn equal_candidates_resolve_to_the_lowest_id() {
    let mut sorting = InMemorySorting::new(vec![GROUP])
        .with_unit(3, sorted(synthetic::clean(50, 1.0)))
        .with_unit(6, sorted(synthetic::clean(50, 1.0)))
        .with_unit(8, sorted(synthetic::from_histogram(&[(38, 20)], BIN, 1.0)));
    let mut units: UnitTable = [
        unit(3, 50, Label::Good),
        unit(6, 50, Label::Good),
        unit(8, 20, Label::Trash),
    ]
    .into_iter()
    .collect();

    let outcome = reassign_group(&mut sorting, &mut units, GROUP, 0.8).unwrap();

    assert_eq!(outcome.spikes_reassigned, 20);
    assert_eq!(outcome.trash_units_removed, 1);
    assert_eq!(outcome.residual_trash, None);
    assert_eq!(units.get(3).unwrap().spike_count, 70);
    assert_eq!(units.get(6).unwrap().spike_count, 50);
    assert!(!units.contains(8));
    assert_eq!(sorting.spike_count(3), Some(70));
    assert_eq!(sorting.spike_count(8), None);
}

#[test]
fn leftover_trash_is_merged_into_one_unit() {
    let mut sorting = InMemorySorting::new(vec![GROUP])
        .with_unit(1, sorted(synthetic::clean(100, 1.0)))
        .with_unit(2, sorted(synthetic::from_histogram(&[(38, 10), (29, 6)], BIN, 1.0)))
        .with_unit(3, sorted(synthetic::from_histogram(&[(29, 4)], BIN, 1.0)));
    let mut units: UnitTable = [
        unit(1, 100, Label::Good),
        unit(2, 16, Label::Trash),
        unit(3, 4, Label::Trash),
    ]
    .into_iter()
    .collect();

    let outcome = reassign_group(&mut sorting, &mut units, GROUP, 0.8).unwrap();

    assert_eq!(outcome.spikes_reassigned, 10);
    assert_eq!(outcome.trash_units_removed, 0);
    assert_eq!(outcome.residual_trash, Some(4));
    assert_eq!(units.ids(), vec![1, 4]);
    let residual = units.get(4).unwrap();
    assert_eq!(residual.label, Some(Label::Trash));
    assert_eq!(residual.spike_count, 10);
    assert_eq!(sorting.spike_count(1), Some(110));
    assert_eq!(sorting.spike_count(4), Some(10));
}

#[test]
fn group_without_trash_is_untouched() {
    let mut sorting = InMemorySorting::new(vec![GROUP]).with_unit(1, sorted(synthetic::clean(10, 1.0)));
    let mut units: UnitTable = [unit(1, 10, Label::Good)].into_iter().collect();

    let outcome = reassign_group(&mut sorting, &mut units, GROUP, 0.8).unwrap();
    assert_eq!(outcome.spikes_reassigned, 0);
    assert!(sorting.mutations().is_empty());
}

proptest! {
    #[test]
    fn tie_break_ignores_candidate_order(
        scores in Just(vec![(11u32, 0.9), (4, 0.9), (7, 0.9), (2, 0.3), (9, 0.85)]).prop_shuffle(),
    ) {
        prop_assert_eq!(choose_destination(&scores, 0.8), Some(4));
    }

    #[test]
    fn winner_is_never_below_threshold(
        scores in prop::collection::vec((0u32..50, -1.0f64..=1.0), 0..20),
        threshold in -1.0f64..1.0,
    ) {
        if let Some(winner) = choose_destination(&scores, threshold) {
            let best = scores.iter().map(|(_, s)| *s).fold(f64::NEG_INFINITY, f64::max);
            prop_assert!(best > threshold);
            prop_assert!(scores.iter().any(|&(id, s)| id == winner && s == best));
            prop_assert!(scores.iter().all(|&(id, s)| s < best || id >= winner));
        } else {
            prop_assert!(scores.iter().all(|(_, s)| *s <= threshold));
        }
    }
}
