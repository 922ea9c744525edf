//! Tests for the unit table and quality metrics.

use spyke_core::models::{ChannelGroup, Label, QualityMetrics, Unit, UnitTable};
use spyke_core::CurationError;

fn table() -> UnitTable {
    let a = ChannelGroup::new(0, 0);
    let b = ChannelGroup::new(0, 1);
    [
        Unit::new(3, 5000, 1, a).with_label(Label::Good),
        Unit::new(1, 100, 0, a).with_label(Label::Raw),
        Unit::new(8, 4000, 5, b).with_label(Label::Trash),
        Unit::new(5, 7000, 2, a).with_label(Label::Trash),
    ]
    .into_iter()
    .collect()
}

#[test]
fn test_units_group_by_shank_in_id_order() {
    let groups = table().by_group();
    assert_eq!(groups[&ChannelGroup::new(0, 0)], vec![1, 3, 5]);
    assert_eq!(groups[&ChannelGroup::new(0, 1)], vec![8]);
}

#[test]
fn test_ids_with_label_stay_in_group() {
    let units = table();
    assert_eq!(units.ids_with_label(ChannelGroup::new(0, 0), Label::Trash), vec![5]);
    assert_eq!(units.label_counts()[&Label::Trash], 2);
}

#[test]
fn test_json_round_trip_through_disk() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("nested").join("units.json");

    let mut units = table();
    let unit = units.get_mut(3).unwrap();
    unit.remove = vec![4, 9];
    unit.split = vec![vec![1, 2]];
    unit.center = Some(20);

    units.save_json(&path).unwrap();
    let loaded = UnitTable::load_json(&path).unwrap();
    assert_eq!(units, loaded);

    let raw = std::fs::read_to_string(&path).unwrap();
    assert!(raw.contains("\"trash\""));
}

#[test]
fn test_load_missing_file_is_persistence_error() {
    let dir = tempfile::TempDir::new().unwrap();
    let err = UnitTable::load_json(&dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, CurationError::Persistence { .. }));
}

#[test]
fn test_require_reports_first_missing_metric() {
    let metrics = QualityMetrics {
        spike_count: Some(4000.0),
        presence_ratio: Some(0.9),
        firing_rate: None,
        amplitude_cutoff: Some(f64::NAN),
        refractory_violation_count: Some(3.0),
    };
    match metrics.require(42) {
        Err(CurationError::MissingMetric { unit_id, metric }) => {
            assert_eq!(unit_id, 42);
            assert_eq!(metric, "firing_rate");
        }
        other => panic!("expected MissingMetric, got {other:?}"),
    }
}

#[test]
fn test_nan_amplitude_cutoff_is_not_missing() {
    let row = QualityMetrics::complete(4000.0, 0.9, 2.0, f64::NAN, 40.0)
        .require(1)
        .unwrap();
    assert!(row.amplitude_cutoff.is_nan());
    assert!((row.false_discovery_ratio() - 0.01).abs() < 1e-12);
}
