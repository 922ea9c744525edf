//! Serializable table of curated units handed to downstream exporters.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{ChannelGroup, Label, Unit, UnitId};
use crate::errors::{CurationError, CurationResult};

/// Units keyed by id, iterated in ascending id order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitTable {
    units: BTreeMap<UnitId, Unit>,
}

impl UnitTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, unit: Unit) -> Option<Unit> {
        self.units.insert(unit.id, unit)
    }

    pub fn get(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(&id)
    }

    pub fn get_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.units.get_mut(&id)
    }

    pub fn remove(&mut self, id: UnitId) -> Option<Unit> {
        self.units.remove(&id)
    }

    pub fn contains(&self, id: UnitId) -> bool {
        self.units.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn ids(&self) -> Vec<UnitId> {
        self.units.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Unit> {
        self.units.values()
    }

    /// Unit ids per shank/probe group, each list in ascending id order.
    pub fn by_group(&self) -> BTreeMap<ChannelGroup, Vec<UnitId>> {
        let mut groups: BTreeMap<ChannelGroup, Vec<UnitId>> = BTreeMap::new();
        for unit in self.units.values() {
            groups.entry(unit.channel_group()).or_default().push(unit.id);
        }
        groups
    }

    /// Ids of the units in `group` carrying `label`.
    pub fn ids_with_label(&self, group: ChannelGroup, label: Label) -> Vec<UnitId> {
        self.units
            .values()
            .filter(|u| u.channel_group() == group && u.is_labeled(label))
            .map(|u| u.id)
            .collect()
    }

    /// Number of units per label; unlabeled units are not counted.
    pub fn label_counts(&self) -> BTreeMap<Label, usize> {
        let mut counts = BTreeMap::new();
        for label in self.units.values().filter_map(|u| u.label) {
            *counts.entry(label).or_insert(0) += 1;
        }
        counts
    }

    /// Write the table as pretty JSON.
    pub fn save_json(&self, path: &Path) -> CurationResult<()> {
        let persistence_error = |message: String| CurationError::Persistence {
            path: path.display().to_string(),
            message,
        };
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| persistence_error(e.to_string()))?;
            }
        }
        let json =
            serde_json::to_string_pretty(self).map_err(|e| persistence_error(e.to_string()))?;
        std::fs::write(path, json).map_err(|e| persistence_error(e.to_string()))
    }

    /// Read a table written by `save_json`.
    pub fn load_json(path: &Path) -> CurationResult<Self> {
        let persistence_error = |message: String| CurationError::Persistence {
            path: path.display().to_string(),
            message,
        };
        let content = std::fs::read_to_string(path).map_err(|e| persistence_error(e.to_string()))?;
        serde_json::from_str(&content).map_err(|e| persistence_error(e.to_string()))
    }
}

impl FromIterator<Unit> for UnitTable {
    fn from_iter<I: IntoIterator<Item = Unit>>(iter: I) -> Self {
        Self {
            units: iter.into_iter().map(|u| (u.id, u)).collect(),
        }
    }
}
