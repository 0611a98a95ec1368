//! Result organization: distance sort and locality grouping.
//!
//! Entries are stably sorted by ascending distance, then grouped in a single
//! pass. Groups appear in order of their first entry and keep the sorted
//! relative order of their entries.

use std::collections::HashMap;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::HeatmapEntry;

/// Stable ascending sort by distance. Ties keep cluster discovery order.
pub fn sort_by_distance(entries: &mut [HeatmapEntry]) {
    entries.sort_by(|a, b| a.distance.total_cmp(&b.distance));
}

/// Entries sharing one locality label.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocalityGroup {
    pub locality: String,
    pub entries: Vec<HeatmapEntry>,
    /// Position of each entry in the sorted sequence the group was built from
    positions: Vec<usize>,
}

impl LocalityGroup {
    pub fn positions(&self) -> &[usize] {
        &self.positions
    }
}

/// Mapping from locality to its entries, with a deterministic key order.
///
/// Serializes as a JSON object `{locality: [entry, ...]}`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocalityGroups {
    groups: Vec<LocalityGroup>,
}

impl LocalityGroups {
    /// Group an already distance-sorted sequence without reordering it.
    pub fn from_sorted(entries: Vec<HeatmapEntry>) -> Self {
        let mut groups: Vec<LocalityGroup> = Vec::new();
        let mut slot: HashMap<String, usize> = HashMap::new();

        for (position, entry) in entries.into_iter().enumerate() {
            let idx = *slot.entry(entry.locality.clone()).or_insert_with(|| {
                groups.push(LocalityGroup {
                    locality: entry.locality.clone(),
                    ..Default::default()
                });
                groups.len() - 1
            });
            groups[idx].entries.push(entry);
            groups[idx].positions.push(position);
        }

        Self { groups }
    }

    pub fn get(&self, locality: &str) -> Option<&[HeatmapEntry]> {
        self.groups
            .iter()
            .find(|g| g.locality == locality)
            .map(|g| g.entries.as_slice())
    }

    pub fn localities(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|g| g.locality.as_str())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LocalityGroup> {
        self.groups.iter()
    }

    /// Number of distinct localities.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total number of entries across all groups.
    pub fn entry_count(&self) -> usize {
        self.groups.iter().map(|g| g.entries.len()).sum()
    }

    /// Entries back in the global distance order they were grouped from.
    pub fn flatten(&self) -> Vec<&HeatmapEntry> {
        let mut indexed: Vec<(usize, &HeatmapEntry)> = self
            .groups
            .iter()
            .flat_map(|g| g.positions.iter().copied().zip(g.entries.iter()))
            .collect();
        indexed.sort_by_key(|(position, _)| *position);
        indexed.into_iter().map(|(_, e)| e).collect()
    }
}

impl<'a> IntoIterator for &'a LocalityGroups {
    type Item = &'a LocalityGroup;
    type IntoIter = std::slice::Iter<'a, LocalityGroup>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.iter()
    }
}

impl Serialize for LocalityGroups {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.groups.len()))?;
        for group in &self.groups {
            map.serialize_entry(&group.locality, &group.entries)?;
        }
        map.end()
    }
}

/// Sort entries by distance and group them by locality.
pub fn organize(mut entries: Vec<HeatmapEntry>) -> LocalityGroups {
    sort_by_distance(&mut entries);
    LocalityGroups::from_sorted(entries)
}
