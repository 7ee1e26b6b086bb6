//! Facet indexes - inverted maps from facet value to machine names

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use super::extract::MachineRecord;
use super::{Facet, NONE_VALUE};

/// Inverted index for one facet
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetIndex {
    buckets: HashMap<String, Vec<String>>,
}

impl FacetIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a machine to the bucket for `value`
    pub fn insert(&mut self, value: impl Into<String>, machine: impl Into<String>) {
        self.buckets
            .entry(value.into())
            .or_default()
            .push(machine.into());
    }

    /// Machines holding `value`, in first-seen order
    pub fn bucket(&self, value: &str) -> &[String] {
        self.buckets.get(value).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every known value, sorted
    pub fn values(&self) -> BTreeSet<&str> {
        self.buckets.keys().map(String::as_str).collect()
    }

    pub fn buckets(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.buckets
            .iter()
            .map(|(value, names)| (value.as_str(), names.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

/// Build an index from a per-record selector.
///
/// A selector yields the values a record holds; an empty result leaves the
/// record out of the index.
pub fn build_index<'a, I, F, V>(records: I, selector: F) -> FacetIndex
where
    I: IntoIterator<Item = &'a MachineRecord>,
    F: Fn(&'a MachineRecord) -> V,
    V: IntoIterator<Item = String>,
{
    let mut index = FacetIndex::new();
    for record in records {
        for value in selector(record) {
            index.insert(value, record.name.as_str());
        }
    }
    index
}

/// One index per [`Facet`]
#[derive(Debug, Clone, Default)]
pub struct FacetIndexes {
    control_type: FacetIndex,
    buttons: FacetIndex,
    ways: FacetIndex,
    players: FacetIndex,
    status: FacetIndex,
    emulation: FacetIndex,
    savestate: FacetIndex,
    category: FacetIndex,
}

impl FacetIndexes {
    /// Build every facet index from the record collection
    pub fn build(records: &[MachineRecord]) -> Self {
        let indexes = Self {
            control_type: build_index(records, |r| r.control_type.clone()),
            buttons: build_index(records, |r| control_value(r, &r.button_count)),
            ways: build_index(records, |r| control_value(r, &r.ways)),
            players: build_index(records, |r| r.players.clone()),
            status: build_index(records, |r| r.driver.as_ref().map(|d| or_none(&d.status))),
            emulation: build_index(records, |r| {
                r.driver.as_ref().map(|d| or_none(&d.emulation))
            }),
            savestate: build_index(records, |r| {
                r.driver.as_ref().map(|d| or_none(&d.savestate))
            }),
            category: build_index(records, |r| r.categories.clone()),
        };

        tracing::debug!(
            "Built facet indexes: {}",
            Facet::ALL
                .iter()
                .map(|f| format!("{}={}", f, indexes.get(*f).len()))
                .collect::<Vec<_>>()
                .join(", ")
        );

        indexes
    }

    pub fn get(&self, facet: Facet) -> &FacetIndex {
        match facet {
            Facet::ControlType => &self.control_type,
            Facet::Buttons => &self.buttons,
            Facet::Ways => &self.ways,
            Facet::Players => &self.players,
            Facet::Status => &self.status,
            Facet::Emulation => &self.emulation,
            Facet::Savestate => &self.savestate,
            Facet::Category => &self.category,
        }
    }
}

fn or_none(value: &Option<String>) -> String {
    value.clone().unwrap_or_else(|| NONE_VALUE.to_string())
}

// Control derived facets only exist for machines with a usable input block
fn control_value(record: &MachineRecord, value: &Option<String>) -> Option<String> {
    record.control_type.as_ref().map(|_| or_none(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::extract::DriverInfo;
    use crate::core::MIXED_VALUE;

    fn record(name: &str, control_type: Option<&str>, buttons: Option<&str>) -> MachineRecord {
        MachineRecord {
            name: name.to_string(),
            players: Some("1".to_string()),
            control_type: control_type.map(str::to_string),
            button_count: buttons.map(str::to_string),
            driver: Some(DriverInfo {
                emulation: Some("good".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_build_index_groups_by_value() {
        let records = vec![
            record("a", Some("joy"), Some("2")),
            record("b", Some("joy"), Some("3")),
            record("c", Some("dial"), Some("2")),
        ];
        let index = build_index(&records, |r| r.control_type.clone());

        assert_eq!(index.bucket("joy"), ["a", "b"]);
        assert_eq!(index.bucket("dial"), ["c"]);
        assert!(index.bucket("trackball").is_empty());
        assert_eq!(index.values().into_iter().collect::<Vec<_>>(), ["dial", "joy"]);
    }

    #[test]
    fn test_unset_buttons_land_in_none_bucket() {
        let records = vec![
            record("joy2", Some("joy"), Some("2")),
            record("keypad", Some("keypad"), None),
            record("mixed", Some(MIXED_VALUE), None),
            record("noinput", None, None),
        ];
        let indexes = FacetIndexes::build(&records);
        let buttons = indexes.get(Facet::Buttons);

        assert_eq!(buttons.bucket("2"), ["joy2"]);
        assert_eq!(buttons.bucket(NONE_VALUE), ["keypad", "mixed"]);
        assert!(buttons.buckets().all(|(_, names)| !names.contains(&"noinput".to_string())));
    }

    #[test]
    fn test_missing_driver_attributes_are_none_bucket() {
        let mut bare = record("bare", Some("joy"), None);
        bare.driver = Some(DriverInfo::default());
        let mut nodriver = record("nodriver", Some("joy"), None);
        nodriver.driver = None;

        let indexes = FacetIndexes::build(&[bare, nodriver]);
        let emulation = indexes.get(Facet::Emulation);

        assert_eq!(emulation.bucket(NONE_VALUE), ["bare"]);
        assert_eq!(emulation.len(), 1);
    }

    #[test]
    fn test_multi_category_machine_in_each_bucket() {
        let mut shooter = record("shooter", Some("joy"), Some("1"));
        shooter.categories = ["Shooter", "Mature"].iter().map(|c| c.to_string()).collect();

        let indexes = FacetIndexes::build(&[shooter]);
        let category = indexes.get(Facet::Category);

        assert_eq!(category.bucket("Shooter"), ["shooter"]);
        assert_eq!(category.bucket("Mature"), ["shooter"]);
    }
}
