//! Filter engine - narrows a candidate set by subtracting excluded buckets

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::index::{FacetIndex, FacetIndexes};
use super::{Facet, NONE_VALUE};

/// Machine names surviving the active filters, sorted
pub type CandidateSet = BTreeSet<String>;

/// Narrow `candidates` by subtracting every bucket whose value is not included.
///
/// An empty `included` set means "no opinion" and returns `candidates`
/// unchanged. A machine listed under several values (categories) is removed
/// as soon as one of them is excluded. Machines absent from the index are
/// never removed.
pub fn filter(
    index: &FacetIndex,
    included: &BTreeSet<String>,
    mut candidates: CandidateSet,
) -> CandidateSet {
    if included.is_empty() {
        return candidates;
    }

    for (value, names) in index.buckets() {
        if included.contains(value) {
            continue;
        }
        for name in names {
            candidates.remove(name);
        }
    }

    candidates
}

/// Included button-count values for a "at most `max` buttons" filter.
///
/// `"None"` is always included so machines without buttons survive.
pub fn button_range(max: u32) -> BTreeSet<String> {
    (0..=max)
        .map(|n| n.to_string())
        .chain(std::iter::once(NONE_VALUE.to_string()))
        .collect()
}

/// Active per-facet selections
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSelection {
    /// Drop every clone from the candidates
    pub exclude_clones: bool,
    /// Range filter on the button facet; overrides explicit button values
    pub max_buttons: Option<u32>,
    /// Included values per facet, a missing or empty entry includes everything
    pub include: BTreeMap<Facet, BTreeSet<String>>,
}

impl FilterSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the included values for a facet
    pub fn set_included<I, S>(&mut self, facet: Facet, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: BTreeSet<String> = values.into_iter().map(Into::into).collect();
        if values.is_empty() {
            self.include.remove(&facet);
        } else {
            self.include.insert(facet, values);
        }
    }

    pub fn with_included<I, S>(mut self, facet: Facet, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set_included(facet, values);
        self
    }

    /// Values the engine will actually include for `facet`
    pub fn effective(&self, facet: Facet) -> Option<Cow<'_, BTreeSet<String>>> {
        if facet == Facet::Buttons {
            if let Some(max) = self.max_buttons {
                return Some(Cow::Owned(button_range(max)));
            }
        }
        self.include.get(&facet).map(Cow::Borrowed)
    }

    /// Whether no facet narrows anything
    pub fn is_inclusive(&self) -> bool {
        !self.exclude_clones
            && self.max_buttons.is_none()
            && self.include.values().all(BTreeSet::is_empty)
    }

    /// Recompute the candidate set from scratch over `universe`
    pub fn apply(
        &self,
        indexes: &FacetIndexes,
        clones: &BTreeSet<String>,
        universe: &CandidateSet,
    ) -> CandidateSet {
        let mut candidates = if self.exclude_clones {
            universe.difference(clones).cloned().collect()
        } else {
            universe.clone()
        };

        for facet in Facet::ALL {
            if let Some(included) = self.effective(facet) {
                candidates = filter(indexes.get(facet), &included, candidates);
            }
        }

        tracing::debug!("{} of {} machines selected", candidates.len(), universe.len());
        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::index::build_index;
    use crate::core::MachineRecord;
    use proptest::prelude::*;

    fn names(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn index(pairs: &[(&str, &str)]) -> FacetIndex {
        let mut index = FacetIndex::new();
        for (value, name) in pairs {
            index.insert(*value, *name);
        }
        index
    }

    #[test]
    fn test_empty_selection_is_noop() {
        let idx = index(&[("joy", "a"), ("dial", "b")]);
        let candidates = names(&["a", "b", "c"]);
        assert_eq!(filter(&idx, &BTreeSet::new(), candidates.clone()), candidates);
    }

    #[test]
    fn test_excluded_values_are_subtracted() {
        let idx = index(&[("joy", "a"), ("dial", "b"), ("joy", "c")]);
        let result = filter(&idx, &names(&["joy"]), names(&["a", "b", "c"]));
        assert_eq!(result, names(&["a", "c"]));
    }

    #[test]
    fn test_unindexed_machines_survive() {
        let idx = index(&[("joy", "a"), ("dial", "b")]);
        let result = filter(&idx, &names(&["joy"]), names(&["a", "b", "noinput"]));
        assert_eq!(result, names(&["a", "noinput"]));
    }

    #[test]
    fn test_excluding_any_bucket_drops_multi_bucket_machine() {
        let idx = index(&[
            ("Platform", "plat"),
            ("Platform", "platmature"),
            ("Mature", "platmature"),
        ]);
        let all = names(&["plat", "platmature"]);

        // Unticking Mature drops the machine even though Platform stays ticked
        let result = filter(&idx, &names(&["Platform"]), all.clone());
        assert_eq!(result, names(&["plat"]));

        let result = filter(&idx, &names(&["Platform", "Mature"]), all.clone());
        assert_eq!(result, all);

        let result = filter(&idx, &names(&["Mature"]), all);
        assert!(result.is_empty());
    }

    #[test]
    fn test_button_range_includes_none() {
        assert_eq!(button_range(2), names(&["0", "1", "2", "None"]));
        assert_eq!(button_range(0), names(&["0", "None"]));
    }

    #[test]
    fn test_max_buttons_overrides_explicit_values() {
        let selection = FilterSelection {
            max_buttons: Some(1),
            ..Default::default()
        }
        .with_included(Facet::Buttons, ["6"]);

        assert_eq!(
            selection.effective(Facet::Buttons).unwrap().as_ref(),
            &button_range(1)
        );
        assert!(selection.effective(Facet::Ways).is_none());
    }

    #[test]
    fn test_set_included_empty_clears_facet() {
        let mut selection = FilterSelection::new().with_included(Facet::Players, ["1"]);
        assert!(!selection.is_inclusive());
        selection.set_included(Facet::Players, Vec::<String>::new());
        assert!(selection.is_inclusive());
    }

    #[test]
    fn test_apply_excludes_clones_and_ranges_buttons() {
        let records: Vec<MachineRecord> = [
            ("sf2", Some("6"), None),
            ("sf2ce", Some("6"), Some("sf2")),
            ("pacman", Some("0"), None),
            ("tetris", None, None),
        ]
        .into_iter()
        .map(|(name, buttons, parent)| MachineRecord {
            name: name.to_string(),
            clone_of: parent.map(str::to_string),
            control_type: Some("joy".to_string()),
            button_count: buttons.map(str::to_string),
            ..Default::default()
        })
        .collect();

        let indexes = FacetIndexes::build(&records);
        let universe: CandidateSet = records.iter().map(|r| r.name.clone()).collect();
        let clones = names(&["sf2ce"]);

        let selection = FilterSelection {
            exclude_clones: true,
            max_buttons: Some(2),
            ..Default::default()
        };

        assert_eq!(
            selection.apply(&indexes, &clones, &universe),
            names(&["pacman", "tetris"])
        );
        assert_eq!(
            FilterSelection::new().apply(&indexes, &clones, &universe),
            universe
        );
    }

    fn arb_index() -> impl Strategy<Value = (FacetIndex, CandidateSet)> {
        prop::collection::vec((0u8..5, 0u8..20), 0..40).prop_map(|pairs| {
            let records: Vec<MachineRecord> = pairs
                .iter()
                .map(|(value, machine)| MachineRecord {
                    name: format!("m{}", machine),
                    control_type: Some(format!("v{}", value)),
                    ..Default::default()
                })
                .collect();
            let index = build_index(&records, |r| r.control_type.clone());
            let universe = (0u8..20).map(|m| format!("m{}", m)).collect();
            (index, universe)
        })
    }

    fn arb_values() -> impl Strategy<Value = BTreeSet<String>> {
        prop::collection::btree_set((0u8..6).prop_map(|v| format!("v{}", v)), 0..6)
    }

    proptest! {
        #[test]
        fn prop_fully_inclusive_is_noop((idx, universe) in arb_index()) {
            let all: BTreeSet<String> = idx.values().into_iter().map(str::to_string).collect();
            prop_assert_eq!(filter(&idx, &all, universe.clone()), universe);
        }

        #[test]
        fn prop_filter_only_narrows((idx, universe) in arb_index(), included in arb_values()) {
            let result = filter(&idx, &included, universe.clone());
            prop_assert!(result.is_subset(&universe));
        }

        #[test]
        fn prop_filter_is_idempotent((idx, universe) in arb_index(), included in arb_values()) {
            let once = filter(&idx, &included, universe);
            let twice = filter(&idx, &included, once.clone());
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_facet_order_is_irrelevant(
            (a, universe) in arb_index(),
            (b, _) in arb_index(),
            sa in arb_values(),
            sb in arb_values(),
        ) {
            let ab = filter(&b, &sb, filter(&a, &sa, universe.clone()));
            let ba = filter(&a, &sa, filter(&b, &sb, universe));
            prop_assert_eq!(ab, ba);
        }
    }
}
