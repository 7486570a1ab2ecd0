//! Merged mapping tables binding reports to actions.
//!
//! A table is built once per aircraft bind from up to three ordered
//! layers: device defaults, aircraft base, variant overlay. Later layers
//! override earlier ones on key collision, so the resolution order is
//! deterministic and a key is never ambiguous. Lookup is exact-match and
//! case-sensitive; absence of a match is not an error.

use crate::action::Action;
use crate::report::{ReportKey, ReportKind};
use std::collections::HashMap;

/// One ordered layer of mapping entries.
pub type MappingLayer = Vec<(ReportKey, Action)>;

/// Immutable, pre-merged report→action lookup structure.
///
/// Keyed by kind first so lookups borrow the report name instead of
/// building a composite key on the dispatch path.
#[derive(Debug, Clone, Default)]
pub struct MappingTable {
    entries: HashMap<ReportKind, HashMap<String, Action>>,
}

impl MappingTable {
    /// Merge layers in precedence order: device defaults < aircraft base
    /// < variant overlay.
    pub fn build(
        device_defaults: MappingLayer,
        aircraft_base: MappingLayer,
        variant_overlay: Option<MappingLayer>,
    ) -> Self {
        let mut entries: HashMap<ReportKind, HashMap<String, Action>> = HashMap::new();
        for layer in [
            Some(device_defaults),
            Some(aircraft_base),
            variant_overlay,
        ]
        .into_iter()
        .flatten()
        {
            for (key, action) in layer {
                entries.entry(key.kind).or_default().insert(key.name, action);
            }
        }
        Self { entries }
    }

    /// An empty table; every lookup misses.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Exact-match lookup. `None` is a normal outcome, not an error.
    pub fn lookup(&self, kind: ReportKind, name: &str) -> Option<&Action> {
        self.entries.get(&kind)?.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate all entries, in no particular order.
    pub fn entries(&self) -> impl Iterator<Item = (ReportKind, &str, &Action)> {
        self.entries.iter().flat_map(|(kind, by_name)| {
            by_name
                .iter()
                .map(|(name, action)| (*kind, name.as_str(), action))
        })
    }
}
