// Merges the built-in catalog with user overrides into one host mapping

use crate::model::ReferrerDefinition;
use std::collections::BTreeMap;
use tracing::debug;

/// Host -> definition mapping. Later sources win by host.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferrerMap {
    entries: BTreeMap<String, ReferrerDefinition>,
}

impl ReferrerMap {
    pub fn get(&self, host: &str) -> Option<&ReferrerDefinition> {
        self.entries.get(host)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hosts(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReferrerDefinition> {
        self.entries.values()
    }

    /// Whole-record insert; replaces whatever was there for the same host.
    fn insert(&mut self, definition: ReferrerDefinition) {
        self.entries.insert(definition.host.clone(), definition);
    }
}

/// Builds the merged mapping.
///
/// The catalog only seeds the mapping when `track_all` is set; overrides are
/// always applied on top. Entries with a blank host are dropped. Returns `None`
/// when nothing is left, meaning no classification is possible.
pub fn resolve(
    catalog: &[ReferrerDefinition],
    overrides: &[ReferrerDefinition],
    track_all: bool,
) -> Option<ReferrerMap> {
    let mut map = ReferrerMap::default();

    if track_all {
        for definition in catalog {
            map.insert(definition.clone());
        }
    }

    for definition in overrides {
        map.insert(definition.clone());
    }

    map.entries.retain(|host, _| !host.trim().is_empty());

    debug!(
        "Resolved {} referrer hosts ({} catalog, {} overrides, track_all={})",
        map.len(),
        if track_all { catalog.len() } else { 0 },
        overrides.len(),
        track_all
    );

    if map.is_empty() { None } else { Some(map) }
}
