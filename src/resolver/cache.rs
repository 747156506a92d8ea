//! Per-segment lookup cache.

use std::collections::BTreeMap;

use crate::lookup::GeoRecord;

/// Address → record cache owned by one segment resolution.
///
/// Keys are raw address values. The resolver only ever looks forward from its
/// cursor, so everything below the cursor can be dropped in one split.
#[derive(Debug, Default)]
pub struct ScopedCache {
    entries: BTreeMap<u64, GeoRecord>,
}

impl ScopedCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, address: u64) -> Option<&GeoRecord> {
        self.entries.get(&address)
    }

    pub fn insert(&mut self, address: u64, record: GeoRecord) {
        self.entries.insert(address, record);
    }

    /// Removes every entry keyed strictly below `floor`.
    pub fn prune_below(&mut self, floor: u64) {
        self.entries = self.entries.split_off(&floor);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
