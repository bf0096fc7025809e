//! Routing table cache
//!
//! Entries are keyed by `(index, shard_count)` and written at most once. The
//! in-memory cache lives as long as the process (or whoever owns the `Arc`)
//! and never evicts. A topology change that moves shards invalidates cached
//! tokens; detecting that is left to the caller, who can `clear()` the cache.

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use super::RoutingTable;

/// Storage for computed routing tables, shared by every router that uses it
pub trait RoutingCache: Send + Sync {
    fn get(&self, index: &str, shard_count: u32) -> Option<RoutingTable>;

    /// Store `table` unless an entry already exists, and return the entry that
    /// ends up cached. Concurrent writers for one key compute identical tables,
    /// so whichever lands first wins.
    fn insert(&self, index: &str, shard_count: u32, table: RoutingTable) -> RoutingTable;
}

/// Process-scoped routing cache without eviction
#[derive(Default)]
pub struct InMemoryRoutingCache {
    entries: RwLock<FxHashMap<String, FxHashMap<u32, RoutingTable>>>,
}

impl InMemoryRoutingCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached `(index, shard_count)` entries
    pub fn len(&self) -> usize {
        self.entries.read().values().map(|tables| tables.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry, e.g. after shards were relocated
    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

impl RoutingCache for InMemoryRoutingCache {
    fn get(&self, index: &str, shard_count: u32) -> Option<RoutingTable> {
        self.entries
            .read()
            .get(index)
            .and_then(|tables| tables.get(&shard_count))
            .cloned()
    }

    fn insert(&self, index: &str, shard_count: u32, table: RoutingTable) -> RoutingTable {
        self.entries
            .write()
            .entry(index.to_string())
            .or_default()
            .entry(shard_count)
            .or_insert(table)
            .clone()
    }
}
