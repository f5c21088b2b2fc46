//! A single shard of the keyspace: an ordered set of version chains behind
//! one read-write lock, plus the index the teacher's `Shard` keeps for
//! O(log n + k) prefix/range scans.

use std::collections::BTreeSet;

use rustc_hash::FxHashMap;
use ukv_core::{CollectionId, Key};

use crate::chain::VersionChain;

/// `(collection, key)` — the unit of ordering and sharding throughout this
/// crate.
pub type ShardKey = (CollectionId, Key);

/// One shard's worth of keyspace.
#[derive(Default)]
pub struct Shard {
    data: FxHashMap<ShardKey, VersionChain>,
    ordered_keys: BTreeSet<ShardKey>,
}

impl Shard {
    /// An empty shard.
    pub fn new() -> Shard {
        Shard::default()
    }

    /// Look up a key's version chain.
    pub fn get(&self, key: &ShardKey) -> Option<&VersionChain> {
        self.data.get(key)
    }

    /// Push a new version onto `key`'s chain, creating the chain (and
    /// indexing the key) if this is the first write.
    pub fn push(&mut self, key: ShardKey, version: crate::chain::StoredVersion) {
        if let Some(chain) = self.data.get_mut(&key) {
            chain.push(version);
        } else {
            self.ordered_keys.insert(key);
            self.data.insert(key, VersionChain::new(version));
        }
    }

    /// Ascending keys within `collection` starting at or after `start`,
    /// stopping once `limit` live keys have been produced. Keys whose
    /// latest version is a tombstone are skipped — `ordered_keys` is never
    /// pruned on delete, so the liveness check happens here.
    pub fn scan(&self, collection: CollectionId, start: Key, limit: usize) -> Vec<Key> {
        self.ordered_keys
            .range((collection, start)..)
            .take_while(|(c, _)| *c == collection)
            .filter(|shard_key| self.is_live(shard_key))
            .take(limit)
            .map(|(_, k)| *k)
            .collect()
    }

    /// Every live key currently indexed in `collection`, in ascending
    /// order. Keys whose latest version is a tombstone are skipped.
    pub fn keys_in(&self, collection: CollectionId) -> impl Iterator<Item = Key> + '_ {
        self.ordered_keys
            .range((collection, Key::MIN)..)
            .take_while(move |(c, _)| *c == collection)
            .filter(|shard_key| self.is_live(shard_key))
            .map(|(_, k)| *k)
    }

    fn is_live(&self, shard_key: &ShardKey) -> bool {
        match self.data.get(shard_key).and_then(|chain| chain.latest()) {
            Some(version) => !version.value.is_tombstone(),
            None => false,
        }
    }

    /// Number of distinct keys tracked by this shard (across all
    /// collections); includes keys whose latest version is a tombstone.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Garbage-collect every chain's versions older than `floor`. Returns
    /// the total number of pruned versions.
    pub fn reclaim_below(&mut self, floor: ukv_core::Generation) -> usize {
        self.data.values_mut().map(|chain| chain.reclaim_below(floor)).sum()
    }

    /// Remove every key belonging to `collection` from this shard.
    pub fn drop_collection(&mut self, collection: CollectionId) {
        self.data.retain(|(c, _), _| *c != collection);
        self.ordered_keys.retain(|(c, _)| *c != collection);
    }

    /// Iterate over every live `(key, chain)` pair, for persistence dumps.
    pub fn iter(&self) -> impl Iterator<Item = (&ShardKey, &VersionChain)> {
        self.data.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::StoredVersion;
    use ukv_core::{WriteValue, MAIN_COLLECTION};

    fn version(generation: u64, bytes: &[u8]) -> StoredVersion {
        StoredVersion { generation, value: WriteValue::Value(bytes.to_vec()) }
    }

    #[test]
    fn scan_respects_collection_boundary_and_limit() {
        let mut shard = Shard::new();
        let other = CollectionId(1);
        shard.push((MAIN_COLLECTION, 1), version(1, b"a"));
        shard.push((MAIN_COLLECTION, 2), version(1, b"b"));
        shard.push((other, 1), version(1, b"c"));

        let scanned = shard.scan(MAIN_COLLECTION, 0, 10);
        assert_eq!(scanned, vec![1, 2]);

        let limited = shard.scan(MAIN_COLLECTION, 0, 1);
        assert_eq!(limited, vec![1]);
    }

    #[test]
    fn scan_starts_at_the_requested_key_inclusive() {
        let mut shard = Shard::new();
        shard.push((MAIN_COLLECTION, 5), version(1, b"a"));
        shard.push((MAIN_COLLECTION, 10), version(1, b"b"));
        assert_eq!(shard.scan(MAIN_COLLECTION, 5, 10), vec![5, 10]);
        assert_eq!(shard.scan(MAIN_COLLECTION, 6, 10), vec![10]);
    }

    #[test]
    fn scan_and_keys_in_omit_tombstoned_keys() {
        let mut shard = Shard::new();
        shard.push((MAIN_COLLECTION, 5), version(1, b"a"));
        shard.push((MAIN_COLLECTION, 5), StoredVersion { generation: 2, value: WriteValue::Tombstone });

        assert_eq!(shard.scan(MAIN_COLLECTION, 0, 10), Vec::<Key>::new());
        assert_eq!(shard.keys_in(MAIN_COLLECTION).collect::<Vec<_>>(), Vec::<Key>::new());
    }
}
