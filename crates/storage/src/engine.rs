//! The ordered-set engine (`SPEC_FULL.md` §4.1): the committed state shared
//! by the HEAD (non-transactional) path and by transaction commits.

use std::hash::{Hash, Hasher};

use parking_lot::RwLock;
use rand::Rng;
use rustc_hash::FxHasher;
use ukv_core::{Blob, CollectionId, Error, Generation, Key, Result, WriteValue, GENERATION_FIRST, GENERATION_MISSING};

use crate::chain::StoredVersion;
use crate::collections::CollectionTable;
use crate::shard::{Shard, ShardKey};
use crate::snapshot::{Snapshot, SnapshotRegistry};

/// Number of shards used unless the caller overrides it (`SPEC_FULL.md`
/// §4.1: "64 by default, configurable").
pub const DEFAULT_SHARD_COUNT: usize = 64;

/// A conservative cardinality/size estimate returned by
/// [`Engine::measure`]. When `range` is `None` (the whole collection) the
/// counters are tracked exactly and `min == max`; a bounded range can span
/// an unpredictable subset of shards under hash sharding, so only `[0,
/// total]` can be stated without scanning.
#[derive(Debug, Clone, Copy, Default)]
pub struct Measurement {
    /// Lower bound on the number of live keys.
    pub min_cardinality: u64,
    /// Upper bound on the number of live keys.
    pub max_cardinality: u64,
    /// Lower bound on retained value bytes.
    pub min_value_bytes: u64,
    /// Upper bound on retained value bytes.
    pub max_value_bytes: u64,
    /// Lower bound on on-disk bytes (persistence file contribution).
    pub min_disk_bytes: u64,
    /// Upper bound on on-disk bytes.
    pub max_disk_bytes: u64,
}

/// The ordered-set engine: committed state, sharded for concurrency.
pub struct Engine {
    shards: Vec<RwLock<Shard>>,
    collections: RwLock<CollectionTable>,
    generation: std::sync::atomic::AtomicU64,
    pub(crate) snapshots: SnapshotRegistry,
}

impl Engine {
    /// An empty engine with the default shard count.
    pub fn new() -> Engine {
        Engine::with_shard_count(DEFAULT_SHARD_COUNT)
    }

    /// An empty engine with a caller-chosen shard count.
    pub fn with_shard_count(shard_count: usize) -> Engine {
        let shard_count = shard_count.max(1);
        let shards = (0..shard_count).map(|_| RwLock::new(Shard::new())).collect();
        Engine {
            shards,
            collections: RwLock::new(CollectionTable::new()),
            generation: std::sync::atomic::AtomicU64::new(GENERATION_FIRST - 1),
            snapshots: SnapshotRegistry::new(),
        }
    }

    fn shard_index(&self, collection: CollectionId, key: Key) -> usize {
        let mut hasher = FxHasher::default();
        collection.hash(&mut hasher);
        key.hash(&mut hasher);
        (hasher.finish() as usize) % self.shards.len()
    }

    /// The generation of the most recent successful commit (or batched
    /// write), `0` if nothing has ever been written.
    pub fn current_generation(&self) -> Generation {
        self.generation.load(std::sync::atomic::Ordering::Acquire)
    }

    fn next_generation(&self) -> Generation {
        self.generation.fetch_add(1, std::sync::atomic::Ordering::AcqRel) + 1
    }

    /// Open (creating if absent) a named collection.
    pub fn open_collection(&self, name: &str) -> Result<CollectionId> {
        self.collections.write().open(name)
    }

    /// Drop a named collection and every key stored under it.
    pub fn remove_collection(&self, name: &str) -> Result<()> {
        let id = {
            let table = self.collections.read();
            table
                .list()
                .into_iter()
                .find(|(n, _)| n == name)
                .map(|(_, id)| id)
                .ok_or_else(|| Error::ArgumentWrong(format!("no such collection: {name}")))?
        };
        for shard in &self.shards {
            shard.write().drop_collection(id);
        }
        self.collections.write().remove(name)
    }

    /// List every known collection.
    pub fn list_collections(&self) -> Vec<(String, CollectionId)> {
        self.collections.read().list()
    }

    /// Direct write access to the collection table, for the persistence
    /// module's reload path only (see `persist::load`).
    #[doc(hidden)]
    pub fn collections_for_persistence(&self) -> parking_lot::RwLockWriteGuard<'_, CollectionTable> {
        self.collections.write()
    }

    /// Read one key as of `as_of` (or the latest committed version when
    /// `as_of` is `None`, the HEAD-path behavior).
    pub fn read_one(&self, collection: CollectionId, key: Key, as_of: Option<Generation>) -> Option<WriteValue> {
        let shard = self.shards[self.shard_index(collection, key)].read();
        let chain = shard.get(&(collection, key))?;
        let version = match as_of {
            Some(generation) => chain.get_at(generation)?,
            None => chain.latest()?,
        };
        Some(version.value.clone())
    }

    /// The committed generation of `key`'s most recent version at or before
    /// `as_of` (or ever, if `as_of` is `None`); `GENERATION_MISSING` if the
    /// key has no version visible there.
    pub fn generation_of(&self, collection: CollectionId, key: Key, as_of: Option<Generation>) -> Generation {
        let shard = self.shards[self.shard_index(collection, key)].read();
        let Some(chain) = shard.get(&(collection, key)) else {
            return GENERATION_MISSING;
        };
        let found = match as_of {
            Some(generation) => chain.get_at(generation),
            None => chain.latest(),
        };
        found.map(|v| v.generation).unwrap_or(GENERATION_MISSING)
    }

    /// Apply a batch of writes atomically: every entry becomes visible at a
    /// single new generation, or (on a poisoned lock) none does. Returns the
    /// generation assigned.
    pub fn write_batch(&self, entries: &[(CollectionId, Key, WriteValue)]) -> Generation {
        let generation = self.next_generation();
        let mut by_shard: std::collections::BTreeMap<usize, Vec<(ShardKey, StoredVersion)>> =
            std::collections::BTreeMap::new();
        for (collection, key, value) in entries {
            let index = self.shard_index(*collection, *key);
            by_shard.entry(index).or_default().push((
                (*collection, *key),
                StoredVersion { generation, value: value.clone() },
            ));
        }
        // Lock shards in ascending index order to avoid deadlocking against
        // a concurrent batch that touches an overlapping shard set.
        for (index, writes) in by_shard {
            let mut shard = self.shards[index].write();
            for (shard_key, version) in writes {
                shard.push(shard_key, version);
            }
        }
        tracing::debug!(generation, entries = entries.len(), "batch committed");
        generation
    }

    /// Ascending keys in `collection` starting at or after `start`, up to
    /// `limit`. Merges per-shard results since hash-sharding does not
    /// preserve key order across shards.
    pub fn scan(&self, collection: CollectionId, start: Key, limit: usize) -> Vec<Key> {
        let mut merged: Vec<Key> = Vec::new();
        for shard in &self.shards {
            merged.extend(shard.read().scan(collection, start, limit));
        }
        merged.sort_unstable();
        merged.truncate(limit);
        merged
    }

    /// Uniform-random sample of up to `limit` keys from `collection`,
    /// without replacement, via a single-pass reservoir over every shard's
    /// key iterator chained together.
    pub fn sample(&self, collection: CollectionId, limit: usize, rng: &mut impl Rng) -> Vec<Key> {
        if limit == 0 {
            return Vec::new();
        }
        let mut reservoir: Vec<Key> = Vec::with_capacity(limit);
        let mut seen: u64 = 0;
        for shard in &self.shards {
            let guard = shard.read();
            for key in guard.keys_in(collection) {
                seen += 1;
                if reservoir.len() < limit {
                    reservoir.push(key);
                } else {
                    let j = rng.gen_range(0..seen);
                    if (j as usize) < limit {
                        reservoir[j as usize] = key;
                    }
                }
            }
        }
        reservoir
    }

    /// Conservative cardinality/size bounds for `collection`, optionally
    /// restricted to `range` (see [`Measurement`] for why a bounded range
    /// widens to `[0, total]` under hash sharding).
    pub fn measure(&self, collection: CollectionId, range: Option<(Key, Key)>) -> Measurement {
        let mut total_keys: u64 = 0;
        let mut total_bytes: u64 = 0;
        for shard in &self.shards {
            let guard = shard.read();
            for (shard_key, chain) in guard.iter() {
                if shard_key.0 != collection {
                    continue;
                }
                if let Some(latest) = chain.latest() {
                    if !latest.value.is_tombstone() {
                        total_keys += 1;
                        total_bytes += chain.value_bytes() as u64;
                    }
                }
            }
        }
        match range {
            None => Measurement {
                min_cardinality: total_keys,
                max_cardinality: total_keys,
                min_value_bytes: total_bytes,
                max_value_bytes: total_bytes,
                min_disk_bytes: total_bytes,
                max_disk_bytes: total_bytes,
            },
            Some(_) => Measurement {
                min_cardinality: 0,
                max_cardinality: total_keys,
                min_value_bytes: 0,
                max_value_bytes: total_bytes,
                min_disk_bytes: 0,
                max_disk_bytes: total_bytes,
            },
        }
    }

    /// Reclaim versions older than the oldest live snapshot/transaction (or
    /// everything but each key's latest version, if nothing is pinned).
    /// Invoked explicitly — there is no background timer
    /// (`SPEC_FULL.md` §5).
    pub fn reclaim(&self) -> usize {
        let floor = self.snapshots.floor().unwrap_or(self.current_generation() + 1);
        let pruned: usize = self.shards.iter().map(|s| s.write().reclaim_below(floor)).sum();
        tracing::debug!(floor, pruned, "generation reclamation swept");
        pruned
    }

    /// Pin the current generation as a snapshot.
    pub fn open_snapshot(&self) -> Snapshot {
        self.snapshots.pin(self.current_generation())
    }

    /// Release a previously opened snapshot.
    pub fn drop_snapshot(&self, snapshot: &Snapshot) {
        self.snapshots.release(snapshot);
    }

    /// Iterate every live `(collection, key, value)` triplet for
    /// persistence dumps.
    pub fn iter_live(&self) -> Vec<(CollectionId, Key, Blob)> {
        let mut out = Vec::new();
        for shard in &self.shards {
            let guard = shard.read();
            for ((collection, key), chain) in guard.iter() {
                if let Some(latest) = chain.latest() {
                    if let Some(bytes) = latest.value.as_blob() {
                        out.push((*collection, *key, bytes.clone()));
                    }
                }
            }
        }
        out
    }
}

impl Default for Engine {
    fn default() -> Self {
        Engine::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ukv_core::MAIN_COLLECTION;

    #[test]
    fn write_then_read_round_trips() {
        let engine = Engine::new();
        engine.write_batch(&[(MAIN_COLLECTION, 42, WriteValue::Value(vec![0xDE, 0xAD, 0xBE, 0xEF]))]);
        let value = engine.read_one(MAIN_COLLECTION, 42, None).unwrap();
        assert_eq!(value.as_blob().unwrap(), &[0xDE, 0xAD, 0xBE, 0xEF]);
        assert!(engine.read_one(MAIN_COLLECTION, 43, None).is_none());
    }

    #[test]
    fn batch_write_assigns_a_single_generation_to_every_entry() {
        let engine = Engine::new();
        let generation = engine.write_batch(&[
            (MAIN_COLLECTION, 1, WriteValue::Value(vec![1])),
            (MAIN_COLLECTION, 2, WriteValue::Value(vec![2])),
        ]);
        assert_eq!(engine.generation_of(MAIN_COLLECTION, 1, None), generation);
        assert_eq!(engine.generation_of(MAIN_COLLECTION, 2, None), generation);
    }

    #[test]
    fn snapshot_read_does_not_see_later_writes() {
        let engine = Engine::new();
        engine.write_batch(&[(MAIN_COLLECTION, 1, WriteValue::Value(vec![1]))]);
        let snapshot = engine.open_snapshot();
        engine.write_batch(&[(MAIN_COLLECTION, 1, WriteValue::Value(vec![2]))]);
        let value = engine.read_one(MAIN_COLLECTION, 1, Some(snapshot.generation())).unwrap();
        assert_eq!(value.as_blob().unwrap(), &[1]);
        engine.drop_snapshot(&snapshot);
    }

    #[test]
    fn scan_returns_ascending_keys_merged_across_shards() {
        let engine = Engine::with_shard_count(4);
        engine.write_batch(&[
            (MAIN_COLLECTION, 30, WriteValue::Value(vec![0])),
            (MAIN_COLLECTION, 10, WriteValue::Value(vec![0])),
            (MAIN_COLLECTION, 20, WriteValue::Value(vec![0])),
        ]);
        assert_eq!(engine.scan(MAIN_COLLECTION, 0, 10), vec![10, 20, 30]);
        assert_eq!(engine.scan(MAIN_COLLECTION, 0, 2), vec![10, 20]);
    }

    #[test]
    fn reclaim_prunes_versions_below_the_snapshot_floor() {
        let engine = Engine::new();
        engine.write_batch(&[(MAIN_COLLECTION, 1, WriteValue::Value(vec![1]))]);
        let snapshot = engine.open_snapshot();
        engine.write_batch(&[(MAIN_COLLECTION, 1, WriteValue::Value(vec![2]))]);
        engine.write_batch(&[(MAIN_COLLECTION, 1, WriteValue::Value(vec![3]))]);
        // Nothing below the snapshot's generation should be pruned yet.
        engine.reclaim();
        assert!(engine.read_one(MAIN_COLLECTION, 1, Some(snapshot.generation())).is_some());
        engine.drop_snapshot(&snapshot);
        engine.reclaim();
        assert_eq!(engine.read_one(MAIN_COLLECTION, 1, None).unwrap().as_blob().unwrap(), &[3]);
    }

    #[test]
    fn measure_without_range_is_exact() {
        let engine = Engine::new();
        engine.write_batch(&[
            (MAIN_COLLECTION, 1, WriteValue::Value(vec![1, 2, 3])),
            (MAIN_COLLECTION, 2, WriteValue::Value(vec![4, 5])),
        ]);
        let m = engine.measure(MAIN_COLLECTION, None);
        assert_eq!(m.min_cardinality, 2);
        assert_eq!(m.max_cardinality, 2);
        assert_eq!(m.min_value_bytes, 5);
    }
}
