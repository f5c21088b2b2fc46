//! The top-level `Database` facade (`SPEC_FULL.md` §2 "Modality adapters"):
//! lifts validated requests through arena-backed response assembly, the
//! ordered-set engine, and the document/graph/path modality layers.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use parking_lot::Mutex;
use ukv_arena::{Arena, Backing};
use ukv_concurrency::Transaction;
use ukv_core::{CollectionId, Error, Generation, Key, Options, Result};
use ukv_documents::DocumentStore;
use ukv_graphs::GraphStore;
use ukv_paths::PathStore;
use ukv_storage::{persist, Engine, Measurement, Snapshot};

use crate::config::DatabaseConfig;
use crate::validation;

/// The outcome of a point read batch, arena-assembled the way the original
/// C ABI returns `(presence, offsets, lengths, values)` — but as owned,
/// safe Rust values rather than raw pointers into the arena
/// (`SPEC_FULL.md` §4.1 "read").
#[derive(Debug, Clone, Default)]
pub struct ReadBatch {
    /// `true` at index `i` iff key `i` had a value.
    pub presence: Vec<bool>,
    /// Byte offset of entry `i` within `values` (meaningless if absent).
    pub offsets: Vec<usize>,
    /// Byte length of entry `i` within `values`.
    pub lengths: Vec<usize>,
    /// All present values concatenated.
    pub values: Vec<u8>,
}

/// The embedded database: owns the ordered-set engine and exposes the
/// document/graph/path modality adapters over it (`SPEC_FULL.md` §2).
pub struct Database {
    engine: Engine,
    config: DatabaseConfig,
    response_arena: Mutex<Arena>,
}

impl Database {
    /// Open a database per `config`: if a persistence path is configured
    /// and exists, load its full image; otherwise start empty
    /// (`SPEC_FULL.md` §4.1 "Persistence").
    pub fn open(config: DatabaseConfig) -> Result<Database> {
        let engine = match &config.persistence_path {
            Some(path) if path.exists() => {
                let file = File::open(path).map_err(|e| Error::ArgumentWrong(format!("failed to open {path:?}: {e}")))?;
                persist::load(file, config.shard_count)?
            }
            _ => Engine::with_shard_count(config.shard_count),
        };
        Ok(Database { engine, config, response_arena: Mutex::new(Arena::new(Backing::Heap)) })
    }

    /// Open a purely in-memory database with default configuration —
    /// the teacher's `Database::cache()` equivalent for tests and
    /// ephemeral use (`SPEC_FULL.md` §7).
    pub fn cache() -> Database {
        Database::open(DatabaseConfig::default()).expect("in-memory open never touches disk")
    }

    /// The capability flags this backend supports (`SPEC_FULL.md` §4.3
    /// supplemented feature: "Collection-level capability probing").
    pub fn capabilities(&self) -> ukv_core::Capabilities {
        ukv_core::Capabilities::FULL
    }

    /// The configuration this database was opened with.
    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Flush the full committed state to `config.persistence_path`. A
    /// no-op error if no path was configured.
    pub fn flush(&self) -> Result<()> {
        let path = self
            .config
            .persistence_path
            .as_ref()
            .ok_or_else(|| Error::ArgsCombo("flush requires a configured persistence path".into()))?;
        self.flush_to(path)
    }

    /// Flush the full committed state to an explicit path, independent of
    /// `config.persistence_path` (used by tests and manual snapshots).
    pub fn flush_to(&self, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|e| Error::ArgumentWrong(format!("failed to create {path:?}: {e}")))?;
        let mut writer = BufWriter::new(file);
        persist::save(&self.engine, &mut writer)
    }

    /// Open (or fetch the handle of) a named collection.
    pub fn open_collection(&self, name: &str) -> Result<CollectionId> {
        validation::validate_collection_name(&self.config.limits, name)?;
        self.engine.open_collection(name)
    }

    /// Drop a named collection.
    pub fn remove_collection(&self, name: &str) -> Result<()> {
        self.engine.remove_collection(name)
    }

    /// List every open collection.
    pub fn list_collections(&self) -> Vec<(String, CollectionId)> {
        self.engine.list_collections()
    }

    /// Begin a new transaction against this database.
    /// `snapshot: true` additionally pins a read snapshot at the begin
    /// generation (`SPEC_FULL.md` §4.2 "Begin").
    pub fn begin_transaction(&self, options: Options, snapshot: bool) -> Result<Transaction<'_>> {
        validation::validate_known_options(options)?;
        Ok(Transaction::begin(&self.engine, options, snapshot))
    }

    /// Pin a read snapshot at the current generation without starting a
    /// transaction.
    pub fn open_snapshot(&self) -> Snapshot {
        self.engine.open_snapshot()
    }

    /// Release a previously pinned snapshot.
    pub fn drop_snapshot(&self, snapshot: &Snapshot) {
        self.engine.drop_snapshot(snapshot)
    }

    /// Point-read a batch of keys, returning the arena-assembled response
    /// (`SPEC_FULL.md` §4.1 "read").
    pub fn read_batch(&self, collection: CollectionId, keys: &[Key], as_of: Option<Generation>) -> Result<ReadBatch> {
        validation::validate_batch_len(&self.config.limits, keys.len())?;
        let mut arena = self.response_arena.lock();
        arena.reset(false);
        let mut batch = ReadBatch { presence: Vec::with_capacity(keys.len()), ..ReadBatch::default() };
        let mut cursor = 0usize;
        for &key in keys {
            match self.engine.read_one(collection, key, as_of) {
                Some(value) if !value.is_tombstone() => {
                    let bytes = value.as_blob().expect("non-tombstone write value always has blob bytes");
                    let slot = arena.alloc(bytes.len())?;
                    slot.copy_from_slice(bytes);
                    batch.presence.push(true);
                    batch.offsets.push(cursor);
                    batch.lengths.push(bytes.len());
                    batch.values.extend_from_slice(bytes);
                    cursor += bytes.len();
                }
                _ => {
                    batch.presence.push(false);
                    batch.offsets.push(cursor);
                    batch.lengths.push(0);
                }
            }
        }
        Ok(batch)
    }

    /// Batched write: `None` deletes the key, `Some(bytes)` writes it
    /// (`SPEC_FULL.md` §4.1 "write").
    pub fn write_batch(&self, collection: CollectionId, entries: &[(Key, Option<Vec<u8>>)]) -> Result<Generation> {
        validation::validate_batch_len(&self.config.limits, entries.len())?;
        for (_, value) in entries {
            if let Some(bytes) = value {
                validation::validate_blob_len(&self.config.limits, bytes.len())?;
            }
        }
        let writes: Vec<_> = entries
            .iter()
            .map(|(key, value)| {
                let write_value = match value {
                    Some(bytes) => ukv_core::WriteValue::Value(bytes.clone()),
                    None => ukv_core::WriteValue::Tombstone,
                };
                (collection, *key, write_value)
            })
            .collect();
        let generation = self.engine.write_batch(&writes);
        tracing::debug!(collection = collection.0, entries = entries.len(), generation, "database write_batch");
        Ok(generation)
    }

    /// Scan up to `limit` keys starting at `start`, ascending
    /// (`SPEC_FULL.md` §4.1 "scan" — full unbounded scans are rejected).
    pub fn scan(&self, collection: CollectionId, start: Key, limit: Option<usize>) -> Result<Vec<Key>> {
        let limit = validation::validate_scan_limit(limit)?;
        Ok(self.engine.scan(collection, start, limit))
    }

    /// Conservative cardinality/byte-size bounds for `collection`, optionally
    /// restricted to `range` (`SPEC_FULL.md` §4.1 "measure").
    pub fn measure(&self, collection: CollectionId, range: Option<(Key, Key)>) -> Measurement {
        self.engine.measure(collection, range)
    }

    /// Reclaim MVCC versions no longer covered by any live snapshot.
    pub fn reclaim(&self) -> usize {
        self.engine.reclaim()
    }

    /// The document-modality adapter over this database's engine
    /// (`SPEC_FULL.md` §4.3).
    pub fn documents(&self) -> DocumentStore<'_> {
        DocumentStore::new(&self.engine)
    }

    /// The graph-modality adapter, directed per `config.directed_graph`
    /// (`SPEC_FULL.md` §4.4).
    pub fn graphs(&self) -> GraphStore<'_> {
        GraphStore::new(&self.engine, self.config.directed_graph)
    }

    /// The paths-modality adapter (`SPEC_FULL.md` §4.5).
    pub fn paths(&self) -> PathStore<'_> {
        PathStore::new(&self.engine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ukv_core::MAIN_COLLECTION;

    #[test]
    fn read_batch_reports_presence_and_concatenated_values() {
        let db = Database::cache();
        db.write_batch(MAIN_COLLECTION, &[(1, Some(b"hi".to_vec())), (2, None)]).unwrap();
        let batch = db.read_batch(MAIN_COLLECTION, &[1, 2, 3], None).unwrap();
        assert_eq!(batch.presence, vec![true, false, false]);
        assert_eq!(&batch.values[batch.offsets[0]..batch.offsets[0] + batch.lengths[0]], b"hi");
    }

    #[test]
    fn scan_without_limit_is_rejected() {
        let db = Database::cache();
        assert!(db.scan(MAIN_COLLECTION, 0, None).is_err());
    }

    #[test]
    fn transaction_commits_are_visible_through_the_database() {
        let db = Database::cache();
        {
            let mut txn = db.begin_transaction(Options::NONE, false).unwrap();
            txn.write(MAIN_COLLECTION, 1, ukv_core::WriteValue::Value(b"v".to_vec())).unwrap();
            txn.commit().unwrap();
        }
        let batch = db.read_batch(MAIN_COLLECTION, &[1], None).unwrap();
        assert!(batch.presence[0]);
    }

    #[test]
    fn flush_and_reopen_round_trips_through_persistence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.ukv");
        let config = crate::config::DatabaseConfigBuilder::new().persistence_path(&path).build();
        let db = Database::open(config.clone()).unwrap();
        db.write_batch(MAIN_COLLECTION, &[(1, Some(b"persisted".to_vec()))]).unwrap();
        db.flush().unwrap();

        let reopened = Database::open(config).unwrap();
        let batch = reopened.read_batch(MAIN_COLLECTION, &[1], None).unwrap();
        assert!(batch.presence[0]);
        assert_eq!(&batch.values[..], b"persisted");
    }
}
