//! Transaction context: watch set, write buffer, and the
//! begin/read/write/stage/commit/abort lifecycle (`SPEC_FULL.md` §4.2).

use std::collections::HashMap;

use ukv_core::{Blob, CollectionId, Error, Generation, Key, Options, Result, WriteValue};
use ukv_storage::{Engine, Snapshot};

use crate::conflict::watched_key_conflicts;

/// Lifecycle state of a [`Transaction`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionStatus {
    /// Open for reads and writes.
    Active,
    /// Committed successfully at the given generation.
    Committed {
        /// Generation assigned to this transaction's writes.
        generation: Generation,
    },
    /// Aborted, either by the caller or by a failed stage/commit.
    Aborted {
        /// Why the transaction was aborted.
        reason: String,
    },
}

/// A single optimistic-concurrency transaction over an [`Engine`].
///
/// Not `Sync` — one `Transaction` belongs to one caller at a time, the same
/// way the teacher's `TransactionContext` is owned per-caller rather than
/// shared.
pub struct Transaction<'engine> {
    engine: &'engine Engine,
    start_generation: Generation,
    pinned_snapshot: Option<Snapshot>,
    dont_watch: bool,
    write_buffer: HashMap<(CollectionId, Key), WriteValue>,
    watch_set: HashMap<(CollectionId, Key), Generation>,
    status: TransactionStatus,
}

impl<'engine> Transaction<'engine> {
    /// Begin a transaction, capturing the engine's current generation.
    /// When `options` includes [`Options::TRANSACTION_DONT_WATCH`], reads
    /// never populate the watch set (the caller accepts write-skew risk in
    /// exchange for avoiding stage-time validation of those keys). This
    /// does not by itself pin a snapshot; pass `snapshot = true` for that.
    pub fn begin(engine: &'engine Engine, options: Options, snapshot: bool) -> Transaction<'engine> {
        let start_generation = engine.current_generation();
        let pinned_snapshot = if snapshot { Some(engine.open_snapshot()) } else { None };
        Transaction {
            engine,
            start_generation,
            pinned_snapshot,
            dont_watch: options.contains(Options::TRANSACTION_DONT_WATCH),
            write_buffer: HashMap::new(),
            watch_set: HashMap::new(),
            status: TransactionStatus::Active,
        }
    }

    /// The generation this transaction began at (and reads through, for
    /// keys not in its own write buffer).
    pub fn start_generation(&self) -> Generation {
        self.start_generation
    }

    /// Current lifecycle state.
    pub fn status(&self) -> &TransactionStatus {
        &self.status
    }

    fn require_active(&self) -> Result<()> {
        match &self.status {
            TransactionStatus::Active => Ok(()),
            TransactionStatus::Committed { .. } => {
                Err(Error::UninitializedState("transaction already committed".into()))
            }
            TransactionStatus::Aborted { reason } => {
                Err(Error::UninitializedState(format!("transaction aborted: {reason}")))
            }
        }
    }

    /// Read a key: write buffer first, then the engine at this
    /// transaction's start generation (or pinned snapshot generation,
    /// which is the same value). Adds the key to the watch set unless
    /// `dont_watch` was requested at `begin`.
    pub fn read(&mut self, collection: CollectionId, key: Key) -> Result<Option<Blob>> {
        self.require_active()?;
        if let Some(buffered) = self.write_buffer.get(&(collection, key)) {
            return Ok(buffered.as_blob().map(|b| b.to_vec()));
        }
        let as_of = Some(self.start_generation);
        let value = self.engine.read_one(collection, key, as_of);
        if !self.dont_watch {
            let recorded = self.engine.generation_of(collection, key, as_of);
            self.watch_set.entry((collection, key)).or_insert(recorded);
        }
        Ok(value.and_then(|v| v.as_blob().map(|b| b.to_vec())))
    }

    /// Buffer a write (or tombstone). Visible to this transaction's own
    /// subsequent reads; not visible to anything else until `commit`.
    pub fn write(&mut self, collection: CollectionId, key: Key, value: WriteValue) -> Result<()> {
        self.require_active()?;
        self.write_buffer.insert((collection, key), value);
        Ok(())
    }

    /// Validate the watch set against the engine's current state without
    /// mutating anything. `commit` calls this internally; exposed
    /// separately so callers can probe for a conflict before paying for a
    /// write-batch allocation.
    pub fn stage(&self) -> Result<()> {
        if self.watch_set.is_empty() {
            return Ok(());
        }
        let youngest = self.engine.current_generation();
        for (&(collection, key), &recorded) in &self.watch_set {
            let current = self.engine.generation_of(collection, key, None);
            if watched_key_conflicts(recorded, youngest, current) {
                let err = Error::TransactionConflict(format!(
                    "key {key} in collection {collection} was overwritten since this transaction began"
                ));
                err.log();
                return Err(err);
            }
        }
        Ok(())
    }

    /// Stage, then — if validation passes — apply the write buffer to the
    /// engine atomically and transition to `Committed`. On conflict, the
    /// transaction transitions to `Aborted` and the write buffer is
    /// discarded, matching the "stage failure leaves the transaction
    /// untouched... commit failure aborts the entire batch" propagation
    /// policy in `SPEC_FULL.md` §7.
    pub fn commit(&mut self) -> Result<Generation> {
        self.require_active()?;
        if let Err(err) = self.stage() {
            self.status = TransactionStatus::Aborted { reason: err.to_string() };
            self.release_snapshot();
            return Err(err);
        }
        let entries: Vec<_> =
            self.write_buffer.iter().map(|(&(c, k), v)| (c, k, v.clone())).collect();
        let generation = self.engine.write_batch(&entries);
        tracing::debug!(generation, writes = entries.len(), "transaction committed");
        self.status = TransactionStatus::Committed { generation };
        self.release_snapshot();
        Ok(generation)
    }

    /// Discard the write buffer and watch set without committing.
    pub fn abort(&mut self, reason: impl Into<String>) {
        self.write_buffer.clear();
        self.watch_set.clear();
        self.status = TransactionStatus::Aborted { reason: reason.into() };
        self.release_snapshot();
    }

    /// Reuse this handle for a fresh transaction, as `SPEC_FULL.md` §4.2
    /// permits ("the transaction handle may be reused by re-issuing
    /// begin"), without requiring the caller to allocate a new
    /// `Transaction`.
    pub fn restart(&mut self, options: Options, snapshot: bool) {
        self.release_snapshot();
        self.start_generation = self.engine.current_generation();
        self.pinned_snapshot = if snapshot { Some(self.engine.open_snapshot()) } else { None };
        self.dont_watch = options.contains(Options::TRANSACTION_DONT_WATCH);
        self.write_buffer.clear();
        self.watch_set.clear();
        self.status = TransactionStatus::Active;
    }

    fn release_snapshot(&mut self) {
        if let Some(snapshot) = self.pinned_snapshot.take() {
            self.engine.drop_snapshot(&snapshot);
        }
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        self.release_snapshot();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ukv_core::MAIN_COLLECTION;

    #[test]
    fn read_your_own_writes() {
        let engine = Engine::new();
        let mut txn = Transaction::begin(&engine, Options::NONE, false);
        txn.write(MAIN_COLLECTION, 1, WriteValue::Value(vec![9])).unwrap();
        assert_eq!(txn.read(MAIN_COLLECTION, 1).unwrap(), Some(vec![9]));
    }

    #[test]
    fn commit_makes_writes_visible_to_new_readers() {
        let engine = Engine::new();
        let mut txn = Transaction::begin(&engine, Options::NONE, false);
        txn.write(MAIN_COLLECTION, 1, WriteValue::Value(vec![9])).unwrap();
        txn.commit().unwrap();
        assert_eq!(engine.read_one(MAIN_COLLECTION, 1, None).unwrap().as_blob().unwrap(), &[9]);
    }

    #[test]
    fn watched_missing_key_created_by_another_transaction_conflicts() {
        let engine = Engine::new();

        let mut txn_a = Transaction::begin(&engine, Options::NONE, false);
        assert_eq!(txn_a.read(MAIN_COLLECTION, 1).unwrap(), None);

        let mut txn_b = Transaction::begin(&engine, Options::NONE, false);
        txn_b.write(MAIN_COLLECTION, 1, WriteValue::Value(vec![1])).unwrap();
        txn_b.commit().unwrap();

        txn_a.write(MAIN_COLLECTION, 1, WriteValue::Value(vec![2])).unwrap();
        let result = txn_a.commit();
        assert!(matches!(result, Err(Error::TransactionConflict(_))));
    }

    #[test]
    fn dont_watch_option_skips_conflict_detection() {
        let engine = Engine::new();
        let mut txn_a = Transaction::begin(&engine, Options::TRANSACTION_DONT_WATCH, false);
        txn_a.read(MAIN_COLLECTION, 1).unwrap();

        let mut txn_b = Transaction::begin(&engine, Options::NONE, false);
        txn_b.write(MAIN_COLLECTION, 1, WriteValue::Value(vec![1])).unwrap();
        txn_b.commit().unwrap();

        txn_a.write(MAIN_COLLECTION, 1, WriteValue::Value(vec![2])).unwrap();
        assert!(txn_a.commit().is_ok());
    }

    #[test]
    fn unrelated_keys_do_not_conflict() {
        let engine = Engine::new();
        let mut txn_a = Transaction::begin(&engine, Options::NONE, false);
        txn_a.read(MAIN_COLLECTION, 1).unwrap();

        let mut txn_b = Transaction::begin(&engine, Options::NONE, false);
        txn_b.write(MAIN_COLLECTION, 2, WriteValue::Value(vec![1])).unwrap();
        txn_b.commit().unwrap();

        txn_a.write(MAIN_COLLECTION, 1, WriteValue::Value(vec![2])).unwrap();
        assert!(txn_a.commit().is_ok());
    }

    #[test]
    fn restart_clears_state_and_allows_a_fresh_transaction() {
        let engine = Engine::new();
        let mut txn = Transaction::begin(&engine, Options::NONE, false);
        txn.write(MAIN_COLLECTION, 1, WriteValue::Value(vec![1])).unwrap();
        txn.abort("caller changed its mind");
        txn.restart(Options::NONE, false);
        assert_eq!(txn.status(), &TransactionStatus::Active);
        assert_eq!(txn.read(MAIN_COLLECTION, 1).unwrap(), None);
    }
}
