//! Per-key MVCC version chain.
//!
//! Versions are kept newest-first in a `VecDeque` so the common case — read
//! the latest value, or push a new one on write — is O(1). Generalizes the
//! teacher's `VersionChain` (which keeps only the latest value) to a bounded
//! history, since snapshot reads here must be able to see a value as of an
//! older generation than the current head.

use std::collections::VecDeque;

use ukv_core::{Generation, WriteValue};

/// One entry in a key's version chain.
#[derive(Debug, Clone)]
pub struct StoredVersion {
    /// The generation at which this version was committed.
    pub generation: Generation,
    /// The value, or a tombstone marking a deletion.
    pub value: WriteValue,
}

/// Newest-first history of values written to one key.
#[derive(Debug, Clone, Default)]
pub struct VersionChain {
    versions: VecDeque<StoredVersion>,
}

impl VersionChain {
    /// A chain holding a single version.
    pub fn new(version: StoredVersion) -> VersionChain {
        let mut versions = VecDeque::with_capacity(4);
        versions.push_front(version);
        VersionChain { versions }
    }

    /// Record a new version. Must be newer than every version already in
    /// the chain — callers (the engine's write path) only ever append at
    /// the current generation under the owning shard's write lock.
    pub fn push(&mut self, version: StoredVersion) {
        self.versions.push_front(version);
    }

    /// The most recently committed version, if any.
    pub fn latest(&self) -> Option<&StoredVersion> {
        self.versions.front()
    }

    /// The generation of the most recent write to this key, `0`
    /// (`GENERATION_MISSING`) if the chain is empty.
    pub fn latest_generation(&self) -> Generation {
        self.latest().map(|v| v.generation).unwrap_or(ukv_core::GENERATION_MISSING)
    }

    /// The newest version visible at or before `max_generation` — the read
    /// path for snapshot and transactional reads.
    pub fn get_at(&self, max_generation: Generation) -> Option<&StoredVersion> {
        self.versions.iter().find(|v| v.generation <= max_generation)
    }

    /// Drop every version strictly older than `floor`, except the single
    /// newest version is always kept even if it predates `floor` — a chain
    /// must never become empty as a result of reclamation.
    pub fn reclaim_below(&mut self, floor: Generation) -> usize {
        if self.versions.len() <= 1 {
            return 0;
        }
        let mut pruned = 0;
        while self.versions.len() > 1 {
            let oldest_generation = self.versions.back().map(|v| v.generation);
            match oldest_generation {
                Some(g) if g < floor => {
                    self.versions.pop_back();
                    pruned += 1;
                }
                _ => break,
            }
        }
        pruned
    }

    /// Number of retained versions (for `measure` byte/shape accounting).
    pub fn version_count(&self) -> usize {
        self.versions.len()
    }

    /// Approximate byte footprint of the retained versions' payloads.
    pub fn value_bytes(&self) -> usize {
        self.versions
            .iter()
            .map(|v| match &v.value {
                WriteValue::Value(b) => b.len(),
                WriteValue::Tombstone => 0,
            })
            .sum()
    }
}
