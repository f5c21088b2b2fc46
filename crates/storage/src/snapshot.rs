//! Live-snapshot bookkeeping for generation reclamation.
//!
//! `SPEC_FULL.md` §5: "a generation may be reclaimed only when strictly less
//! than the minimum start-generation of any live snapshot or running
//! transaction." This module tracks the refcounted set of pinned
//! generations; the concurrency crate registers a transaction's start
//! generation here the same way it registers a snapshot's.

use std::collections::BTreeMap;

use parking_lot::Mutex;
use ukv_core::Generation;

/// A read-only view pinned at the generation observed when it was taken.
/// Reads through a snapshot always see that generation, regardless of
/// writes committed afterward.
#[derive(Debug)]
pub struct Snapshot {
    generation: Generation,
}

impl Snapshot {
    /// The generation this snapshot is pinned to.
    pub fn generation(&self) -> Generation {
        self.generation
    }
}

/// Refcounted registry of generations currently pinned by a live snapshot
/// or an in-flight transaction.
#[derive(Default)]
pub struct SnapshotRegistry {
    pinned: Mutex<BTreeMap<Generation, u64>>,
}

impl SnapshotRegistry {
    /// An empty registry.
    pub fn new() -> SnapshotRegistry {
        SnapshotRegistry::default()
    }

    /// Pin `generation`, returning a [`Snapshot`] handle. Dropping the
    /// handle does *not* automatically unpin it — callers release
    /// explicitly via [`SnapshotRegistry::release`], mirroring the
    /// engine's explicit `reclaim()` call rather than relying on RAII across
    /// an FFI boundary.
    pub fn pin(&self, generation: Generation) -> Snapshot {
        *self.pinned.lock().entry(generation).or_insert(0) += 1;
        Snapshot { generation }
    }

    /// Release a previously pinned generation.
    pub fn release(&self, snapshot: &Snapshot) {
        let mut pinned = self.pinned.lock();
        if let Some(count) = pinned.get_mut(&snapshot.generation) {
            *count -= 1;
            if *count == 0 {
                pinned.remove(&snapshot.generation);
            }
        }
    }

    /// The lowest pinned generation, or `None` if nothing is pinned — the
    /// floor below which old versions may be reclaimed.
    pub fn floor(&self) -> Option<Generation> {
        self.pinned.lock().keys().next().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floor_tracks_the_oldest_pinned_generation() {
        let registry = SnapshotRegistry::new();
        let a = registry.pin(5);
        let _b = registry.pin(10);
        assert_eq!(registry.floor(), Some(5));
        registry.release(&a);
        assert_eq!(registry.floor(), Some(10));
    }

    #[test]
    fn floor_is_none_when_nothing_is_pinned() {
        let registry = SnapshotRegistry::new();
        assert_eq!(registry.floor(), None);
    }

    #[test]
    fn repeated_pins_of_the_same_generation_require_matching_releases() {
        let registry = SnapshotRegistry::new();
        let a = registry.pin(5);
        let b = registry.pin(5);
        registry.release(&a);
        assert_eq!(registry.floor(), Some(5));
        registry.release(&b);
        assert_eq!(registry.floor(), None);
    }
}
