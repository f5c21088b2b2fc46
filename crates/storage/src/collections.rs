//! The collection name → handle table, guarded by the single coarse
//! structural lock mentioned in `SPEC_FULL.md` §4.1 ("collection
//! create/drop, rare").

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use ukv_core::{validate_collection_name, CollectionId, Error, Result, MAIN_COLLECTION, MAIN_COLLECTION_NAME};

/// Maps collection names to stable handles and back.
pub struct CollectionTable {
    by_name: HashMap<String, CollectionId>,
    names: HashMap<CollectionId, String>,
    next_handle: AtomicU64,
}

impl CollectionTable {
    /// A table containing only the always-present `main` collection.
    pub fn new() -> CollectionTable {
        let mut by_name = HashMap::new();
        let mut names = HashMap::new();
        by_name.insert(MAIN_COLLECTION_NAME.to_string(), MAIN_COLLECTION);
        names.insert(MAIN_COLLECTION, MAIN_COLLECTION_NAME.to_string());
        CollectionTable { by_name, names, next_handle: AtomicU64::new(1) }
    }

    /// Look up a collection by name, creating it if it doesn't exist yet.
    pub fn open(&mut self, name: &str) -> Result<CollectionId> {
        if name.is_empty() {
            return Ok(MAIN_COLLECTION);
        }
        validate_collection_name(name).map_err(|e| Error::ArgumentWrong(e.to_string()))?;
        if let Some(&id) = self.by_name.get(name) {
            return Ok(id);
        }
        let id = CollectionId(self.next_handle.fetch_add(1, Ordering::Relaxed));
        self.by_name.insert(name.to_string(), id);
        self.names.insert(id, name.to_string());
        Ok(id)
    }

    /// Remove a named collection from the table. Does not touch any data
    /// already stored under that handle — callers (the engine) are
    /// responsible for clearing shard entries before calling this.
    pub fn remove(&mut self, name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(Error::ArgumentWrong("cannot drop the main collection".into()));
        }
        match self.by_name.remove(name) {
            Some(id) => {
                self.names.remove(&id);
                Ok(())
            }
            None => Err(Error::ArgumentWrong(format!("no such collection: {name}"))),
        }
    }

    /// List every known collection as `(name, handle)` pairs.
    pub fn list(&self) -> Vec<(String, CollectionId)> {
        let mut out: Vec<_> = self.by_name.iter().map(|(n, id)| (n.clone(), *id)).collect();
        out.sort_by(|a, b| a.1.cmp(&b.1));
        out
    }

    /// The name registered for `id`, if any.
    pub fn name_of(&self, id: CollectionId) -> Option<&str> {
        self.names.get(&id).map(|s| s.as_str())
    }

    /// Register a `(name, handle)` pair directly, bypassing handle
    /// allocation. Used only when reloading a persistence file, where the
    /// handles on disk must be reproduced exactly rather than renumbered.
    pub fn seed(&mut self, name: String, id: CollectionId) {
        self.next_handle.fetch_max(id.0 + 1, Ordering::Relaxed);
        self.by_name.insert(name.clone(), id);
        self.names.insert(id, name);
    }
}

impl Default for CollectionTable {
    fn default() -> Self {
        CollectionTable::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn main_collection_is_always_present() {
        let table = CollectionTable::new();
        assert_eq!(table.name_of(MAIN_COLLECTION), Some(""));
    }

    #[test]
    fn opening_the_same_name_twice_returns_the_same_handle() {
        let mut table = CollectionTable::new();
        let a = table.open("orders").unwrap();
        let b = table.open("orders").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn removing_main_collection_is_rejected() {
        let mut table = CollectionTable::new();
        assert!(table.remove("").is_err());
    }

    #[test]
    fn removing_unknown_collection_is_an_error() {
        let mut table = CollectionTable::new();
        assert!(table.remove("nope").is_err());
    }
}
