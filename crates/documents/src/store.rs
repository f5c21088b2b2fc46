//! The document modality facade (`SPEC_FULL.md` §4.3): modification modes,
//! whole-document/field reads, gist, and gather, all built on top of the
//! ordered-set engine's blob storage.

use serde_json::Value;
use ukv_core::{CollectionId, Error, Key, WriteValue};
use ukv_storage::Engine;

use crate::format::{self, Format};
use crate::gather::{self, ColumnType, GatheredColumn};
use crate::merge;
use crate::patch::{self, PatchOp};
use crate::pointer::{self, JsonPointer};

/// How a document write should reconcile with whatever is already stored
/// at that path (`SPEC_FULL.md` §4.3 "Write operations").
#[derive(Debug, Clone)]
pub enum WriteMode {
    /// Replace the value at `path` if present, else create it.
    Upsert {
        /// Target location within the document.
        path: JsonPointer,
        /// New value.
        value: Value,
    },
    /// Replace the value at `path`; fail if `path` is missing.
    Update {
        /// Target location within the document.
        path: JsonPointer,
        /// New value.
        value: Value,
    },
    /// Create the value at `path`; fail if `path` already exists.
    Insert {
        /// Target location within the document.
        path: JsonPointer,
        /// New value.
        value: Value,
    },
    /// Apply an RFC 6902 JSON-Patch operations array.
    Patch(Vec<PatchOp>),
    /// Apply an RFC 7396 JSON-Merge-Patch document.
    Merge(Value),
}

/// The document modality: a thin layer over [`Engine`] blob storage that
/// interprets each value as a parsed JSON document.
pub struct DocumentStore<'engine> {
    engine: &'engine Engine,
}

impl<'engine> DocumentStore<'engine> {
    /// Wrap `engine` for document-modality access.
    pub fn new(engine: &'engine Engine) -> DocumentStore<'engine> {
        DocumentStore { engine }
    }

    fn load(&self, collection: CollectionId, key: Key) -> Result<Option<Value>, Error> {
        match self.engine.read_one(collection, key, None) {
            None | Some(WriteValue::Tombstone) => Ok(None),
            Some(WriteValue::Value(bytes)) => {
                if bytes.is_empty() {
                    Ok(Some(Value::Null))
                } else {
                    format::decode(Format::Json, &bytes).map(Some)
                }
            }
        }
    }

    fn store(&self, collection: CollectionId, key: Key, document: Value) -> Result<(), Error> {
        let bytes = format::encode(Format::Json, &document)?;
        self.engine.write_batch(&[(collection, key, WriteValue::Value(bytes))]);
        Ok(())
    }

    /// Apply `mode` to the document at `(collection, key)`.
    ///
    /// Per §4.3's batch-semantics note, a caller applying several
    /// modifications to the same key should fetch once, apply every mode
    /// to the in-memory copy, and call [`DocumentStore::write`] only for
    /// the final write-back; this method itself always performs one
    /// read-modify-write round trip, matching a single-mode call.
    pub fn write(&self, collection: CollectionId, key: Key, mode: WriteMode) -> Result<(), Error> {
        let existing = self.load(collection, key)?;
        let updated = apply_mode(existing, mode)?;
        tracing::debug!(collection = collection.0, key, "document write");
        self.store(collection, key, updated)
    }

    /// Apply a sequence of modes to the same document, fetching it once
    /// and writing the result back once (`SPEC_FULL.md` §4.3 "Batch
    /// semantics").
    pub fn write_batch(&self, collection: CollectionId, key: Key, modes: Vec<WriteMode>) -> Result<(), Error> {
        let mut document = self.load(collection, key)?;
        for mode in modes {
            document = Some(apply_mode(document, mode)?);
        }
        self.store(collection, key, document.unwrap_or(Value::Null))
    }

    /// Read the whole document, serialized in `format`.
    pub fn read_document(&self, collection: CollectionId, key: Key, format: Format) -> Result<Option<Vec<u8>>, Error> {
        match self.load(collection, key)? {
            None => Ok(None),
            Some(document) => format::encode(format, &document).map(Some),
        }
    }

    /// Read the sub-tree at `path` within the document, serialized in
    /// `format`.
    pub fn read_field(
        &self,
        collection: CollectionId,
        key: Key,
        path: &JsonPointer,
        format: Format,
    ) -> Result<Option<Vec<u8>>, Error> {
        let Some(document) = self.load(collection, key)? else { return Ok(None) };
        match pointer::get(&document, path) {
            None => Ok(None),
            Some(found) => format::encode(format, found).map(Some),
        }
    }

    /// Enumerate every distinct leaf JSON-pointer path present across
    /// `keys`' documents, deduplicated and lexicographically sorted
    /// (`SPEC_FULL.md` §4.3 "Gist").
    pub fn gist(&self, collection: CollectionId, keys: &[Key]) -> Result<Vec<String>, Error> {
        let mut paths = std::collections::BTreeSet::new();
        for &key in keys {
            if let Some(document) = self.load(collection, key)? {
                collect_leaf_paths(&document, &mut JsonPointer::root(), &mut paths);
            }
        }
        Ok(paths.into_iter().collect())
    }

    /// Project `(path, type)` columns out of `keys`' documents
    /// (`SPEC_FULL.md` §4.3 "Gather").
    pub fn gather(
        &self,
        collection: CollectionId,
        keys: &[Key],
        columns: &[(JsonPointer, ColumnType)],
    ) -> Result<Vec<GatheredColumn>, Error> {
        let mut documents = Vec::with_capacity(keys.len());
        for &key in keys {
            documents.push(self.load(collection, key)?);
        }
        Ok(gather::gather(&documents, columns))
    }
}

fn apply_mode(existing: Option<Value>, mode: WriteMode) -> Result<Value, Error> {
    match mode {
        WriteMode::Upsert { path, value } => {
            let mut document = existing.unwrap_or(Value::Null);
            pointer::set_creating(&mut document, &path, value)?;
            Ok(document)
        }
        WriteMode::Update { path, value } => {
            let mut document = existing.ok_or_else(|| Error::OutOfRange("update target document does not exist".into()))?;
            if pointer::get(&document, &path).is_none() {
                return Err(Error::OutOfRange(format!("update target path does not exist: {path}")));
            }
            pointer::set_creating(&mut document, &path, value)?;
            Ok(document)
        }
        WriteMode::Insert { path, value } => {
            let mut document = existing.unwrap_or(Value::Null);
            if pointer::get(&document, &path).is_some() {
                return Err(Error::ArgumentWrong(format!("insert target path already exists: {path}")));
            }
            pointer::set_creating(&mut document, &path, value)?;
            Ok(document)
        }
        WriteMode::Patch(ops) => {
            let document = existing.ok_or_else(|| Error::OutOfRange("patch target document does not exist".into()))?;
            patch::apply(&document, &ops)
        }
        WriteMode::Merge(patch_value) => {
            let mut document = existing.unwrap_or(Value::Null);
            merge::merge_patch(&mut document, &patch_value);
            Ok(document)
        }
    }
}

fn collect_leaf_paths(value: &Value, path: &mut JsonPointer, out: &mut std::collections::BTreeSet<String>) {
    match value {
        Value::Object(map) if !map.is_empty() => {
            for (key, child) in map {
                let mut child_path = path.clone();
                child_path.push_segment(key.clone());
                collect_leaf_paths(child, &mut child_path, out);
            }
        }
        Value::Array(items) if !items.is_empty() => {
            for (index, child) in items.iter().enumerate() {
                let mut child_path = path.clone();
                child_path.push_segment(index.to_string());
                collect_leaf_paths(child, &mut child_path, out);
            }
        }
        _ => {
            out.insert(path.to_string_form());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use ukv_core::MAIN_COLLECTION;

    #[test]
    fn upsert_creates_then_replaces() {
        let engine = Engine::new();
        let store = DocumentStore::new(&engine);
        let path = JsonPointer::parse("/a/b").unwrap();
        store
            .write(MAIN_COLLECTION, 1, WriteMode::Upsert { path: path.clone(), value: json!(1) })
            .unwrap();
        store.write(MAIN_COLLECTION, 1, WriteMode::Upsert { path, value: json!(2) }).unwrap();
        let bytes = store.read_document(MAIN_COLLECTION, 1, Format::Json).unwrap().unwrap();
        let document: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(document, json!({"a": {"b": 2}}));
    }

    #[test]
    fn update_on_missing_document_fails() {
        let engine = Engine::new();
        let store = DocumentStore::new(&engine);
        let result = store.write(
            MAIN_COLLECTION,
            1,
            WriteMode::Update { path: JsonPointer::parse("/a").unwrap(), value: json!(1) },
        );
        assert!(result.is_err());
    }

    #[test]
    fn insert_on_existing_path_fails() {
        let engine = Engine::new();
        let store = DocumentStore::new(&engine);
        let path = JsonPointer::parse("/a").unwrap();
        store.write(MAIN_COLLECTION, 1, WriteMode::Insert { path: path.clone(), value: json!(1) }).unwrap();
        let result = store.write(MAIN_COLLECTION, 1, WriteMode::Insert { path, value: json!(2) });
        assert!(result.is_err());
    }

    #[test]
    fn field_read_extracts_a_subtree() {
        let engine = Engine::new();
        let store = DocumentStore::new(&engine);
        store
            .write(MAIN_COLLECTION, 1, WriteMode::Upsert { path: JsonPointer::root(), value: json!({"a": {"b": 5}}) })
            .unwrap();
        let bytes = store
            .read_field(MAIN_COLLECTION, 1, &JsonPointer::parse("/a/b").unwrap(), Format::Json)
            .unwrap()
            .unwrap();
        assert_eq!(bytes, b"5");
    }

    #[test]
    fn gist_enumerates_deduplicated_sorted_leaf_paths() {
        let engine = Engine::new();
        let store = DocumentStore::new(&engine);
        store
            .write(MAIN_COLLECTION, 1, WriteMode::Upsert { path: JsonPointer::root(), value: json!({"a": 1, "b": 2}) })
            .unwrap();
        store
            .write(MAIN_COLLECTION, 2, WriteMode::Upsert { path: JsonPointer::root(), value: json!({"a": 9, "c": 3}) })
            .unwrap();
        let paths = store.gist(MAIN_COLLECTION, &[1, 2]).unwrap();
        assert_eq!(paths, vec!["/a".to_string(), "/b".to_string(), "/c".to_string()]);
    }

    #[test]
    fn write_batch_applies_modes_in_order_with_one_write_back() {
        let engine = Engine::new();
        let store = DocumentStore::new(&engine);
        let modes = vec![
            WriteMode::Upsert { path: JsonPointer::parse("/a").unwrap(), value: json!(1) },
            WriteMode::Upsert { path: JsonPointer::parse("/b").unwrap(), value: json!(2) },
        ];
        store.write_batch(MAIN_COLLECTION, 1, modes).unwrap();
        let bytes = store.read_document(MAIN_COLLECTION, 1, Format::Json).unwrap().unwrap();
        let document: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(document, json!({"a": 1, "b": 2}));
    }
}
