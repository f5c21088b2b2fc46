//! The paths modality facade (`SPEC_FULL.md` §4.5): variable-length string
//! keys hashed into fixed integer keys, with intra-bucket collision lists
//! and prefix/regex scans.

use std::collections::BTreeMap;

use regex::Regex;
use ukv_core::{CollectionId, Error, Key, WriteValue};
use ukv_storage::Engine;
use xxhash_rust::xxh3::xxh3_64;

use crate::bucket::Bucket;

fn hash_key(path: &str) -> Key {
    xxh3_64(path.as_bytes()) as i64
}

/// Whether a `match` pattern is a literal prefix or a regular expression
/// (`SPEC_FULL.md` §4.5 "Two pattern kinds"). A pattern counts as a regex
/// the moment it contains any of regex's reserved metacharacters.
fn is_regex_pattern(pattern: &str) -> bool {
    pattern.chars().any(|c| "\\^$.|?*+()[]{}".contains(c))
}

/// The paths modality: hash-bucketed string-keyed values built on blob
/// storage (`SPEC_FULL.md` §4.5).
pub struct PathStore<'engine> {
    engine: &'engine Engine,
}

impl<'engine> PathStore<'engine> {
    /// Wrap `engine` for path-modality access.
    pub fn new(engine: &'engine Engine) -> PathStore<'engine> {
        PathStore { engine }
    }

    fn load_bucket(&self, collection: CollectionId, bucket_key: Key) -> Bucket {
        match self.engine.read_one(collection, bucket_key, None) {
            Some(WriteValue::Value(bytes)) => Bucket::decode(&bytes),
            _ => Bucket::default(),
        }
    }

    fn store_bucket(&self, collection: CollectionId, bucket_key: Key, bucket: Bucket) {
        if bucket.is_empty() {
            self.engine.write_batch(&[(collection, bucket_key, WriteValue::Tombstone)]);
        } else {
            self.engine.write_batch(&[(collection, bucket_key, WriteValue::Value(bucket.encode()))]);
        }
    }

    /// Write `(path, value)` pairs; `value: None` removes the path
    /// (`SPEC_FULL.md` §4.5 "write"). Writes are grouped by bucket so each
    /// bucket is read and written back only once per call.
    pub fn write(&self, collection: CollectionId, entries: &[(String, Option<Vec<u8>>)]) -> Result<(), Error> {
        let mut by_bucket: BTreeMap<Key, Vec<&(String, Option<Vec<u8>>)>> = BTreeMap::new();
        for entry in entries {
            by_bucket.entry(hash_key(&entry.0)).or_default().push(entry);
        }
        for (bucket_key, group) in by_bucket {
            let mut bucket = self.load_bucket(collection, bucket_key);
            for (path, value) in group {
                match value {
                    Some(bytes) => bucket.upsert(path, bytes.clone()),
                    None => bucket.remove(path),
                }
            }
            self.store_bucket(collection, bucket_key, bucket);
        }
        tracing::debug!(collection = collection.0, entries = entries.len(), "path write");
        Ok(())
    }

    /// Read each path's value, `None` if absent (`SPEC_FULL.md` §4.5
    /// "read").
    pub fn read(&self, collection: CollectionId, paths: &[String]) -> Vec<Option<Vec<u8>>> {
        paths
            .iter()
            .map(|path| {
                let bucket = self.load_bucket(collection, hash_key(path));
                bucket.find(path).map(|entry| entry.value.clone())
            })
            .collect()
    }

    /// Scan for paths matching any of `patterns`, resuming after
    /// `previous` (the last path returned by a prior call) and returning
    /// at most `limit` results in lexicographic order
    /// (`SPEC_FULL.md` §4.5 "match").
    pub fn find_matching(
        &self,
        collection: CollectionId,
        patterns: &[String],
        previous: Option<&str>,
        limit: usize,
    ) -> Result<Vec<(String, Vec<u8>)>, Error> {
        let compiled: Vec<Matcher> = patterns.iter().map(|p| Matcher::compile(p)).collect::<Result<_, Error>>()?;

        let mut bucket_keys = Vec::new();
        let mut cursor = Key::MIN;
        loop {
            let batch = self.engine.scan(collection, cursor, 4096);
            if batch.is_empty() {
                break;
            }
            let last = *batch.last().unwrap();
            let batch_len = batch.len();
            bucket_keys.extend(batch);
            if batch_len < 4096 || last == Key::MAX {
                break;
            }
            cursor = last + 1;
        }

        let mut candidates = Vec::new();
        for bucket_key in bucket_keys {
            let bucket = self.load_bucket(collection, bucket_key);
            for entry in bucket.entries {
                if compiled.iter().any(|m| m.matches(&entry.path)) {
                    candidates.push((entry.path, entry.value));
                }
            }
        }
        candidates.sort_by(|a, b| a.0.cmp(&b.0));

        let start = match previous {
            None => 0,
            Some(previous) => candidates.iter().position(|(path, _)| path.as_str() > previous).unwrap_or(candidates.len()),
        };
        Ok(candidates.into_iter().skip(start).take(limit).collect())
    }
}

enum Matcher {
    Prefix(String),
    Regex(Box<Regex>),
}

impl Matcher {
    fn compile(pattern: &str) -> Result<Matcher, Error> {
        if is_regex_pattern(pattern) {
            Regex::new(pattern)
                .map(|re| Matcher::Regex(Box::new(re)))
                .map_err(|e| Error::ArgumentWrong(format!("invalid path-match regex {pattern:?}: {e}")))
        } else {
            Ok(Matcher::Prefix(pattern.to_string()))
        }
    }

    fn matches(&self, path: &str) -> bool {
        match self {
            Matcher::Prefix(prefix) => path.starts_with(prefix.as_str()),
            Matcher::Regex(re) => re.is_match(path),
        }
    }
}
