//! Size limits enforced by the engine and wire-request validation.
//!
//! Mirrors the shape of the teacher codebase's own `Limits` type: a plain
//! `Default`-able struct of `usize` fields, checked by the validation layer
//! rather than baked into every call site.

/// Size limits for blobs, collection names, and batch sizes.
#[derive(Debug, Clone)]
pub struct Limits {
    /// Maximum collection name length in bytes.
    pub max_collection_name_bytes: usize,
    /// Maximum blob length in bytes (default: ~4 GiB, per `SPEC_FULL.md` §3).
    pub max_blob_bytes: usize,
    /// Maximum number of tasks (keys) accepted in a single batched call.
    pub max_batch_tasks: usize,
    /// Maximum nesting depth accepted by the documents modality.
    pub max_document_depth: usize,
    /// Maximum path-string length accepted by the paths modality.
    pub max_path_bytes: usize,
    /// Maximum number of `(path, value)` entries packed into one bucket
    /// before a path write forces a second bucket entry (soft limit; actual
    /// buckets are unbounded in count, this just avoids pathological linear
    /// scans within one bucket).
    pub max_bucket_entries: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_collection_name_bytes: 1024,
            max_blob_bytes: 4 * 1024 * 1024 * 1024, // ~4 GiB
            max_batch_tasks: 1_000_000,
            max_document_depth: 128,
            max_path_bytes: 4096,
            max_bucket_entries: 4096,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let limits = Limits::default();
        assert!(limits.max_blob_bytes > 0);
        assert!(limits.max_batch_tasks > 0);
    }
}
