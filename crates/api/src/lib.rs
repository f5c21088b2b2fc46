//! Public facade for the embedded transactional multi-modal key-value
//! engine (`SPEC_FULL.md` §1-2).
//!
//! Re-exports the pieces most callers need — [`Database`], its
//! configuration, and the document/graph/path modality types — so a
//! dependent crate only needs `ukv-api` rather than every individual
//! workspace member.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub use ukv_core::{
    validate_collection_name, Blob, Capabilities, CollectionId, Entry, Error, Generation, Key, Limits, Options, Result,
    Role, WriteValue, DEFAULT_EDGE_ID, GENERATION_FIRST, GENERATION_MISSING, KEY_UNKNOWN, MAIN_COLLECTION,
    VERTEX_DEGREE_MISSING,
};
pub use ukv_documents::{ColumnType, DocumentStore, Format, GatheredColumn, JsonPointer, PatchOp, WriteMode};
pub use ukv_engine::{Database, DatabaseConfig, DatabaseConfigBuilder, ReadBatch};
pub use ukv_graphs::{Edge, GraphStore, VertexEdges};
pub use ukv_paths::PathStore;
pub use ukv_storage::{Measurement, Snapshot};

#[cfg(feature = "embedded")]
pub use ukv_concurrency::{Transaction, TransactionStatus};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_cache_is_reachable_through_the_facade() {
        let db = Database::cache();
        assert!(db.capabilities().supports_transactions);
        db.write_batch(MAIN_COLLECTION, &[(1, Some(b"hi".to_vec()))]).unwrap();
        let batch = db.read_batch(MAIN_COLLECTION, &[1], None).unwrap();
        assert!(batch.presence[0]);
    }
}
