//! The ordered-set engine: the committed, MVCC-versioned key-value store
//! that every modality and the transaction layer build on
//! (`SPEC_FULL.md` §4.1).

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod chain;
pub mod collections;
pub mod engine;
pub mod persist;
pub mod shard;
pub mod snapshot;

pub use chain::{StoredVersion, VersionChain};
pub use collections::CollectionTable;
pub use engine::{Engine, Measurement, DEFAULT_SHARD_COUNT};
pub use shard::{Shard, ShardKey};
pub use snapshot::{Snapshot, SnapshotRegistry};
