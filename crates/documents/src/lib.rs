//! The document modality (`SPEC_FULL.md` §4.3): JSON/BSON/MessagePack
//! encoding, JSON-Pointer field access, RFC 6902/7396 modification
//! operators, gist, and the Arrow-style columnar gather pipeline.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod format;
pub mod gather;
pub mod merge;
pub mod patch;
pub mod pointer;
pub mod store;

pub use format::Format;
pub use gather::{BitBuffer, ColumnData, ColumnType, GatheredColumn};
pub use merge::merge_patch;
pub use patch::{apply as apply_patch, PatchOp};
pub use pointer::JsonPointer;
pub use store::{DocumentStore, WriteMode};
