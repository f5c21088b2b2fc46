//! Core types shared across every layer of the engine: keys, collections,
//! generations, blobs, options, limits, capabilities, and errors.
//!
//! This crate defines no behavior of its own — it is the vocabulary the
//! storage, concurrency, and modality crates build on.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod blob;
pub mod capabilities;
pub mod collection;
pub mod error;
pub mod generation;
pub mod key;
pub mod limits;
pub mod options;

pub use blob::{Blob, Entry, WriteValue};
pub use capabilities::Capabilities;
pub use collection::{validate_collection_name, CollectionId, CollectionNameError, MAIN_COLLECTION};
pub use error::{Error, Result};
pub use generation::{generation_overwritten, Generation, GENERATION_FIRST, GENERATION_MISSING};
pub use key::{Key, Role, DEFAULT_EDGE_ID, KEY_UNKNOWN, LENGTH_MISSING, VERTEX_DEGREE_MISSING};
pub use limits::Limits;
pub use options::Options;
