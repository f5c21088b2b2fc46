//! The database facade (`SPEC_FULL.md` §2): wires wire-request validation,
//! the ordered-set engine, transactions, and the document/graph/path
//! modality adapters into one `Database` type.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod database;
pub mod validation;

pub use config::{DatabaseConfig, DatabaseConfigBuilder};
pub use database::{Database, ReadBatch};
