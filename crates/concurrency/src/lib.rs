//! Optimistic-concurrency transaction protocol over the ordered-set engine
//! (`SPEC_FULL.md` §4.2).

#![warn(missing_docs)]
#![warn(clippy::all)]

pub(crate) mod conflict;
pub mod transaction;

pub use transaction::{Transaction, TransactionStatus};
