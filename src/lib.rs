//! Transactional, multi-modal, embedded key-value engine with
//! document/graph/path modalities (`SPEC_FULL.md` §1-2).
//!
//! This crate is a thin re-export of [`ukv_api`]; application code should
//! depend on it directly rather than reaching into individual workspace
//! members.

pub use ukv_api::*;
