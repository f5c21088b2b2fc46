//! Named collections: independent ordered maps within one database.
//!
//! A distinguished *main* collection always exists under a reserved handle.
//! Named collections are created/dropped explicitly; handles are opaque
//! 64-bit identifiers, unique within a database's lifetime, carrying no
//! ownership semantics of their own (the database exclusively owns the name
//! table — see `SPEC_FULL.md` §9, "Shared-pointer graphs").

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque handle to a collection. Copyable, carries no ownership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CollectionId(pub u64);

/// Handle reserved for the always-present main collection.
pub const MAIN_COLLECTION: CollectionId = CollectionId(0);

/// Name reserved for the main collection in persistence headers and listings.
pub const MAIN_COLLECTION_NAME: &str = "";

impl CollectionId {
    /// Render as the `0x<16-hex-digit>` form used in the persistence header.
    pub fn to_hex(self) -> String {
        format!("0x{:016x}", self.0)
    }
}

impl fmt::Display for CollectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Validation errors for a proposed collection name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CollectionNameError {
    /// Name was empty (only the main collection may use the empty name, and
    /// only implicitly).
    #[error("collection name cannot be empty")]
    Empty,
    /// Name contained a NUL byte, which the persistence header's line-based
    /// format cannot represent.
    #[error("collection name cannot contain NUL bytes")]
    ContainsNul,
    /// Name contained a newline, which would corrupt the persistence
    /// header's one-line-per-collection layout.
    #[error("collection name cannot contain newlines")]
    ContainsNewline,
}

/// Validate a user-supplied collection name.
pub fn validate_collection_name(name: &str) -> Result<(), CollectionNameError> {
    if name.is_empty() {
        return Err(CollectionNameError::Empty);
    }
    if name.contains('\0') {
        return Err(CollectionNameError::ContainsNul);
    }
    if name.contains('\n') {
        return Err(CollectionNameError::ContainsNewline);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn main_collection_hex_is_stable() {
        assert_eq!(MAIN_COLLECTION.to_hex(), "0x0000000000000000");
    }

    #[test]
    fn rejects_empty_and_embedded_nul() {
        assert_eq!(validate_collection_name(""), Err(CollectionNameError::Empty));
        assert_eq!(
            validate_collection_name("a\0b"),
            Err(CollectionNameError::ContainsNul)
        );
    }

    #[test]
    fn accepts_ordinary_names() {
        assert!(validate_collection_name("movies.graph").is_ok());
    }
}
