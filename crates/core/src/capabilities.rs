//! Compile-/runtime capability flags a backend must honor (`SPEC_FULL.md` §6).

/// Capability flags callers must check before relying on optional features.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// `true` if this backend supports `begin`/`stage`/`commit` transactions.
    pub supports_transactions: bool,
    /// `true` if this backend supports named collections beyond `main`.
    pub supports_named_collections: bool,
    /// `true` if this backend supports pinned read snapshots.
    pub supports_snapshots: bool,
}

impl Capabilities {
    /// The full in-memory engine built by this crate family supports all
    /// three; a stripped-down backend (e.g. a single-collection STL-style
    /// engine, mentioned in `SPEC_FULL.md` §7 as an example of
    /// `MissingFeature`) would report fewer.
    pub const FULL: Capabilities = Capabilities {
        supports_transactions: true,
        supports_named_collections: true,
        supports_snapshots: true,
    };
}
