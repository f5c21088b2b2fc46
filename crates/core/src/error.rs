//! Error types for the engine.
//!
//! The original C ABI conveys failure as a null-terminated string, with the
//! error *kind* encoded as a string prefix. This rewrite uses an ordinary
//! `Result<T, Error>` as the primary contract, but keeps [`Error::to_wire_string`]
//! so a future FFI shim can reproduce the original convention byte-for-byte
//! (`SPEC_FULL.md` §6/§7).

use thiserror::Error;

/// Result type alias used throughout the engine.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for every public operation.
///
/// Variant names map directly onto the "Error kinds" enumerated in
/// `SPEC_FULL.md` §7; each carries the detail a caller needs to react
/// (retry, fix arguments, fall back to another backend) without parsing a
/// string.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid stride, null required pointer, malformed path, unknown
    /// option bit, or otherwise a structurally invalid argument.
    #[error("argument-wrong: {0}")]
    ArgumentWrong(String),

    /// Arena growth or container allocation failed.
    #[error("out-of-memory: {0}")]
    OutOfMemory(String),

    /// Scan/limit arithmetic overflow, or a field path out of document
    /// bounds.
    #[error("out-of-range: {0}")]
    OutOfRange(String),

    /// Mutually exclusive options, or an incompatible txn/collection
    /// pairing.
    #[error("args-combo: {0}")]
    ArgsCombo(String),

    /// Operation not supported by the selected backend.
    #[error("missing-feature: {0}")]
    MissingFeature(String),

    /// A database/transaction handle was used after being dropped, or
    /// before being initialized.
    #[error("uninitialized-state: {0}")]
    UninitializedState(String),

    /// Remote transport failed (client only; unused by the embedded path).
    #[error("network: {0}")]
    Network(String),

    /// A watched entry was overwritten, or a watched-missing entry now
    /// exists — the transaction must retry.
    #[error("transaction-conflict: {0}")]
    TransactionConflict(String),

    /// An internal invariant was violated.
    #[error("error-unknown: {0}")]
    ErrorUnknown(String),
}

impl Error {
    /// The stable reason-code string used in the wire protocol's error
    /// prefix convention.
    pub fn reason_code(&self) -> &'static str {
        match self {
            Error::ArgumentWrong(_) => "argument-wrong",
            Error::OutOfMemory(_) => "out-of-memory",
            Error::OutOfRange(_) => "out-of-range",
            Error::ArgsCombo(_) => "args-combo",
            Error::MissingFeature(_) => "missing-feature",
            Error::UninitializedState(_) => "uninitialized-state",
            Error::Network(_) => "network",
            Error::TransactionConflict(_) => "transaction-conflict",
            Error::ErrorUnknown(_) => "error-unknown",
        }
    }

    /// `true` for errors a caller should retry (currently just conflicts).
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::TransactionConflict(_))
    }

    /// Render the null-terminated-string form the original C ABI exposes,
    /// for any future FFI layer that needs it. The embedded Rust API never
    /// needs this — use the `Err` variant directly.
    pub fn to_wire_string(&self) -> String {
        format!("{}: {}\0", self.reason_code(), self)
    }

    /// Log this error at the severity the teacher codebase uses: ordinary
    /// caller-input mistakes are `debug!`, engine-internal problems are
    /// `warn!` (`SPEC_FULL.md` §7, "Ambient logging").
    pub fn log(&self) {
        match self {
            Error::ArgumentWrong(_) | Error::ArgsCombo(_) | Error::MissingFeature(_) => {
                tracing::debug!(reason = self.reason_code(), "{}", self);
            }
            _ => {
                tracing::warn!(reason = self.reason_code(), "{}", self);
            }
        }
    }
}
