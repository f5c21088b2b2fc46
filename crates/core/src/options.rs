//! The per-request option bitset (`SPEC_FULL.md` §6).
//!
//! Mirrors the original C ABI's `ukv_options_t` flags enum, but as a
//! `Copy` bitset type with named constructors instead of raw integer
//! constants, in the same spirit as the rest of this crate's preference for
//! typed wrappers over bare primitives.

use std::ops::{BitOr, BitOrAssign};

/// Request option bits. Combine with `|`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Options(u8);

impl Options {
    /// No options set.
    pub const NONE: Options = Options(0);
    /// Reads within this call bypass watch-set tracking.
    pub const TRANSACTION_DONT_WATCH: Options = Options(1 << 0);
    /// Preserve prior arena contents across this call.
    pub const DONT_DISCARD_MEMORY: Options = Options(1 << 1);
    /// Back the response arena with shared memory.
    pub const READ_SHARED_MEMORY: Options = Options(1 << 2);
    /// On commit, flush persistent state to disk before returning.
    pub const WRITE_FLUSH: Options = Options(1 << 3);
    /// Hint: caller will consume all scan results (enables read-ahead).
    pub const SCAN_BULK: Options = Options(1 << 4);

    /// `true` if every bit set in `other` is also set in `self`.
    pub fn contains(self, other: Options) -> bool {
        self.0 & other.0 == other.0
    }

    /// Raw bit pattern, for wire encoding.
    pub fn bits(self) -> u8 {
        self.0
    }

    /// Reconstruct from a raw bit pattern. Unknown bits are preserved as-is;
    /// callers that need to reject unknown bits should check
    /// `bits & !Options::ALL.bits() == 0` themselves (see `ukv-engine`'s
    /// wire-request validation, which is the layer responsible for
    /// rejecting unrecognized option bits per §7 "Argument-wrong").
    pub fn from_bits(bits: u8) -> Options {
        Options(bits)
    }

    /// Bitwise-or of every option defined above, for validating that no
    /// unknown bits were supplied.
    pub const ALL: Options = Options(
        Self::TRANSACTION_DONT_WATCH.0
            | Self::DONT_DISCARD_MEMORY.0
            | Self::READ_SHARED_MEMORY.0
            | Self::WRITE_FLUSH.0
            | Self::SCAN_BULK.0,
    );
}

impl BitOr for Options {
    type Output = Options;
    fn bitor(self, rhs: Options) -> Options {
        Options(self.0 | rhs.0)
    }
}

impl BitOrAssign for Options {
    fn bitor_assign(&mut self, rhs: Options) {
        self.0 |= rhs.0;
    }
}
