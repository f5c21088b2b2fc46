//! Watch-set conflict detection (`SPEC_FULL.md` §4.2).
//!
//! Two checks run for every watched key at stage time: a generation
//! comparison (via [`ukv_core::generation_overwritten`]) and an explicit
//! presence check. The generation check alone already catches almost every
//! conflict; the presence check is the documented backstop for a
//! watched-missing key whose create-then-delete cycle might otherwise
//! "coincidentally" satisfy the raw numeric comparison.

use ukv_core::{generation_overwritten, Generation, GENERATION_MISSING};

/// `true` if a watched key (recorded at generation `recorded` when read,
/// `GENERATION_MISSING` if it was absent) has been overwritten by the time
/// of staging, given the key's `current` committed generation and the
/// engine's `youngest` generation observed at stage time.
pub fn watched_key_conflicts(recorded: Generation, youngest: Generation, current: Generation) -> bool {
    if recorded == GENERATION_MISSING {
        // Watched-missing: any version at all — even one later tombstoned —
        // is a conflict. This subsumes the generation check for the normal
        // case and is the explicit backstop for the create-then-delete
        // pitfall called out in SPEC_FULL.md §4.2.
        current != GENERATION_MISSING
    } else {
        current == GENERATION_MISSING || generation_overwritten(recorded, youngest, current)
    }
}
