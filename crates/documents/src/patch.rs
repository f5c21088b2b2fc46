//! RFC 6902 JSON-Patch (`SPEC_FULL.md` §4.3: "Apply RFC 6902 JSON-Patch
//! operations array: add, remove, replace, copy, move, test").
//!
//! The teacher's own `JsonPatch` (`core::json`) only models `Set`/`Delete`;
//! this extends that idea to the full six-operation RFC, since the
//! document-patch conformance property in `SPEC_FULL.md` §8 requires all
//! six.

use serde::Deserialize;
use serde_json::Value;
use ukv_core::Error;

use crate::pointer::{self, JsonPointer};

/// One operation in a JSON-Patch document (RFC 6902 §4).
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum PatchOp {
    /// Add a value at `path` (or append, for `path` ending in `/-`).
    Add {
        /// Target location.
        path: String,
        /// Value to insert.
        value: Value,
    },
    /// Remove the value at `path`.
    Remove {
        /// Target location.
        path: String,
    },
    /// Replace the value at `path`.
    Replace {
        /// Target location.
        path: String,
        /// Replacement value.
        value: Value,
    },
    /// Move the value at `from` to `path`, removing it from `from`.
    Move {
        /// Source location.
        from: String,
        /// Destination location.
        path: String,
    },
    /// Copy the value at `from` to `path`, leaving `from` untouched.
    Copy {
        /// Source location.
        from: String,
        /// Destination location.
        path: String,
    },
    /// Assert the value at `path` equals `value`; fails the whole patch
    /// (per RFC 6902 §5) if it doesn't.
    Test {
        /// Target location.
        path: String,
        /// Expected value.
        value: Value,
    },
}

/// Apply a sequence of patch operations to `document` in order. Either
/// every operation succeeds and `document` reflects all of them, or the
/// first failure is returned and `document` is left exactly as it was
/// (operations are applied to a scratch copy first — `SPEC_FULL.md` §7:
/// "modality layers never partially apply a modification").
pub fn apply(document: &Value, ops: &[PatchOp]) -> Result<Value, Error> {
    let mut working = document.clone();
    for op in ops {
        apply_one(&mut working, op)?;
    }
    Ok(working)
}

fn apply_one(document: &mut Value, op: &PatchOp) -> Result<(), Error> {
    match op {
        PatchOp::Add { path, value } => {
            let pointer = JsonPointer::parse(path)?;
            pointer::set_creating(document, &pointer, value.clone())
        }
        PatchOp::Remove { path } => {
            let pointer = JsonPointer::parse(path)?;
            pointer::remove(document, &pointer).map(|_| ())
        }
        PatchOp::Replace { path, value } => {
            let pointer = JsonPointer::parse(path)?;
            if pointer::get(document, &pointer).is_none() {
                return Err(Error::OutOfRange(format!("replace target does not exist: {path}")));
            }
            pointer::set_creating(document, &pointer, value.clone())
        }
        PatchOp::Move { from, path } => {
            let from_pointer = JsonPointer::parse(from)?;
            let to_pointer = JsonPointer::parse(path)?;
            let from_segments = from_pointer.segments();
            let to_segments = to_pointer.segments();
            if to_segments.len() > from_segments.len() && &to_segments[..from_segments.len()] == from_segments {
                return Err(Error::ArgumentWrong("move destination is a descendant of the source".into()));
            }
            let value = pointer::remove(document, &from_pointer)?;
            pointer::set_creating(document, &to_pointer, value)
        }
        PatchOp::Copy { from, path } => {
            let from_pointer = JsonPointer::parse(from)?;
            let to_pointer = JsonPointer::parse(path)?;
            let value = pointer::get(document, &from_pointer)
                .ok_or_else(|| Error::OutOfRange(format!("copy source does not exist: {from}")))?
                .clone();
            pointer::set_creating(document, &to_pointer, value)
        }
        PatchOp::Test { path, value } => {
            let pointer = JsonPointer::parse(path)?;
            match pointer::get(document, &pointer) {
                Some(found) if found == value => Ok(()),
                _ => Err(Error::ArgumentWrong(format!("test failed at {path}"))),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn replace_and_append_match_the_spec_scenario() {
        let doc = json!({"a":{"b":1},"c":[10,20,30]});
        let ops = vec![
            PatchOp::Replace { path: "/a/b".into(), value: json!(2) },
            PatchOp::Add { path: "/c/-".into(), value: json!(40) },
        ];
        let result = apply(&doc, &ops).unwrap();
        assert_eq!(result, json!({"a":{"b":2},"c":[10,20,30,40]}));
    }

    #[test]
    fn replace_on_missing_path_fails_and_leaves_original_untouched() {
        let doc = json!({"a": 1});
        let ops = vec![PatchOp::Replace { path: "/missing".into(), value: json!(2) }];
        assert!(apply(&doc, &ops).is_err());
    }

    #[test]
    fn move_relocates_a_value() {
        let doc = json!({"a": 1, "b": null});
        let ops = vec![PatchOp::Move { from: "/a".into(), path: "/b".into() }];
        let result = apply(&doc, &ops).unwrap();
        assert_eq!(result, json!({"b": 1}));
    }

    #[test]
    fn move_rejects_only_true_descendants_not_string_prefix_siblings() {
        let doc = json!({"a": {"b": 1}, "a2": {"b": 2}});
        let ops = vec![PatchOp::Move { from: "/a".into(), path: "/a/b/c".into() }];
        assert!(apply(&doc, &ops).is_err());

        let ops = vec![PatchOp::Move { from: "/a".into(), path: "/a2/b".into() }];
        let result = apply(&doc, &ops).unwrap();
        assert_eq!(result, json!({"a2": {"b": {"b": 1}}}));
    }

    #[test]
    fn copy_leaves_the_source_in_place() {
        let doc = json!({"a": 1});
        let ops = vec![PatchOp::Copy { from: "/a".into(), path: "/b".into() }];
        let result = apply(&doc, &ops).unwrap();
        assert_eq!(result, json!({"a": 1, "b": 1}));
    }

    #[test]
    fn test_op_aborts_the_whole_patch_on_mismatch() {
        let doc = json!({"a": 1});
        let ops = vec![
            PatchOp::Test { path: "/a".into(), value: json!(2) },
            PatchOp::Replace { path: "/a".into(), value: json!(99) },
        ];
        assert!(apply(&doc, &ops).is_err());
    }

    #[test]
    fn remove_deletes_an_array_element() {
        let doc = json!({"items": [1, 2, 3]});
        let ops = vec![PatchOp::Remove { path: "/items/1".into() }];
        let result = apply(&doc, &ops).unwrap();
        assert_eq!(result, json!({"items": [1, 3]}));
    }
}
