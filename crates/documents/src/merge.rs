//! RFC 7396 JSON Merge Patch (`SPEC_FULL.md` §4.3: "nulls remove keys;
//! objects recursively merged; scalars replace").
//!
//! Adapted directly from the teacher's `merge_patch_inner` in
//! `core::json`, operating on `serde_json::Value` rather than the
//! teacher's `JsonValue` newtype.

use serde_json::{Map, Value};

/// Apply `patch` to `target` in place per RFC 7396.
pub fn merge_patch(target: &mut Value, patch: &Value) {
    if let Value::Object(patch_obj) = patch {
        if !target.is_object() {
            *target = Value::Object(Map::new());
        }
        if let Value::Object(target_obj) = target {
            for (key, value) in patch_obj {
                if value.is_null() {
                    target_obj.remove(key);
                } else if let Some(existing) = target_obj.get_mut(key) {
                    merge_patch(existing, value);
                } else {
                    target_obj.insert(key.clone(), value.clone());
                }
            }
        }
    } else {
        *target = patch.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn null_removes_a_key() {
        let mut target = json!({"a": 1, "b": 2});
        merge_patch(&mut target, &json!({"b": null}));
        assert_eq!(target, json!({"a": 1}));
    }

    #[test]
    fn nested_objects_merge_recursively() {
        let mut target = json!({"a": {"x": 1, "y": 2}});
        merge_patch(&mut target, &json!({"a": {"y": 3, "z": 4}}));
        assert_eq!(target, json!({"a": {"x": 1, "y": 3, "z": 4}}));
    }

    #[test]
    fn scalar_patch_replaces_the_whole_target() {
        let mut target = json!({"a": 1});
        merge_patch(&mut target, &json!("replaced"));
        assert_eq!(target, json!("replaced"));
    }

    #[test]
    fn arrays_are_replaced_not_merged() {
        let mut target = json!({"a": [1, 2, 3]});
        merge_patch(&mut target, &json!({"a": [9]}));
        assert_eq!(target, json!({"a": [9]}));
    }
}
