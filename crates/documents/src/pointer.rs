//! RFC 6901 JSON-Pointer paths (`SPEC_FULL.md` §4.3).
//!
//! Adapted from the teacher's `JsonPath`/`PathSegment` pair in
//! `core::json`, but parsing the standard `/a/b/0` pointer syntax (with
//! `~0`/`~1` escaping) the spec requires instead of the teacher's dotted
//! `a.b[0]` shorthand.

use std::fmt;

use serde_json::Value;
use ukv_core::Error;

/// One segment of a parsed pointer: either an object key or an array
/// index. Pointers don't distinguish the two syntactically (`/0` could be
/// an object key `"0"` or array index `0`) — which one applies is decided
/// by the value found at that point during traversal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment(pub String);

/// A parsed RFC 6901 JSON-Pointer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JsonPointer {
    segments: Vec<Segment>,
}

impl JsonPointer {
    /// The root pointer (`""`), referring to the whole document.
    pub fn root() -> JsonPointer {
        JsonPointer { segments: Vec::new() }
    }

    /// Parse a pointer string. An empty string is the root pointer; a
    /// non-empty pointer must start with `/`.
    pub fn parse(raw: &str) -> Result<JsonPointer, Error> {
        if raw.is_empty() {
            return Ok(JsonPointer::root());
        }
        if !raw.starts_with('/') {
            return Err(Error::ArgumentWrong(format!("JSON pointer must start with '/': {raw:?}")));
        }
        let segments = raw[1..]
            .split('/')
            .map(|part| Segment(part.replace("~1", "/").replace("~0", "~")))
            .collect();
        Ok(JsonPointer { segments })
    }

    /// This pointer's segments.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// `true` for the root pointer.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// The pointer to this pointer's parent, and the final segment —
    /// `None` for the root pointer. Used by patch ops that need to mutate
    /// the *container* a target lives in (add/remove/replace all operate
    /// on "the parent, at this last key").
    pub fn split_last(&self) -> Option<(JsonPointer, &Segment)> {
        let (last, rest) = self.segments.split_last()?;
        Some((JsonPointer { segments: rest.to_vec() }, last))
    }

    /// Render back to the canonical `/a/b/0` string form.
    pub fn to_string_form(&self) -> String {
        self.to_string()
    }

    /// Append one more segment, descending into a child key or index.
    pub fn push_segment(&mut self, segment: impl Into<String>) {
        self.segments.push(Segment(segment.into()));
    }
}

impl fmt::Display for JsonPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            write!(f, "/{}", segment.0.replace('~', "~0").replace('/', "~1"))?;
        }
        Ok(())
    }
}

/// Array-index meaning of a pointer segment against an array of length
/// `len`: a decimal index, or `-` meaning "one past the end" (RFC 6901 §4,
/// used by JSON-Patch `add` to mean append).
pub enum ArrayIndex {
    /// An ordinary in-bounds or append index.
    At(usize),
    /// Not a valid array index segment at all.
    Invalid,
}

pub(crate) fn array_index(segment: &Segment, len: usize) -> ArrayIndex {
    if segment.0 == "-" {
        return ArrayIndex::At(len);
    }
    if segment.0 == "0" {
        return ArrayIndex::At(0);
    }
    if segment.0.starts_with('0') {
        return ArrayIndex::Invalid; // leading zero is not a valid index per RFC 6901 §4
    }
    match segment.0.parse::<usize>() {
        Ok(i) => ArrayIndex::At(i),
        Err(_) => ArrayIndex::Invalid,
    }
}

/// Read the value at `pointer` within `root`, or `None` if any segment is
/// missing or type-incompatible.
pub fn get<'a>(root: &'a Value, pointer: &JsonPointer) -> Option<&'a Value> {
    let mut current = root;
    for segment in pointer.segments() {
        current = match current {
            Value::Object(map) => map.get(&segment.0)?,
            Value::Array(items) => match array_index(segment, items.len()) {
                ArrayIndex::At(i) => items.get(i)?,
                ArrayIndex::Invalid => return None,
            },
            _ => return None,
        };
    }
    Some(current)
}

/// Mutable variant of [`get`].
pub fn get_mut<'a>(root: &'a mut Value, pointer: &JsonPointer) -> Option<&'a mut Value> {
    let mut current = root;
    for segment in pointer.segments() {
        current = match current {
            Value::Object(map) => map.get_mut(&segment.0)?,
            Value::Array(items) => match array_index(segment, items.len()) {
                ArrayIndex::At(i) => items.get_mut(i)?,
                ArrayIndex::Invalid => return None,
            },
            _ => return None,
        };
    }
    Some(current)
}

/// Set the value at `pointer`, creating missing intermediate objects along
/// the way (the behavior `upsert`/`insert` document writes need). Fails if
/// an intermediate segment exists but is neither an object nor the array
/// index it needs to be.
pub fn set_creating(root: &mut Value, pointer: &JsonPointer, value: Value) -> Result<(), Error> {
    if pointer.is_root() {
        *root = value;
        return Ok(());
    }
    let mut current = root;
    let segments = pointer.segments();
    for segment in &segments[..segments.len() - 1] {
        if current.is_null() {
            *current = Value::Object(serde_json::Map::new());
        }
        current = match current {
            Value::Object(map) => map.entry(segment.0.clone()).or_insert(Value::Object(serde_json::Map::new())),
            Value::Array(items) => match array_index(segment, items.len()) {
                ArrayIndex::At(i) if i < items.len() => &mut items[i],
                _ => return Err(Error::OutOfRange(format!("array index out of bounds in pointer segment {segment:?}"))),
            },
            _ => return Err(Error::ArgumentWrong("JSON pointer traverses through a scalar".into())),
        };
    }
    let last = &segments[segments.len() - 1];
    match current {
        Value::Object(map) => {
            map.insert(last.0.clone(), value);
        }
        Value::Array(items) => match array_index(last, items.len()) {
            ArrayIndex::At(i) if i <= items.len() => {
                if i == items.len() {
                    items.push(value);
                } else {
                    items[i] = value;
                }
            }
            _ => return Err(Error::OutOfRange(format!("array index out of bounds: {}", last.0))),
        },
        Value::Null => {
            *current = Value::Object(serde_json::Map::new());
            if let Value::Object(map) = current {
                map.insert(last.0.clone(), value);
            }
        }
        _ => return Err(Error::ArgumentWrong("JSON pointer target's parent is a scalar".into())),
    }
    Ok(())
}

/// Remove the value at `pointer`, returning the removed value. Fails if
/// the pointer doesn't resolve to anything.
pub fn remove(root: &mut Value, pointer: &JsonPointer) -> Result<Value, Error> {
    let (parent_pointer, last) = pointer
        .split_last()
        .ok_or_else(|| Error::ArgumentWrong("cannot remove the document root".into()))?;
    let parent = get_mut(root, &parent_pointer)
        .ok_or_else(|| Error::OutOfRange(format!("JSON pointer not found: {pointer}")))?;
    match parent {
        Value::Object(map) => map
            .remove(&last.0)
            .ok_or_else(|| Error::OutOfRange(format!("JSON pointer not found: {pointer}"))),
        Value::Array(items) => match array_index(last, items.len()) {
            ArrayIndex::At(i) if i < items.len() => Ok(items.remove(i)),
            _ => Err(Error::OutOfRange(format!("JSON pointer not found: {pointer}"))),
        },
        _ => Err(Error::ArgumentWrong("JSON pointer's parent is a scalar".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_and_renders_round_trip() {
        let p = JsonPointer::parse("/user/friends/0/name").unwrap();
        assert_eq!(p.to_string_form(), "/user/friends/0/name");
    }

    #[test]
    fn tilde_and_slash_escaping_round_trips() {
        let p = JsonPointer::parse("/a~1b/c~0d").unwrap();
        assert_eq!(p.segments()[0].0, "a/b");
        assert_eq!(p.segments()[1].0, "c~d");
        assert_eq!(p.to_string_form(), "/a~1b/c~0d");
    }

    #[test]
    fn get_traverses_objects_and_arrays() {
        let doc = json!({"a": {"b": 1}, "c": [10, 20, 30]});
        assert_eq!(get(&doc, &JsonPointer::parse("/a/b").unwrap()), Some(&json!(1)));
        assert_eq!(get(&doc, &JsonPointer::parse("/c/1").unwrap()), Some(&json!(20)));
        assert_eq!(get(&doc, &JsonPointer::parse("/c/9").unwrap()), None);
    }

    #[test]
    fn set_creating_builds_missing_intermediate_objects() {
        let mut doc = json!({});
        set_creating(&mut doc, &JsonPointer::parse("/a/b").unwrap(), json!(2)).unwrap();
        assert_eq!(doc, json!({"a": {"b": 2}}));
    }

    #[test]
    fn set_creating_dash_appends_to_array() {
        let mut doc = json!({"c": [10, 20]});
        set_creating(&mut doc, &JsonPointer::parse("/c/-").unwrap(), json!(30)).unwrap();
        assert_eq!(doc, json!({"c": [10, 20, 30]}));
    }

    #[test]
    fn remove_deletes_object_key() {
        let mut doc = json!({"a": 1, "b": 2});
        let removed = remove(&mut doc, &JsonPointer::parse("/a").unwrap()).unwrap();
        assert_eq!(removed, json!(1));
        assert_eq!(doc, json!({"b": 2}));
    }
}
