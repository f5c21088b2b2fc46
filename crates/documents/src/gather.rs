//! The document "gather" pipeline: columnar projection of a batch of
//! documents into Arrow-style validity/conversion/collision bitmaps
//! (`SPEC_FULL.md` §4.3).
//!
//! Hand-rolled rather than built on the `arrow` crate — gather here only
//! ever needs three parallel bit-packed presence flags plus one
//! fixed-or-variable-width data buffer per column, which doesn't justify
//! pulling in Arrow's full columnar memory model (see `DESIGN.md`).

use serde_json::Value;

use crate::pointer::{self, JsonPointer};

/// A bit-packed boolean buffer, one bit per row.
#[derive(Debug, Clone)]
pub struct BitBuffer {
    bits: Vec<u8>,
    len: usize,
}

impl BitBuffer {
    /// A buffer of `len` bits, all initially `false`.
    pub fn zeroed(len: usize) -> BitBuffer {
        BitBuffer { bits: vec![0u8; (len + 7) / 8], len }
    }

    /// Number of bits in this buffer.
    pub fn len(&self) -> usize {
        self.len
    }

    /// `true` if this buffer holds no bits.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Read bit `index`.
    pub fn get(&self, index: usize) -> bool {
        (self.bits[index / 8] >> (index % 8)) & 1 == 1
    }

    /// Set bit `index` to `value`.
    pub fn set(&mut self, index: usize, value: bool) {
        let byte = &mut self.bits[index / 8];
        let mask = 1u8 << (index % 8);
        if value {
            *byte |= mask;
        } else {
            *byte &= !mask;
        }
    }

    /// Render as one `bool` per row, for tests and debugging.
    pub fn to_vec(&self) -> Vec<bool> {
        (0..self.len).map(|i| self.get(i)).collect()
    }
}

/// The requested scalar type for one gathered column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    /// 32-bit signed integer.
    I32,
    /// 64-bit signed integer.
    I64,
    /// 64-bit float.
    F64,
    /// Boolean.
    Bool,
    /// UTF-8 string (variable-length).
    String,
    /// Opaque bytes (variable-length).
    Bytes,
}

/// The data buffer backing one gathered column, laid out according to its
/// [`ColumnType`].
#[derive(Debug, Clone)]
pub enum ColumnData {
    /// One `i32` per row (placeholder `0` where invalid).
    I32(Vec<i32>),
    /// One `i64` per row.
    I64(Vec<i64>),
    /// One `f64` per row.
    F64(Vec<f64>),
    /// One bit per row.
    Bool(BitBuffer),
    /// Variable-length data: `offsets` has `rows + 1` entries (Arrow-style
    /// offset buffer) into the single joined `bytes` buffer; row `i`'s
    /// slice is `bytes[offsets[i]..offsets[i+1]]`.
    Variable { offsets: Vec<u32>, bytes: Vec<u8> },
}

/// One gathered column: presence/coercion/conflict bitmaps plus the data.
#[derive(Debug, Clone)]
pub struct GatheredColumn {
    /// `true` where a value existed and was successfully produced.
    pub validity: BitBuffer,
    /// `true` where the stored type differed from requested and was
    /// coerced.
    pub conversion: BitBuffer,
    /// `true` where a value existed but was structurally incompatible.
    pub collision: BitBuffer,
    /// The column's data buffer.
    pub data: ColumnData,
}

enum Cell {
    Missing,
    Exact(Value),
    Coerced(Value),
    Collision,
}

fn classify(value: Option<&Value>, column_type: ColumnType) -> Cell {
    let Some(value) = value else { return Cell::Missing };
    let exact = match (column_type, value) {
        (ColumnType::I32, Value::Number(n)) if n.is_i64() => n.as_i64().and_then(|v| i32::try_from(v).ok()).is_some(),
        (ColumnType::I64, Value::Number(n)) => n.is_i64(),
        (ColumnType::F64, Value::Number(n)) => n.is_f64() || n.is_i64(),
        (ColumnType::Bool, Value::Bool(_)) => true,
        (ColumnType::String, Value::String(_)) => true,
        (ColumnType::Bytes, Value::String(_)) => true,
        _ => false,
    };
    if exact {
        return Cell::Exact(value.clone());
    }
    let coerced = match (column_type, value) {
        (ColumnType::I32 | ColumnType::I64, Value::String(s)) => s.parse::<i64>().ok().map(Value::from),
        (ColumnType::F64, Value::String(s)) => s.parse::<f64>().ok().map(Value::from),
        (ColumnType::String, Value::Number(n)) => Some(Value::from(n.to_string())),
        (ColumnType::Bool, Value::Number(n)) => n.as_i64().map(|v| Value::from(v != 0)),
        _ => None,
    };
    match coerced {
        Some(v) => Cell::Coerced(v),
        None => match value {
            Value::Object(_) | Value::Array(_) | Value::Null => Cell::Collision,
            _ => Cell::Collision,
        },
    }
}

/// Gather `columns` out of `documents`, producing one [`GatheredColumn`]
/// per requested `(path, type)` pair.
pub fn gather(documents: &[Option<Value>], columns: &[(JsonPointer, ColumnType)]) -> Vec<GatheredColumn> {
    columns
        .iter()
        .map(|(path, column_type)| gather_column(documents, path, *column_type))
        .collect()
}

fn gather_column(documents: &[Option<Value>], path: &JsonPointer, column_type: ColumnType) -> GatheredColumn {
    let rows = documents.len();
    let mut validity = BitBuffer::zeroed(rows);
    let mut conversion = BitBuffer::zeroed(rows);
    let mut collision = BitBuffer::zeroed(rows);

    let is_variable = matches!(column_type, ColumnType::String | ColumnType::Bytes);
    let mut i32s = Vec::with_capacity(if is_variable { 0 } else { rows });
    let mut i64s = Vec::with_capacity(0);
    let mut f64s = Vec::with_capacity(0);
    let mut bools = BitBuffer::zeroed(if matches!(column_type, ColumnType::Bool) { rows } else { 0 });
    let mut offsets = Vec::with_capacity(if is_variable { rows + 1 } else { 0 });
    let mut bytes = Vec::new();
    if is_variable {
        offsets.push(0u32);
    }

    for (row, document) in documents.iter().enumerate() {
        let found = document.as_ref().and_then(|doc| pointer::get(doc, path));
        let cell = classify(found, column_type);
        let (value, is_valid, is_conversion, is_collision) = match cell {
            Cell::Missing => (None, false, false, false),
            Cell::Exact(v) => (Some(v), true, false, false),
            Cell::Coerced(v) => (Some(v), true, true, false),
            Cell::Collision => (None, false, false, true),
        };
        validity.set(row, is_valid);
        conversion.set(row, is_conversion);
        collision.set(row, is_collision);

        match column_type {
            ColumnType::I32 => i32s.push(value.as_ref().and_then(|v| v.as_i64()).and_then(|v| i32::try_from(v).ok()).unwrap_or(0)),
            ColumnType::I64 => i64s.push(value.as_ref().and_then(|v| v.as_i64()).unwrap_or(0)),
            ColumnType::F64 => f64s.push(value.as_ref().and_then(|v| v.as_f64()).unwrap_or(0.0)),
            ColumnType::Bool => bools.set(row, value.as_ref().and_then(|v| v.as_bool()).unwrap_or(false)),
            ColumnType::String => {
                let s = value.as_ref().and_then(|v| v.as_str()).unwrap_or("");
                bytes.extend_from_slice(s.as_bytes());
                offsets.push(bytes.len() as u32);
            }
            ColumnType::Bytes => {
                let s = value.as_ref().and_then(|v| v.as_str()).unwrap_or("");
                bytes.extend_from_slice(s.as_bytes());
                offsets.push(bytes.len() as u32);
            }
        }
    }

    let data = match column_type {
        ColumnType::I32 => ColumnData::I32(i32s),
        ColumnType::I64 => ColumnData::I64(i64s),
        ColumnType::F64 => ColumnData::F64(f64s),
        ColumnType::Bool => ColumnData::Bool(bools),
        ColumnType::String | ColumnType::Bytes => ColumnData::Variable { offsets, bytes },
    };

    GatheredColumn { validity, conversion, collision, data }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn matches_the_spec_gather_scenario() {
        let docs = vec![
            Some(json!({"x": "10"})),
            Some(json!({"x": 42})),
            Some(json!({"y": "oops"})),
        ];
        let path = JsonPointer::parse("/x").unwrap();
        let columns = gather(&docs, &[(path, ColumnType::I32)]);
        let column = &columns[0];
        assert_eq!(column.validity.to_vec(), vec![true, true, false]);
        assert_eq!(column.conversion.to_vec(), vec![true, false, false]);
        assert_eq!(column.collision.to_vec(), vec![false, false, false]);
        match &column.data {
            ColumnData::I32(values) => assert_eq!(values, &vec![10, 42, 0]),
            _ => panic!("expected I32 column"),
        }
    }

    #[test]
    fn object_where_scalar_expected_is_a_collision() {
        let docs = vec![Some(json!({"x": {"nested": true}}))];
        let path = JsonPointer::parse("/x").unwrap();
        let columns = gather(&docs, &[(path, ColumnType::I32)]);
        assert_eq!(columns[0].collision.to_vec(), vec![true]);
        assert_eq!(columns[0].validity.to_vec(), vec![false]);
    }

    #[test]
    fn variable_length_string_column_shares_one_joined_buffer() {
        let docs = vec![Some(json!({"x": "hi"})), Some(json!({"x": "there"}))];
        let path = JsonPointer::parse("/x").unwrap();
        let columns = gather(&docs, &[(path, ColumnType::String)]);
        match &columns[0].data {
            ColumnData::Variable { offsets, bytes } => {
                assert_eq!(offsets, &vec![0, 2, 7]);
                assert_eq!(&bytes[0..2], b"hi");
                assert_eq!(&bytes[2..7], b"there");
            }
            _ => panic!("expected variable-length column"),
        }
    }
}
