//! Document wire formats (`SPEC_FULL.md` §4.3: "documents are accepted and
//! returned as JSON, BSON, or MessagePack; the engine's internal
//! representation is always a parsed `serde_json::Value`").

use ukv_core::Error;

/// A document wire format a caller can read or write in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Plain JSON text.
    Json,
    /// BSON (MongoDB wire format).
    Bson,
    /// MessagePack.
    MsgPack,
}

/// Parse `bytes` in `format` into the internal `serde_json::Value`
/// representation.
pub fn decode(format: Format, bytes: &[u8]) -> Result<serde_json::Value, Error> {
    match format {
        Format::Json => serde_json::from_slice(bytes).map_err(|e| Error::ArgumentWrong(format!("invalid JSON: {e}"))),
        Format::Bson => {
            let document =
                bson::from_slice::<bson::Document>(bytes).map_err(|e| Error::ArgumentWrong(format!("invalid BSON: {e}")))?;
            bson::from_document(document).map_err(|e| Error::ArgumentWrong(format!("BSON does not map to a document: {e}")))
        }
        Format::MsgPack => {
            rmp_serde::from_slice(bytes).map_err(|e| Error::ArgumentWrong(format!("invalid MessagePack: {e}")))
        }
    }
}

/// Render `value` into `format`'s wire bytes.
pub fn encode(format: Format, value: &serde_json::Value) -> Result<Vec<u8>, Error> {
    match format {
        Format::Json => serde_json::to_vec(value).map_err(|e| Error::ErrorUnknown(format!("failed to serialize JSON: {e}"))),
        Format::Bson => {
            let document = bson::to_document(value).map_err(|e| Error::ArgumentWrong(format!("value does not fit BSON: {e}")))?;
            let mut out = Vec::new();
            document
                .to_writer(&mut out)
                .map_err(|e| Error::ErrorUnknown(format!("failed to serialize BSON: {e}")))?;
            Ok(out)
        }
        Format::MsgPack => {
            rmp_serde::to_vec(value).map_err(|e| Error::ErrorUnknown(format!("failed to serialize MessagePack: {e}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_round_trips() {
        let value = json!({"a": 1, "b": [true, "x"]});
        let bytes = encode(Format::Json, &value).unwrap();
        assert_eq!(decode(Format::Json, &bytes).unwrap(), value);
    }

    #[test]
    fn bson_round_trips_a_document() {
        let value = json!({"a": 1, "b": "text"});
        let bytes = encode(Format::Bson, &value).unwrap();
        assert_eq!(decode(Format::Bson, &bytes).unwrap(), value);
    }

    #[test]
    fn msgpack_round_trips() {
        let value = json!({"a": 1, "b": [1, 2, 3]});
        let bytes = encode(Format::MsgPack, &value).unwrap();
        assert_eq!(decode(Format::MsgPack, &bytes).unwrap(), value);
    }

    #[test]
    fn invalid_json_is_an_argument_error() {
        assert!(decode(Format::Json, b"not json").is_err());
    }
}
