//! Values that can travel through byte-oriented devices.

use serde_json::Value;
use stream::StreamError;

/// Item type carried by dispatched readers and writers.
///
/// Binary devices (buffers, files) produce and consume bytes; a payload type
/// says how to build itself from a chunk and how to turn itself back into
/// bytes.
pub trait Payload: Clone + Send + Sync + 'static {
    /// Builds a value from one chunk.
    fn from_bytes(bytes: Vec<u8>) -> Result<Self, StreamError>;

    /// Converts the value into bytes for a binary sink.
    fn into_bytes(self) -> Result<Vec<u8>, StreamError>;

    /// Length of the longest prefix of `bytes` that forms a complete chunk.
    ///
    /// Chunked readers carry the rest over to the next chunk. The default
    /// treats every byte boundary as complete.
    fn complete_prefix(bytes: &[u8]) -> usize {
        bytes.len()
    }
}

impl Payload for Vec<u8> {
    fn from_bytes(bytes: Vec<u8>) -> Result<Self, StreamError> {
        Ok(bytes)
    }

    fn into_bytes(self) -> Result<Vec<u8>, StreamError> {
        Ok(self)
    }
}

/// Length of the valid UTF-8 prefix, ignoring a truncated trailing sequence.
fn utf8_prefix(bytes: &[u8]) -> usize {
    match std::str::from_utf8(bytes) {
        Ok(_) => bytes.len(),
        Err(err) if err.error_len().is_none() => err.valid_up_to(),
        Err(_) => bytes.len(),
    }
}

impl Payload for String {
    fn from_bytes(bytes: Vec<u8>) -> Result<Self, StreamError> {
        Self::from_utf8(bytes).map_err(StreamError::upstream)
    }

    fn into_bytes(self) -> Result<Vec<u8>, StreamError> {
        Ok(self.into_bytes())
    }

    fn complete_prefix(bytes: &[u8]) -> usize {
        utf8_prefix(bytes)
    }
}

/// Chunks become strings when they are UTF-8 and arrays of byte values otherwise.
impl Payload for Value {
    fn from_bytes(bytes: Vec<u8>) -> Result<Self, StreamError> {
        match String::from_utf8(bytes) {
            Ok(text) => Ok(Self::String(text)),
            Err(err) => Ok(Self::Array(
                err.into_bytes().into_iter().map(Self::from).collect(),
            )),
        }
    }

    fn into_bytes(self) -> Result<Vec<u8>, StreamError> {
        match self {
            Self::String(text) => Ok(text.into_bytes()),
            Self::Array(values) => values
                .iter()
                .map(|value| {
                    value
                        .as_u64()
                        .and_then(|byte| u8::try_from(byte).ok())
                        .ok_or_else(|| StreamError::upstream(format!("not a byte value: {value}")))
                })
                .collect(),
            other => Ok(other.to_string().into_bytes()),
        }
    }

    fn complete_prefix(bytes: &[u8]) -> usize {
        utf8_prefix(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn string_rejects_invalid_utf8() {
        let err = String::from_bytes(vec![0xff, 0xfe]).expect_err("invalid utf-8");
        assert!(matches!(err, StreamError::Upstream { .. }));
    }

    #[test]
    fn string_prefix_stops_before_split_character() {
        let text = "h\u{e9}".as_bytes();
        assert_eq!(String::complete_prefix(text), 3);
        assert_eq!(String::complete_prefix(&text[..2]), 1);
        assert_eq!(Vec::<u8>::complete_prefix(&text[..2]), 2);
    }

    #[test]
    fn json_value_from_bytes() {
        assert_eq!(Value::from_bytes(b"abc".to_vec()).expect("utf-8"), json!("abc"));
        assert_eq!(Value::from_bytes(vec![0xff, 1]).expect("bytes"), json!([255, 1]));
    }

    #[test]
    fn json_value_into_bytes() {
        assert_eq!(json!("hi").into_bytes().expect("string"), b"hi".to_vec());
        assert_eq!(json!([1, 2, 255]).into_bytes().expect("array"), vec![1, 2, 255]);
        assert_eq!(json!({"a": 1}).into_bytes().expect("object"), b"{\"a\":1}".to_vec());
        assert!(json!([256]).into_bytes().is_err());
    }
}
