//! Serde for index rows.
//!
//! Index entries encode two logical fields into their range bytes: the label
//! value the row was indexed under and the chunk key (or series ID) the row
//! points at. Both are var-u64 length-prefixed so the encoding is
//! self-delimiting:
//!
//! ```text
//! | var_u64 len | label_value | var_u64 len | chunk_key |
//! ```
//!
//! Label-name rows carry a JSON-encoded string array in their value bytes
//! instead, e.g. `["job","env"]`.

use bytes::{BufMut, Bytes, BytesMut};
use thiserror::Error;

/// Error raised when index row bytes cannot be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct EncodingError {
    pub message: String,
}

impl EncodingError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Variable-length u64 encoding (LEB128).
pub mod var_u64 {
    use super::*;

    /// Appends `value` to `buf` in LEB128 form.
    pub fn serialize(mut value: u64, buf: &mut BytesMut) {
        while value >= 0x80 {
            buf.put_u8((value as u8) | 0x80);
            value >>= 7;
        }
        buf.put_u8(value as u8);
    }

    /// Reads a LEB128 value from the front of `buf`, advancing it.
    pub fn deserialize(buf: &mut &[u8]) -> Result<u64, EncodingError> {
        let mut value = 0u64;
        let mut shift = 0u32;
        loop {
            let (byte, rest) = buf
                .split_first()
                .ok_or_else(|| EncodingError::new("truncated var_u64"))?;
            *buf = rest;
            if shift >= 64 {
                return Err(EncodingError::new("var_u64 overflows u64"));
            }
            value |= u64::from(byte & 0x7f) << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
            shift += 7;
        }
    }
}

fn put_len_prefixed(data: &[u8], buf: &mut BytesMut) {
    var_u64::serialize(data.len() as u64, buf);
    buf.put_slice(data);
}

fn get_len_prefixed<'a>(buf: &mut &'a [u8]) -> Result<&'a [u8], EncodingError> {
    let len = var_u64::deserialize(buf)? as usize;
    if buf.len() < len {
        return Err(EncodingError::new(format!(
            "length prefix {} exceeds remaining {} bytes",
            len,
            buf.len()
        )));
    }
    let (data, rest) = buf.split_at(len);
    *buf = rest;
    Ok(data)
}

/// Encodes an index entry's range bytes from a chunk key and label value.
pub fn encode_entry_range(chunk_key: &str, label_value: &str) -> Bytes {
    let mut buf = BytesMut::with_capacity(chunk_key.len() + label_value.len() + 4);
    put_len_prefixed(label_value.as_bytes(), &mut buf);
    put_len_prefixed(chunk_key.as_bytes(), &mut buf);
    buf.freeze()
}

/// Decodes an index entry's range bytes into `(chunk_key, label_value)`.
pub fn decode_entry_range(range: &[u8]) -> Result<(String, String), EncodingError> {
    let mut buf = range;
    let label_value = get_len_prefixed(&mut buf)?;
    let chunk_key = get_len_prefixed(&mut buf)?;
    let label_value = std::str::from_utf8(label_value)
        .map_err(|_| EncodingError::new("label value is not valid utf-8"))?;
    let chunk_key = std::str::from_utf8(chunk_key)
        .map_err(|_| EncodingError::new("chunk key is not valid utf-8"))?;
    Ok((chunk_key.to_string(), label_value.to_string()))
}

/// Encodes a label-name row value as a JSON string array.
pub fn encode_label_names(names: &[String]) -> Bytes {
    Bytes::from(serde_json::to_vec(names).expect("string arrays always serialize"))
}

/// Decodes a label-name row value.
pub fn decode_label_names(value: &[u8]) -> Result<Vec<String>, EncodingError> {
    serde_json::from_slice(value)
        .map_err(|err| EncodingError::new(format!("invalid label names row: {}", err)))
}
