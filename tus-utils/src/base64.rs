//! Base64 encoding helpers.
//!
//! The tus protocol specifies standard (not URL-safe) Base64 for every header value that embeds
//! binary data (`Upload-Metadata` values, `Upload-Checksum` digests).

pub use base64::DecodeError;
use std::result::Result;

/// Encodes `data` as standard Base64, matching `Upload-Metadata`/`Upload-Checksum` wire format.
pub fn encode(data: &[u8]) -> String {
    base64::encode_config(data, base64::STANDARD)
}

/// Encodes `data` as standard Base64 into an existing buffer.
pub fn encode_buf(data: &[u8], encoded: &mut String) {
    base64::encode_config_buf(data, base64::STANDARD, encoded)
}

/// Decodes a standard Base64 string back into bytes.
pub fn decode(data: &[u8]) -> Result<Vec<u8>, DecodeError> {
    base64::decode_config(data, base64::STANDARD)
}

/// Decodes a standard Base64 string into an existing buffer.
pub fn decode_buf(data: &[u8], decoded: &mut Vec<u8>) -> Result<(), DecodeError> {
    base64::decode_config_buf(data, base64::STANDARD, decoded)
}
