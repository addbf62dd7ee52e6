//! Bit-exact construction and parsing of tus protocol headers.

use crate::base64;
use std::fmt::Write as _;

/// The protocol version this crate speaks. Sent as `Tus-Resumable` on every request and expected
/// back on every response.
pub const TUS_RESUMABLE: &str = "1.0.0";

/// Separator between a parent client key and a partial upload's unique suffix.
pub const PARTIAL_KEY_SEPARATOR: char = '+';

pub const HEADER_TUS_RESUMABLE: &str = "Tus-Resumable";
pub const HEADER_TUS_VERSION: &str = "Tus-Version";
pub const HEADER_TUS_EXTENSION: &str = "Tus-Extension";
pub const HEADER_TUS_MAX_SIZE: &str = "Tus-Max-Size";
pub const HEADER_UPLOAD_LENGTH: &str = "Upload-Length";
pub const HEADER_UPLOAD_KEY: &str = "Upload-Key";
pub const HEADER_UPLOAD_OFFSET: &str = "Upload-Offset";
pub const HEADER_UPLOAD_METADATA: &str = "Upload-Metadata";
pub const HEADER_UPLOAD_CHECKSUM: &str = "Upload-Checksum";
pub const HEADER_UPLOAD_CONCAT: &str = "Upload-Concat";
pub const HEADER_LOCATION: &str = "Location";
pub const HEADER_CONTENT_TYPE: &str = "Content-Type";
pub const HEADER_CONTENT_LENGTH: &str = "Content-Length";

/// Fixed `Content-Type` sent on every `PATCH`.
pub const PATCH_CONTENT_TYPE: &str = "application/offset+octet-stream";

/// Encodes a single `key value` pair list as the `Upload-Metadata` header value.
///
/// Each pair is rendered `<key> <base64(value)>`; pairs are joined with `,`. `key` MUST NOT
/// contain a space or comma; this is a caller invariant, not validated here, mirroring the
/// protocol's own silence on the matter.
pub fn encode_metadata<'a, I>(pairs: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a [u8])>,
{
    let mut out = String::new();
    for (key, value) in pairs {
        if !out.is_empty() {
            out.push(',');
        }
        out.push_str(key);
        out.push(' ');
        out.push_str(&base64::encode(value));
    }
    out
}

/// Parses an `Upload-Metadata` header value into `(key, decoded value)` pairs. Malformed pairs
/// (missing value, undecodable Base64) are skipped rather than failing the whole parse, since a
/// single unexpected key should not make every other key unreadable.
pub fn parse_metadata(header: &str) -> Vec<(String, Vec<u8>)> {
    header
        .split(',')
        .filter_map(|pair| {
            let pair = pair.trim();
            let (key, encoded) = pair.split_once(' ')?;
            let decoded = base64::decode(encoded.trim().as_bytes()).ok()?;
            Some((key.to_string(), decoded))
        })
        .collect()
}

/// Encodes an `Upload-Checksum` header value: `<algorithm> <base64(digest)>`.
pub fn encode_checksum(algorithm: &str, digest: &[u8]) -> String {
    let mut out = String::with_capacity(algorithm.len() + 1 + digest.len() * 2);
    out.push_str(algorithm);
    out.push(' ');
    out.push_str(&base64::encode(digest));
    out
}

/// Parses an `Upload-Checksum` header value into `(algorithm, digest)`.
pub fn parse_checksum(header: &str) -> Option<(String, Vec<u8>)> {
    let (algorithm, encoded) = header.trim().split_once(' ')?;
    let digest = base64::decode(encoded.trim().as_bytes()).ok()?;
    Some((algorithm.to_string(), digest))
}

/// Encodes the `Upload-Concat` header value for a partial upload.
pub fn encode_concat_partial() -> &'static str {
    "partial"
}

/// Encodes the `Upload-Concat` header value for a final (concatenating) upload, given the
/// already-resolved partial URLs in caller order.
pub fn encode_concat_final<'a, I>(partial_urls: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut out = String::from("final;");
    let mut first = true;
    for url in partial_urls {
        if !first {
            out.push(' ');
        }
        first = false;
        out.push_str(url);
    }
    out
}

/// Parses `Tus-Version` / `Tus-Extension` comma-separated header values into a list, preserving
/// order and keeping unrecognized tokens verbatim.
pub fn parse_csv(header: &str) -> Vec<String> {
    header
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Renders a decimal byte count, the format every length/offset header uses on the wire.
pub fn format_u64(value: u64) -> String {
    let mut out = String::new();
    let _ = write!(out, "{value}");
    out
}

/// Merges caller-supplied headers into a protocol header list, keyed case-insensitively.
///
/// A user header whose name collides with one already present is dropped; `protocol` headers are
/// laid down first and always win, satisfying the "user headers never override protocol headers"
/// invariant without requiring the caller to know which names are reserved.
pub fn merge_user_headers<'a>(
    protocol: Vec<(&'a str, String)>,
    user: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> Vec<(String, String)> {
    let mut out: Vec<(String, String)> = protocol
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect();
    for (name, value) in user {
        let reserved = out.iter().any(|(existing, _)| existing.eq_ignore_ascii_case(name));
        if !reserved {
            out.push((name.to_string(), value.to_string()));
        }
    }
    out
}
