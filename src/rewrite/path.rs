//! Request path encoding for forwarding.

use percent_encoding::{percent_decode_str, percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Everything except the characters a URI component may carry unescaped.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encode each `/`-separated segment independently.
///
/// Segments are decoded first, so already-escaped input is not escaped twice
/// and an encoded `%2F` stays inside its segment.
pub fn encode_path(path: &str) -> String {
    if path.is_empty() {
        return String::new();
    }
    path.split('/')
        .map(|segment| {
            let raw: Vec<u8> = percent_decode_str(segment).collect();
            percent_encode(&raw, SEGMENT).to_string()
        })
        .collect::<Vec<_>>()
        .join("/")
}
