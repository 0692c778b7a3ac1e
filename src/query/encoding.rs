//! URL component encoding
//!
//! `application/x-www-form-urlencoded` rules: `+` decodes to a space and
//! everything outside the unreserved set is percent-encoded.

use url::form_urlencoded;

/// Percent-encode one query component
pub fn encode_component(text: &str) -> String {
    form_urlencoded::byte_serialize(text.as_bytes()).collect()
}

/// Decode one query component; invalid escapes pass through unchanged
pub fn decode_component(text: &str) -> String {
    // Raw separators are data here, not pair delimiters
    let escaped = text.replace('&', "%26").replace('=', "%3D");
    form_urlencoded::parse(escaped.as_bytes())
        .next()
        .map(|(key, _)| key.into_owned())
        .unwrap_or_default()
}
