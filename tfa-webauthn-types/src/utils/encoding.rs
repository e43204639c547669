//! Utility functions for encoding datatypes in a consistent way across the `tfa-webauthn` crates,
//! tolerant of the encodings browsers and legacy U2F registrations actually produce.

use data_encoding::{Encoding, Specification, BASE64, BASE64URL, BASE64URL_NOPAD, BASE64_NOPAD};

/// Convert bytes to base64 without padding
pub fn base64(data: &[u8]) -> String {
    BASE64_NOPAD.encode(data)
}

/// Convert bytes to base64url without padding
pub fn base64url(data: &[u8]) -> String {
    BASE64URL_NOPAD.encode(data)
}

fn lenient(spec: Specification) -> Option<Encoding> {
    Specification {
        check_trailing_bits: false,
        padding: None,
        ..spec
    }
    .encoding()
    .ok()
}

/// Try parsing from base64 with or without padding
pub fn try_from_base64(input: &str) -> Option<Vec<u8>> {
    let encoding = lenient(BASE64.specification())?;
    encoding
        .decode(input.trim_end_matches('=').as_bytes())
        .ok()
}

/// Try parsing from base64url with or without padding
pub fn try_from_base64url(input: &str) -> Option<Vec<u8>> {
    let encoding = lenient(BASE64URL.specification())?;
    encoding
        .decode(input.trim_end_matches('=').as_bytes())
        .ok()
}

/// Try parsing a "websafe" base64 string, the encoding legacy U2F libraries used for key handles.
///
/// The URL-safe characters are mapped back onto the standard alphabet before decoding, so a
/// handle stored in either alphabet yields the same bytes.
pub fn try_from_websafe_base64(input: &str) -> Option<Vec<u8>> {
    let standard: String = input
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();
    try_from_base64(&standard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn websafe_and_standard_decode_to_same_bytes() {
        let raw = [0xfb, 0xef, 0xbe, 0xff, 0x01];
        let standard = BASE64.encode(&raw);
        let websafe = base64url(&raw);
        assert_ne!(standard.trim_end_matches('='), websafe);

        assert_eq!(try_from_websafe_base64(&websafe).as_deref(), Some(&raw[..]));
        assert_eq!(try_from_websafe_base64(&standard).as_deref(), Some(&raw[..]));
    }

    #[test]
    fn padding_is_optional() {
        assert_eq!(try_from_base64("AQ=="), Some(vec![1]));
        assert_eq!(try_from_base64("AQ"), Some(vec![1]));
        assert_eq!(try_from_base64url("AQ=="), Some(vec![1]));
        assert_eq!(try_from_base64url("AQ"), Some(vec![1]));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(try_from_base64url("*!*"), None);
        assert_eq!(try_from_websafe_base64("a b"), None);
    }
}
