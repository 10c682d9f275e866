use base64ct::{Base64UrlUnpadded, Encoding};

/// Base64url encode bytes without padding.
pub fn base64url_encode(data: &[u8]) -> String {
    Base64UrlUnpadded::encode_string(data)
}

/// Base64url decode a string to bytes.
///
/// Accepts both padded and unpadded input — browser subscription objects
/// are inconsistent about trailing `=`.
pub fn base64url_decode(s: &str) -> Result<Vec<u8>, base64ct::Error> {
    Base64UrlUnpadded::decode_vec(s.trim_end_matches('='))
}

/// True iff every character is in the URL-safe base64 alphabet.
///
/// Length and padding are not checked.
pub fn base64url_validate(s: &str) -> bool {
    s.chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let data = b"Hello, World!";
        let encoded = base64url_encode(data);
        let decoded = base64url_decode(&encoded).unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn no_padding() {
        let encoded = base64url_encode(b"ab");
        assert!(!encoded.contains('='));
    }

    #[test]
    fn url_safe_chars() {
        // Bytes that would produce + and / in standard base64
        let data = vec![0xfb, 0xff, 0xfe];
        let encoded = base64url_encode(&data);
        assert!(!encoded.contains('+'));
        assert!(!encoded.contains('/'));
    }

    #[test]
    fn decodes_padded_input() {
        assert_eq!(base64url_decode("AA==").unwrap(), vec![0u8]);
        assert_eq!(base64url_decode("AAA=").unwrap(), vec![0u8, 0]);
        assert_eq!(base64url_decode("AA").unwrap(), vec![0u8]);
    }

    #[test]
    fn rejects_standard_alphabet() {
        assert!(base64url_decode("a+b/").is_err());
    }

    #[test]
    fn empty_input() {
        assert_eq!(base64url_encode(b""), "");
        assert_eq!(base64url_decode("").unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn validate_accepts_alphabet() {
        assert!(base64url_validate("AZaz09-_"));
        assert!(base64url_validate(""));
    }

    #[test]
    fn validate_rejects_other_chars() {
        assert!(!base64url_validate("abc="));
        assert!(!base64url_validate("a+b"));
        assert!(!base64url_validate("a/b"));
        assert!(!base64url_validate("a b"));
    }
}
