//! VAPID (RFC 8292) sender authentication.
//!
//! Builds the ES256-signed compact token and formats it into the
//! authentication header value for each content encoding. The aes128gcm
//! form carries the key inline (`vapid t=..., k=...`); the aesgcm form
//! splits token and key across `Authorization` and `Crypto-Key`.

use ecdsa::signature::Signer;
use p256::ecdsa::{Signature, SigningKey};
use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};
use zeroize::Zeroize;

use crate::base64url::base64url_encode;
use crate::error::CryptoError;
use crate::keys::{decode_private_key, decode_public_key};
use crate::types::ContentEncoding;

/// Default token lifetime: 12 hours.
pub const DEFAULT_EXPIRATION_SECONDS: u64 = 12 * 60 * 60;

/// Maximum token lifetime permitted by push services: 24 hours.
pub const MAX_EXPIRATION_SECONDS: u64 = 24 * 60 * 60;

/// Authentication header values for one push request.
#[derive(Debug, Clone)]
pub struct VapidHeaders {
    /// `Authorization` header value.
    pub authorization: String,
    /// `Crypto-Key` fragment (`p256ecdsa=...`), present only for aesgcm.
    pub crypto_key: Option<String>,
}

#[derive(Serialize)]
struct Claims<'a> {
    aud: &'a str,
    exp: u64,
    sub: &'a str,
}

/// Build the authentication header value(s) for a push request.
///
/// # Arguments
/// * `audience` - Push service origin, e.g. `https://fcm.googleapis.com`
/// * `subject` - Sender contact, a `mailto:` or `https:` URI
/// * `public_key` - VAPID public key, base64url (65-byte point)
/// * `private_key` - VAPID private key, base64url (32-byte scalar)
/// * `content_encoding` - Selects the header format
/// * `expiration_seconds` - Token lifetime, default 12 h, capped at 24 h
pub fn build_vapid_headers(
    audience: &str,
    subject: &str,
    public_key: &str,
    private_key: &str,
    content_encoding: ContentEncoding,
    expiration_seconds: Option<u64>,
) -> Result<VapidHeaders, CryptoError> {
    let now_seconds = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| CryptoError::SigningFailed(e.to_string()))?
        .as_secs();
    build_vapid_headers_at(
        audience,
        subject,
        public_key,
        private_key,
        content_encoding,
        expiration_seconds,
        now_seconds,
    )
}

/// As [`build_vapid_headers`], with the clock as a parameter.
fn build_vapid_headers_at(
    audience: &str,
    subject: &str,
    public_key: &str,
    private_key: &str,
    content_encoding: ContentEncoding,
    expiration_seconds: Option<u64>,
    now_seconds: u64,
) -> Result<VapidHeaders, CryptoError> {
    if !subject.starts_with("mailto:") && !subject.starts_with("https:") {
        return Err(CryptoError::InvalidSubject {
            got: subject.to_string(),
        });
    }
    if audience.is_empty() {
        return Err(CryptoError::InvalidAudience {
            got: audience.to_string(),
        });
    }

    let expiration = expiration_seconds.unwrap_or(DEFAULT_EXPIRATION_SECONDS);
    if expiration > MAX_EXPIRATION_SECONDS {
        return Err(CryptoError::ExpirationTooFar {
            limit: MAX_EXPIRATION_SECONDS,
            got: expiration,
        });
    }

    // Re-encode the validated key so the header never carries padding.
    let public = decode_public_key("vapid public key", public_key)?;
    let public_b64 = base64url_encode(&public);

    let mut private = decode_private_key("vapid private key", private_key)?;
    let signing_key = SigningKey::from_bytes(private.as_slice().into())
        .map_err(|e| CryptoError::SigningFailed(e.to_string()));
    private.zeroize();

    let token = sign_token(&signing_key?, audience, subject, now_seconds + expiration)?;

    Ok(match content_encoding {
        ContentEncoding::Aes128Gcm => VapidHeaders {
            authorization: format!("vapid t={}, k={}", token, public_b64),
            crypto_key: None,
        },
        ContentEncoding::AesGcm => VapidHeaders {
            authorization: format!("WebPush {}", token),
            crypto_key: Some(format!("p256ecdsa={}", public_b64)),
        },
    })
}

/// Sign a compact token with ES256 (ECDSA P-256 + SHA-256).
///
/// The signature is the fixed 64-byte IEEE P1363 form (r || s, each half
/// left-padded to 32 bytes), not ASN.1 DER.
fn sign_token(
    signing_key: &SigningKey,
    audience: &str,
    subject: &str,
    expiration: u64,
) -> Result<String, CryptoError> {
    let header = serde_json::json!({"alg": "ES256", "typ": "JWT"});
    let claims = Claims {
        aud: audience,
        exp: expiration,
        sub: subject,
    };

    let header_json =
        serde_json::to_string(&header).map_err(|e| CryptoError::SigningFailed(e.to_string()))?;
    let claims_json =
        serde_json::to_string(&claims).map_err(|e| CryptoError::SigningFailed(e.to_string()))?;

    let signing_input = format!(
        "{}.{}",
        base64url_encode(header_json.as_bytes()),
        base64url_encode(claims_json.as_bytes())
    );

    let signature: Signature = signing_key
        .try_sign(signing_input.as_bytes())
        .map_err(|e| CryptoError::SigningFailed(e.to_string()))?;
    let signature_b64 = base64url_encode(signature.to_bytes().as_slice());

    Ok(format!("{}.{}", signing_input, signature_b64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base64url::base64url_decode;
    use crate::keys::generate_vapid_keys;
    use ecdsa::signature::Verifier;
    use p256::ecdsa::VerifyingKey;
    use serde_json::Value;

    const NOW: u64 = 1_700_000_000;
    const AUDIENCE: &str = "https://push.example";
    const SUBJECT: &str = "mailto:push@example.com";

    fn headers_at(
        encoding: ContentEncoding,
        expiration_seconds: Option<u64>,
    ) -> (crate::keys::VapidKeys, VapidHeaders) {
        let keys = generate_vapid_keys().unwrap();
        let headers = build_vapid_headers_at(
            AUDIENCE,
            SUBJECT,
            &keys.public_key,
            &keys.private_key,
            encoding,
            expiration_seconds,
            NOW,
        )
        .unwrap();
        (keys, headers)
    }

    fn extract_token(headers: &VapidHeaders) -> String {
        let auth = &headers.authorization;
        if let Some(rest) = auth.strip_prefix("vapid t=") {
            rest.split(", k=").next().unwrap().to_string()
        } else {
            auth.strip_prefix("WebPush ").unwrap().to_string()
        }
    }

    fn parse_token(token: &str) -> (Value, Value, Vec<u8>, String) {
        let parts: Vec<&str> = token.split('.').collect();
        assert_eq!(parts.len(), 3);
        let header: Value =
            serde_json::from_slice(&base64url_decode(parts[0]).unwrap()).unwrap();
        let claims: Value =
            serde_json::from_slice(&base64url_decode(parts[1]).unwrap()).unwrap();
        let signature = base64url_decode(parts[2]).unwrap();
        let signing_input = format!("{}.{}", parts[0], parts[1]);
        (header, claims, signature, signing_input)
    }

    #[test]
    fn token_structure() {
        let (_, headers) = headers_at(ContentEncoding::Aes128Gcm, None);
        let token = extract_token(&headers);
        let (header, claims, signature, _) = parse_token(&token);

        assert_eq!(header["alg"], "ES256");
        assert_eq!(header["typ"], "JWT");
        assert_eq!(claims["aud"], AUDIENCE);
        assert_eq!(claims["sub"], SUBJECT);
        assert_eq!(claims["exp"], NOW + DEFAULT_EXPIRATION_SECONDS);
        assert!(claims["exp"].as_u64().unwrap() - NOW <= MAX_EXPIRATION_SECONDS);
        assert_eq!(signature.len(), 64);
    }

    #[test]
    fn signature_verifies_with_public_key() {
        let (keys, headers) = headers_at(ContentEncoding::Aes128Gcm, None);
        let token = extract_token(&headers);
        let (_, _, signature, signing_input) = parse_token(&token);

        let public = base64url_decode(&keys.public_key).unwrap();
        let verifying_key = VerifyingKey::from_sec1_bytes(&public).unwrap();
        let signature = Signature::from_slice(&signature).unwrap();
        assert!(verifying_key
            .verify(signing_input.as_bytes(), &signature)
            .is_ok());
    }

    #[test]
    fn tampered_token_fails_verification() {
        let (keys, headers) = headers_at(ContentEncoding::Aes128Gcm, None);
        let token = extract_token(&headers);
        let (_, _, mut signature, signing_input) = parse_token(&token);

        let public = base64url_decode(&keys.public_key).unwrap();
        let verifying_key = VerifyingKey::from_sec1_bytes(&public).unwrap();

        // Flipped claims byte invalidates the signature
        let mut tampered_input = signing_input.clone().into_bytes();
        let last = tampered_input.len() - 1;
        tampered_input[last] ^= 0x01;
        let good_signature = Signature::from_slice(&signature).unwrap();
        assert!(verifying_key
            .verify(&tampered_input, &good_signature)
            .is_err());

        // Flipped low-order signature byte fails too
        signature[63] ^= 0x01;
        if let Ok(bad_signature) = Signature::from_slice(&signature) {
            assert!(verifying_key
                .verify(signing_input.as_bytes(), &bad_signature)
                .is_err());
        }
    }

    #[test]
    fn aes128gcm_header_format() {
        let (keys, headers) = headers_at(ContentEncoding::Aes128Gcm, None);
        assert!(headers.authorization.starts_with("vapid t="));
        assert!(headers
            .authorization
            .ends_with(&format!(", k={}", keys.public_key)));
        assert!(headers.crypto_key.is_none());
    }

    #[test]
    fn aesgcm_header_format() {
        let (keys, headers) = headers_at(ContentEncoding::AesGcm, None);
        assert!(headers.authorization.starts_with("WebPush "));
        assert!(!headers.authorization.contains("k="));
        assert_eq!(
            headers.crypto_key.as_deref(),
            Some(format!("p256ecdsa={}", keys.public_key).as_str())
        );
    }

    #[test]
    fn crypto_key_fragment_joins_with_dh() {
        // The aesgcm Crypto-Key header is the encryption dh= fragment plus
        // the sender p256ecdsa= fragment.
        let (keys, headers) = headers_at(ContentEncoding::AesGcm, None);
        let combined = format!("dh=ABC; {}", headers.crypto_key.unwrap());
        assert_eq!(
            combined,
            format!("dh=ABC; p256ecdsa={}", keys.public_key)
        );
    }

    #[test]
    fn mailto_subject_scenario() {
        let keys = generate_vapid_keys().unwrap();
        let headers = build_vapid_headers(
            "https://push.example",
            "mailto:push@example.com",
            &keys.public_key,
            &keys.private_key,
            ContentEncoding::Aes128Gcm,
            None,
        )
        .unwrap();
        assert!(headers.authorization.starts_with("vapid t="));
        assert!(headers.authorization.contains(", k="));
    }

    #[test]
    fn https_subject_accepted() {
        let keys = generate_vapid_keys().unwrap();
        assert!(build_vapid_headers_at(
            AUDIENCE,
            "https://example.com/contact",
            &keys.public_key,
            &keys.private_key,
            ContentEncoding::Aes128Gcm,
            None,
            NOW,
        )
        .is_ok());
    }

    #[test]
    fn unsupported_subject_schemes_rejected() {
        let keys = generate_vapid_keys().unwrap();
        for subject in ["http://example.com", "push@example.com", ""] {
            let err = build_vapid_headers_at(
                AUDIENCE,
                subject,
                &keys.public_key,
                &keys.private_key,
                ContentEncoding::Aes128Gcm,
                None,
                NOW,
            )
            .unwrap_err();
            assert!(matches!(err, CryptoError::InvalidSubject { .. }), "{}", subject);
        }
    }

    #[test]
    fn empty_audience_rejected() {
        let keys = generate_vapid_keys().unwrap();
        let err = build_vapid_headers_at(
            "",
            SUBJECT,
            &keys.public_key,
            &keys.private_key,
            ContentEncoding::Aes128Gcm,
            None,
            NOW,
        )
        .unwrap_err();
        assert!(matches!(err, CryptoError::InvalidAudience { .. }));
    }

    #[test]
    fn expiration_capped_at_24_hours() {
        let keys = generate_vapid_keys().unwrap();
        let err = build_vapid_headers_at(
            AUDIENCE,
            SUBJECT,
            &keys.public_key,
            &keys.private_key,
            ContentEncoding::Aes128Gcm,
            Some(MAX_EXPIRATION_SECONDS + 1),
            NOW,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CryptoError::ExpirationTooFar {
                limit: MAX_EXPIRATION_SECONDS,
                got
            } if got == MAX_EXPIRATION_SECONDS + 1
        ));

        let (_, headers) = headers_at(ContentEncoding::Aes128Gcm, Some(MAX_EXPIRATION_SECONDS));
        let (_, claims, _, _) = parse_token(&extract_token(&headers));
        assert_eq!(claims["exp"], NOW + MAX_EXPIRATION_SECONDS);
    }

    #[test]
    fn padded_public_key_is_reencoded_unpadded() {
        let keys = generate_vapid_keys().unwrap();
        let padded = format!("{}=", keys.public_key);
        let headers = build_vapid_headers_at(
            AUDIENCE,
            SUBJECT,
            &padded,
            &keys.private_key,
            ContentEncoding::Aes128Gcm,
            None,
            NOW,
        )
        .unwrap();
        assert!(headers.authorization.ends_with(&format!(", k={}", keys.public_key)));
        assert!(!headers.authorization.ends_with('='));
    }

    #[test]
    fn malformed_keys_rejected() {
        let keys = generate_vapid_keys().unwrap();
        assert!(matches!(
            build_vapid_headers_at(
                AUDIENCE,
                SUBJECT,
                "AAAA",
                &keys.private_key,
                ContentEncoding::Aes128Gcm,
                None,
                NOW,
            )
            .unwrap_err(),
            CryptoError::InvalidKeyLength { expected: 65, .. }
        ));
        assert!(matches!(
            build_vapid_headers_at(
                AUDIENCE,
                SUBJECT,
                &keys.public_key,
                "AAAA",
                ContentEncoding::Aes128Gcm,
                None,
                NOW,
            )
            .unwrap_err(),
            CryptoError::InvalidKeyLength { expected: 32, .. }
        ));
    }

    #[test]
    fn tokens_differ_per_audience() {
        let keys = generate_vapid_keys().unwrap();
        let a = build_vapid_headers_at(
            "https://push-a.example",
            SUBJECT,
            &keys.public_key,
            &keys.private_key,
            ContentEncoding::Aes128Gcm,
            None,
            NOW,
        )
        .unwrap();
        let b = build_vapid_headers_at(
            "https://push-b.example",
            SUBJECT,
            &keys.public_key,
            &keys.private_key,
            ContentEncoding::Aes128Gcm,
            None,
            NOW,
        )
        .unwrap();
        assert_ne!(a.authorization, b.authorization);
    }
}
