//! P-256 key generation, decoding, and structural validation.
//!
//! The same key shape serves ephemeral ECDH keys and long-term VAPID
//! signing keys: a 65-byte uncompressed SEC1 public point and a 32-byte
//! private scalar.

use p256::elliptic_curve::rand_core::OsRng;
use p256::elliptic_curve::sec1::ToEncodedPoint;
use p256::{PublicKey, SecretKey};
use serde::Serialize;
use zeroize::Zeroize;

use crate::base64url::{base64url_decode, base64url_encode};
use crate::error::CryptoError;
use crate::types::{PRIVATE_KEY_LENGTH, PUBLIC_KEY_LENGTH};

/// A VAPID key pair as URL-safe base64 strings, the form callers store in
/// configuration and hand to browsers.
#[derive(Debug, Clone, Serialize)]
pub struct VapidKeys {
    pub public_key: String,
    pub private_key: String,
}

/// Generate a new P-256 key pair in raw form.
///
/// # Returns
/// Uncompressed public point (65 bytes, leading 0x04) and private scalar
/// (32 bytes).
pub fn generate_key_pair(
) -> Result<([u8; PUBLIC_KEY_LENGTH], [u8; PRIVATE_KEY_LENGTH]), CryptoError> {
    let secret = SecretKey::random(&mut OsRng);
    let point = secret.public_key().to_encoded_point(false);

    let public: [u8; PUBLIC_KEY_LENGTH] =
        point
            .as_bytes()
            .try_into()
            .map_err(|_| CryptoError::InvalidKeyLength {
                field: "generated public key",
                expected: PUBLIC_KEY_LENGTH,
                got: point.as_bytes().len(),
            })?;
    let private: [u8; PRIVATE_KEY_LENGTH] = secret.to_bytes().into();

    Ok((public, private))
}

/// Generate a new VAPID key pair as base64url strings.
pub fn generate_vapid_keys() -> Result<VapidKeys, CryptoError> {
    let (public, mut private) = generate_key_pair()?;
    let keys = VapidKeys {
        public_key: base64url_encode(&public),
        private_key: base64url_encode(&private),
    };
    private.zeroize();
    Ok(keys)
}

/// Decode and structurally validate a base64url public key.
///
/// Must decode to exactly 65 bytes with leading byte 0x04.
pub fn decode_public_key(
    field: &'static str,
    encoded: &str,
) -> Result<[u8; PUBLIC_KEY_LENGTH], CryptoError> {
    let bytes = base64url_decode(encoded).map_err(|e| CryptoError::InvalidBase64 {
        field,
        reason: e.to_string(),
    })?;
    if bytes.len() != PUBLIC_KEY_LENGTH {
        return Err(CryptoError::InvalidKeyLength {
            field,
            expected: PUBLIC_KEY_LENGTH,
            got: bytes.len(),
        });
    }
    if bytes[0] != 0x04 {
        return Err(CryptoError::InvalidKeyPrefix {
            field,
            got: bytes[0],
        });
    }
    // Length validated above, so try_into cannot fail
    Ok(bytes
        .try_into()
        .expect("slice is exactly 65 bytes after length check"))
}

/// Decode and structurally validate a base64url private key (32-byte scalar).
pub fn decode_private_key(
    field: &'static str,
    encoded: &str,
) -> Result<[u8; PRIVATE_KEY_LENGTH], CryptoError> {
    let bytes = base64url_decode(encoded).map_err(|e| CryptoError::InvalidBase64 {
        field,
        reason: e.to_string(),
    })?;
    if bytes.len() != PRIVATE_KEY_LENGTH {
        return Err(CryptoError::InvalidKeyLength {
            field,
            expected: PRIVATE_KEY_LENGTH,
            got: bytes.len(),
        });
    }
    Ok(bytes
        .try_into()
        .expect("slice is exactly 32 bytes after length check"))
}

/// Decode a base64url subscriber auth secret (at least 16 bytes).
pub fn decode_auth_secret(field: &'static str, encoded: &str) -> Result<Vec<u8>, CryptoError> {
    let bytes = base64url_decode(encoded).map_err(|e| CryptoError::InvalidBase64 {
        field,
        reason: e.to_string(),
    })?;
    if bytes.len() < crate::types::AUTH_SECRET_LENGTH {
        return Err(CryptoError::AuthSecretTooShort {
            minimum: crate::types::AUTH_SECRET_LENGTH,
            got: bytes.len(),
        });
    }
    Ok(bytes)
}

/// Import an uncompressed SEC1 public point, rejecting off-curve points.
pub(crate) fn import_public_key(
    field: &'static str,
    bytes: &[u8; PUBLIC_KEY_LENGTH],
) -> Result<PublicKey, CryptoError> {
    PublicKey::from_sec1_bytes(bytes).map_err(|_| CryptoError::NotOnCurve { field })
}
