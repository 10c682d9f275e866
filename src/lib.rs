//! Cryptographic core for sending Web Push notifications: payload
//! encryption for the aes128gcm and aesgcm content encodings, VAPID
//! sender authentication, and P-256 key handling.

pub mod base64url;
pub mod ece;
pub mod error;
pub mod hkdf;
pub mod keys;
pub mod types;
pub mod vapid;

pub use base64url::{base64url_decode, base64url_encode, base64url_validate};
pub use ece::{encrypt, encrypt_aes128gcm, encrypt_aesgcm, EncryptOptions, EncryptedMessage};
pub use error::CryptoError;
pub use keys::{
    decode_auth_secret, decode_private_key, decode_public_key, generate_key_pair,
    generate_vapid_keys, VapidKeys,
};
pub use types::{
    ContentEncoding, Payload, AUTH_SECRET_LENGTH, DEFAULT_RECORD_SIZE, MIN_RECORD_SIZE,
    PRIVATE_KEY_LENGTH, PUBLIC_KEY_LENGTH, SALT_LENGTH,
};
pub use vapid::{
    build_vapid_headers, VapidHeaders, DEFAULT_EXPIRATION_SECONDS, MAX_EXPIRATION_SECONDS,
};
