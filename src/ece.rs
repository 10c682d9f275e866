//! Encrypted content encoding for Web Push payloads.
//!
//! Implements the aes128gcm encoding (RFC 8291 key schedule, RFC 8188
//! record framing) and the pre-standard aesgcm draft encoding. The two
//! share the ECDH + HKDF-SHA256 skeleton but differ in derivation labels
//! and record layout, so each has its own schedule function.
//!
//! aes128gcm body layout:
//! [salt:16][rs:4 BE][idlen:1 = 65][ephemeral public key:65][records...]
//!
//! aesgcm produces a bare single-record ciphertext; salt and ephemeral key
//! travel in the Encryption and Crypto-Key headers instead.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes128Gcm, Nonce};
use p256::elliptic_curve::rand_core::OsRng;
use p256::elliptic_curve::sec1::ToEncodedPoint;
use p256::SecretKey;
use zeroize::Zeroize;

use crate::base64url::base64url_encode;
use crate::error::CryptoError;
use crate::hkdf::hkdf_derive;
use crate::keys::{decode_auth_secret, decode_public_key, import_public_key};
use crate::types::{
    ContentEncoding, Payload, AES_GCM_NONCE_LENGTH, AES_GCM_TAG_LENGTH, CEK_LENGTH,
    DEFAULT_RECORD_SIZE, MIN_RECORD_SIZE, PUBLIC_KEY_LENGTH, SALT_LENGTH,
};

const IKM_INFO_PREFIX: &[u8] = b"WebPush: info\0";
const KEY_INFO_AES128GCM: &[u8] = b"Content-Encoding: aes128gcm\0";
const NONCE_INFO: &[u8] = b"Content-Encoding: nonce\0";
const PRK_INFO_AESGCM: &[u8] = b"Content-Encoding: auth\0";
const KEY_INFO_AESGCM: &[u8] = b"Content-Encoding: aesgcm\0";
const CONTEXT_LABEL_AESGCM: &[u8] = b"P-256\0";

/// Delimiter appended to every record that has a successor.
const DELIMITER_CONTINUED: u8 = 0x01;
/// Delimiter appended to the final record.
const DELIMITER_FINAL: u8 = 0x02;

/// aesgcm single-record payload limit: 4096 - 16 tag - 2 pad prefix.
const AESGCM_MAX_PAYLOAD: usize = 4078;

const SUBSCRIBER_KEY_FIELD: &str = "subscriber public key";
const AUTH_SECRET_FIELD: &str = "subscriber auth secret";

/// Options for the aes128gcm encoding.
#[derive(Debug, Clone)]
pub struct EncryptOptions {
    /// Record size `rs` written into the body header. Minimum 18.
    pub record_size: u32,
    /// Split oversized payloads across records instead of failing.
    pub allow_multiple_records: bool,
    /// Zero bytes appended after the final delimiter to mask payload length.
    pub final_record_padding: usize,
}

impl Default for EncryptOptions {
    fn default() -> Self {
        Self {
            record_size: DEFAULT_RECORD_SIZE,
            allow_multiple_records: false,
            final_record_padding: 0,
        }
    }
}

/// An encrypted push message body plus the per-message material the caller
/// needs for HTTP headers.
#[derive(Debug, Clone)]
pub struct EncryptedMessage {
    /// Request body. For aes128gcm this includes the in-body header block;
    /// for aesgcm it is the bare ciphertext+tag.
    pub body: Vec<u8>,
    pub salt: [u8; SALT_LENGTH],
    pub ephemeral_public_key: [u8; PUBLIC_KEY_LENGTH],
    pub content_encoding: ContentEncoding,
}

impl EncryptedMessage {
    /// Content-Length implied by the body.
    pub fn content_length(&self) -> usize {
        self.body.len()
    }

    /// `Encryption` header value for the aesgcm encoding.
    pub fn encryption_header(&self) -> String {
        format!("salt={}", base64url_encode(&self.salt))
    }

    /// `Crypto-Key` fragment for the aesgcm encoding, to be joined with the
    /// sender's `p256ecdsa=` fragment.
    pub fn crypto_key_fragment(&self) -> String {
        format!("dh={}", base64url_encode(&self.ephemeral_public_key))
    }
}

/// Encrypt a payload for a subscriber under the given content encoding.
///
/// `options` applies to the aes128gcm encoding; aesgcm is single-record by
/// definition and ignores it.
pub fn encrypt(
    payload: &Payload,
    subscriber_public_key: &str,
    subscriber_auth_secret: &str,
    content_encoding: ContentEncoding,
    options: &EncryptOptions,
) -> Result<EncryptedMessage, CryptoError> {
    match content_encoding {
        ContentEncoding::Aes128Gcm => {
            encrypt_aes128gcm(payload, subscriber_public_key, subscriber_auth_secret, options)
        }
        ContentEncoding::AesGcm => {
            encrypt_aesgcm(payload, subscriber_public_key, subscriber_auth_secret)
        }
    }
}

/// Encrypt a payload with the aes128gcm content encoding.
///
/// # Arguments
/// * `payload` - Message content, normalized to bytes
/// * `subscriber_public_key` - Subscription `p256dh` key, base64url
/// * `subscriber_auth_secret` - Subscription `auth` secret, base64url
/// * `options` - Record size, chunking, and padding controls
///
/// # Returns
/// The full body: `salt || rs || idlen || ephemeral key || records`.
pub fn encrypt_aes128gcm(
    payload: &Payload,
    subscriber_public_key: &str,
    subscriber_auth_secret: &str,
    options: &EncryptOptions,
) -> Result<EncryptedMessage, CryptoError> {
    let (salt, ephemeral) = fresh_materials()?;
    encrypt_aes128gcm_with(
        payload,
        subscriber_public_key,
        subscriber_auth_secret,
        options,
        salt,
        &ephemeral,
    )
}

/// Encrypt a payload with the legacy aesgcm content encoding.
///
/// Single record only. The returned salt and ephemeral key must be sent in
/// the `Encryption` and `Crypto-Key` headers; the body carries only the
/// ciphertext and tag.
pub fn encrypt_aesgcm(
    payload: &Payload,
    subscriber_public_key: &str,
    subscriber_auth_secret: &str,
) -> Result<EncryptedMessage, CryptoError> {
    let (salt, ephemeral) = fresh_materials()?;
    encrypt_aesgcm_with(
        payload,
        subscriber_public_key,
        subscriber_auth_secret,
        salt,
        &ephemeral,
    )
}

/// aes128gcm with caller-supplied salt and ephemeral key, for reproducible
/// output.
fn encrypt_aes128gcm_with(
    payload: &Payload,
    subscriber_public_key: &str,
    subscriber_auth_secret: &str,
    options: &EncryptOptions,
    salt: [u8; SALT_LENGTH],
    ephemeral: &SecretKey,
) -> Result<EncryptedMessage, CryptoError> {
    if options.record_size < MIN_RECORD_SIZE {
        return Err(CryptoError::RecordSizeTooSmall {
            minimum: MIN_RECORD_SIZE,
            got: options.record_size,
        });
    }

    let subscriber_public = decode_public_key(SUBSCRIBER_KEY_FIELD, subscriber_public_key)?;
    let auth_secret = decode_auth_secret(AUTH_SECRET_FIELD, subscriber_auth_secret)?;

    let (mut ecdh_secret, ephemeral_public) = agree(ephemeral, &subscriber_public)?;
    let schedule = derive_aes128gcm_keys(
        &ecdh_secret,
        &auth_secret,
        &subscriber_public,
        &ephemeral_public,
        &salt,
    );
    ecdh_secret.zeroize();
    let (mut cek, nonce_base) = schedule?;

    let records = seal_records(&cek, &nonce_base, payload.as_bytes(), options);
    cek.zeroize();
    let records = records?;

    let mut body =
        Vec::with_capacity(SALT_LENGTH + 4 + 1 + PUBLIC_KEY_LENGTH + records.len());
    body.extend_from_slice(&salt);
    body.extend_from_slice(&options.record_size.to_be_bytes());
    body.push(PUBLIC_KEY_LENGTH as u8);
    body.extend_from_slice(&ephemeral_public);
    body.extend_from_slice(&records);

    Ok(EncryptedMessage {
        body,
        salt,
        ephemeral_public_key: ephemeral_public,
        content_encoding: ContentEncoding::Aes128Gcm,
    })
}

/// aesgcm with caller-supplied salt and ephemeral key.
fn encrypt_aesgcm_with(
    payload: &Payload,
    subscriber_public_key: &str,
    subscriber_auth_secret: &str,
    salt: [u8; SALT_LENGTH],
    ephemeral: &SecretKey,
) -> Result<EncryptedMessage, CryptoError> {
    let data = payload.as_bytes();
    if data.len() > AESGCM_MAX_PAYLOAD {
        return Err(CryptoError::PayloadTooLarge {
            limit: AESGCM_MAX_PAYLOAD,
            got: data.len(),
        });
    }

    let subscriber_public = decode_public_key(SUBSCRIBER_KEY_FIELD, subscriber_public_key)?;
    let auth_secret = decode_auth_secret(AUTH_SECRET_FIELD, subscriber_auth_secret)?;

    let (mut ecdh_secret, ephemeral_public) = agree(ephemeral, &subscriber_public)?;
    let schedule = derive_aesgcm_keys(
        &ecdh_secret,
        &auth_secret,
        &subscriber_public,
        &ephemeral_public,
        &salt,
    );
    ecdh_secret.zeroize();
    let (mut cek, nonce_base) = schedule?;

    // Record layout: two-byte pad-length prefix (zero) ahead of the data.
    let mut plaintext = Vec::with_capacity(2 + data.len());
    plaintext.extend_from_slice(&[0u8, 0u8]);
    plaintext.extend_from_slice(data);

    let cipher = Aes128Gcm::new_from_slice(&cek)
        .map_err(|e| CryptoError::EncryptionFailed(e.to_string()));
    cek.zeroize();
    let nonce = record_nonce(&nonce_base, 0);
    let body = cipher?
        .encrypt(Nonce::from_slice(&nonce), plaintext.as_slice())
        .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

    Ok(EncryptedMessage {
        body,
        salt,
        ephemeral_public_key: ephemeral_public,
        content_encoding: ContentEncoding::AesGcm,
    })
}

/// Fresh per-message salt and ephemeral key.
fn fresh_materials() -> Result<([u8; SALT_LENGTH], SecretKey), CryptoError> {
    let mut salt = [0u8; SALT_LENGTH];
    getrandom::getrandom(&mut salt).map_err(|e| CryptoError::RngFailed(e.to_string()))?;
    Ok((salt, SecretKey::random(&mut OsRng)))
}

/// ECDH against the subscriber key; returns the shared secret and the
/// ephemeral public point in uncompressed form.
fn agree(
    ephemeral: &SecretKey,
    subscriber_public: &[u8; PUBLIC_KEY_LENGTH],
) -> Result<(Vec<u8>, [u8; PUBLIC_KEY_LENGTH]), CryptoError> {
    let remote = import_public_key(SUBSCRIBER_KEY_FIELD, subscriber_public)?;
    let shared =
        p256::ecdh::diffie_hellman(ephemeral.to_nonzero_scalar(), remote.as_affine());

    let point = ephemeral.public_key().to_encoded_point(false);
    let ephemeral_public: [u8; PUBLIC_KEY_LENGTH] = point
        .as_bytes()
        .try_into()
        .expect("uncompressed P-256 point is 65 bytes");

    Ok((shared.raw_secret_bytes().to_vec(), ephemeral_public))
}

/// RFC 8291 key schedule: ECDH secret + auth secret -> (CEK, nonce base).
fn derive_aes128gcm_keys(
    ecdh_secret: &[u8],
    auth_secret: &[u8],
    subscriber_public: &[u8; PUBLIC_KEY_LENGTH],
    ephemeral_public: &[u8; PUBLIC_KEY_LENGTH],
    salt: &[u8; SALT_LENGTH],
) -> Result<(Vec<u8>, Vec<u8>), CryptoError> {
    let mut ikm_info =
        Vec::with_capacity(IKM_INFO_PREFIX.len() + 2 * PUBLIC_KEY_LENGTH);
    ikm_info.extend_from_slice(IKM_INFO_PREFIX);
    ikm_info.extend_from_slice(subscriber_public);
    ikm_info.extend_from_slice(ephemeral_public);

    let mut ikm = hkdf_derive(ecdh_secret, auth_secret, &ikm_info, 32)?;
    let cek = hkdf_derive(&ikm, salt, KEY_INFO_AES128GCM, CEK_LENGTH);
    let nonce_base = hkdf_derive(&ikm, salt, NONCE_INFO, AES_GCM_NONCE_LENGTH);
    ikm.zeroize();
    Ok((cek?, nonce_base?))
}

/// Legacy aesgcm key schedule. The label layout differs from aes128gcm:
/// the PRK is bound to "Content-Encoding: auth" and the per-message infos
/// carry a length-prefixed P-256 context instead of the WebPush info block.
fn derive_aesgcm_keys(
    ecdh_secret: &[u8],
    auth_secret: &[u8],
    subscriber_public: &[u8; PUBLIC_KEY_LENGTH],
    ephemeral_public: &[u8; PUBLIC_KEY_LENGTH],
    salt: &[u8; SALT_LENGTH],
) -> Result<(Vec<u8>, Vec<u8>), CryptoError> {
    let mut prk = hkdf_derive(ecdh_secret, auth_secret, PRK_INFO_AESGCM, 32)?;

    // context = "P-256" 0x00 || len16(subscriber) || subscriber ||
    //           len16(ephemeral) || ephemeral
    let mut context =
        Vec::with_capacity(CONTEXT_LABEL_AESGCM.len() + 2 * (2 + PUBLIC_KEY_LENGTH));
    context.extend_from_slice(CONTEXT_LABEL_AESGCM);
    context.extend_from_slice(&(PUBLIC_KEY_LENGTH as u16).to_be_bytes());
    context.extend_from_slice(subscriber_public);
    context.extend_from_slice(&(PUBLIC_KEY_LENGTH as u16).to_be_bytes());
    context.extend_from_slice(ephemeral_public);

    let mut key_info = Vec::with_capacity(KEY_INFO_AESGCM.len() + context.len());
    key_info.extend_from_slice(KEY_INFO_AESGCM);
    key_info.extend_from_slice(&context);

    let mut nonce_info = Vec::with_capacity(NONCE_INFO.len() + context.len());
    nonce_info.extend_from_slice(NONCE_INFO);
    nonce_info.extend_from_slice(&context);

    let cek = hkdf_derive(&prk, salt, &key_info, CEK_LENGTH);
    let nonce_base = hkdf_derive(&prk, salt, &nonce_info, AES_GCM_NONCE_LENGTH);
    prk.zeroize();
    Ok((cek?, nonce_base?))
}

/// Nonce for record `index`: the nonce base XORed with the big-endian
/// 96-bit record counter.
fn record_nonce(nonce_base: &[u8], index: u64) -> [u8; AES_GCM_NONCE_LENGTH] {
    let mut nonce = [0u8; AES_GCM_NONCE_LENGTH];
    nonce.copy_from_slice(nonce_base);
    let counter = (index as u128).to_be_bytes();
    for (n, c) in nonce.iter_mut().zip(&counter[4..]) {
        *n ^= c;
    }
    nonce
}

/// Split the payload into delimited records and seal each with AES-128-GCM.
fn seal_records(
    cek: &[u8],
    nonce_base: &[u8],
    payload: &[u8],
    options: &EncryptOptions,
) -> Result<Vec<u8>, CryptoError> {
    let rs = options.record_size as usize;
    let data_per_record = rs - 1 - AES_GCM_TAG_LENGTH;

    if !options.allow_multiple_records {
        // Everything including the delimiter and padding must fit in one
        // record of rs bytes once the tag is added.
        let capacity = rs - AES_GCM_TAG_LENGTH;
        if payload.len() + 1 + options.final_record_padding > capacity {
            return Err(CryptoError::PayloadTooLarge {
                limit: capacity.saturating_sub(1 + options.final_record_padding),
                got: payload.len(),
            });
        }
    }

    let record_count = if payload.is_empty() {
        1
    } else {
        payload.len().div_ceil(data_per_record)
    };

    let cipher = Aes128Gcm::new_from_slice(cek)
        .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

    let mut records = Vec::with_capacity(record_count * rs);
    for index in 0..record_count {
        let start = index * data_per_record;
        let end = usize::min(payload.len(), start + data_per_record);
        let final_record = index == record_count - 1;

        let mut plaintext =
            Vec::with_capacity(end - start + 1 + options.final_record_padding);
        plaintext.extend_from_slice(&payload[start..end]);
        plaintext.push(if final_record {
            DELIMITER_FINAL
        } else {
            DELIMITER_CONTINUED
        });
        if final_record {
            plaintext.resize(plaintext.len() + options.final_record_padding, 0);
        }

        let nonce = record_nonce(nonce_base, index as u64);
        let sealed = cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext.as_slice())
            .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;
        records.extend_from_slice(&sealed);
    }

    Ok(records)
}
