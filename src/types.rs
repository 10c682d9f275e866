/// Salt length in bytes, stored in the aes128gcm body header.
pub const SALT_LENGTH: usize = 16;

/// Uncompressed SEC1 P-256 public point: 0x04 marker + two 32-byte coordinates.
pub const PUBLIC_KEY_LENGTH: usize = 65;

/// Raw P-256 private scalar length in bytes.
pub const PRIVATE_KEY_LENGTH: usize = 32;

/// Minimum subscriber auth secret length in bytes.
pub const AUTH_SECRET_LENGTH: usize = 16;

/// AES-GCM nonce length in bytes (96 bits).
pub const AES_GCM_NONCE_LENGTH: usize = 12;

/// AES-GCM tag length in bytes (128 bits).
pub const AES_GCM_TAG_LENGTH: usize = 16;

/// Content-encryption key length in bytes (AES-128).
pub const CEK_LENGTH: usize = 16;

/// Default record size for the aes128gcm encoding.
pub const DEFAULT_RECORD_SIZE: u32 = 4096;

/// Minimum record size: 1 data byte + 1 delimiter + 16-byte tag.
pub const MIN_RECORD_SIZE: u32 = 18;

/// Web Push content encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentEncoding {
    /// RFC 8291 / RFC 8188 encoding with the in-body header block.
    Aes128Gcm,
    /// Pre-standard draft encoding; salt and key travel in HTTP headers.
    AesGcm,
}

impl ContentEncoding {
    /// The Content-Encoding header value for this encoding.
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentEncoding::Aes128Gcm => "aes128gcm",
            ContentEncoding::AesGcm => "aesgcm",
        }
    }
}

/// Message payload accepted at the API boundary.
///
/// Normalized to bytes before any crypto operation; text payloads are
/// encrypted as their UTF-8 encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Text(String),
    Binary(Vec<u8>),
}

impl Payload {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Payload::Text(s) => s.as_bytes(),
            Payload::Binary(b) => b.as_slice(),
        }
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }
}

impl From<&str> for Payload {
    fn from(s: &str) -> Self {
        Payload::Text(s.to_string())
    }
}

impl From<String> for Payload {
    fn from(s: String) -> Self {
        Payload::Text(s)
    }
}

impl From<&[u8]> for Payload {
    fn from(b: &[u8]) -> Self {
        Payload::Binary(b.to_vec())
    }
}

impl From<Vec<u8>> for Payload {
    fn from(b: Vec<u8>) -> Self {
        Payload::Binary(b)
    }
}
