use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Invalid {field}: expected {expected} bytes, got {got}")]
    InvalidKeyLength {
        field: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("Invalid {field}: uncompressed P-256 point must start with 0x04, got 0x{got:02x}")]
    InvalidKeyPrefix { field: &'static str, got: u8 },

    #[error("Invalid auth secret: must be at least {minimum} bytes, got {got}")]
    AuthSecretTooShort { minimum: usize, got: usize },

    #[error("Invalid base64url in {field}: {reason}")]
    InvalidBase64 { field: &'static str, reason: String },

    #[error("Invalid {field}: not a point on the P-256 curve")]
    NotOnCurve { field: &'static str },

    #[error("Record size must be at least {minimum}, got {got}")]
    RecordSizeTooSmall { minimum: u32, got: u32 },

    #[error("Payload too large for a single record: limit {limit} bytes, got {got}")]
    PayloadTooLarge { limit: usize, got: usize },

    #[error("Subject must use a mailto: or https: URI, got \"{got}\"")]
    InvalidSubject { got: String },

    #[error("Audience must be a push service origin, got \"{got}\"")]
    InvalidAudience { got: String },

    #[error("Token expiration exceeds {limit} seconds: got {got}")]
    ExpirationTooFar { limit: u64, got: u64 },

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Signing failed: {0}")]
    SigningFailed(String),

    #[error("Random number generation failed: {0}")]
    RngFailed(String),
}
