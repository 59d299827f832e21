/// Failure modes for signing, linking, and integrity validation.
#[derive(Debug, thiserror::Error)]
pub enum IntegrityError {
    /// The signature did not verify against the claimed author's public key.
    #[error("signature verification failed")]
    BadSignature,

    /// `author` was not a valid hex-encoded Ed25519 public key.
    #[error("malformed author key: {0}")]
    MalformedAuthor(#[source] ed25519_dalek::SignatureError),

    /// A decoded key or signature had the wrong byte length.
    #[error("expected {expected} bytes, got {got}")]
    WrongLength { expected: usize, got: usize },

    /// `integrity` was not a valid 64-byte Ed25519 signature.
    #[error("malformed integrity bytes: {0}")]
    MalformedSignature(#[source] ed25519_dalek::SignatureError),

    /// The recomputed hash chain value did not match the claimed `integrity`.
    #[error("hash chain mismatch")]
    ChainMismatch,

    /// Hex decoding of `author` or `integrity` failed.
    #[error("hex decode error: {0}")]
    Hex(#[from] hex::FromHexError),
}
