//! JOSE error types

use thiserror::Error;

/// JOSE operation result type
pub type JoseResult<T> = Result<T, JoseError>;

/// Key operation named in capability errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOperation {
    /// Producing a signature
    Sign,
    /// Checking a signature
    Verify,
}

impl std::fmt::Display for KeyOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyOperation::Sign => f.write_str("sign"),
            KeyOperation::Verify => f.write_str("verify"),
        }
    }
}

/// JOSE error types
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JoseError {
    /// Malformed compact or JSON serialization
    #[error("invalid JWS format: {0}")]
    InvalidFormat(String),
    /// A segment or member was not valid base64url
    #[error("invalid base64 in {0}")]
    InvalidBase64(&'static str),
    /// A header parameter had the wrong type or value
    #[error("invalid header: {0}")]
    InvalidHeader(String),
    /// The same parameter appears twice across or within headers
    #[error("duplicate header parameter: {0}")]
    DuplicateParameter(String),
    /// No algorithm with this identifier is registered
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),
    /// The algorithm policy refused this identifier
    #[error("algorithm not allowed: {0}")]
    AlgorithmNotAllowed(String),
    /// Header algorithm and bound key algorithm disagree
    #[error("algorithm mismatch: header says {header}, key is bound to {key}")]
    AlgorithmMismatch {
        /// Algorithm named by the header
        header: String,
        /// Algorithm the key was bound to
        key: String,
    },
    /// Key material does not belong to the algorithm family
    #[error("key type mismatch: {0}")]
    KeyTypeMismatch(String),
    /// Key material is below the algorithm's minimum strength
    #[error("weak key rejected: {0}")]
    WeakKey(String),
    /// Key capability metadata does not grant the operation
    #[error("key is not permitted to {0}")]
    CapabilityDenied(KeyOperation),
    /// The algorithm has no usable hash function
    #[error("hash function unavailable")]
    HashUnavailable,
    /// The key cannot perform the operation (missing half or provider failure)
    #[error("signing operation unavailable")]
    SignUnavailable,
    /// Signature does not match the signing input
    #[error("signature mismatch")]
    SignatureMismatch,
    /// No signature of a message could be verified
    #[error("JWS verification failed")]
    VerificationFailed,
    /// The key finder had no key for the headers
    #[error("key not found: {0}")]
    KeyNotFound(String),
    /// Message cannot be used for the requested operation
    #[error("invalid message: {0}")]
    InvalidMessage(String),
    /// JSON encoding or decoding failed
    #[error("serialization error: {0}")]
    Serialization(String),
    /// The operation context was cancelled
    #[error("operation cancelled")]
    Cancelled,
    /// The operation context deadline passed
    #[error("operation deadline exceeded")]
    DeadlineExceeded,
}

impl JoseError {
    /// Create an invalid format error
    #[inline]
    #[must_use]
    pub fn invalid_format(msg: &str) -> Self {
        JoseError::InvalidFormat(msg.to_string())
    }

    /// Create an invalid header error
    #[inline]
    #[must_use]
    pub fn invalid_header(msg: &str) -> Self {
        JoseError::InvalidHeader(msg.to_string())
    }

    /// Create a key type mismatch error
    #[inline]
    #[must_use]
    pub fn key_type_mismatch(msg: &str) -> Self {
        JoseError::KeyTypeMismatch(msg.to_string())
    }

    /// Create a weak key error
    #[inline]
    #[must_use]
    pub fn weak_key(msg: &str) -> Self {
        JoseError::WeakKey(msg.to_string())
    }

    /// Create an invalid message error
    #[inline]
    #[must_use]
    pub fn invalid_message(msg: &str) -> Self {
        JoseError::InvalidMessage(msg.to_string())
    }

    /// Create a serialization error
    #[inline]
    #[must_use]
    pub fn serialization(msg: &str) -> Self {
        JoseError::Serialization(msg.to_string())
    }

    /// Whether the error comes from the operation context rather than the
    /// signature being examined. The verifier never skips past these.
    #[inline]
    #[must_use]
    pub fn is_context_error(&self) -> bool {
        matches!(self, JoseError::Cancelled | JoseError::DeadlineExceeded)
    }
}

impl From<serde_json::Error> for JoseError {
    fn from(err: serde_json::Error) -> Self {
        JoseError::Serialization(err.to_string())
    }
}
