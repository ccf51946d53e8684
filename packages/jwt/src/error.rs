//! JWT error types

use cryypt_jose::JoseError;
use std::fmt;

/// JWT operation result type
pub type JwtResult<T> = Result<T, JwtError>;

/// JWT error types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JwtError {
    /// Invalid JWT format
    InvalidToken(String),
    /// No signature could be verified
    InvalidSignature,
    /// Token has expired
    TokenExpired,
    /// Token not yet valid
    TokenNotYetValid,
    /// Missing required claim
    MissingClaim(String),
    /// Issuer rejected by the configured verifier
    InvalidIssuer,
    /// Audience rejected by the configured verifier
    InvalidAudience,
    /// Subject rejected by the configured verifier
    InvalidSubject,
    /// Unsupported algorithm
    UnsupportedAlgorithm(String),
    /// Serialization failed
    Serialization(String),
    /// Invalid claims configuration
    InvalidClaims(String),
    /// Error from the signature layer
    Jose(JoseError),
}

impl fmt::Display for JwtError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JwtError::InvalidToken(msg) => write!(f, "Invalid JWT token: {msg}"),
            JwtError::InvalidSignature => write!(f, "Invalid JWT signature"),
            JwtError::TokenExpired => write!(f, "JWT token has expired"),
            JwtError::TokenNotYetValid => write!(f, "JWT token not yet valid"),
            JwtError::MissingClaim(claim) => write!(f, "Missing required claim: {claim}"),
            JwtError::InvalidIssuer => write!(f, "Invalid JWT issuer"),
            JwtError::InvalidAudience => write!(f, "Invalid JWT audience"),
            JwtError::InvalidSubject => write!(f, "Invalid JWT subject"),
            JwtError::UnsupportedAlgorithm(alg) => write!(f, "Unsupported algorithm: {alg}"),
            JwtError::Serialization(msg) => write!(f, "Serialization error: {msg}"),
            JwtError::InvalidClaims(msg) => write!(f, "Invalid claims: {msg}"),
            JwtError::Jose(err) => write!(f, "JWS error: {err}"),
        }
    }
}

impl std::error::Error for JwtError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            JwtError::Jose(err) => Some(err),
            _ => None,
        }
    }
}

impl From<JoseError> for JwtError {
    fn from(err: JoseError) -> Self {
        match err {
            JoseError::VerificationFailed => JwtError::InvalidSignature,
            JoseError::UnsupportedAlgorithm(alg) => JwtError::UnsupportedAlgorithm(alg),
            other => JwtError::Jose(other),
        }
    }
}

impl From<serde_json::Error> for JwtError {
    fn from(err: serde_json::Error) -> Self {
        JwtError::Serialization(err.to_string())
    }
}

impl JwtError {
    /// Create an invalid token error
    #[inline]
    #[must_use]
    pub fn invalid_token(msg: &str) -> Self {
        JwtError::InvalidToken(msg.to_string())
    }

    /// Create a missing claim error
    #[inline]
    #[must_use]
    pub fn missing_claim(claim: &str) -> Self {
        JwtError::MissingClaim(claim.to_string())
    }

    /// Create an invalid claims error
    #[inline]
    #[must_use]
    pub fn invalid_claims(msg: &str) -> Self {
        JwtError::InvalidClaims(msg.to_string())
    }

    /// Whether the operation context was cancelled or ran out of time
    #[inline]
    #[must_use]
    pub fn is_context_error(&self) -> bool {
        matches!(self, JwtError::Jose(err) if err.is_context_error())
    }
}
