//! JSON Web Signature messages (RFC 7515, RFC 7797)
//!
//! A [`Message`] is the parsed or in-progress form of a JWS in any
//! serialization. Each [`Signature`] keeps the protected header exactly as it
//! appeared on the wire; signing inputs are always rebuilt from that text and
//! the payload as it was transmitted, never from decoded header values.

mod finder;
mod parse;
mod policy;
mod serialize;
mod sign;
mod verify;

pub use finder::{KeyFinder, KeySetFinder, StaticKeyFinder};
pub use policy::{AlgorithmPolicy, AllowList, UnsafeAcceptAnyAlgorithm};
pub use verify::{Signer, Verified, Verifier};

use crate::codec::base64_url_encode;
use crate::error::{JoseError, JoseResult};
use crate::header::Header;
use std::borrow::Cow;

/// Critical extensions this engine implements
pub(crate) const UNDERSTOOD_CRITICAL: [&str; 1] = ["b64"];

/// One signature of a [`Message`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    protected: Header,
    unprotected: Option<Header>,
    protected_raw: String,
    signature: Vec<u8>,
}

impl Signature {
    /// Integrity-protected header (empty when the signature has none)
    #[must_use]
    pub fn protected(&self) -> &Header {
        &self.protected
    }

    /// Unprotected header, if present
    #[must_use]
    pub fn unprotected(&self) -> Option<&Header> {
        self.unprotected.as_ref()
    }

    /// Base64url protected header text as it appeared on the wire
    #[must_use]
    pub fn protected_raw(&self) -> &str {
        &self.protected_raw
    }

    /// Raw signature bytes
    #[must_use]
    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    /// `alg` from the protected header, falling back to the unprotected one
    #[must_use]
    pub fn algorithm(&self) -> Option<&str> {
        self.protected
            .algorithm()
            .or_else(|| self.unprotected.as_ref().and_then(Header::algorithm))
    }

    /// Union of both headers
    pub fn merged_header(&self) -> JoseResult<Header> {
        match &self.unprotected {
            Some(unprotected) => Header::merge(&self.protected, unprotected),
            None => Ok(self.protected.clone()),
        }
    }
}

/// A JWS payload with zero or more signatures.
///
/// A message without signatures is a valid signing target but cannot be
/// verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    payload: Option<Vec<u8>>,
    encoded_payload: Option<String>,
    detached: bool,
    signatures: Vec<Signature>,
}

impl Message {
    /// Signing target carrying `payload`
    #[must_use]
    pub fn new(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            payload: Some(payload.into()),
            encoded_payload: None,
            detached: false,
            signatures: Vec::new(),
        }
    }

    /// Signing target whose payload is left out of every serialization
    /// (RFC 7515 Appendix F)
    #[must_use]
    pub fn new_detached(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            detached: true,
            ..Self::new(payload)
        }
    }

    /// Payload bytes after `b64` interpretation. `None` for a parsed detached
    /// message until [`Message::attach_payload`] is called.
    #[must_use]
    pub fn payload(&self) -> Option<&[u8]> {
        self.payload.as_deref()
    }

    /// Whether the payload travels outside the serialization
    #[must_use]
    pub fn is_detached(&self) -> bool {
        self.detached
    }

    /// Signatures in document order
    #[must_use]
    pub fn signatures(&self) -> &[Signature] {
        &self.signatures
    }

    /// Supply the payload of a detached message. A compact message parsed
    /// with an empty payload segment accepts one too, and becomes detached.
    pub fn attach_payload(&mut self, payload: impl Into<Vec<u8>>) -> JoseResult<()> {
        if !self.detached && self.payload.as_deref().is_some_and(|p| !p.is_empty()) {
            return Err(JoseError::invalid_message(
                "payload can only be attached to a detached message",
            ));
        }
        self.payload = Some(payload.into());
        self.encoded_payload = None;
        self.detached = true;
        Ok(())
    }

    /// Effective `b64` value shared by every signature; `true` when the
    /// message has no signatures yet.
    #[must_use]
    pub fn base64_payload(&self) -> bool {
        self.signatures
            .first()
            .and_then(|sig| sig.protected.base64_payload())
            .unwrap_or(true)
    }

    /// Payload as it goes into the signing input for the given `b64` value.
    pub(crate) fn content(&self, b64: bool) -> JoseResult<Cow<'_, [u8]>> {
        let payload = self.payload.as_deref().ok_or_else(|| {
            JoseError::invalid_message("detached payload has not been supplied")
        })?;
        if !b64 {
            return Ok(Cow::Borrowed(payload));
        }
        Ok(match &self.encoded_payload {
            Some(text) => Cow::Borrowed(text.as_bytes()),
            None => Cow::Owned(base64_url_encode(payload).into_bytes()),
        })
    }

    /// Bytes covered by `signature`: `protected_raw || '.' || content`.
    pub fn signing_input(&self, signature: &Signature) -> JoseResult<Vec<u8>> {
        let content = self.content(self.base64_payload())?;
        Ok(signing_input(&signature.protected_raw, &content))
    }
}

pub(crate) fn signing_input(protected_raw: &str, content: &[u8]) -> Vec<u8> {
    let mut input = Vec::with_capacity(protected_raw.len() + 1 + content.len());
    input.extend_from_slice(protected_raw.as_bytes());
    input.push(b'.');
    input.extend_from_slice(content);
    input
}

/// Checks shared by parsing and signing. Returns the effective `b64`.
pub(crate) fn check_headers(protected: &Header, unprotected: Option<&Header>) -> JoseResult<bool> {
    if let Some(unprotected) = unprotected {
        for name in ["b64", "crit"] {
            if unprotected.contains(name) {
                return Err(JoseError::InvalidHeader(format!(
                    "{name} must be in the protected header"
                )));
            }
        }
        Header::merge(protected, unprotected)?;
    }
    match protected.base64_payload() {
        Some(_) if !protected.is_critical("b64") => Err(JoseError::invalid_header(
            "b64 must be listed in crit",
        )),
        Some(b64) => Ok(b64),
        None => Ok(true),
    }
}
