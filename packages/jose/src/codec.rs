//! Base64url transcoding for JWS segments
//!
//! All JWS segments use the URL-safe alphabet without padding (RFC 7515 §2).
//! Decoding is strict: padding characters and non-canonical trailing bits are
//! rejected, so a decoded segment maps back to exactly one wire form.

use crate::error::{JoseError, JoseResult};
use base64::{
    Engine as _,
    engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD},
};

/// Base64 URL-safe encoding without padding (RFC 7515)
#[inline]
pub fn base64_url_encode(input: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(input)
}

/// Base64 URL-safe decoding without padding (RFC 7515)
///
/// `what` names the segment in the error.
#[inline]
pub fn base64_url_decode(input: &[u8], what: &'static str) -> JoseResult<Vec<u8>> {
    URL_SAFE_NO_PAD
        .decode(input)
        .map_err(|_| JoseError::InvalidBase64(what))
}

/// Standard (padded) base64, used only by the `x5c` header parameter.
#[inline]
pub(crate) fn base64_std_decode(input: &str, what: &'static str) -> JoseResult<Vec<u8>> {
    STANDARD
        .decode(input)
        .map_err(|_| JoseError::InvalidBase64(what))
}

/// Scratch space for one encode or decode session.
///
/// A scratch buffer belongs to exactly one parse, sign or verify call. It is
/// handed around by `&mut` and is never stored in shared state, so two
/// concurrent calls can never observe each other's bytes.
#[derive(Debug, Default)]
pub struct Base64Scratch {
    bytes: Vec<u8>,
    text: String,
}

impl Base64Scratch {
    /// Fresh scratch space for a new session
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode `input` into the scratch buffer and borrow the result.
    pub fn decode<'a>(&'a mut self, input: &[u8], what: &'static str) -> JoseResult<&'a [u8]> {
        self.bytes.clear();
        URL_SAFE_NO_PAD
            .decode_vec(input, &mut self.bytes)
            .map_err(|_| JoseError::InvalidBase64(what))?;
        Ok(&self.bytes)
    }

    /// Encode `input` into the scratch text and borrow the result.
    pub fn encode<'a>(&'a mut self, input: &[u8]) -> &'a str {
        self.text.clear();
        URL_SAFE_NO_PAD.encode_string(input, &mut self.text);
        &self.text
    }
}
