//! Compact and JSON serialization

use super::{Message, Signature};
use crate::codec::{Base64Scratch, base64_url_encode};
use crate::error::{JoseError, JoseResult};
use crate::header::Header;
use serde::Serialize;
use std::borrow::Cow;

#[derive(Serialize)]
struct JsonSignatureOut<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    protected: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    header: Option<&'a Header>,
    signature: String,
}

#[derive(Serialize)]
struct FlattenedOut<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    payload: Option<Cow<'a, str>>,
    #[serde(flatten)]
    signature: JsonSignatureOut<'a>,
}

#[derive(Serialize)]
struct GeneralOut<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    payload: Option<Cow<'a, str>>,
    signatures: Vec<JsonSignatureOut<'a>>,
}

impl Message {
    /// Compact serialization. Needs exactly one signature with a protected
    /// header and no unprotected header. A detached message has an empty
    /// payload segment.
    pub fn compact(&self) -> JoseResult<String> {
        self.compact_with(self.detached)
    }

    /// Compact serialization with the payload segment left empty
    pub fn compact_detached(&self) -> JoseResult<String> {
        self.compact_with(true)
    }

    fn compact_with(&self, detached: bool) -> JoseResult<String> {
        let signature = self.single_signature("compact")?;
        if signature.unprotected.as_ref().is_some_and(|h| !h.is_empty()) {
            return Err(JoseError::invalid_message(
                "compact serialization cannot carry an unprotected header",
            ));
        }
        if signature.protected_raw.is_empty() {
            return Err(JoseError::invalid_message(
                "compact serialization needs a protected header",
            ));
        }

        let payload = if detached {
            Cow::Borrowed("")
        } else {
            let payload = self.payload_text()?;
            if !self.base64_payload() && payload.contains('.') {
                return Err(JoseError::invalid_message(
                    "unencoded payload containing '.' cannot use the compact form",
                ));
            }
            payload
        };

        let mut scratch = Base64Scratch::new();
        let signature_text = scratch.encode(&signature.signature);
        Ok(format!(
            "{}.{}.{}",
            signature.protected_raw, payload, signature_text
        ))
    }

    /// Flattened JSON serialization (RFC 7515 §7.2.2); needs exactly one
    /// signature.
    pub fn to_flattened_json(&self) -> JoseResult<String> {
        let signature = self.single_signature("flattened JSON")?;
        let document = FlattenedOut {
            payload: self.json_payload()?,
            signature: json_signature(signature),
        };
        Ok(serde_json::to_string(&document)?)
    }

    /// General JSON serialization (RFC 7515 §7.2.1)
    pub fn to_general_json(&self) -> JoseResult<String> {
        let document = GeneralOut {
            payload: self.json_payload()?,
            signatures: self.signatures.iter().map(json_signature).collect(),
        };
        Ok(serde_json::to_string(&document)?)
    }

    fn single_signature(&self, form: &str) -> JoseResult<&Signature> {
        match self.signatures.as_slice() {
            [signature] => Ok(signature),
            other => Err(JoseError::InvalidMessage(format!(
                "{form} serialization needs exactly one signature, message has {}",
                other.len()
            ))),
        }
    }

    fn json_payload(&self) -> JoseResult<Option<Cow<'_, str>>> {
        if self.detached {
            return Ok(None);
        }
        self.payload_text().map(Some)
    }

    /// Payload as it appears in a serialization: base64url text, or the raw
    /// payload when `b64` is false.
    fn payload_text(&self) -> JoseResult<Cow<'_, str>> {
        let payload = self.payload.as_deref().ok_or_else(|| {
            JoseError::invalid_message("detached payload has not been supplied")
        })?;
        if !self.base64_payload() {
            return std::str::from_utf8(payload)
                .map(Cow::Borrowed)
                .map_err(|_| JoseError::invalid_message("unencoded payload is not UTF-8"));
        }
        Ok(match &self.encoded_payload {
            Some(text) => Cow::Borrowed(text.as_str()),
            None => Cow::Owned(base64_url_encode(payload)),
        })
    }
}

fn json_signature(signature: &Signature) -> JsonSignatureOut<'_> {
    JsonSignatureOut {
        protected: Some(signature.protected_raw.as_str()).filter(|raw| !raw.is_empty()),
        header: signature.unprotected.as_ref(),
        signature: base64_url_encode(&signature.signature),
    }
}
