//! Compact and JSON parsing

use super::{Message, Signature, check_headers};
use crate::codec::{Base64Scratch, base64_url_decode};
use crate::error::{JoseError, JoseResult};
use crate::header::Header;
use serde::Deserialize;
use serde_json::value::RawValue;

/// Top-level members of both JSON serializations
#[derive(Deserialize)]
struct JsonDocument {
    payload: Option<String>,
    protected: Option<String>,
    header: Option<Box<RawValue>>,
    signature: Option<String>,
    signatures: Option<Vec<JsonSignature>>,
}

#[derive(Deserialize)]
struct JsonSignature {
    protected: Option<String>,
    header: Option<Box<RawValue>>,
    signature: String,
}

impl Message {
    /// Parse either serialization; JSON is detected by a leading `{`.
    pub fn parse(input: impl AsRef<[u8]>) -> JoseResult<Self> {
        let input = input.as_ref();
        match input.iter().find(|b| !b.is_ascii_whitespace()) {
            Some(b'{') => Self::parse_json(input),
            _ => Self::parse_compact(input),
        }
    }

    /// Parse the compact serialization: `header.payload.signature`.
    ///
    /// An empty payload segment parses as an empty attached payload; a
    /// detached payload can still be supplied with [`Message::attach_payload`].
    pub fn parse_compact(input: impl AsRef<[u8]>) -> JoseResult<Self> {
        let input = input.as_ref();
        let mut segments = input.split(|b| *b == b'.');
        let (Some(header), Some(payload), Some(signature), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(JoseError::invalid_format(
                "compact serialization needs exactly three segments",
            ));
        };

        let mut scratch = Base64Scratch::new();
        let protected = Header::parse(scratch.decode(header, "protected header")?)?;
        let b64 = check_headers(&protected, None)?;
        let protected_raw = String::from_utf8(header.to_vec())
            .map_err(|_| JoseError::InvalidBase64("protected header"))?;

        let (payload, encoded_payload) = if b64 {
            let text = String::from_utf8(payload.to_vec())
                .map_err(|_| JoseError::InvalidBase64("payload"))?;
            (base64_url_decode(payload, "payload")?, Some(text))
        } else {
            (payload.to_vec(), None)
        };

        let signature = base64_url_decode(signature, "signature")?;

        tracing::trace!(payload_len = payload.len(), b64, "parsed compact JWS");
        Ok(Message {
            payload: Some(payload),
            encoded_payload,
            detached: false,
            signatures: vec![Signature {
                protected,
                unprotected: None,
                protected_raw,
                signature,
            }],
        })
    }

    /// Parse the flattened or general JSON serialization.
    ///
    /// A missing `payload` member marks a detached payload.
    pub fn parse_json(input: impl AsRef<[u8]>) -> JoseResult<Self> {
        let document: JsonDocument = serde_json::from_slice(input.as_ref())
            .map_err(|err| JoseError::InvalidFormat(err.to_string()))?;

        let entries = match document.signatures {
            Some(signatures) => {
                if document.protected.is_some()
                    || document.header.is_some()
                    || document.signature.is_some()
                {
                    return Err(JoseError::invalid_format(
                        "general serialization cannot carry flattened signature members",
                    ));
                }
                signatures
            }
            None => {
                let signature = document.signature.ok_or_else(|| {
                    JoseError::invalid_format("missing signature or signatures member")
                })?;
                vec![JsonSignature {
                    protected: document.protected,
                    header: document.header,
                    signature,
                }]
            }
        };

        let mut scratch = Base64Scratch::new();
        let mut signatures = Vec::with_capacity(entries.len());
        let mut b64 = None;
        for (index, entry) in entries.into_iter().enumerate() {
            let signature = parse_json_signature(&mut scratch, entry)?;
            let this_b64 = check_headers(&signature.protected, signature.unprotected.as_ref())?;
            if b64.is_some_and(|first| first != this_b64) {
                return Err(JoseError::InvalidHeader(format!(
                    "signature {index} disagrees on b64 with earlier signatures"
                )));
            }
            b64 = Some(this_b64);
            signatures.push(signature);
        }
        let b64 = b64.unwrap_or(true);

        let detached = document.payload.is_none();
        let (payload, encoded_payload) = match document.payload {
            None => (None, None),
            Some(text) if b64 => {
                let payload = base64_url_decode(text.as_bytes(), "payload")?;
                (Some(payload), Some(text))
            }
            Some(text) => (Some(text.into_bytes()), None),
        };

        tracing::trace!(
            signatures = signatures.len(),
            detached,
            b64,
            "parsed JSON JWS"
        );
        Ok(Message {
            payload,
            encoded_payload,
            detached,
            signatures,
        })
    }
}

fn parse_json_signature(
    scratch: &mut Base64Scratch,
    entry: JsonSignature,
) -> JoseResult<Signature> {
    if entry.protected.is_none() && entry.header.is_none() {
        return Err(JoseError::invalid_format(
            "signature has neither a protected nor an unprotected header",
        ));
    }
    let protected = match &entry.protected {
        Some(text) => Header::parse(scratch.decode(text.as_bytes(), "protected header")?)?,
        None => Header::new(),
    };
    let unprotected = entry
        .header
        .as_deref()
        .map(|raw| Header::parse(raw.get().as_bytes()))
        .transpose()?;
    let signature = base64_url_decode(entry.signature.as_bytes(), "signature")?;
    Ok(Signature {
        protected,
        unprotected,
        protected_raw: entry.protected.unwrap_or_default(),
        signature,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compact_needs_exactly_three_segments() {
        for input in ["", "a.b", "a.b.c.d", "eyJhbGciOiJub25lIn0"] {
            assert!(matches!(
                Message::parse_compact(input),
                Err(JoseError::InvalidFormat(_))
            ));
        }
    }

    #[test]
    fn compact_with_empty_payload_is_an_empty_attached_payload() {
        let mut message = Message::parse("eyJhbGciOiJub25lIn0..").unwrap();
        assert!(!message.is_detached());
        assert_eq!(message.payload(), Some(&b""[..]));
        assert_eq!(
            message.signing_input(&message.signatures()[0]).unwrap(),
            b"eyJhbGciOiJub25lIn0."
        );
        assert_eq!(message.signatures()[0].protected_raw(), "eyJhbGciOiJub25lIn0");

        message.attach_payload(b"detached".to_vec()).unwrap();
        assert!(message.is_detached());
        assert_eq!(message.payload(), Some(&b"detached"[..]));
        assert_eq!(
            message.signing_input(&message.signatures()[0]).unwrap(),
            b"eyJhbGciOiJub25lIn0.ZGV0YWNoZWQ"
        );
    }

    #[test]
    fn payload_cannot_replace_a_non_empty_attached_payload() {
        let mut message = Message::parse("eyJhbGciOiJub25lIn0.e30.").unwrap();
        assert!(matches!(
            message.attach_payload(b"other".to_vec()),
            Err(JoseError::InvalidMessage(_))
        ));
    }

    #[test]
    fn flattened_and_general_members_cannot_mix() {
        let input = r#"{"payload":"e30","signature":"","signatures":[]}"#;
        assert!(matches!(
            Message::parse(input),
            Err(JoseError::InvalidFormat(_))
        ));
    }

    #[test]
    fn duplicate_between_protected_and_unprotected_is_fatal() {
        // protected: {"alg":"none"}
        let input = r#"{"payload":"e30","protected":"eyJhbGciOiJub25lIn0","header":{"alg":"none"},"signature":""}"#;
        assert_eq!(
            Message::parse(input),
            Err(JoseError::DuplicateParameter("alg".into()))
        );
    }

    #[test]
    fn duplicate_inside_unprotected_header_is_fatal() {
        let input = r#"{"payload":"e30","header":{"kid":"a","kid":"b"},"signature":""}"#;
        assert_eq!(
            Message::parse(input),
            Err(JoseError::DuplicateParameter("kid".into()))
        );
    }

    #[test]
    fn b64_must_be_protected_and_critical() {
        let unprotected = r#"{"payload":"x","protected":"eyJhbGciOiJub25lIn0","header":{"b64":false},"signature":""}"#;
        assert!(matches!(
            Message::parse(unprotected),
            Err(JoseError::InvalidHeader(_))
        ));
        // protected: {"alg":"none","b64":false}
        let not_critical = "eyJhbGciOiJub25lIiwiYjY0IjpmYWxzZX0.x.";
        assert!(matches!(
            Message::parse(not_critical),
            Err(JoseError::InvalidHeader(_))
        ));
    }

    #[test]
    fn signature_without_any_header_is_rejected() {
        let input = r#"{"payload":"e30","signatures":[{"signature":""}]}"#;
        assert!(matches!(
            Message::parse(input),
            Err(JoseError::InvalidFormat(_))
        ));
    }
}
