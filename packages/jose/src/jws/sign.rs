//! Adding signatures to a message

use super::{Message, Signature, check_headers, signing_input};
use crate::algorithms::SigningKey;
use crate::codec::Base64Scratch;
use crate::error::{JoseError, JoseResult};
use crate::header::Header;

impl Message {
    /// Sign the payload and append the signature.
    ///
    /// `alg` is filled in from `key` when neither header names one; a header
    /// naming a different algorithm than the key is an error. The protected
    /// header is encoded once here and its text is kept verbatim.
    pub fn sign(
        &mut self,
        mut protected: Header,
        unprotected: Option<Header>,
        key: &SigningKey,
    ) -> JoseResult<()> {
        key.check()?;

        let header_alg = protected
            .algorithm()
            .or_else(|| unprotected.as_ref().and_then(Header::algorithm))
            .map(str::to_owned);
        match header_alg {
            Some(header) if header != key.algorithm() => {
                return Err(JoseError::AlgorithmMismatch {
                    header,
                    key: key.algorithm().to_string(),
                });
            }
            Some(_) => {}
            None => protected.set_algorithm(key.algorithm()),
        }

        let b64 = check_headers(&protected, unprotected.as_ref())?;
        if !self.signatures.is_empty() && self.base64_payload() != b64 {
            return Err(JoseError::invalid_header(
                "b64 must agree with the existing signatures",
            ));
        }

        // an empty protected header is omitted, not encoded as `{}`
        let protected_raw = if protected.is_empty() {
            String::new()
        } else {
            Base64Scratch::new().encode(&protected.encode()?).to_owned()
        };
        let input = signing_input(&protected_raw, &self.content(b64)?);
        let signature = key.sign(&input)?;

        tracing::debug!(
            algorithm = key.algorithm(),
            kid = key.key_id(),
            index = self.signatures.len(),
            "added JWS signature"
        );
        self.signatures.push(Signature {
            protected,
            unprotected,
            protected_raw,
            signature,
        });
        Ok(())
    }
}
