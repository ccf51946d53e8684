//! Compact JWT encoding and verified decoding

use crate::claims::Claims;
use crate::error::{JwtError, JwtResult};
use crate::validator::ClaimsValidator;
use cryypt_jose::{AllowList, Context, Header, KeyFinder, Message, SigningKey, Verifier};
use tracing::debug;

/// Header `typ` value set on encode
pub const JWT_TYPE: &str = "JWT";

/// Sign `claims` and return the compact token.
///
/// `typ` is set to `JWT` unless the header already carries one; `alg` is
/// taken from the key when absent.
///
/// # Errors
/// Header or key errors from the signature layer, or claim serialization
/// failures
pub fn encode(mut header: Header, claims: &Claims, key: &SigningKey) -> JwtResult<String> {
    if header.token_type().is_none() {
        header.set_type(JWT_TYPE);
    }
    let payload = serde_json::to_vec(claims)?;
    let mut message = Message::new(payload);
    message.sign(header, None, key)?;
    Ok(message.compact()?)
}

/// A token whose signature and claims were both accepted
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedJwt {
    /// Protected header of the token
    pub header: Header,
    /// Validated claims
    pub claims: Claims,
}

/// Verifies compact JWTs and validates their claims
#[derive(Debug)]
pub struct JwtVerifier<F> {
    verifier: Verifier<AllowList, F>,
    validator: ClaimsValidator,
}

impl<F: KeyFinder> JwtVerifier<F> {
    /// Verifier accepting the algorithms listed in the validator's options
    #[must_use]
    pub fn new(finder: F, validator: ClaimsValidator) -> Self {
        let policy = AllowList::new(validator.options().allowed_algorithms.iter().cloned());
        Self {
            verifier: Verifier::new(policy, finder),
            validator,
        }
    }

    /// Claims validator in use
    #[must_use]
    pub fn validator(&self) -> &ClaimsValidator {
        &self.validator
    }

    /// Verify the signature of `token`, then decode and validate its claims.
    ///
    /// # Errors
    /// `InvalidToken` for malformed or unsupported token shapes,
    /// `InvalidSignature` when no signature verifies, context errors as
    /// `Jose`, and any claim validation failure
    pub async fn decode(&self, ctx: &Context, token: &str) -> JwtResult<DecodedJwt> {
        if token.trim_start().starts_with('{') {
            return Err(JwtError::invalid_token("JWTs use the compact serialization"));
        }
        let message = Message::parse_compact(token)
            .map_err(|err| JwtError::InvalidToken(err.to_string()))?;
        if message.payload().unwrap_or_default().is_empty() {
            return Err(JwtError::invalid_token("payload is missing"));
        }
        if !message.base64_payload() {
            return Err(JwtError::invalid_token("unencoded payloads are not JWTs"));
        }

        let verified = self.verifier.verify(ctx, &message).await?;

        if verified
            .protected
            .content_type()
            .is_some_and(|cty| cty.eq_ignore_ascii_case(JWT_TYPE))
        {
            return Err(JwtError::invalid_token("nested JWTs are not supported"));
        }

        let claims: Claims = serde_json::from_slice(&verified.payload)?;
        self.validator.validate(&claims)?;
        debug!(
            algorithm = verified.protected.algorithm(),
            kid = verified.protected.key_id(),
            "JWT accepted"
        );
        Ok(DecodedJwt {
            header: verified.protected,
            claims,
        })
    }
}
