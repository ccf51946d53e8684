//! Verification and policy-driven signing

use super::{AlgorithmPolicy, KeyFinder, Message, Signature, UNDERSTOOD_CRITICAL, signing_input};
use crate::context::Context;
use crate::error::{JoseError, JoseResult};
use crate::header::Header;

/// Outcome of a successful verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verified {
    /// Protected header of the signature that verified
    pub protected: Header,
    /// Unprotected header of the signature that verified
    pub unprotected: Option<Header>,
    /// Verified payload bytes
    pub payload: Vec<u8>,
    /// Position of the signature in the message
    pub index: usize,
}

/// Checks messages against an algorithm policy and a key finder.
///
/// Signatures are tried in document order and the first one that verifies
/// wins. Why each rejected signature was skipped is logged at `debug`; the
/// caller only ever sees [`JoseError::VerificationFailed`].
#[derive(Debug, Clone)]
pub struct Verifier<P, F> {
    policy: P,
    finder: F,
}

impl<P, F> Verifier<P, F>
where
    P: AlgorithmPolicy,
    F: KeyFinder,
{
    /// Verifier consulting `policy` and `finder`
    pub fn new(policy: P, finder: F) -> Self {
        Self { policy, finder }
    }

    /// Verify `message`.
    ///
    /// Fails with [`JoseError::InvalidMessage`] when there is nothing to
    /// verify, with [`JoseError::Cancelled`] or
    /// [`JoseError::DeadlineExceeded`] as soon as the context gives out, and
    /// with [`JoseError::VerificationFailed`] when no signature verifies.
    pub async fn verify(&self, ctx: &Context, message: &Message) -> JoseResult<Verified> {
        if message.signatures().is_empty() {
            return Err(JoseError::invalid_message("message has no signatures"));
        }
        let payload = message.payload().ok_or_else(|| {
            JoseError::invalid_message("detached payload has not been supplied")
        })?;
        let content = message.content(message.base64_payload())?;

        for (index, signature) in message.signatures().iter().enumerate() {
            match self.verify_one(ctx, signature, &content).await {
                Ok(()) => {
                    tracing::debug!(index, algorithm = signature.algorithm(), "JWS verified");
                    return Ok(Verified {
                        protected: signature.protected().clone(),
                        unprotected: signature.unprotected().cloned(),
                        payload: payload.to_vec(),
                        index,
                    });
                }
                Err(err) if err.is_context_error() => return Err(err),
                Err(err) => {
                    tracing::debug!(index, error = %err, "skipping JWS signature");
                }
            }
        }
        Err(JoseError::VerificationFailed)
    }

    async fn verify_one(
        &self,
        ctx: &Context,
        signature: &Signature,
        content: &[u8],
    ) -> JoseResult<()> {
        let alg = signature
            .algorithm()
            .ok_or_else(|| JoseError::invalid_header("signature has no alg"))?;
        if let Some(critical) = signature.protected().critical() {
            for name in critical {
                if !UNDERSTOOD_CRITICAL.contains(&name) {
                    return Err(JoseError::InvalidHeader(format!(
                        "critical parameter {name} is not understood"
                    )));
                }
            }
        }

        ctx.run(self.policy.accept(ctx, alg)).await?;
        let key = ctx
            .run(
                self.finder
                    .find_key(ctx, signature.protected(), signature.unprotected()),
            )
            .await?;
        if key.algorithm() != alg {
            return Err(JoseError::AlgorithmMismatch {
                header: alg.to_string(),
                key: key.algorithm().to_string(),
            });
        }

        let input = signing_input(signature.protected_raw(), content);
        key.verify(&input, signature.signature())
    }
}

/// Signs messages with keys from a key finder, subject to an algorithm
/// policy.
///
/// Unlike verification, every collaborator error is terminal.
#[derive(Debug, Clone)]
pub struct Signer<P, F> {
    policy: P,
    finder: F,
}

impl<P, F> Signer<P, F>
where
    P: AlgorithmPolicy,
    F: KeyFinder,
{
    /// Signer consulting `policy` and `finder`
    pub fn new(policy: P, finder: F) -> Self {
        Self { policy, finder }
    }

    /// Look up a key for the headers and add a signature to `message`
    pub async fn sign(
        &self,
        ctx: &Context,
        message: &mut Message,
        protected: Header,
        unprotected: Option<Header>,
    ) -> JoseResult<()> {
        let key = ctx
            .run(self.finder.find_key(ctx, &protected, unprotected.as_ref()))
            .await?;
        let alg = protected
            .algorithm()
            .or_else(|| unprotected.as_ref().and_then(Header::algorithm))
            .unwrap_or_else(|| key.algorithm())
            .to_string();
        ctx.run(self.policy.accept(ctx, &alg)).await?;
        message.sign(protected, unprotected, &key)
    }
}
