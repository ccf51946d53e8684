//! Verifier and signer behavior around policies, key finders and contexts

use cryypt_jose::{
    Algorithm, AlgorithmPolicy, AllowList, CancellationToken, Capabilities, Context, Header,
    HmacAlgorithm, JoseError, JoseResult, Key, KeyFinder, KeySetFinder, KeyUsage, Message,
    NoneAlgorithm, Signer, SigningKey, StaticKeyFinder, UnsafeAcceptAnyAlgorithm, Verifier,
};
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

fn hs256_key(byte: u8) -> SigningKey {
    HmacAlgorithm::hs256().new_signing_key(&Key::symmetric(vec![byte; 32]))
}

fn signed_twice() -> Message {
    let mut message = Message::new(b"two signatures".to_vec());
    message
        .sign(Header::new(), Some(Header::new().with_key_id("first")), &hs256_key(1))
        .unwrap();
    message
        .sign(Header::new(), Some(Header::new().with_key_id("second")), &hs256_key(2))
        .unwrap();
    message
}

/// Finder that fails the first lookup with a fixed error and counts calls
struct FailingFirst {
    error: JoseError,
    calls: AtomicUsize,
}

impl KeyFinder for FailingFirst {
    async fn find_key(
        &self,
        _ctx: &Context,
        _protected: &Header,
        _unprotected: Option<&Header>,
    ) -> JoseResult<SigningKey> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            Err(self.error.clone())
        } else {
            Ok(hs256_key(2))
        }
    }
}

/// Finder that never answers
struct Stalled;

impl KeyFinder for Stalled {
    async fn find_key(
        &self,
        _ctx: &Context,
        _protected: &Header,
        _unprotected: Option<&Header>,
    ) -> JoseResult<SigningKey> {
        std::future::pending::<()>().await;
        Err(JoseError::KeyNotFound("unreachable".into()))
    }
}

/// Policy that cancels the caller's context while answering
struct CancelWhileAsked;

impl AlgorithmPolicy for CancelWhileAsked {
    async fn accept(&self, ctx: &Context, _alg: &str) -> JoseResult<()> {
        ctx.cancel();
        tokio::task::yield_now().await;
        Ok(())
    }
}

#[tokio::test]
async fn test_ordinary_finder_errors_skip_to_next_signature() {
    let finder = FailingFirst {
        error: JoseError::KeyNotFound("first".into()),
        calls: AtomicUsize::new(0),
    };
    let verifier = Verifier::new(AllowList::new(["HS256"]), finder);
    let verified = verifier
        .verify(&Context::new(), &signed_twice())
        .await
        .unwrap();
    assert_eq!(verified.index, 1);
    assert_eq!(
        verified.unprotected.as_ref().and_then(Header::key_id),
        Some("second")
    );
}

#[tokio::test]
async fn test_cancellation_from_finder_is_never_skipped() {
    let finder = FailingFirst {
        error: JoseError::Cancelled,
        calls: AtomicUsize::new(0),
    };
    let verifier = Verifier::new(AllowList::new(["HS256"]), finder);
    let result = verifier.verify(&Context::new(), &signed_twice()).await;
    assert_eq!(result, Err(JoseError::Cancelled));
}

#[tokio::test]
async fn test_cancelled_context_stops_verification() {
    let token = CancellationToken::new();
    let ctx = Context::with_cancellation(token.clone());
    token.cancel();

    let verifier = Verifier::new(AllowList::new(["HS256"]), StaticKeyFinder::new(hs256_key(1)));
    let result = verifier.verify(&ctx, &signed_twice()).await;
    assert_eq!(result, Err(JoseError::Cancelled));
}

#[tokio::test]
async fn test_cancel_during_policy_check_propagates() {
    let verifier = Verifier::new(CancelWhileAsked, StaticKeyFinder::new(hs256_key(1)));
    let result = verifier.verify(&Context::new(), &signed_twice()).await;
    assert_eq!(result, Err(JoseError::Cancelled));
}

#[tokio::test(start_paused = true)]
async fn test_deadline_interrupts_stalled_finder() {
    let ctx = Context::new().with_timeout(Duration::from_secs(1));
    let verifier = Verifier::new(AllowList::new(["HS256"]), Stalled);
    let result = verifier.verify(&ctx, &signed_twice()).await;
    assert_eq!(result, Err(JoseError::DeadlineExceeded));
}

#[tokio::test]
async fn test_no_usable_signature_is_a_generic_failure() {
    // wrong key for both signatures
    let verifier = Verifier::new(AllowList::new(["HS256"]), StaticKeyFinder::new(hs256_key(9)));
    let result = verifier.verify(&Context::new(), &signed_twice()).await;
    assert_eq!(result, Err(JoseError::VerificationFailed));

    // policy refuses everything
    let verifier = Verifier::new(AllowList::new(["ES256"]), StaticKeyFinder::new(hs256_key(1)));
    let result = verifier.verify(&Context::new(), &signed_twice()).await;
    assert_eq!(result, Err(JoseError::VerificationFailed));
}

#[tokio::test]
async fn test_message_without_signatures_is_invalid() {
    let verifier = Verifier::new(AllowList::new(["HS256"]), StaticKeyFinder::new(hs256_key(1)));
    let result = verifier
        .verify(&Context::new(), &Message::new(b"unsigned".to_vec()))
        .await;
    assert!(matches!(result, Err(JoseError::InvalidMessage(_))));
}

#[tokio::test]
async fn test_key_bound_to_other_algorithm_is_skipped() {
    // HS512 key offered for an HS256 header
    let hs512 = HmacAlgorithm::hs512().new_signing_key(&Key::symmetric(vec![1; 64]));
    let verifier = Verifier::new(UnsafeAcceptAnyAlgorithm, StaticKeyFinder::new(hs512));
    let result = verifier.verify(&Context::new(), &signed_twice()).await;
    assert_eq!(result, Err(JoseError::VerificationFailed));
}

#[tokio::test]
async fn test_none_requires_explicit_policy() {
    let none = NoneAlgorithm.new_signing_key(&Key::default());
    let mut message = Message::new(b"unsecured".to_vec());
    message.sign(Header::new(), None, &none).unwrap();

    let strict = Verifier::new(
        AllowList::new(["HS256", "ES256"]),
        StaticKeyFinder::new(none.clone()),
    );
    assert_eq!(
        strict.verify(&Context::new(), &message).await,
        Err(JoseError::VerificationFailed)
    );

    let permissive = Verifier::new(UnsafeAcceptAnyAlgorithm, StaticKeyFinder::new(none));
    let verified = permissive.verify(&Context::new(), &message).await.unwrap();
    assert_eq!(verified.payload, b"unsecured");
}

#[tokio::test]
async fn test_unknown_critical_extension_is_skipped() {
    let key = hs256_key(1);
    let mut message = Message::new(b"crit".to_vec());
    let protected = Header::new()
        .with_param("urn:example:must-understand", true)
        .unwrap()
        .with_critical(["urn:example:must-understand"])
        .unwrap();
    message.sign(protected, None, &key).unwrap();

    let verifier = Verifier::new(AllowList::new(["HS256"]), StaticKeyFinder::new(key));
    assert_eq!(
        verifier.verify(&Context::new(), &message).await,
        Err(JoseError::VerificationFailed)
    );
}

#[test]
fn test_capabilities_from_jwk_usage_gate_operations() {
    let usage =
        KeyUsage::from_jwk(&json!({"kty": "oct", "kid": "ro", "key_ops": ["verify"]})).unwrap();
    let key = Key::symmetric(vec![4; 32]).with_usage(&usage);
    let bound = HmacAlgorithm::hs256().new_signing_key(&key);

    assert_eq!(bound.capabilities(), Capabilities::VERIFY_ONLY);
    assert_eq!(bound.key_id(), Some("ro"));
    assert_eq!(
        bound.sign(b"data"),
        Err(JoseError::CapabilityDenied(cryypt_jose::KeyOperation::Sign))
    );

    let mut message = Message::new(b"data".to_vec());
    assert!(matches!(
        message.sign(Header::new(), None, &bound),
        Err(JoseError::CapabilityDenied(_))
    ));

    // capabilities are captured at binding time
    let signer = HmacAlgorithm::hs256().new_signing_key(&Key::symmetric(vec![4; 32]));
    let tag = signer.sign(b"data").unwrap();
    assert!(bound.verify(b"data", &tag).is_ok());

    let enc_only = Key::symmetric(vec![4; 32]).with_capabilities(Capabilities::NONE);
    let bound = HmacAlgorithm::hs256().new_signing_key(&enc_only);
    assert_eq!(
        bound.verify(b"data", &tag),
        Err(JoseError::CapabilityDenied(cryypt_jose::KeyOperation::Verify))
    );
}

#[tokio::test]
async fn test_signer_resolves_key_and_checks_policy() {
    let finder = Arc::new(
        KeySetFinder::with_default_algorithms().with_key("mac", Key::symmetric(vec![6; 48])),
    );
    let ctx = Context::new();
    let signer = Signer::new(AllowList::new(["HS384"]), Arc::clone(&finder));

    let mut message = Message::new(b"policy signed".to_vec());
    let header = Header::new().with_algorithm("HS384").with_key_id("mac");
    signer.sign(&ctx, &mut message, header, None).await.unwrap();

    let verifier = Verifier::new(AllowList::new(["HS384"]), finder);
    let verified = verifier.verify(&ctx, &message).await.unwrap();
    assert_eq!(verified.protected.key_id(), Some("mac"));

    // policy errors are terminal for signing
    let refusing = Signer::new(AllowList::new(["ES256"]), StaticKeyFinder::new(hs256_key(1)));
    let mut other = Message::new(b"x".to_vec());
    assert_eq!(
        refusing.sign(&ctx, &mut other, Header::new(), None).await,
        Err(JoseError::AlgorithmNotAllowed("HS256".into()))
    );
    assert!(other.signatures().is_empty());
}

#[tokio::test]
async fn test_verification_runs_concurrently_across_tasks() {
    let verifier = Arc::new(Verifier::new(
        AllowList::new(["HS256"]),
        StaticKeyFinder::new(hs256_key(2)),
    ));
    let message = Arc::new(signed_twice());
    let mut handles = Vec::new();
    for _ in 0..8 {
        let verifier = Arc::clone(&verifier);
        let message = Arc::clone(&message);
        handles.push(tokio::spawn(async move {
            verifier.verify(&Context::new(), &message).await.map(|v| v.index)
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap(), Ok(1));
    }
}
