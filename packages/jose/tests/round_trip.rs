//! Sign/verify round trips for every registered algorithm

use cryypt_jose::{
    Algorithm, AlgorithmRegistry, AllowList, Context, HashAlg, Header, HmacAlgorithm, JoseError,
    Key, Message, RsaAlgorithm, RsaPadding, SigningKey, StaticKeyFinder, Verifier,
};
use once_cell::sync::Lazy;
use proptest::prelude::*;
use rand_core::OsRng;

static RSA_2048: Lazy<rsa::RsaPrivateKey> =
    Lazy::new(|| rsa::RsaPrivateKey::new(&mut OsRng, 2048).unwrap());

/// One valid key per registered algorithm id
fn key_for(alg: &str) -> Key {
    match alg {
        "HS256" | "HS384" | "HS512" => Key::symmetric(vec![0xa5; 64]),
        "RS256" | "RS384" | "RS512" | "PS256" | "PS384" | "PS512" => {
            Key::from_private(RSA_2048.clone())
        }
        "ES256" => Key::from_private(p256::ecdsa::SigningKey::random(&mut OsRng)),
        "ES384" => Key::from_private(p384::ecdsa::SigningKey::random(&mut OsRng)),
        "ES512" => Key::from_private(p521::ecdsa::SigningKey::random(&mut OsRng)),
        "ES256K" => Key::from_private(k256::ecdsa::SigningKey::random(&mut OsRng)),
        "EdDSA" => Key::from_private(ed25519_dalek::SigningKey::generate(&mut OsRng)),
        "none" => Key::default(),
        other => panic!("no test key for {other}"),
    }
}

fn bind(alg: &str, key: &Key) -> SigningKey {
    AlgorithmRegistry::global()
        .resolve(alg)
        .unwrap()
        .try_new_signing_key(key)
        .unwrap()
}

#[tokio::test]
async fn test_every_registered_algorithm_round_trips() {
    let registry = AlgorithmRegistry::global();
    for alg in registry.ids() {
        let key = bind(alg, &key_for(alg));
        let mut message = Message::new(b"round trip payload".to_vec());
        message.sign(Header::new(), None, &key).unwrap();

        let token = message.compact().unwrap();
        let parsed = Message::parse(&token).unwrap();
        let verifier = Verifier::new(AllowList::new([alg]), StaticKeyFinder::new(key));
        let verified = verifier.verify(&Context::new(), &parsed).await.unwrap();

        assert_eq!(verified.payload, b"round trip payload", "{alg}");
        assert_eq!(verified.protected.algorithm(), Some(alg), "{alg}");
    }
}

#[tokio::test]
async fn test_ed448_round_trips_under_eddsa() {
    let secret = ed448_goldilocks_plus::SigningKey::generate(&mut OsRng);
    let public = secret.verifying_key();
    let signer = bind("EdDSA", &Key::from_private(secret));
    let verifier_key = bind("EdDSA", &Key::from_public(public));

    let mut message = Message::new(b"ed448".to_vec());
    message.sign(Header::new().with_key_id("ed448"), None, &signer).unwrap();
    let parsed = Message::parse(message.to_flattened_json().unwrap()).unwrap();

    let verifier = Verifier::new(AllowList::new(["EdDSA"]), StaticKeyFinder::new(verifier_key));
    let verified = verifier.verify(&Context::new(), &parsed).await.unwrap();
    assert_eq!(verified.payload, b"ed448");
    assert_eq!(verified.protected.key_id(), Some("ed448"));
}

#[test]
fn test_single_byte_mutations_fail_for_every_signing_algorithm() {
    let registry = AlgorithmRegistry::global();
    for alg in registry.ids().into_iter().filter(|alg| *alg != "none") {
        let key = bind(alg, &key_for(alg));
        let mut message = Message::new(b"mutate me".to_vec());
        message.sign(Header::new(), None, &key).unwrap();
        let signature = &message.signatures()[0];
        let input = message.signing_input(signature).unwrap();
        assert!(key.verify(&input, signature.signature()).is_ok(), "{alg}");

        // first byte is protected header text, last byte is payload text
        for position in [0, input.len() / 2, input.len() - 1] {
            let mut mutated = input.clone();
            mutated[position] ^= 0x01;
            assert!(key.verify(&mutated, signature.signature()).is_err(), "{alg} input {position}");
        }
        for position in [0, signature.signature().len() - 1] {
            let mut mutated = signature.signature().to_vec();
            mutated[position] ^= 0x80;
            assert!(key.verify(&input, &mutated).is_err(), "{alg} signature {position}");
        }
    }
}

#[test]
fn test_hmac_and_pkcs1_signatures_are_deterministic() {
    for alg in ["HS256", "RS256"] {
        let key = bind(alg, &key_for(alg));
        assert_eq!(key.sign(b"input").unwrap(), key.sign(b"input").unwrap(), "{alg}");
    }
    // PSS is randomized, yet both verify
    let pss = bind("PS256", &key_for("PS256"));
    let first = pss.sign(b"input").unwrap();
    let second = pss.sign(b"input").unwrap();
    assert_ne!(first, second);
    assert!(pss.verify(b"input", &first).is_ok());
    assert!(pss.verify(b"input", &second).is_ok());
}

#[test]
fn test_none_signs_empty_and_verifies_empty_only() {
    let key = bind("none", &Key::default());
    let mut message = Message::new(b"unsecured".to_vec());
    message.sign(Header::new(), None, &key).unwrap();

    let token = message.compact().unwrap();
    assert!(token.ends_with('.'));
    assert!(message.signatures()[0].signature().is_empty());
    assert_eq!(key.verify(b"x", b"\x00"), Err(JoseError::SignatureMismatch));
}

#[test]
fn test_hs256_weak_variant_matches_strict_output() {
    let short = Key::symmetric(vec![0x42; 31]);
    let strict = HmacAlgorithm::hs256().new_signing_key(&short);
    assert!(matches!(strict.sign(b"data"), Err(JoseError::WeakKey(_))));

    let weak = HmacAlgorithm::weak(HashAlg::Sha256).new_signing_key(&short);
    let mac = weak.sign(b"data").unwrap();
    assert!(weak.verify(b"data", &mac).is_ok());

    // plain HMAC-SHA256 over the same secret
    let expected = {
        use hmac::{Hmac, Mac};
        let mut mac = Hmac::<sha2::Sha256>::new_from_slice(&[0x42; 31]).unwrap();
        mac.update(b"data");
        mac.finalize().into_bytes().to_vec()
    };
    assert_eq!(mac, expected);
}

#[test]
fn test_rsa_modulus_below_2048_bits_is_weak() {
    let small = rsa::RsaPrivateKey::new(&mut OsRng, 1024).unwrap();
    let key = Key::from_private(small);
    for alg in ["RS256", "PS512"] {
        let bound = AlgorithmRegistry::global()
            .resolve(alg)
            .unwrap()
            .new_signing_key(&key);
        assert!(matches!(bound.check(), Err(JoseError::WeakKey(_))), "{alg}");
    }

    let bound = RsaAlgorithm::weak(RsaPadding::Pkcs1v15, HashAlg::Sha256).new_signing_key(&key);
    let sig = bound.sign(b"legacy").unwrap();
    assert_eq!(sig.len(), 128);
    assert!(bound.verify(b"legacy", &sig).is_ok());
}

#[test]
fn test_rsa_modulus_one_bit_short_is_weak() {
    let short = rsa::RsaPrivateKey::new(&mut OsRng, 2047).unwrap();
    assert_eq!(rsa::traits::PublicKeyParts::size(&short), 256);
    let key = Key::from_private(short);
    for alg in ["RS256", "PS256"] {
        let bound = AlgorithmRegistry::global()
            .resolve(alg)
            .unwrap()
            .new_signing_key(&key);
        assert!(matches!(bound.check(), Err(JoseError::WeakKey(_))), "{alg}");
    }
    let bound = RsaAlgorithm::weak(RsaPadding::Pss, HashAlg::Sha256).new_signing_key(&key);
    assert!(bound.check().is_ok());
}

#[tokio::test]
async fn test_empty_payload_round_trips_through_compact() {
    let key = HmacAlgorithm::hs256().new_signing_key(&Key::symmetric(vec![0x3c; 32]));
    let mut message = Message::new(Vec::new());
    message.sign(Header::new(), None, &key).unwrap();
    let token = message.compact().unwrap();
    assert!(token.contains(".."));

    let parsed = Message::parse(&token).unwrap();
    assert!(!parsed.is_detached());
    let verifier = Verifier::new(AllowList::new(["HS256"]), StaticKeyFinder::new(key));
    let verified = verifier.verify(&Context::new(), &parsed).await.unwrap();
    assert!(verified.payload.is_empty());
    assert_eq!(parsed.compact().unwrap(), token);
}

proptest! {
    #[test]
    fn prop_hs256_any_single_byte_mutation_fails(
        payload in proptest::collection::vec(any::<u8>(), 1..64),
        position in any::<prop::sample::Index>(),
        mask in 1u8..=255,
        mutate_signature in any::<bool>(),
    ) {
        let key = HmacAlgorithm::hs256().new_signing_key(&Key::symmetric(vec![0x3c; 32]));
        let mut message = Message::new(payload);
        message.sign(Header::new(), None, &key).unwrap();
        let signature = &message.signatures()[0];
        let mut input = message.signing_input(signature).unwrap();
        let mut tag = signature.signature().to_vec();

        if mutate_signature {
            let at = position.index(tag.len());
            tag[at] ^= mask;
        } else {
            let at = position.index(input.len());
            input[at] ^= mask;
        }
        prop_assert_eq!(key.verify(&input, &tag), Err(JoseError::SignatureMismatch));
    }
}
