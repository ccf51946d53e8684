//! ECDSA algorithms (ES256, ES384, ES512, ES256K)
//!
//! Signatures use the fixed-width `R || S` encoding of RFC 7518 §3.4, not
//! DER. Nonces are derived per RFC 6979, so signing is deterministic for a
//! given key and input.

use super::{Algorithm, SignatureScheme, SigningKey, bind};
use crate::error::{JoseError, JoseResult};
use crate::key::{Key, KeyKind, PrivateKey, PublicKey};
use p256::ecdsa::signature::{Signer, Verifier};

/// Curves supported by [`EcdsaAlgorithm`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EcCurve {
    /// NIST P-256 with SHA-256
    P256,
    /// NIST P-384 with SHA-384
    P384,
    /// NIST P-521 with SHA-512
    P521,
    /// secp256k1 with SHA-256 (RFC 8812)
    Secp256k1,
}

impl EcCurve {
    fn key_kind(self) -> KeyKind {
        match self {
            EcCurve::P256 => KeyKind::P256,
            EcCurve::P384 => KeyKind::P384,
            EcCurve::P521 => KeyKind::P521,
            EcCurve::Secp256k1 => KeyKind::Secp256k1,
        }
    }
}

/// ECDSA over one curve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EcdsaAlgorithm {
    curve: EcCurve,
}

impl EcdsaAlgorithm {
    /// ECDSA over `curve`
    #[must_use]
    pub const fn new(curve: EcCurve) -> Self {
        Self { curve }
    }

    /// Curve of this algorithm
    #[must_use]
    pub const fn curve(&self) -> EcCurve {
        self.curve
    }

    fn scheme_for(&self, key: &Key) -> JoseResult<EcdsaScheme> {
        let private = match key.private() {
            Some(
                private @ (PrivateKey::P256(_)
                | PrivateKey::P384(_)
                | PrivateKey::P521(_)
                | PrivateKey::Secp256k1(_)),
            ) => Some(private.clone()),
            Some(
                other @ (PrivateKey::Rsa(_)
                | PrivateKey::Ed25519(_)
                | PrivateKey::Ed448(_)
                | PrivateKey::X25519(_)
                | PrivateKey::X448(_)
                | PrivateKey::Symmetric(_)),
            ) => return Err(self.mismatch(other.kind())),
            None => None,
        };
        let public = match key.public() {
            Some(
                public @ (PublicKey::P256(_)
                | PublicKey::P384(_)
                | PublicKey::P521(_)
                | PublicKey::Secp256k1(_)),
            ) => Some(public.clone()),
            Some(
                other @ (PublicKey::Rsa(_)
                | PublicKey::Ed25519(_)
                | PublicKey::Ed448(_)
                | PublicKey::X25519(_)
                | PublicKey::X448(_)),
            ) => return Err(self.mismatch(other.kind())),
            None => None,
        };

        let expected = self.curve.key_kind();
        for kind in private
            .as_ref()
            .map(PrivateKey::kind)
            .into_iter()
            .chain(public.as_ref().map(PublicKey::kind))
        {
            if kind != expected {
                return Err(self.mismatch(kind));
            }
        }
        match (&private, &public) {
            (None, None) => return Err(JoseError::key_type_mismatch("missing EC key")),
            (Some(private), Some(public)) if !halves_match(private, public) => {
                return Err(JoseError::key_type_mismatch(
                    "EC private and public halves belong to different keys",
                ));
            }
            _ => {}
        }

        Ok(EcdsaScheme { private, public })
    }

    fn mismatch(&self, kind: KeyKind) -> JoseError {
        JoseError::KeyTypeMismatch(format!(
            "{} requires an {} key, got {kind}",
            self.id(),
            self.curve.key_kind()
        ))
    }
}

impl Algorithm for EcdsaAlgorithm {
    fn id(&self) -> &str {
        match self.curve {
            EcCurve::P256 => "ES256",
            EcCurve::P384 => "ES384",
            EcCurve::P521 => "ES512",
            EcCurve::Secp256k1 => "ES256K",
        }
    }

    fn new_signing_key(&self, key: &Key) -> SigningKey {
        bind(self.id(), key, self.scheme_for(key))
    }
}

/// Whether `public` is the public half of `private`
fn halves_match(private: &PrivateKey, public: &PublicKey) -> bool {
    match (private, public) {
        (PrivateKey::P256(private), PublicKey::P256(public)) => {
            private.verifying_key() == &**public
        }
        (PrivateKey::P384(private), PublicKey::P384(public)) => {
            private.verifying_key() == &**public
        }
        (PrivateKey::P521(private), PublicKey::P521(public)) => {
            p521::ecdsa::VerifyingKey::from(&**private).to_encoded_point(false)
                == public.to_encoded_point(false)
        }
        (PrivateKey::Secp256k1(private), PublicKey::Secp256k1(public)) => {
            private.verifying_key() == &**public
        }
        _ => false,
    }
}

/// Both halves are already known to be of the algorithm's curve.
struct EcdsaScheme {
    private: Option<PrivateKey>,
    public: Option<PublicKey>,
}

macro_rules! ecdsa_sign {
    ($curve:ident, $key:expr, $input:expr) => {{
        let signature: $curve::ecdsa::Signature =
            $key.try_sign($input).map_err(|_| JoseError::SignUnavailable)?;
        Ok(signature.to_bytes().to_vec())
    }};
}

macro_rules! ecdsa_verify {
    ($curve:ident, $key:expr, $input:expr, $signature:expr) => {{
        let signature = $curve::ecdsa::Signature::from_slice($signature)
            .map_err(|_| JoseError::SignatureMismatch)?;
        $key.verify($input, &signature)
            .map_err(|_| JoseError::SignatureMismatch)
    }};
}

impl SignatureScheme for EcdsaScheme {
    fn sign(&self, input: &[u8]) -> JoseResult<Vec<u8>> {
        match &self.private {
            Some(PrivateKey::P256(key)) => ecdsa_sign!(p256, &**key, input),
            Some(PrivateKey::P384(key)) => ecdsa_sign!(p384, &**key, input),
            Some(PrivateKey::P521(key)) => ecdsa_sign!(p521, &**key, input),
            Some(PrivateKey::Secp256k1(key)) => ecdsa_sign!(k256, &**key, input),
            Some(
                PrivateKey::Rsa(_)
                | PrivateKey::Ed25519(_)
                | PrivateKey::Ed448(_)
                | PrivateKey::X25519(_)
                | PrivateKey::X448(_)
                | PrivateKey::Symmetric(_),
            )
            | None => Err(JoseError::SignUnavailable),
        }
    }

    fn verify(&self, input: &[u8], signature: &[u8]) -> JoseResult<()> {
        match (&self.public, &self.private) {
            (Some(PublicKey::P256(key)), _) => ecdsa_verify!(p256, &**key, input, signature),
            (Some(PublicKey::P384(key)), _) => ecdsa_verify!(p384, &**key, input, signature),
            (Some(PublicKey::P521(key)), _) => ecdsa_verify!(p521, &**key, input, signature),
            (Some(PublicKey::Secp256k1(key)), _) => {
                ecdsa_verify!(k256, &**key, input, signature)
            }
            (None, Some(PrivateKey::P256(key))) => {
                ecdsa_verify!(p256, key.verifying_key(), input, signature)
            }
            (None, Some(PrivateKey::P384(key))) => {
                ecdsa_verify!(p384, key.verifying_key(), input, signature)
            }
            (None, Some(PrivateKey::P521(key))) => {
                ecdsa_verify!(p521, &p521::ecdsa::VerifyingKey::from(&**key), input, signature)
            }
            (None, Some(PrivateKey::Secp256k1(key))) => {
                ecdsa_verify!(k256, key.verifying_key(), input, signature)
            }
            (
                Some(
                    PublicKey::Rsa(_)
                    | PublicKey::Ed25519(_)
                    | PublicKey::Ed448(_)
                    | PublicKey::X25519(_)
                    | PublicKey::X448(_),
                ),
                _,
            )
            | (
                None,
                Some(
                    PrivateKey::Rsa(_)
                    | PrivateKey::Ed25519(_)
                    | PrivateKey::Ed448(_)
                    | PrivateKey::X25519(_)
                    | PrivateKey::X448(_)
                    | PrivateKey::Symmetric(_),
                ),
            )
            | (None, None) => Err(JoseError::SignUnavailable),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signatures_are_fixed_width() {
        let p256 = p256::ecdsa::SigningKey::from_slice(&[3u8; 32]).unwrap();
        let key = EcdsaAlgorithm::new(EcCurve::P256).new_signing_key(&Key::from_private(p256));
        let sig = key.sign(b"input").unwrap();
        assert_eq!(sig.len(), 64);
        assert!(key.verify(b"input", &sig).is_ok());

        let p384 = p384::ecdsa::SigningKey::from_slice(&[3u8; 48]).unwrap();
        let key = EcdsaAlgorithm::new(EcCurve::P384).new_signing_key(&Key::from_private(p384));
        assert_eq!(key.sign(b"input").unwrap().len(), 96);
    }

    #[test]
    fn curve_mismatch_yields_invalid_key() {
        let p256 = p256::ecdsa::SigningKey::from_slice(&[3u8; 32]).unwrap();
        let key = EcdsaAlgorithm::new(EcCurve::P384).new_signing_key(&Key::from_private(p256));
        assert!(matches!(key.check(), Err(JoseError::KeyTypeMismatch(_))));
        assert!(matches!(
            key.verify(b"input", &[0u8; 96]),
            Err(JoseError::KeyTypeMismatch(_))
        ));
    }

    #[test]
    fn public_only_key_cannot_sign() {
        let secret = k256::ecdsa::SigningKey::from_slice(&[5u8; 32]).unwrap();
        let algorithm = EcdsaAlgorithm::new(EcCurve::Secp256k1);
        let signer = algorithm.new_signing_key(&Key::from_private(secret.clone()));
        let verifier = algorithm.new_signing_key(&Key::from_public(*secret.verifying_key()));
        let sig = signer.sign(b"input").unwrap();
        assert!(verifier.verify(b"input", &sig).is_ok());
        assert_eq!(verifier.sign(b"input"), Err(JoseError::SignUnavailable));
    }

    #[test]
    fn halves_from_different_keys_are_rejected() {
        let first = p256::ecdsa::SigningKey::from_slice(&[3u8; 32]).unwrap();
        let second = p256::ecdsa::SigningKey::from_slice(&[4u8; 32]).unwrap();
        let algorithm = EcdsaAlgorithm::new(EcCurve::P256);

        let matching = algorithm.new_signing_key(&Key::pair(first.clone(), *first.verifying_key()));
        let sig = matching.sign(b"input").unwrap();
        assert!(matching.verify(b"input", &sig).is_ok());

        let mixed = algorithm.new_signing_key(&Key::pair(first, *second.verifying_key()));
        assert!(matches!(mixed.check(), Err(JoseError::KeyTypeMismatch(_))));
    }

    #[test]
    fn p521_pairs_are_compared_by_point() {
        // leading zero byte keeps the scalar below the group order
        let scalar = |byte: u8| {
            let mut bytes = [byte; 66];
            bytes[0] = 0;
            p521::ecdsa::SigningKey::from_slice(&bytes).unwrap()
        };
        let (first, second) = (scalar(3), scalar(4));
        let algorithm = EcdsaAlgorithm::new(EcCurve::P521);

        let public = p521::ecdsa::VerifyingKey::from(&first);
        let matching = algorithm.new_signing_key(&Key::pair(first.clone(), public));
        let sig = matching.sign(b"input").unwrap();
        assert_eq!(sig.len(), 132);
        assert!(matching.verify(b"input", &sig).is_ok());

        let signer = algorithm.new_signing_key(&Key::from_private(first.clone()));
        assert!(signer.verify(b"input", &sig).is_ok());

        let mixed =
            algorithm.new_signing_key(&Key::pair(first, p521::ecdsa::VerifyingKey::from(&second)));
        assert!(matches!(mixed.check(), Err(JoseError::KeyTypeMismatch(_))));
    }
}
