//! EdDSA (RFC 8037) over Ed25519 and Ed448
//!
//! One `alg` id covers both curves; the key decides which curve is used.

use super::{Algorithm, SignatureScheme, SigningKey, bind};
use crate::error::{JoseError, JoseResult};
use crate::key::{Key, PrivateKey, PublicKey};
use ed25519_dalek::Signer as _;
use std::sync::Arc;

/// Ed448 signature length in bytes
const ED448_SIGNATURE_LENGTH: usize = 114;

/// EdDSA with Ed25519 or Ed448 keys
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EdDsaAlgorithm;

impl EdDsaAlgorithm {
    fn scheme_for(&self, key: &Key) -> JoseResult<EdDsaScheme> {
        let private = key.private();
        let public = key.public();
        let scheme = match (private, public) {
            (Some(PrivateKey::Ed25519(private)), None) => EdDsaScheme::Ed25519 {
                public: private.verifying_key(),
                private: Some(private.clone()),
            },
            (private, Some(PublicKey::Ed25519(public))) => {
                let private = match private {
                    Some(PrivateKey::Ed25519(private)) if private.verifying_key() != **public => {
                        return Err(self.unpaired());
                    }
                    Some(PrivateKey::Ed25519(private)) => Some(private.clone()),
                    None => None,
                    Some(other) => return Err(self.mismatch(&other.kind().to_string())),
                };
                EdDsaScheme::Ed25519 {
                    public: **public,
                    private,
                }
            }
            (Some(PrivateKey::Ed448(private)), None) => EdDsaScheme::Ed448 {
                public: Arc::new(private.verifying_key()),
                private: Some(private.clone()),
            },
            (private, Some(PublicKey::Ed448(public))) => {
                let private = match private {
                    Some(PrivateKey::Ed448(private)) if private.verifying_key() != **public => {
                        return Err(self.unpaired());
                    }
                    Some(PrivateKey::Ed448(private)) => Some(private.clone()),
                    None => None,
                    Some(other) => return Err(self.mismatch(&other.kind().to_string())),
                };
                EdDsaScheme::Ed448 {
                    public: Arc::clone(public),
                    private,
                }
            }
            (
                Some(
                    other @ (PrivateKey::Rsa(_)
                    | PrivateKey::P256(_)
                    | PrivateKey::P384(_)
                    | PrivateKey::P521(_)
                    | PrivateKey::Secp256k1(_)
                    | PrivateKey::X25519(_)
                    | PrivateKey::X448(_)
                    | PrivateKey::Symmetric(_)),
                ),
                None,
            ) => return Err(self.mismatch(&other.kind().to_string())),
            (
                _,
                Some(
                    other @ (PublicKey::Rsa(_)
                    | PublicKey::P256(_)
                    | PublicKey::P384(_)
                    | PublicKey::P521(_)
                    | PublicKey::Secp256k1(_)
                    | PublicKey::X25519(_)
                    | PublicKey::X448(_)),
                ),
            ) => return Err(self.mismatch(&other.kind().to_string())),
            (None, None) => return Err(JoseError::key_type_mismatch("missing OKP key")),
        };
        Ok(scheme)
    }

    fn unpaired(&self) -> JoseError {
        JoseError::key_type_mismatch("OKP private and public halves belong to different keys")
    }

    fn mismatch(&self, got: &str) -> JoseError {
        JoseError::KeyTypeMismatch(format!(
            "EdDSA requires an Ed25519 or Ed448 key, got {got}"
        ))
    }
}

impl Algorithm for EdDsaAlgorithm {
    fn id(&self) -> &str {
        "EdDSA"
    }

    fn new_signing_key(&self, key: &Key) -> SigningKey {
        bind(self.id(), key, self.scheme_for(key))
    }
}

enum EdDsaScheme {
    Ed25519 {
        private: Option<Arc<ed25519_dalek::SigningKey>>,
        public: ed25519_dalek::VerifyingKey,
    },
    Ed448 {
        private: Option<Arc<ed448_goldilocks_plus::SigningKey>>,
        public: Arc<ed448_goldilocks_plus::VerifyingKey>,
    },
}

impl SignatureScheme for EdDsaScheme {
    fn sign(&self, input: &[u8]) -> JoseResult<Vec<u8>> {
        match self {
            EdDsaScheme::Ed25519 { private, .. } => {
                let private = private.as_deref().ok_or(JoseError::SignUnavailable)?;
                let signature = private
                    .try_sign(input)
                    .map_err(|_| JoseError::SignUnavailable)?;
                Ok(signature.to_bytes().to_vec())
            }
            EdDsaScheme::Ed448 { private, .. } => {
                let private = private.as_deref().ok_or(JoseError::SignUnavailable)?;
                Ok(private.sign_raw(input).to_bytes().to_vec())
            }
        }
    }

    fn verify(&self, input: &[u8], signature: &[u8]) -> JoseResult<()> {
        match self {
            EdDsaScheme::Ed25519 { public, .. } => {
                let signature = ed25519_dalek::Signature::from_slice(signature)
                    .map_err(|_| JoseError::SignatureMismatch)?;
                public
                    .verify_strict(input, &signature)
                    .map_err(|_| JoseError::SignatureMismatch)
            }
            EdDsaScheme::Ed448 { public, .. } => {
                if signature.len() != ED448_SIGNATURE_LENGTH {
                    return Err(JoseError::SignatureMismatch);
                }
                let signature = ed448_goldilocks_plus::Signature::try_from(signature)
                    .map_err(|_| JoseError::SignatureMismatch)?;
                public
                    .verify_raw(&signature, input)
                    .map_err(|_| JoseError::SignatureMismatch)
            }
        }
    }
}
