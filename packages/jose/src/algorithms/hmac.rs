//! HMAC-SHA algorithms (HS256, HS384, HS512)

use super::{Algorithm, HashAlg, SignatureScheme, SigningKey, bind};
use crate::error::{JoseError, JoseResult};
use crate::key::{Key, PrivateKey};
use hmac::{Hmac, Mac};
use sha2::{Sha256, Sha384, Sha512};
use std::sync::Arc;
use zeroize::Zeroizing;

type HmacSha256 = Hmac<Sha256>;
type HmacSha384 = Hmac<Sha384>;
type HmacSha512 = Hmac<Sha512>;

/// HMAC with a SHA-2 hash.
///
/// The strict form rejects secrets shorter than the hash output
/// (RFC 7518 §3.2). [`HmacAlgorithm::weak`] keeps the same `alg` id and MAC
/// but accepts any secret length; it is never registered by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HmacAlgorithm {
    hash: HashAlg,
    allow_weak: bool,
}

impl HmacAlgorithm {
    /// Strict HMAC for `hash`
    #[must_use]
    pub const fn new(hash: HashAlg) -> Self {
        Self {
            hash,
            allow_weak: false,
        }
    }

    /// Variant accepting secrets shorter than the hash output
    #[must_use]
    pub const fn weak(hash: HashAlg) -> Self {
        Self {
            hash,
            allow_weak: true,
        }
    }

    /// HS256
    #[must_use]
    pub const fn hs256() -> Self {
        Self::new(HashAlg::Sha256)
    }

    /// HS384
    #[must_use]
    pub const fn hs384() -> Self {
        Self::new(HashAlg::Sha384)
    }

    /// HS512
    #[must_use]
    pub const fn hs512() -> Self {
        Self::new(HashAlg::Sha512)
    }

    /// Hash function of this algorithm
    #[must_use]
    pub const fn hash(&self) -> HashAlg {
        self.hash
    }

    fn secret_for(&self, key: &Key) -> JoseResult<HmacScheme> {
        if key.public().is_some() {
            return Err(JoseError::key_type_mismatch(
                "HMAC keys have no public half",
            ));
        }
        let secret = match key.private() {
            Some(PrivateKey::Symmetric(secret)) => Arc::clone(secret),
            Some(
                other @ (PrivateKey::Rsa(_)
                | PrivateKey::P256(_)
                | PrivateKey::P384(_)
                | PrivateKey::P521(_)
                | PrivateKey::Secp256k1(_)
                | PrivateKey::Ed25519(_)
                | PrivateKey::Ed448(_)
                | PrivateKey::X25519(_)
                | PrivateKey::X448(_)),
            ) => {
                return Err(JoseError::KeyTypeMismatch(format!(
                    "{} requires a symmetric key, got {}",
                    self.id(),
                    other.kind()
                )));
            }
            None => return Err(JoseError::key_type_mismatch("missing symmetric secret")),
        };

        let min_length = self.hash.output_size();
        if secret.len() < min_length && !self.allow_weak {
            return Err(JoseError::WeakKey(format!(
                "HMAC key for {} must be at least {} bytes, got {}",
                self.id(),
                min_length,
                secret.len()
            )));
        }

        Ok(HmacScheme {
            hash: self.hash,
            secret,
        })
    }
}

impl Algorithm for HmacAlgorithm {
    fn id(&self) -> &str {
        match self.hash {
            HashAlg::Sha256 => "HS256",
            HashAlg::Sha384 => "HS384",
            HashAlg::Sha512 => "HS512",
        }
    }

    fn new_signing_key(&self, key: &Key) -> SigningKey {
        bind(self.id(), key, self.secret_for(key))
    }
}

struct HmacScheme {
    hash: HashAlg,
    secret: Arc<Zeroizing<Vec<u8>>>,
}

macro_rules! hmac_with {
    ($mac:ty, $secret:expr, $input:expr) => {{
        let mut mac = <$mac>::new_from_slice($secret).map_err(|_| JoseError::HashUnavailable)?;
        mac.update($input);
        mac
    }};
}

impl SignatureScheme for HmacScheme {
    fn sign(&self, input: &[u8]) -> JoseResult<Vec<u8>> {
        let tag = match self.hash {
            HashAlg::Sha256 => hmac_with!(HmacSha256, &self.secret, input)
                .finalize()
                .into_bytes()
                .to_vec(),
            HashAlg::Sha384 => hmac_with!(HmacSha384, &self.secret, input)
                .finalize()
                .into_bytes()
                .to_vec(),
            HashAlg::Sha512 => hmac_with!(HmacSha512, &self.secret, input)
                .finalize()
                .into_bytes()
                .to_vec(),
        };
        Ok(tag)
    }

    fn verify(&self, input: &[u8], signature: &[u8]) -> JoseResult<()> {
        // verify_slice compares in constant time and rejects truncated tags
        let checked = match self.hash {
            HashAlg::Sha256 => hmac_with!(HmacSha256, &self.secret, input).verify_slice(signature),
            HashAlg::Sha384 => hmac_with!(HmacSha384, &self.secret, input).verify_slice(signature),
            HashAlg::Sha512 => hmac_with!(HmacSha512, &self.secret, input).verify_slice(signature),
        };
        checked.map_err(|_| JoseError::SignatureMismatch)
    }
}
