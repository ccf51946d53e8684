//! RSA algorithms: RSASSA-PKCS1-v1_5 (RS256/384/512) and RSASSA-PSS (PS256/384/512)

use super::{Algorithm, HashAlg, SignatureScheme, SigningKey, bind};
use crate::error::{JoseError, JoseResult};
use crate::key::{Key, KeyKind, PrivateKey, PublicKey};
use rand_core::OsRng;
use rsa::sha2::{Sha256, Sha384, Sha512};
use rsa::signature::{RandomizedSigner, SignatureEncoding, Signer, Verifier};
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey, pkcs1v15, pss};
use std::sync::Arc;

/// Smallest modulus accepted by the strict variants, in bits
pub const MIN_RSA_MODULUS_BITS: usize = 2048;

/// RSA signature padding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RsaPadding {
    /// RSASSA-PKCS1-v1_5, deterministic
    Pkcs1v15,
    /// RSASSA-PSS with MGF1 and a salt as long as the hash, randomized
    Pss,
}

/// RSA signature algorithm.
///
/// The strict form rejects moduli under 2048 bits (RFC 7518 §3.3). The
/// [`RsaAlgorithm::weak`] form keeps the same `alg` id and accepts shorter
/// moduli; it is never registered by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RsaAlgorithm {
    hash: HashAlg,
    padding: RsaPadding,
    allow_weak: bool,
}

impl RsaAlgorithm {
    /// Strict RSA algorithm
    #[must_use]
    pub const fn new(padding: RsaPadding, hash: HashAlg) -> Self {
        Self {
            hash,
            padding,
            allow_weak: false,
        }
    }

    /// Variant accepting moduli shorter than 2048 bits
    #[must_use]
    pub const fn weak(padding: RsaPadding, hash: HashAlg) -> Self {
        Self {
            hash,
            padding,
            allow_weak: true,
        }
    }

    /// RS256
    #[must_use]
    pub const fn rs256() -> Self {
        Self::new(RsaPadding::Pkcs1v15, HashAlg::Sha256)
    }

    /// PS256
    #[must_use]
    pub const fn ps256() -> Self {
        Self::new(RsaPadding::Pss, HashAlg::Sha256)
    }

    fn scheme_for(&self, key: &Key) -> JoseResult<RsaScheme> {
        let private = match key.private() {
            Some(PrivateKey::Rsa(private)) => Some(Arc::clone(private)),
            Some(
                other @ (PrivateKey::P256(_)
                | PrivateKey::P384(_)
                | PrivateKey::P521(_)
                | PrivateKey::Secp256k1(_)
                | PrivateKey::Ed25519(_)
                | PrivateKey::Ed448(_)
                | PrivateKey::X25519(_)
                | PrivateKey::X448(_)
                | PrivateKey::Symmetric(_)),
            ) => return Err(self.mismatch(other.kind())),
            None => None,
        };
        let public = match key.public() {
            Some(PublicKey::Rsa(public)) => Some(Arc::clone(public)),
            Some(
                other @ (PublicKey::P256(_)
                | PublicKey::P384(_)
                | PublicKey::P521(_)
                | PublicKey::Secp256k1(_)
                | PublicKey::Ed25519(_)
                | PublicKey::Ed448(_)
                | PublicKey::X25519(_)
                | PublicKey::X448(_)),
            ) => return Err(self.mismatch(other.kind())),
            None => None,
        };

        let public = match (public, &private) {
            (Some(public), _) => public,
            (None, Some(private)) => Arc::new(private.to_public_key()),
            (None, None) => return Err(JoseError::key_type_mismatch("missing RSA key")),
        };

        let modulus_bits = public.n().bits();
        if modulus_bits < MIN_RSA_MODULUS_BITS && !self.allow_weak {
            return Err(JoseError::WeakKey(format!(
                "RSA modulus for {} must be at least {MIN_RSA_MODULUS_BITS} bits, \
                 got {modulus_bits}",
                self.id()
            )));
        }

        if let Some(private) = &private
            && private.n() != public.n()
        {
            return Err(JoseError::key_type_mismatch(
                "RSA private and public halves do not match",
            ));
        }

        Ok(RsaScheme {
            hash: self.hash,
            padding: self.padding,
            private,
            public,
        })
    }

    fn mismatch(&self, kind: KeyKind) -> JoseError {
        JoseError::KeyTypeMismatch(format!("{} requires an RSA key, got {kind}", self.id()))
    }
}

impl Algorithm for RsaAlgorithm {
    fn id(&self) -> &str {
        match (self.padding, self.hash) {
            (RsaPadding::Pkcs1v15, HashAlg::Sha256) => "RS256",
            (RsaPadding::Pkcs1v15, HashAlg::Sha384) => "RS384",
            (RsaPadding::Pkcs1v15, HashAlg::Sha512) => "RS512",
            (RsaPadding::Pss, HashAlg::Sha256) => "PS256",
            (RsaPadding::Pss, HashAlg::Sha384) => "PS384",
            (RsaPadding::Pss, HashAlg::Sha512) => "PS512",
        }
    }

    fn new_signing_key(&self, key: &Key) -> SigningKey {
        bind(self.id(), key, self.scheme_for(key))
    }
}

struct RsaScheme {
    hash: HashAlg,
    padding: RsaPadding,
    private: Option<Arc<RsaPrivateKey>>,
    public: Arc<RsaPublicKey>,
}

fn pkcs1v15_sign<D>(key: &RsaPrivateKey, input: &[u8]) -> JoseResult<Vec<u8>>
where
    pkcs1v15::SigningKey<D>: Signer<pkcs1v15::Signature>,
    D: rsa::sha2::Digest + rsa::pkcs8::AssociatedOid,
{
    pkcs1v15::SigningKey::<D>::new(key.clone())
        .try_sign(input)
        .map(|sig| sig.to_vec())
        .map_err(|_| JoseError::SignUnavailable)
}

fn pkcs1v15_verify<D>(key: &RsaPublicKey, input: &[u8], signature: &[u8]) -> JoseResult<()>
where
    pkcs1v15::VerifyingKey<D>: Verifier<pkcs1v15::Signature>,
    D: rsa::sha2::Digest + rsa::pkcs8::AssociatedOid,
{
    let signature =
        pkcs1v15::Signature::try_from(signature).map_err(|_| JoseError::SignatureMismatch)?;
    pkcs1v15::VerifyingKey::<D>::new(key.clone())
        .verify(input, &signature)
        .map_err(|_| JoseError::SignatureMismatch)
}

fn pss_sign<D>(key: &RsaPrivateKey, input: &[u8]) -> JoseResult<Vec<u8>>
where
    pss::SigningKey<D>: RandomizedSigner<pss::Signature>,
    D: rsa::sha2::Digest,
{
    pss::SigningKey::<D>::new(key.clone())
        .try_sign_with_rng(&mut OsRng, input)
        .map(|sig| sig.to_vec())
        .map_err(|_| JoseError::SignUnavailable)
}

fn pss_verify<D>(key: &RsaPublicKey, input: &[u8], signature: &[u8]) -> JoseResult<()>
where
    pss::VerifyingKey<D>: Verifier<pss::Signature>,
    D: rsa::sha2::Digest,
{
    let signature =
        pss::Signature::try_from(signature).map_err(|_| JoseError::SignatureMismatch)?;
    pss::VerifyingKey::<D>::new(key.clone())
        .verify(input, &signature)
        .map_err(|_| JoseError::SignatureMismatch)
}

impl SignatureScheme for RsaScheme {
    fn sign(&self, input: &[u8]) -> JoseResult<Vec<u8>> {
        let private = self.private.as_deref().ok_or(JoseError::SignUnavailable)?;
        match (self.padding, self.hash) {
            (RsaPadding::Pkcs1v15, HashAlg::Sha256) => pkcs1v15_sign::<Sha256>(private, input),
            (RsaPadding::Pkcs1v15, HashAlg::Sha384) => pkcs1v15_sign::<Sha384>(private, input),
            (RsaPadding::Pkcs1v15, HashAlg::Sha512) => pkcs1v15_sign::<Sha512>(private, input),
            (RsaPadding::Pss, HashAlg::Sha256) => pss_sign::<Sha256>(private, input),
            (RsaPadding::Pss, HashAlg::Sha384) => pss_sign::<Sha384>(private, input),
            (RsaPadding::Pss, HashAlg::Sha512) => pss_sign::<Sha512>(private, input),
        }
    }

    fn verify(&self, input: &[u8], signature: &[u8]) -> JoseResult<()> {
        let public = &self.public;
        match (self.padding, self.hash) {
            (RsaPadding::Pkcs1v15, HashAlg::Sha256) => {
                pkcs1v15_verify::<Sha256>(public, input, signature)
            }
            (RsaPadding::Pkcs1v15, HashAlg::Sha384) => {
                pkcs1v15_verify::<Sha384>(public, input, signature)
            }
            (RsaPadding::Pkcs1v15, HashAlg::Sha512) => {
                pkcs1v15_verify::<Sha512>(public, input, signature)
            }
            (RsaPadding::Pss, HashAlg::Sha256) => pss_verify::<Sha256>(public, input, signature),
            (RsaPadding::Pss, HashAlg::Sha384) => pss_verify::<Sha384>(public, input, signature),
            (RsaPadding::Pss, HashAlg::Sha512) => pss_verify::<Sha512>(public, input, signature),
        }
    }
}
