//! Signature algorithms and the bound [`SigningKey`]
//!
//! An [`Algorithm`] turns a caller's [`Key`] into a [`SigningKey`]. Binding
//! never fails loudly: a key of the wrong kind, or one that is too weak,
//! produces a `SigningKey` that returns the binding error from every call.

mod ecdsa;
mod eddsa;
mod hmac;
mod none;
mod rsa;

pub use ecdsa::{EcCurve, EcdsaAlgorithm};
pub use eddsa::EdDsaAlgorithm;
pub use hmac::HmacAlgorithm;
pub use none::NoneAlgorithm;
pub use rsa::{RsaAlgorithm, RsaPadding};

use crate::error::{JoseError, JoseResult, KeyOperation};
use crate::key::{Capabilities, Key};
use std::fmt;
use std::sync::Arc;

/// Hash functions used by the built-in algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlg {
    /// SHA-256
    Sha256,
    /// SHA-384
    Sha384,
    /// SHA-512
    Sha512,
}

impl HashAlg {
    /// Digest size in bytes
    #[must_use]
    pub const fn output_size(self) -> usize {
        match self {
            HashAlg::Sha256 => 32,
            HashAlg::Sha384 => 48,
            HashAlg::Sha512 => 64,
        }
    }

    /// Bit size used in algorithm names (`256`, `384`, `512`)
    #[must_use]
    pub const fn bits(self) -> usize {
        self.output_size() * 8
    }
}

/// A signature algorithm able to bind keys.
///
/// Implementations are stateless after construction and shared between
/// threads; the registry hands them out as `Arc<dyn Algorithm>`.
pub trait Algorithm: Send + Sync + fmt::Debug {
    /// The `alg` header value
    fn id(&self) -> &str;

    /// Bind `key` to this algorithm.
    ///
    /// Must not panic. Mismatched or weak keys yield
    /// [`SigningKey::invalid`].
    fn new_signing_key(&self, key: &Key) -> SigningKey;

    /// Bind `key`, surfacing binding errors immediately.
    fn try_new_signing_key(&self, key: &Key) -> JoseResult<SigningKey> {
        let bound = self.new_signing_key(key);
        bound.check()?;
        Ok(bound)
    }
}

/// The cryptographic half of a bound key.
///
/// Built-in algorithms provide their own schemes; implement this trait to plug
/// a custom algorithm into the registry.
pub trait SignatureScheme: Send + Sync {
    /// Produce a signature over `input`
    fn sign(&self, input: &[u8]) -> JoseResult<Vec<u8>>;

    /// Check `signature` over `input`
    fn verify(&self, input: &[u8], signature: &[u8]) -> JoseResult<()>;
}

/// An algorithm bound to key material.
///
/// Cloning is cheap. Capability flags are fixed when the key is bound; a later
/// change to the originating key record does not affect this value.
#[derive(Clone)]
pub struct SigningKey {
    algorithm: Arc<str>,
    capabilities: Capabilities,
    key_id: Option<String>,
    scheme: Result<Arc<dyn SignatureScheme>, JoseError>,
}

impl SigningKey {
    /// Bind a scheme under an algorithm id
    pub fn new(
        algorithm: &str,
        capabilities: Capabilities,
        scheme: impl SignatureScheme + 'static,
    ) -> Self {
        Self {
            algorithm: Arc::from(algorithm),
            capabilities,
            key_id: None,
            scheme: Ok(Arc::new(scheme)),
        }
    }

    /// A key that fails every operation with `error`
    #[must_use]
    pub fn invalid(algorithm: &str, error: JoseError) -> Self {
        Self {
            algorithm: Arc::from(algorithm),
            capabilities: Capabilities::NONE,
            key_id: None,
            scheme: Err(error),
        }
    }

    /// Attach the key id of the originating key record
    #[must_use]
    pub fn with_key_id(mut self, kid: Option<String>) -> Self {
        self.key_id = kid;
        self
    }

    /// Algorithm this key was bound to
    #[must_use]
    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    /// Key id carried over from the key record
    #[must_use]
    pub fn key_id(&self) -> Option<&str> {
        self.key_id.as_deref()
    }

    /// Capability flags captured at binding time
    #[must_use]
    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// Whether binding succeeded
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.scheme.is_ok()
    }

    /// The binding error, if any
    pub fn check(&self) -> JoseResult<()> {
        self.scheme.as_ref().map(|_| ()).map_err(Clone::clone)
    }

    /// Sign `input`
    pub fn sign(&self, input: &[u8]) -> JoseResult<Vec<u8>> {
        let scheme = self.scheme.as_ref().map_err(Clone::clone)?;
        if !self.capabilities.may_sign {
            return Err(JoseError::CapabilityDenied(KeyOperation::Sign));
        }
        scheme.sign(input)
    }

    /// Verify `signature` over `input`
    pub fn verify(&self, input: &[u8], signature: &[u8]) -> JoseResult<()> {
        let scheme = self.scheme.as_ref().map_err(Clone::clone)?;
        if !self.capabilities.may_verify {
            return Err(JoseError::CapabilityDenied(KeyOperation::Verify));
        }
        scheme.verify(input, signature)
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("algorithm", &self.algorithm)
            .field("capabilities", &self.capabilities)
            .field("key_id", &self.key_id)
            .field("valid", &self.scheme.is_ok())
            .finish()
    }
}

/// Bind helper shared by the built-in algorithms
pub(crate) fn bind(
    algorithm: &str,
    key: &Key,
    scheme: JoseResult<impl SignatureScheme + 'static>,
) -> SigningKey {
    match scheme {
        Ok(scheme) => SigningKey::new(algorithm, key.capabilities(), scheme)
            .with_key_id(key.key_id().map(str::to_owned)),
        Err(err) => {
            tracing::debug!(algorithm, error = %err, "key binding rejected");
            SigningKey::invalid(algorithm, err).with_key_id(key.key_id().map(str::to_owned))
        }
    }
}
