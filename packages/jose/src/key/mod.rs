//! Caller-supplied key material
//!
//! A [`Key`] carries up to two halves, each a tagged variant with one case
//! per key kind. Algorithms match on these variants exhaustively when binding
//! a key, so a new key kind cannot be added without every algorithm deciding
//! what to do with it.

mod capabilities;

pub use capabilities::{Capabilities, KeyUsage};

use std::fmt;
use std::sync::Arc;
use zeroize::Zeroizing;

/// Key kinds known to the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyKind {
    /// RSA
    Rsa,
    /// ECDSA over NIST P-256
    P256,
    /// ECDSA over NIST P-384
    P384,
    /// ECDSA over NIST P-521
    P521,
    /// ECDSA over secp256k1
    Secp256k1,
    /// Edwards25519 signing key
    Ed25519,
    /// Edwards448 signing key
    Ed448,
    /// Curve25519 key agreement key
    X25519,
    /// Curve448 key agreement key
    X448,
    /// Octet sequence
    Symmetric,
}

impl fmt::Display for KeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            KeyKind::Rsa => "RSA",
            KeyKind::P256 => "EC P-256",
            KeyKind::P384 => "EC P-384",
            KeyKind::P521 => "EC P-521",
            KeyKind::Secp256k1 => "EC secp256k1",
            KeyKind::Ed25519 => "OKP Ed25519",
            KeyKind::Ed448 => "OKP Ed448",
            KeyKind::X25519 => "OKP X25519",
            KeyKind::X448 => "OKP X448",
            KeyKind::Symmetric => "oct",
        };
        f.write_str(name)
    }
}

/// Private (or secret) half of a key
#[derive(Clone)]
pub enum PrivateKey {
    /// RSA private key
    Rsa(Arc<rsa::RsaPrivateKey>),
    /// P-256 signing key
    P256(Arc<p256::ecdsa::SigningKey>),
    /// P-384 signing key
    P384(Arc<p384::ecdsa::SigningKey>),
    /// P-521 signing key
    P521(Arc<p521::ecdsa::SigningKey>),
    /// secp256k1 signing key
    Secp256k1(Arc<k256::ecdsa::SigningKey>),
    /// Ed25519 signing key
    Ed25519(Arc<ed25519_dalek::SigningKey>),
    /// Ed448 signing key
    Ed448(Arc<ed448_goldilocks_plus::SigningKey>),
    /// X25519 static secret
    X25519(Arc<Zeroizing<[u8; 32]>>),
    /// X448 static secret
    X448(Arc<Zeroizing<[u8; 56]>>),
    /// Shared secret for MAC algorithms
    Symmetric(Arc<Zeroizing<Vec<u8>>>),
}

impl PrivateKey {
    /// Kind of this key half
    #[must_use]
    pub fn kind(&self) -> KeyKind {
        match self {
            PrivateKey::Rsa(_) => KeyKind::Rsa,
            PrivateKey::P256(_) => KeyKind::P256,
            PrivateKey::P384(_) => KeyKind::P384,
            PrivateKey::P521(_) => KeyKind::P521,
            PrivateKey::Secp256k1(_) => KeyKind::Secp256k1,
            PrivateKey::Ed25519(_) => KeyKind::Ed25519,
            PrivateKey::Ed448(_) => KeyKind::Ed448,
            PrivateKey::X25519(_) => KeyKind::X25519,
            PrivateKey::X448(_) => KeyKind::X448,
            PrivateKey::Symmetric(_) => KeyKind::Symmetric,
        }
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PrivateKey({}, ..)", self.kind())
    }
}

/// Public half of a key
#[derive(Clone)]
pub enum PublicKey {
    /// RSA public key
    Rsa(Arc<rsa::RsaPublicKey>),
    /// P-256 verifying key
    P256(Arc<p256::ecdsa::VerifyingKey>),
    /// P-384 verifying key
    P384(Arc<p384::ecdsa::VerifyingKey>),
    /// P-521 verifying key
    P521(Arc<p521::ecdsa::VerifyingKey>),
    /// secp256k1 verifying key
    Secp256k1(Arc<k256::ecdsa::VerifyingKey>),
    /// Ed25519 verifying key
    Ed25519(Arc<ed25519_dalek::VerifyingKey>),
    /// Ed448 verifying key
    Ed448(Arc<ed448_goldilocks_plus::VerifyingKey>),
    /// X25519 public value
    X25519([u8; 32]),
    /// X448 public value
    X448([u8; 56]),
}

impl PublicKey {
    /// Kind of this key half
    #[must_use]
    pub fn kind(&self) -> KeyKind {
        match self {
            PublicKey::Rsa(_) => KeyKind::Rsa,
            PublicKey::P256(_) => KeyKind::P256,
            PublicKey::P384(_) => KeyKind::P384,
            PublicKey::P521(_) => KeyKind::P521,
            PublicKey::Secp256k1(_) => KeyKind::Secp256k1,
            PublicKey::Ed25519(_) => KeyKind::Ed25519,
            PublicKey::Ed448(_) => KeyKind::Ed448,
            PublicKey::X25519(_) => KeyKind::X25519,
            PublicKey::X448(_) => KeyKind::X448,
        }
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.kind())
    }
}

macro_rules! key_half_from {
    ($half:ident :: $variant:ident, $ty:ty) => {
        impl From<$ty> for $half {
            fn from(key: $ty) -> Self {
                $half::$variant(Arc::new(key))
            }
        }
    };
}

key_half_from!(PrivateKey::Rsa, rsa::RsaPrivateKey);
key_half_from!(PrivateKey::P256, p256::ecdsa::SigningKey);
key_half_from!(PrivateKey::P384, p384::ecdsa::SigningKey);
key_half_from!(PrivateKey::P521, p521::ecdsa::SigningKey);
key_half_from!(PrivateKey::Secp256k1, k256::ecdsa::SigningKey);
key_half_from!(PrivateKey::Ed25519, ed25519_dalek::SigningKey);
key_half_from!(PrivateKey::Ed448, ed448_goldilocks_plus::SigningKey);
key_half_from!(PublicKey::Rsa, rsa::RsaPublicKey);
key_half_from!(PublicKey::P256, p256::ecdsa::VerifyingKey);
key_half_from!(PublicKey::P384, p384::ecdsa::VerifyingKey);
key_half_from!(PublicKey::P521, p521::ecdsa::VerifyingKey);
key_half_from!(PublicKey::Secp256k1, k256::ecdsa::VerifyingKey);
key_half_from!(PublicKey::Ed25519, ed25519_dalek::VerifyingKey);
key_half_from!(PublicKey::Ed448, ed448_goldilocks_plus::VerifyingKey);

/// Key material handed to [`Algorithm::new_signing_key`](crate::Algorithm::new_signing_key).
///
/// The engine only reads a `Key`; binding copies the handles it needs (cheap
/// `Arc` clones), so the `Key` can be dropped right after binding.
#[derive(Debug, Clone, Default)]
pub struct Key {
    private: Option<PrivateKey>,
    public: Option<PublicKey>,
    capabilities: Capabilities,
    key_id: Option<String>,
}

impl Key {
    /// Key with only a private half
    #[must_use]
    pub fn from_private(private: impl Into<PrivateKey>) -> Self {
        Self {
            private: Some(private.into()),
            ..Self::default()
        }
    }

    /// Key with only a public half
    #[must_use]
    pub fn from_public(public: impl Into<PublicKey>) -> Self {
        Self {
            public: Some(public.into()),
            ..Self::default()
        }
    }

    /// Key with both halves
    #[must_use]
    pub fn pair(private: impl Into<PrivateKey>, public: impl Into<PublicKey>) -> Self {
        Self {
            private: Some(private.into()),
            public: Some(public.into()),
            ..Self::default()
        }
    }

    /// Shared secret for HMAC algorithms
    #[must_use]
    pub fn symmetric(secret: impl Into<Vec<u8>>) -> Self {
        Self::from_private(PrivateKey::Symmetric(Arc::new(Zeroizing::new(
            secret.into(),
        ))))
    }

    /// Replace the capability flags
    #[must_use]
    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Take key id and capabilities from a JWK usage record
    #[must_use]
    pub fn with_usage(mut self, usage: &KeyUsage) -> Self {
        self.capabilities = usage.capabilities();
        if usage.kid.is_some() {
            self.key_id.clone_from(&usage.kid);
        }
        self
    }

    /// Set the key id
    #[must_use]
    pub fn with_key_id(mut self, kid: impl Into<String>) -> Self {
        self.key_id = Some(kid.into());
        self
    }

    /// Private half, if any
    #[must_use]
    pub fn private(&self) -> Option<&PrivateKey> {
        self.private.as_ref()
    }

    /// Public half, if any
    #[must_use]
    pub fn public(&self) -> Option<&PublicKey> {
        self.public.as_ref()
    }

    /// Capability flags
    #[must_use]
    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// Key id
    #[must_use]
    pub fn key_id(&self) -> Option<&str> {
        self.key_id.as_deref()
    }

    /// The single kind shared by both halves.
    ///
    /// `None` when the key is empty or its halves are of different kinds.
    #[must_use]
    pub fn kind(&self) -> Option<KeyKind> {
        match (&self.private, &self.public) {
            (Some(private), Some(public)) if private.kind() == public.kind() => {
                Some(private.kind())
            }
            (Some(_), Some(_)) | (None, None) => None,
            (Some(private), None) => Some(private.kind()),
            (None, Some(public)) => Some(public.kind()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mixed_halves_have_no_kind() {
        let secret = p256::ecdsa::SigningKey::from_slice(&[7u8; 32]).unwrap();
        let other = p384::ecdsa::SigningKey::from_slice(&[7u8; 48]).unwrap();
        let key = Key::pair(secret, other.verifying_key().clone());
        assert_eq!(key.kind(), None);
    }

    #[test]
    fn debug_output_hides_secret_bytes() {
        let key = Key::symmetric(b"super secret".to_vec());
        let debug = format!("{key:?}");
        assert!(!debug.contains("super"));
        assert_eq!(key.kind(), Some(KeyKind::Symmetric));
    }
}
