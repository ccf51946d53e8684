//! Key lookup for verification and signing

use crate::algorithms::SigningKey;
use crate::context::Context;
use crate::error::{JoseError, JoseResult};
use crate::header::Header;
use crate::key::Key;
use crate::registry::AlgorithmRegistry;
use dashmap::DashMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Supplies the bound key for a signature's headers.
///
/// Implementations may do I/O (fetching a JWK Set, for instance); the engine
/// runs the returned future under the caller's [`Context`].
pub trait KeyFinder: Send + Sync {
    /// Find the key for a signature
    fn find_key(
        &self,
        ctx: &Context,
        protected: &Header,
        unprotected: Option<&Header>,
    ) -> impl Future<Output = JoseResult<SigningKey>> + Send;
}

impl<T: KeyFinder> KeyFinder for Arc<T> {
    fn find_key(
        &self,
        ctx: &Context,
        protected: &Header,
        unprotected: Option<&Header>,
    ) -> impl Future<Output = JoseResult<SigningKey>> + Send {
        (**self).find_key(ctx, protected, unprotected)
    }
}

/// Always returns the same bound key
#[derive(Debug, Clone)]
pub struct StaticKeyFinder {
    key: SigningKey,
}

impl StaticKeyFinder {
    /// Finder returning `key` for every signature
    #[must_use]
    pub fn new(key: SigningKey) -> Self {
        Self { key }
    }
}

impl KeyFinder for StaticKeyFinder {
    async fn find_key(
        &self,
        _ctx: &Context,
        _protected: &Header,
        _unprotected: Option<&Header>,
    ) -> JoseResult<SigningKey> {
        Ok(self.key.clone())
    }
}

/// Keys indexed by `kid`, bound on demand with the header's `alg`.
///
/// Bound keys are cached per `(kid, alg)`; replacing or removing a key drops
/// its cached bindings. Every stored key carries a generation, and a cached
/// binding is only served while its generation is current.
#[derive(Debug)]
pub struct KeySetFinder {
    registry: Arc<AlgorithmRegistry>,
    keys: DashMap<String, (u64, Key)>,
    bound: DashMap<(String, String), (u64, SigningKey)>,
    generation: AtomicU64,
}

impl KeySetFinder {
    /// Empty key set binding through `registry`
    #[must_use]
    pub fn new(registry: Arc<AlgorithmRegistry>) -> Self {
        Self {
            registry,
            keys: DashMap::new(),
            bound: DashMap::new(),
            generation: AtomicU64::new(0),
        }
    }

    /// Empty key set binding through the default algorithms
    #[must_use]
    pub fn with_default_algorithms() -> Self {
        Self::new(Arc::new(AlgorithmRegistry::with_defaults()))
    }

    /// Add or replace the key for `kid`
    pub fn insert(&self, kid: impl Into<String>, key: Key) {
        let kid = kid.into();
        let generation = self.generation.fetch_add(1, Ordering::Relaxed);
        self.keys.insert(kid.clone(), (generation, key));
        self.bound.retain(|(bound_kid, _), _| *bound_kid != kid);
    }

    /// Builder form of [`KeySetFinder::insert`]
    #[must_use]
    pub fn with_key(self, kid: impl Into<String>, key: Key) -> Self {
        self.insert(kid, key);
        self
    }

    /// Remove the key for `kid`
    pub fn remove(&self, kid: &str) -> Option<Key> {
        let removed = self.keys.remove(kid).map(|(_, (_, key))| key);
        self.bound.retain(|(bound_kid, _), _| bound_kid != kid);
        removed
    }

    /// Number of keys
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the set is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    fn bind(&self, kid: &str, alg: &str) -> JoseResult<SigningKey> {
        let (generation, key) = self
            .keys
            .get(kid)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| JoseError::KeyNotFound(kid.to_string()))?;
        let cache_key = (kid.to_string(), alg.to_string());
        if let Some(cached) = self.bound.get(&cache_key) {
            if cached.0 == generation {
                return Ok(cached.1.clone());
            }
        }
        let bound = self
            .registry
            .resolve(alg)?
            .try_new_signing_key(&key.with_key_id(kid))?;
        tracing::trace!(kid, alg, generation, "bound key from key set");
        self.bound.insert(cache_key, (generation, bound.clone()));
        Ok(bound)
    }
}

impl KeyFinder for KeySetFinder {
    async fn find_key(
        &self,
        _ctx: &Context,
        protected: &Header,
        unprotected: Option<&Header>,
    ) -> JoseResult<SigningKey> {
        let kid = protected
            .key_id()
            .or_else(|| unprotected.and_then(Header::key_id))
            .ok_or_else(|| JoseError::KeyNotFound("header has no kid".into()))?;
        let alg = protected
            .algorithm()
            .or_else(|| unprotected.and_then(Header::algorithm))
            .ok_or_else(|| JoseError::invalid_header("header has no alg"))?;
        self.bind(kid, alg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::{Algorithm, HmacAlgorithm};

    #[tokio::test]
    async fn binds_with_header_alg_and_caches() {
        let finder = KeySetFinder::with_default_algorithms()
            .with_key("mac", Key::symmetric(vec![0x5a; 48]));
        let ctx = Context::new();
        let header = Header::new().with_algorithm("HS384").with_key_id("mac");

        let key = finder.find_key(&ctx, &header, None).await.unwrap();
        assert_eq!(key.algorithm(), "HS384");
        assert_eq!(key.key_id(), Some("mac"));
        assert_eq!(finder.bound.len(), 1);

        finder.insert("mac", Key::symmetric(vec![0x11; 48]));
        assert!(finder.bound.is_empty());
    }

    #[tokio::test]
    async fn replaced_key_is_used_after_rebinding() {
        let old = Key::symmetric(vec![0x5a; 32]);
        let new = Key::symmetric(vec![0x11; 32]);
        let finder = KeySetFinder::with_default_algorithms().with_key("mac", old.clone());
        let ctx = Context::new();
        let header = Header::new().with_algorithm("HS256").with_key_id("mac");
        let signer = |key: &Key| HmacAlgorithm::hs256().new_signing_key(key);
        let new_signature = signer(&new).sign(b"input").unwrap();
        let old_signature = signer(&old).sign(b"input").unwrap();

        let bound = finder.find_key(&ctx, &header, None).await.unwrap();
        assert!(bound.verify(b"input", &old_signature).is_ok());

        finder.insert("mac", new);
        let bound = finder.find_key(&ctx, &header, None).await.unwrap();
        assert!(bound.verify(b"input", &new_signature).is_ok());
        assert!(bound.verify(b"input", &old_signature).is_err());
    }

    #[tokio::test]
    async fn stale_cached_binding_is_not_served() {
        let finder = KeySetFinder::with_default_algorithms()
            .with_key("mac", Key::symmetric(vec![0x5a; 32]));
        let ctx = Context::new();
        let header = Header::new().with_algorithm("HS256").with_key_id("mac");
        let stale = finder.find_key(&ctx, &header, None).await.unwrap();

        // a binding cached from the old key after the replacement landed
        finder.insert("mac", Key::symmetric(vec![0x11; 32]));
        finder
            .bound
            .insert(("mac".into(), "HS256".into()), (0, stale.clone()));

        let current = finder.find_key(&ctx, &header, None).await.unwrap();
        let signature = stale.sign(b"input").unwrap();
        assert!(current.verify(b"input", &signature).is_err());
    }

    #[tokio::test]
    async fn unknown_kid_and_weak_binding_fail() {
        let finder = KeySetFinder::with_default_algorithms()
            .with_key("short", Key::symmetric(vec![1; 16]));
        let ctx = Context::new();

        let missing = Header::new().with_algorithm("HS256").with_key_id("other");
        assert!(matches!(
            finder.find_key(&ctx, &missing, None).await,
            Err(JoseError::KeyNotFound(_))
        ));

        let weak = Header::new().with_algorithm("HS256").with_key_id("short");
        assert!(matches!(
            finder.find_key(&ctx, &weak, None).await,
            Err(JoseError::WeakKey(_))
        ));
    }
}
