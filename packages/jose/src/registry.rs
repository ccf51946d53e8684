//! Algorithm registry: `alg` id to algorithm constructor

use crate::algorithms::{
    Algorithm, EcCurve, EcdsaAlgorithm, EdDsaAlgorithm, HashAlg, HmacAlgorithm, NoneAlgorithm,
    RsaAlgorithm, RsaPadding,
};
use crate::error::{JoseError, JoseResult};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Constructor stored for each registered algorithm id
pub type AlgorithmFactory = Arc<dyn Fn() -> Arc<dyn Algorithm> + Send + Sync>;

static GLOBAL: Lazy<AlgorithmRegistry> = Lazy::new(AlgorithmRegistry::with_defaults);

/// Maps algorithm identifiers to constructors.
///
/// Build one with [`AlgorithmRegistry::with_defaults`], add custom algorithms
/// through `&mut self`, then share it by reference or `Arc`. Lookups take
/// `&self` and are safe from any number of threads.
#[derive(Clone, Default)]
pub struct AlgorithmRegistry {
    factories: HashMap<String, AlgorithmFactory>,
}

impl AlgorithmRegistry {
    /// Empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in algorithm.
    ///
    /// Only strict variants are registered. Weak HMAC and RSA variants reuse
    /// the same ids and must be registered explicitly by the caller.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for hash in [HashAlg::Sha256, HashAlg::Sha384, HashAlg::Sha512] {
            registry.register_algorithm(HmacAlgorithm::new(hash));
            registry.register_algorithm(RsaAlgorithm::new(RsaPadding::Pkcs1v15, hash));
            registry.register_algorithm(RsaAlgorithm::new(RsaPadding::Pss, hash));
        }
        for curve in [
            EcCurve::P256,
            EcCurve::P384,
            EcCurve::P521,
            EcCurve::Secp256k1,
        ] {
            registry.register_algorithm(EcdsaAlgorithm::new(curve));
        }
        registry.register_algorithm(EdDsaAlgorithm);
        registry.register_algorithm(NoneAlgorithm);
        registry
    }

    /// Process-wide read-only registry with the default algorithms
    #[must_use]
    pub fn global() -> &'static AlgorithmRegistry {
        &GLOBAL
    }

    /// Register `factory` under `id`, replacing any previous entry.
    pub fn register<F>(&mut self, id: impl Into<String>, factory: F)
    where
        F: Fn() -> Arc<dyn Algorithm> + Send + Sync + 'static,
    {
        let id = id.into();
        tracing::trace!(algorithm = %id, "registering algorithm");
        self.factories.insert(id, Arc::new(factory));
    }

    /// Register a stateless algorithm instance under its own id.
    pub fn register_algorithm<A>(&mut self, algorithm: A)
    where
        A: Algorithm + 'static,
    {
        let shared: Arc<dyn Algorithm> = Arc::new(algorithm);
        let id = shared.id().to_string();
        self.register(id, move || Arc::clone(&shared));
    }

    /// Look up the algorithm registered under `id`
    pub fn resolve(&self, id: &str) -> JoseResult<Arc<dyn Algorithm>> {
        self.factories
            .get(id)
            .map(|factory| factory())
            .ok_or_else(|| JoseError::UnsupportedAlgorithm(id.to_string()))
    }

    /// Whether `id` is registered
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.factories.contains_key(id)
    }

    /// Registered ids in sorted order
    #[must_use]
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

impl fmt::Debug for AlgorithmRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlgorithmRegistry")
            .field("ids", &self.ids())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::Key;

    #[test]
    fn defaults_cover_every_builtin_id() {
        let registry = AlgorithmRegistry::with_defaults();
        let mut expected = vec![
            "HS256", "HS384", "HS512", "RS256", "RS384", "RS512", "PS256", "PS384", "PS512",
            "ES256", "ES384", "ES512", "ES256K", "EdDSA", "none",
        ];
        expected.sort_unstable();
        assert_eq!(registry.ids(), expected);
        for id in expected {
            assert_eq!(registry.resolve(id).unwrap().id(), id);
        }
    }

    #[test]
    fn ids_are_case_sensitive() {
        let registry = AlgorithmRegistry::global();
        assert!(registry.contains("HS256"));
        assert!(matches!(
            registry.resolve("hs256"),
            Err(JoseError::UnsupportedAlgorithm(id)) if id == "hs256"
        ));
    }

    #[test]
    fn weak_variant_replaces_strict_entry_when_registered() {
        let mut registry = AlgorithmRegistry::with_defaults();
        let key = Key::symmetric(vec![7u8; 16]);
        assert!(registry.resolve("HS256").unwrap().try_new_signing_key(&key).is_err());

        registry.register_algorithm(HmacAlgorithm::weak(HashAlg::Sha256));
        let bound = registry.resolve("HS256").unwrap().try_new_signing_key(&key);
        assert!(bound.is_ok());
    }
}
