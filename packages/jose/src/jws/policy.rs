//! Algorithm acceptance policies

use crate::context::Context;
use crate::error::{JoseError, JoseResult};
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

/// Decides whether a signature's algorithm may be used.
///
/// Consulted by [`Verifier`](super::Verifier) before any key lookup and by
/// [`Signer`](super::Signer) before signing. A rejection skips the signature
/// during verification; cancellation and deadline errors always propagate.
pub trait AlgorithmPolicy: Send + Sync {
    /// Accept or reject `alg`
    fn accept(&self, ctx: &Context, alg: &str) -> impl Future<Output = JoseResult<()>> + Send;
}

impl<T: AlgorithmPolicy> AlgorithmPolicy for Arc<T> {
    fn accept(&self, ctx: &Context, alg: &str) -> impl Future<Output = JoseResult<()>> + Send {
        (**self).accept(ctx, alg)
    }
}

/// Accept only the listed algorithm ids.
///
/// `none` is accepted only when listed explicitly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowList {
    allowed: HashSet<String>,
}

impl AllowList {
    /// Allow exactly `ids`
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed: ids.into_iter().map(Into::into).collect(),
        }
    }

    /// Add one id
    #[must_use]
    pub fn allow(mut self, id: impl Into<String>) -> Self {
        self.allowed.insert(id.into());
        self
    }

    /// Whether `id` is allowed
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.allowed.contains(id)
    }
}

impl AlgorithmPolicy for AllowList {
    async fn accept(&self, _ctx: &Context, alg: &str) -> JoseResult<()> {
        if self.contains(alg) {
            Ok(())
        } else {
            Err(JoseError::AlgorithmNotAllowed(alg.to_string()))
        }
    }
}

/// Accepts every algorithm, `none` included.
///
/// Only suitable when the key finder alone pins the algorithm.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsafeAcceptAnyAlgorithm;

impl AlgorithmPolicy for UnsafeAcceptAnyAlgorithm {
    async fn accept(&self, _ctx: &Context, _alg: &str) -> JoseResult<()> {
        Ok(())
    }
}
