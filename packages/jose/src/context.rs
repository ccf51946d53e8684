//! Cancellation and deadline handle passed to key finders and algorithm policies

use crate::error::{JoseError, JoseResult};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Operation context handed to [`KeyFinder`](crate::jws::KeyFinder) and
/// [`AlgorithmPolicy`](crate::jws::AlgorithmPolicy) implementations.
///
/// Key finders commonly fetch a remote JWK Set, so every collaborator call is
/// raced against the context's cancellation token and optional deadline. The
/// engine itself never retries: a cancelled or expired context surfaces as
/// [`JoseError::Cancelled`] or [`JoseError::DeadlineExceeded`].
#[derive(Debug, Clone, Default)]
pub struct Context {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl Context {
    /// Context without a deadline that is only cancelled explicitly
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Context tied to an existing cancellation token
    #[must_use]
    pub fn with_cancellation(token: CancellationToken) -> Self {
        Self {
            cancel: token,
            deadline: None,
        }
    }

    /// Set an absolute deadline
    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Set a deadline relative to now
    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Derive a child context: cancelling the parent cancels the child, not
    /// the other way around. The deadline is inherited.
    #[must_use]
    pub fn child(&self) -> Self {
        Self {
            cancel: self.cancel.child_token(),
            deadline: self.deadline,
        }
    }

    /// The cancellation token backing this context
    #[must_use]
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Cancel this context and every child derived from it
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// The configured deadline, if any
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Fail fast when the context is already cancelled or expired.
    pub fn check(&self) -> JoseResult<()> {
        if self.cancel.is_cancelled() {
            return Err(JoseError::Cancelled);
        }
        if let Some(deadline) = self.deadline
            && Instant::now() >= deadline
        {
            return Err(JoseError::DeadlineExceeded);
        }
        Ok(())
    }

    /// Drive a collaborator future under this context.
    ///
    /// Whichever completes first wins: the future, cancellation, or the
    /// deadline. The future is dropped when it loses.
    pub async fn run<T, F>(&self, fut: F) -> JoseResult<T>
    where
        F: Future<Output = JoseResult<T>>,
    {
        self.check()?;
        let bounded = async {
            match self.deadline {
                Some(deadline) => tokio::time::timeout_at(deadline, fut)
                    .await
                    .map_err(|_| JoseError::DeadlineExceeded)?,
                None => fut.await,
            }
        };
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(JoseError::Cancelled),
            result = bounded => result,
        }
    }
}
