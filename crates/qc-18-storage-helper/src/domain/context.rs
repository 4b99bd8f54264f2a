//! # Lookup Context
//!
//! Caller-supplied cancellation and deadline for remote lookups.
//!
//! A context is cheap to clone and every clone observes the same
//! cancellation signal. Deadlines use `tokio::time::Instant`, so tests can
//! drive them with paused time.

use std::future::Future;

use tokio::sync::watch;
use tokio::time::{Duration, Instant};

use super::errors::ContextError;

/// Cancels every [`LookupContext`] created from it.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    /// Signal cancellation. Idempotent.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    /// Whether [`cancel`](Self::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

/// Cancellation and deadline propagated into a lookup.
#[derive(Debug, Clone, Default)]
pub struct LookupContext {
    cancel: Option<watch::Receiver<bool>>,
    deadline: Option<Instant>,
}

impl LookupContext {
    /// A context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    /// A cancellable context and the handle that cancels it.
    pub fn with_cancel() -> (Self, CancelHandle) {
        let (tx, rx) = watch::channel(false);
        let ctx = Self {
            cancel: Some(rx),
            deadline: None,
        };
        (ctx, CancelHandle { tx })
    }

    /// A context that expires `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    /// A context that expires at `deadline`.
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            cancel: None,
            deadline: Some(deadline),
        }
    }

    /// Derive a context sharing this one's cancellation, expiring no later
    /// than `timeout` from now.
    pub fn child_with_timeout(&self, timeout: Duration) -> Self {
        let candidate = Instant::now() + timeout;
        let deadline = match self.deadline {
            Some(existing) if existing <= candidate => existing,
            _ => candidate,
        };
        Self {
            cancel: self.cancel.clone(),
            deadline: Some(deadline),
        }
    }

    /// Deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Current error state without waiting. Cancellation wins over expiry.
    pub fn err(&self) -> Option<ContextError> {
        if let Some(rx) = &self.cancel {
            if *rx.borrow() {
                return Some(ContextError::Cancelled);
            }
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(ContextError::DeadlineExceeded),
            _ => None,
        }
    }

    /// `Ok(())` while the context is live.
    pub fn check(&self) -> Result<(), ContextError> {
        match self.err() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Resolves once the context is cancelled or expired.
    ///
    /// Never resolves for a background context. Dropping the
    /// [`CancelHandle`] without cancelling does not count as cancellation.
    pub async fn done(&self) -> ContextError {
        let cancelled = async {
            if let Some(rx) = &self.cancel {
                let mut rx = rx.clone();
                let signalled = rx.wait_for(|cancelled| *cancelled).await.is_ok();
                if signalled {
                    return;
                }
            }
            std::future::pending::<()>().await
        };
        let expired = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = cancelled => ContextError::Cancelled,
            _ = expired => ContextError::DeadlineExceeded,
        }
    }

    /// Drive `fut` to completion unless the context ends first.
    ///
    /// `fut` is dropped (aborted) as soon as the context ends.
    pub async fn run<F, T>(&self, fut: F) -> Result<T, ContextError>
    where
        F: Future<Output = T>,
    {
        self.check()?;
        tokio::select! {
            biased;
            err = self.done() => Err(err),
            out = fut => Ok(out),
        }
    }

    /// Sleep for `duration`, waking early with an error if the context ends.
    pub async fn sleep(&self, duration: Duration) -> Result<(), ContextError> {
        self.run(tokio::time::sleep(duration)).await
    }
}
