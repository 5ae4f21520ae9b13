//! Call context passed through to opener and closer callbacks.
//!
//! The registry never inspects a [`Context`] itself. It is handed unchanged to
//! the [`Opener`](crate::callback::Opener) and
//! [`Closer`](crate::callback::Closer), which are responsible for honoring the
//! deadline and cancellation flag it carries.
//!
//! # Example
//!
//! ```
//! use core::time::Duration;
//! use tether_registry::context::Context;
//!
//! let ctx = Context::background().with_timeout(Duration::from_secs(5));
//! assert!(ctx.deadline().is_some());
//! assert!(ctx.check().is_ok());
//!
//! ctx.cancel();
//! assert!(ctx.is_cancelled());
//! ```

use core::sync::atomic::{AtomicBool, Ordering};
use core::time::Duration;
use std::sync::Arc;
use std::time::Instant;

/// Reasons a [`Context`] reports itself as done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ContextError {
    /// [`Context::cancel`] was called on this context or one of its clones.
    #[error("context cancelled")]
    Cancelled,

    /// The context deadline has passed.
    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

/// Cooperative deadline and cancellation carrier.
///
/// Clones share the cancellation flag: cancelling any clone cancels them all.
/// Deadlines are copied, so narrowing the deadline of a clone via
/// [`with_timeout`](Self::with_timeout) does not affect the original.
#[derive(Debug, Clone, Default)]
pub struct Context {
    deadline: Option<Instant>,
    cancelled: Arc<AtomicBool>,
}

impl Context {
    /// Returns a context with no deadline that is not cancelled.
    #[must_use]
    pub fn background() -> Self {
        Self::default()
    }

    /// Returns a context whose deadline is `timeout` from now, or the existing
    /// deadline if that is earlier.
    ///
    /// A timeout too large to represent as an [`Instant`] leaves the deadline
    /// unchanged.
    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self,
        }
    }

    /// Returns a context with the given deadline, or the existing deadline if
    /// that is earlier.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        });
        self
    }

    /// The deadline, if one was set.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left until the deadline. `None` if no deadline is set; zero once
    /// the deadline has passed.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Returns `true` once the deadline has passed.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.deadline
            .is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Cancels this context and every clone of it.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Returns `true` if [`cancel`](Self::cancel) has been called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Returns `true` if the context is cancelled or expired.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.is_cancelled() || self.is_expired()
    }

    /// Returns an error if the context is done.
    ///
    /// Callbacks call this before (and during) long-running work. The error
    /// converts into [`BoxError`](crate::callback::BoxError) with `?`.
    ///
    /// # Errors
    ///
    /// - [`ContextError::Cancelled`] if the context was cancelled
    /// - [`ContextError::DeadlineExceeded`] if the deadline has passed
    pub fn check(&self) -> Result<(), ContextError> {
        if self.is_cancelled() {
            return Err(ContextError::Cancelled);
        }
        if self.is_expired() {
            return Err(ContextError::DeadlineExceeded);
        }
        Ok(())
    }
}
