//! Deterministic callbacks for tests.
//!
//! Available with the `test-utils` feature.
//!
//! - [`CountingOpener`] - Wraps an opener and counts its invocations
//! - [`RecordingCloser`] - Records closed values, optionally failing some

use crate::callback::{BoxError, Closer, Opener};
use crate::context::Context;
use core::sync::atomic::{AtomicUsize, Ordering};
use parking_lot::Mutex;
use std::sync::Arc;

/// Shared invocation counter returned by [`CountingOpener::counter`].
#[derive(Debug, Clone, Default)]
pub struct CallCounter(Arc<AtomicUsize>);

impl CallCounter {
    /// Number of invocations so far.
    #[must_use]
    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    fn increment(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

/// Opener that counts calls before delegating to `inner`.
///
/// ```
/// use tether_registry::callback::BoxError;
/// use tether_registry::context::Context;
/// use tether_registry::registry::Registry;
/// use tether_registry::testing::CountingOpener;
///
/// let opener = CountingOpener::new(|_: &Context, cfg: &u8| Ok::<_, BoxError>(*cfg));
/// let calls = opener.counter();
/// let group = Registry::new(opener).into_default_group();
///
/// let ctx = Context::background();
/// group.register(&ctx, "r", 1).unwrap();
/// group.get(&ctx, "r").unwrap();
/// group.get(&ctx, "r").unwrap();
/// assert_eq!(calls.get(), 1);
/// ```
#[derive(Debug)]
pub struct CountingOpener<F> {
    inner: F,
    calls: CallCounter,
}

impl<F> CountingOpener<F> {
    /// Wraps `inner`.
    pub fn new(inner: F) -> Self {
        Self {
            inner,
            calls: CallCounter::default(),
        }
    }

    /// Returns a handle that keeps counting after the opener moves into a
    /// registry.
    #[must_use]
    pub fn counter(&self) -> CallCounter {
        self.calls.clone()
    }
}

impl<C, T, F: Opener<C, T>> Opener<C, T> for CountingOpener<F> {
    fn open(&self, ctx: &Context, config: &C) -> Result<T, BoxError> {
        self.calls.increment();
        self.inner.open(ctx, config)
    }
}

type FailWhen<T> = Box<dyn Fn(&T) -> bool + Send + Sync>;

/// Handle to the values seen by a [`RecordingCloser`].
#[derive(Debug)]
pub struct ClosedValues<T>(Arc<Mutex<Vec<T>>>);

impl<T> Clone for ClosedValues<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T: Clone> ClosedValues<T> {
    /// Values passed to the closer, in call order, including failed ones.
    #[must_use]
    pub fn closed(&self) -> Vec<T> {
        self.0.lock().clone()
    }
}

impl<T> ClosedValues<T> {
    /// Number of closer invocations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.lock().len()
    }

    /// Returns `true` if the closer was never invoked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.lock().is_empty()
    }
}

/// Closer that records every value it receives.
pub struct RecordingCloser<T> {
    closed: ClosedValues<T>,
    fail_when: Option<FailWhen<T>>,
}

impl<T> RecordingCloser<T> {
    /// A closer that always succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self {
            closed: ClosedValues(Arc::new(Mutex::new(Vec::new()))),
            fail_when: None,
        }
    }

    /// A closer that fails for values matching `predicate`.
    #[must_use]
    pub fn failing(predicate: impl Fn(&T) -> bool + Send + Sync + 'static) -> Self {
        Self {
            fail_when: Some(Box::new(predicate)),
            ..Self::new()
        }
    }

    /// Returns a handle to the recorded values.
    #[must_use]
    pub fn handle(&self) -> ClosedValues<T> {
        self.closed.clone()
    }
}

impl<T> Default for RecordingCloser<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + 'static> Closer<T> for RecordingCloser<T> {
    fn close(&self, _ctx: &Context, value: T) -> Result<(), BoxError> {
        let fail = self.fail_when.as_ref().is_some_and(|fail| fail(&value));
        self.closed.0.lock().push(value);
        if fail {
            return Err("close refused".into());
        }
        Ok(())
    }
}
