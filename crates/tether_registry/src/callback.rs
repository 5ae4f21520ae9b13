//! Creation and teardown strategies.
//!
//! A [`Registry`](crate::registry::Registry) is constructed with exactly one
//! [`Opener`] and at most one [`Closer`]. Every group and resource in that
//! registry shares them, so resource kinds that need different callbacks
//! belong in separate registries.
//!
//! Both traits are implemented for plain closures:
//!
//! ```
//! use tether_registry::callback::{BoxError, Closer, Opener};
//! use tether_registry::context::Context;
//!
//! let opener = |_: &Context, dsn: &String| Ok::<_, BoxError>(dsn.len());
//! let closer = |_: &Context, _conn: usize| Ok::<(), BoxError>(());
//!
//! let ctx = Context::background();
//! assert_eq!(opener.open(&ctx, &"db://primary".to_string()).unwrap(), 12);
//! assert!(closer.close(&ctx, 12).is_ok());
//! ```

use crate::context::Context;

/// Error type returned by callbacks.
pub type BoxError = Box<dyn core::error::Error + Send + Sync + 'static>;

/// Turns a stored configuration into a live resource.
///
/// Implementations must be safe to call concurrently for different resource
/// names. For a single name the registry never runs two lazy creations at the
/// same time, but a failed creation is retried by the next
/// [`Group::get`](crate::registry::Group::get).
///
/// [`Group::ping`](crate::registry::Group::ping) calls `open` on every
/// invocation and drops the result.
pub trait Opener<C, T>: Send + Sync + 'static {
    /// Creates a resource from `config`.
    ///
    /// # Errors
    ///
    /// Any error is returned to the caller of `get` unchanged.
    fn open(&self, ctx: &Context, config: &C) -> Result<T, BoxError>;
}

impl<C, T, F> Opener<C, T> for F
where
    F: Fn(&Context, &C) -> Result<T, BoxError> + Send + Sync + 'static,
{
    fn open(&self, ctx: &Context, config: &C) -> Result<T, BoxError> {
        self(ctx, config)
    }
}

/// Releases a live resource.
///
/// Called at most once per successful materialization, when the resource is
/// unregistered or its group or registry is closed. Values produced by
/// [`Group::ping`](crate::registry::Group::ping) never reach the closer.
pub trait Closer<T>: Send + Sync + 'static {
    /// Tears down `value`.
    ///
    /// # Errors
    ///
    /// Errors are collected by bulk close operations and ignored by
    /// `unregister`.
    fn close(&self, ctx: &Context, value: T) -> Result<(), BoxError>;
}

impl<T, F> Closer<T> for F
where
    F: Fn(&Context, T) -> Result<(), BoxError> + Send + Sync + 'static,
{
    fn close(&self, ctx: &Context, value: T) -> Result<(), BoxError> {
        self(ctx, value)
    }
}
