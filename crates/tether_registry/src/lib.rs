//! Lazily materialized, grouped resource registry.
//!
//! `tether_registry` manages long-lived external resources (database
//! handles, network clients, connection pools) that are declared up front,
//! created on first use, looked up by name and torn down deterministically:
//!
//! - [`callback`] - [`Opener`](callback::Opener) and [`Closer`](callback::Closer) strategies
//! - [`context`] - Deadline and cancellation carrier passed to callbacks
//! - [`error`] - The closed [`RegistryError`](error::RegistryError) taxonomy
//! - [`manifest`] - Declarative group/resource definitions
//! - [`registry`] - [`Registry`](registry::Registry) and [`Group`](registry::Group) handles
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use tether_registry::prelude::*;
//!
//! struct Client { endpoint: String }
//!
//! let registry = Registry::with_closer(
//!     |ctx: &Context, endpoint: &String| -> Result<Arc<Client>, BoxError> {
//!         ctx.check()?;
//!         Ok(Arc::new(Client { endpoint: endpoint.clone() }))
//!     },
//!     |_: &Context, _client: Arc<Client>| Ok::<(), BoxError>(()),
//! );
//!
//! let ctx = Context::background();
//! registry.add_group("search");
//!
//! let search = registry.must_group("search");
//! search.register(&ctx, "primary", "http://search-1:9200".to_string()).unwrap();
//! search.ping(&ctx, "primary").unwrap();
//!
//! let client = search.get(&ctx, "primary").unwrap();
//! assert_eq!(client.endpoint, "http://search-1:9200");
//!
//! assert!(registry.close(&ctx).is_empty());
//! ```
//!
//! # Feature Flags
//!
//! - `test-utils` - Enables the [`testing`] module with counting and
//!   recording callbacks

/// Opener and closer strategies.
pub mod callback;

/// Deadline and cancellation carrier.
pub mod context;

/// Registry error taxonomy.
pub mod error;

/// Declarative group and resource definitions.
pub mod manifest;

/// Registry and group handles.
pub mod registry;

/// Deterministic callbacks for tests.
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::callback::{BoxError, Closer, Opener};
    pub use crate::context::{Context, ContextError};
    pub use crate::error::{ErrorKind, RegistryError};
    pub use crate::manifest::{Manifest, ManifestError, ManifestReport};
    pub use crate::registry::{
        DEFAULT_GROUP_NAME, Group, Registry, RegistryBuilder, single_group,
        single_group_with_closer,
    };
}
