//! A concurrency-safe registry of lazily created, grouped resources.
//!
//! - [`registry`] - Registry, groups, callbacks and errors (`tether_registry`)
//! - [`tracing_setup`] - Subscriber installation (`tether_tracing`)

pub use tether_registry as registry;
pub use tether_tracing as tracing_setup;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use tether_registry::prelude::*;
    pub use tether_tracing::{TracingConfig, TracingFormat, TracingSetup};
}
