//! Tracing setup for applications embedding Tether.
//!
//! `tether_registry` reports its lifecycle through `tracing` events: group
//! creation, registration, lazy opens, pings and teardown. Failures of the
//! closer are logged at `warn`, including the ones `unregister` swallows.
//! This crate installs a subscriber that renders those events:
//!
//! - [`TracingSetup`] - Builder and installer for the global subscriber
//! - [`TracingConfig`] - Snapshot of the installed level and format
//! - [`TracingFormat`] - Pretty, compact or JSON output
//!
//! # Example
//!
//! ```no_run
//! use tether_tracing::{TracingFormat, TracingSetup};
//! use tracing::Level;
//!
//! TracingSetup::new()
//!     .with_level(Level::DEBUG)
//!     .with_format(TracingFormat::Json)
//!     .with_env_filter("tether_registry=debug")
//!     .init()
//!     .expect("no subscriber installed yet");
//! ```

mod subscriber;

pub use subscriber::{TracingConfig, TracingError, TracingFormat, TracingSetup};
