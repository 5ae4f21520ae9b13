//! Groups of lazily opened resources.
//!
//! - [`Registry`] - Owner of all groups and the opener/closer pair
//! - [`Group`] - Handle to one named group of resources
//! - [`RegistryBuilder`] - Step-by-step registry construction
//!
//! # Lifecycle
//!
//! | Step | Operation | Opener | Closer |
//! |------|-----------|--------|--------|
//! | Declare | [`Group::register`] | never | never |
//! | Materialize | [`Group::get`] | first successful call only | never |
//! | Ping | [`Group::ping`] | every call | never |
//! | Release one | [`Group::unregister`] | never | if opened |
//! | Release group | [`Group::close`] | never | every opened resource |
//! | Release all | [`Registry::close`] | never | every opened resource |
//!
//! # Locking
//!
//! A single reader/writer lock protects the whole registry. Reads of already
//! opened resources only take the read lock. Lazy creation runs the opener
//! while holding the write lock, which serializes openers across all groups
//! of a registry and blocks every other operation until the opener returns.
//! Openers and closers must therefore not call back into the registry that
//! invoked them.

mod group;
mod record;
#[expect(
    clippy::module_inception,
    reason = "registry.rs contains the Registry type and its shared state"
)]
mod registry;

pub use group::Group;
pub use registry::{
    DEFAULT_GROUP_NAME, Registry, RegistryBuilder, single_group, single_group_with_closer,
};
