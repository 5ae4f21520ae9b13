//! The registry: owner of every group, the shared lock and the callback pair.

use super::group::Group;
use super::record::{Groups, Record, Records};
use crate::callback::{Closer, Opener};
use crate::context::Context;
use crate::error::{RegistryError, Result};
use crate::manifest::{Manifest, ManifestReport};
use parking_lot::RwLock;
use std::sync::Arc;

/// Name of the group created by [`Registry::into_default_group`] and
/// [`single_group`].
pub const DEFAULT_GROUP_NAME: &str = "defaultGroup";

/// State shared between a [`Registry`] and every [`Group`] handle.
///
/// One lock guards all groups and all records. Lookups take the read lock;
/// structural changes and lazy creation take the write lock, so a running
/// opener blocks every other operation on the registry, including ones on
/// unrelated groups.
pub(crate) struct Shared<C, T> {
    pub(crate) groups: RwLock<Groups<C, T>>,
    pub(crate) opener: Box<dyn Opener<C, T>>,
    pub(crate) closer: Option<Box<dyn Closer<T>>>,
}

impl<C: 'static, T: 'static> Shared<C, T> {
    /// Runs the closer over every ready record of `records`.
    ///
    /// Failures are pushed to `errors` and do not stop the pass. Must be called
    /// with the write lock held, after `records` was detached from the map.
    pub(crate) fn teardown(
        &self,
        ctx: &Context,
        group: &str,
        records: Records<C, T>,
        errors: &mut Vec<RegistryError>,
    ) {
        let Some(closer) = &self.closer else {
            return;
        };

        for (resource, record) in records {
            let Some(value) = record.into_value() else {
                continue;
            };
            match closer.close(ctx, value) {
                Ok(()) => tracing::debug!(group, resource = %resource, "resource closed"),
                Err(source) => {
                    tracing::warn!(
                        group,
                        resource = %resource,
                        error = %source,
                        "failed to close resource"
                    );
                    errors.push(RegistryError::close_failed(group, &resource, source));
                }
            }
        }
    }
}

/// Concurrency-safe registry of lazily created, named resources.
///
/// A registry owns a set of named [`Group`]s. Each group maps resource names
/// to configurations of type `C`; the first [`Group::get`] for a name runs the
/// registry's [`Opener`] and caches the resulting `T`. Closing the registry
/// runs the [`Closer`] over every materialized resource.
///
/// The opener/closer pair is fixed at construction. Resource kinds needing
/// different callbacks belong in different registries.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use tether_registry::callback::BoxError;
/// use tether_registry::context::Context;
/// use tether_registry::registry::Registry;
///
/// struct Pool { dsn: String }
///
/// let registry = Registry::with_closer(
///     |_: &Context, dsn: &String| Ok::<_, BoxError>(Arc::new(Pool { dsn: dsn.clone() })),
///     |_: &Context, _pool: Arc<Pool>| Ok::<(), BoxError>(()),
/// );
///
/// let ctx = Context::background();
/// registry.add_group("primary");
///
/// let primary = registry.group("primary").unwrap();
/// primary.register(&ctx, "orders", "postgres://orders".to_string()).unwrap();
///
/// let pool = primary.get(&ctx, "orders").unwrap();
/// assert_eq!(pool.dsn, "postgres://orders");
///
/// assert!(registry.close(&ctx).is_empty());
/// assert!(registry.is_empty());
/// ```
pub struct Registry<C, T> {
    shared: Arc<Shared<C, T>>,
}

impl<C: 'static, T: 'static> Registry<C, T> {
    /// Creates an empty registry whose resources are never actively torn down.
    #[must_use]
    pub fn new(opener: impl Opener<C, T>) -> Self {
        Self::from_parts(Box::new(opener), None)
    }

    /// Creates an empty registry with both a creation and a teardown callback.
    #[must_use]
    pub fn with_closer(opener: impl Opener<C, T>, closer: impl Closer<T>) -> Self {
        Self::from_parts(Box::new(opener), Some(Box::new(closer)))
    }

    /// Returns a builder for configuring a registry step by step.
    #[must_use]
    pub fn builder() -> RegistryBuilder<C, T> {
        RegistryBuilder::default()
    }

    fn from_parts(opener: Box<dyn Opener<C, T>>, closer: Option<Box<dyn Closer<T>>>) -> Self {
        Self {
            shared: Arc::new(Shared {
                groups: RwLock::new(Groups::new()),
                opener,
                closer,
            }),
        }
    }

    /// Adds an empty group named `name` if it does not exist.
    ///
    /// Returns `true` if the group already existed, in which case nothing
    /// changes, and `false` if it was created.
    pub fn add_group(&self, name: &str) -> bool {
        let mut groups = self.shared.groups.write();
        if groups.contains_key(name) {
            return true;
        }
        groups.insert(name.to_owned(), Records::new());
        tracing::debug!(group = name, "group added");
        false
    }

    /// Returns a handle to the group named `name`.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::GroupNotFound`] if no such group exists
    pub fn group(&self, name: &str) -> Result<Group<C, T>> {
        if !self.shared.groups.read().contains_key(name) {
            return Err(RegistryError::group_not_found(name));
        }
        Ok(Group::new(name.to_owned(), Arc::clone(&self.shared)))
    }

    /// Returns a handle to the group named `name`.
    ///
    /// # Panics
    ///
    /// Panics if the group does not exist. Use [`group`](Self::group) unless
    /// the group is known to be present.
    #[must_use]
    #[track_caller]
    pub fn must_group(&self, name: &str) -> Group<C, T> {
        self.group(name).unwrap_or_else(|err| panic!("{err}"))
    }

    /// Returns `true` if a group named `name` exists.
    #[must_use]
    pub fn contains_group(&self, name: &str) -> bool {
        self.shared.groups.read().contains_key(name)
    }

    /// Names of all groups, in no particular order.
    #[must_use]
    pub fn list_group_names(&self) -> Vec<String> {
        self.shared.groups.read().keys().cloned().collect()
    }

    /// Number of groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shared.groups.read().len()
    }

    /// Returns `true` if the registry holds no groups.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shared.groups.read().is_empty()
    }

    /// Closes every materialized resource in every group and empties the
    /// registry.
    ///
    /// Unready resources are dropped without calling the closer. A failing
    /// closer does not stop the pass: each failure is returned as a
    /// [`RegistryError::CloseResourceFailed`] naming the group and resource.
    pub fn close(&self, ctx: &Context) -> Vec<RegistryError> {
        let mut groups = self.shared.groups.write();
        let mut errors = Vec::new();

        for (group, records) in groups.drain() {
            self.shared.teardown(ctx, &group, records, &mut errors);
        }

        tracing::info!(failures = errors.len(), "registry closed");
        errors
    }

    /// Adds every group of `manifest` and registers its resources.
    ///
    /// Registration follows [`Group::register`]: names already present keep
    /// their original configuration and are reported as skipped. No opener is
    /// called.
    pub fn apply_manifest(&self, manifest: &Manifest<C>) -> ManifestReport
    where
        C: Clone,
    {
        let mut groups = self.shared.groups.write();
        let mut report = ManifestReport::default();

        for (group, resources) in &manifest.groups {
            let records = groups.entry(group.clone()).or_insert_with(Records::new);
            for (resource, config) in resources {
                let key = (group.clone(), resource.clone());
                if records.contains_key(resource.as_str()) {
                    report.skipped.push(key);
                } else {
                    records.insert(resource.clone(), Record::new(config.clone()));
                    report.registered.push(key);
                }
            }
        }

        tracing::info!(
            registered = report.registered.len(),
            skipped = report.skipped.len(),
            "manifest applied"
        );
        report
    }

    /// Creates the [`DEFAULT_GROUP_NAME`] group and returns its handle,
    /// giving up the registry handle.
    ///
    /// The registry state lives on for as long as the returned group handle
    /// (or clones of it) does.
    #[must_use]
    pub fn into_default_group(self) -> Group<C, T> {
        self.add_group(DEFAULT_GROUP_NAME);
        Group::new(DEFAULT_GROUP_NAME.to_owned(), self.shared)
    }
}

impl<C: 'static, T: 'static> core::fmt::Debug for Registry<C, T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Registry")
            .field("groups", &self.list_group_names())
            .field("closer", &self.shared.closer.is_some())
            .finish_non_exhaustive()
    }
}

/// Creates a single-group registry and returns the group handle directly.
///
/// Shorthand for `Registry::new(opener).into_default_group()`, for
/// applications that manage one kind of resource without grouping.
///
/// ```
/// use tether_registry::callback::BoxError;
/// use tether_registry::context::Context;
/// use tether_registry::registry::{single_group, DEFAULT_GROUP_NAME};
///
/// let group = single_group(|_: &Context, port: &u16| Ok::<_, BoxError>(format!("localhost:{port}")));
/// let ctx = Context::background();
///
/// group.register(&ctx, "api", 8080).unwrap();
/// assert_eq!(group.name(), DEFAULT_GROUP_NAME);
/// assert_eq!(group.get(&ctx, "api").unwrap(), "localhost:8080");
/// ```
#[must_use]
pub fn single_group<C: 'static, T: 'static>(opener: impl Opener<C, T>) -> Group<C, T> {
    Registry::new(opener).into_default_group()
}

/// Like [`single_group`], with a teardown callback.
///
/// Shorthand for `Registry::with_closer(opener, closer).into_default_group()`.
/// Resources opened through the returned handle are torn down by
/// [`Group::close`].
#[must_use]
pub fn single_group_with_closer<C: 'static, T: 'static>(
    opener: impl Opener<C, T>,
    closer: impl Closer<T>,
) -> Group<C, T> {
    Registry::with_closer(opener, closer).into_default_group()
}

/// Step-by-step construction of a [`Registry`].
///
/// ```
/// use tether_registry::callback::BoxError;
/// use tether_registry::context::Context;
/// use tether_registry::error::ErrorKind;
/// use tether_registry::registry::Registry;
///
/// let registry = Registry::<u32, u32>::builder()
///     .opener(|_: &Context, cfg: &u32| Ok::<_, BoxError>(cfg * 2))
///     .build()
///     .unwrap();
/// assert!(registry.is_empty());
///
/// let err = Registry::<u32, u32>::builder().build().unwrap_err();
/// assert_eq!(err.kind(), ErrorKind::MissingOpener);
/// ```
pub struct RegistryBuilder<C, T> {
    opener: Option<Box<dyn Opener<C, T>>>,
    closer: Option<Box<dyn Closer<T>>>,
    groups: Vec<String>,
}

impl<C, T> Default for RegistryBuilder<C, T> {
    fn default() -> Self {
        Self {
            opener: None,
            closer: None,
            groups: Vec::new(),
        }
    }
}

impl<C: 'static, T: 'static> RegistryBuilder<C, T> {
    /// Sets the creation callback.
    #[must_use]
    pub fn opener(mut self, opener: impl Opener<C, T>) -> Self {
        self.opener = Some(Box::new(opener));
        self
    }

    /// Sets the teardown callback.
    #[must_use]
    pub fn closer(mut self, closer: impl Closer<T>) -> Self {
        self.closer = Some(Box::new(closer));
        self
    }

    /// Adds an empty group to create when the registry is built.
    #[must_use]
    pub fn group(mut self, name: impl Into<String>) -> Self {
        self.groups.push(name.into());
        self
    }

    /// Builds the registry.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::MissingOpener`] if no opener was set
    pub fn build(self) -> Result<Registry<C, T>> {
        let opener = self.opener.ok_or(RegistryError::MissingOpener)?;
        let registry = Registry::from_parts(opener, self.closer);
        for group in &self.groups {
            registry.add_group(group);
        }
        Ok(registry)
    }
}
