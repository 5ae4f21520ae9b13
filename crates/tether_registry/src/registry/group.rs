//! Group handles.

use super::record::{Groups, Record, Records};
use super::registry::Shared;
use crate::context::Context;
use crate::error::{RegistryError, Result};
use std::sync::Arc;

/// Handle to a named group of resources.
///
/// A `Group` is a reference into its [`Registry`](super::Registry), not a
/// copy: every operation re-resolves the group by name under the registry
/// lock. If the group was closed after the handle was obtained, operations
/// fail with [`RegistryError::GroupNotFound`], except
/// [`register`](Self::register), which re-creates the group.
///
/// Cloning a handle is cheap.
///
/// # Example
///
/// ```
/// use tether_registry::callback::BoxError;
/// use tether_registry::context::Context;
/// use tether_registry::registry::Registry;
///
/// let registry = Registry::new(|_: &Context, addr: &String| Ok::<_, BoxError>(addr.to_uppercase()));
/// registry.add_group("cache");
///
/// let ctx = Context::background();
/// let cache = registry.must_group("cache");
///
/// assert!(cache.register(&ctx, "session", "redis://a".to_string()).unwrap());
/// assert!(!cache.register(&ctx, "session", "redis://b".to_string()).unwrap());
///
/// assert!(!cache.is_ready("session"));
/// assert_eq!(cache.get(&ctx, "session").unwrap(), "REDIS://A");
/// assert!(cache.is_ready("session"));
/// ```
pub struct Group<C, T> {
    name: String,
    shared: Arc<Shared<C, T>>,
}

impl<C, T> Clone for Group<C, T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<C, T> core::fmt::Debug for Group<C, T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Group").field("name", &self.name).finish()
    }
}

/// Resolves `group` or fails with `GroupNotFound`.
fn records<'a, C, T>(groups: &'a Groups<C, T>, group: &str) -> Result<&'a Records<C, T>> {
    groups
        .get(group)
        .ok_or_else(|| RegistryError::group_not_found(group))
}

/// Resolves `group`/`resource` or fails with the matching not-found error.
fn record<'a, C, T>(
    groups: &'a Groups<C, T>,
    group: &str,
    resource: &str,
) -> Result<&'a Record<C, T>> {
    records(groups, group)?
        .get(resource)
        .ok_or_else(|| RegistryError::resource_not_found(group, resource))
}

fn record_mut<'a, C, T>(
    groups: &'a mut Groups<C, T>,
    group: &str,
    resource: &str,
) -> Result<&'a mut Record<C, T>> {
    groups
        .get_mut(group)
        .ok_or_else(|| RegistryError::group_not_found(group))?
        .get_mut(resource)
        .ok_or_else(|| RegistryError::resource_not_found(group, resource))
}

impl<C: 'static, T: 'static> Group<C, T> {
    pub(crate) fn new(name: String, shared: Arc<Shared<C, T>>) -> Self {
        Self { name, shared }
    }

    /// The group name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registers `config` under `name` without opening anything.
    ///
    /// Returns `true` if the name was new. If `name` is already registered the
    /// call is a no-op: the original configuration is kept and `config` is
    /// dropped. If the group was closed, it is re-created.
    ///
    /// # Errors
    ///
    /// Currently infallible; the `Result` is reserved for validation.
    pub fn register(&self, _ctx: &Context, name: &str, config: C) -> Result<bool> {
        let mut groups = self.shared.groups.write();
        let records = groups.entry(self.name.clone()).or_insert_with(|| {
            tracing::debug!(group = %self.name, "re-creating closed group");
            Records::new()
        });

        if records.contains_key(name) {
            tracing::debug!(group = %self.name, resource = name, "resource already registered");
            return Ok(false);
        }

        records.insert(name.to_owned(), Record::new(config));
        tracing::debug!(group = %self.name, resource = name, "resource registered");
        Ok(true)
    }

    /// Returns the resource registered as `name`, opening it on first access.
    ///
    /// The opener runs at most once per successful materialization, however
    /// many threads race on the same name: the ready check is repeated under
    /// the write lock before opening. While it runs, every other operation on
    /// the registry waits.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::GroupNotFound`] if the group no longer exists
    /// - [`RegistryError::ResourceNotFound`] if `name` was never registered
    /// - [`RegistryError::Open`] with the opener's error; the resource stays
    ///   unready and the next call retries
    pub fn get(&self, ctx: &Context, name: &str) -> Result<T>
    where
        T: Clone,
    {
        {
            let groups = self.shared.groups.read();
            if let Some(value) = record(&groups, &self.name, name)?.value() {
                return Ok(value.clone());
            }
        }

        let mut groups = self.shared.groups.write();
        // Group or resource may have been removed while no lock was held.
        let record = record_mut(&mut groups, &self.name, name)?;
        if let Some(value) = record.value() {
            return Ok(value.clone());
        }

        let value = self
            .shared
            .opener
            .open(ctx, record.config())
            .map_err(|err| {
                tracing::debug!(group = %self.name, resource = name, error = %err, "open failed");
                RegistryError::Open(err)
            })?;
        record.materialize(value.clone());
        tracing::info!(group = %self.name, resource = name, "resource opened");
        Ok(value)
    }

    /// Like [`get`](Self::get), but panics on failure.
    ///
    /// # Panics
    ///
    /// Panics with the error message if [`get`](Self::get) fails.
    #[must_use]
    #[track_caller]
    pub fn must_get(&self, ctx: &Context, name: &str) -> T
    where
        T: Clone,
    {
        self.get(ctx, name).unwrap_or_else(|err| panic!("{err}"))
    }

    /// Returns the configuration registered as `name`, ready or not.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::GroupNotFound`] if the group no longer exists
    /// - [`RegistryError::ResourceNotFound`] if `name` was never registered
    pub fn config(&self, _ctx: &Context, name: &str) -> Result<C>
    where
        C: Clone,
    {
        let groups = self.shared.groups.read();
        Ok(record(&groups, &self.name, name)?.config().clone())
    }

    /// Like [`config`](Self::config), but panics on failure.
    ///
    /// # Panics
    ///
    /// Panics with the error message if [`config`](Self::config) fails.
    #[must_use]
    #[track_caller]
    pub fn must_config(&self, ctx: &Context, name: &str) -> C
    where
        C: Clone,
    {
        self.config(ctx, name).unwrap_or_else(|err| panic!("{err}"))
    }

    /// Removes `name` from the group, closing it first if it was opened.
    ///
    /// A closer failure is logged and otherwise ignored; the resource is
    /// removed regardless.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::GroupNotFound`] if the group no longer exists
    /// - [`RegistryError::ResourceNotFound`] if `name` was never registered
    pub fn unregister(&self, ctx: &Context, name: &str) -> Result<()> {
        let mut groups = self.shared.groups.write();
        let record = groups
            .get_mut(self.name.as_str())
            .ok_or_else(|| RegistryError::group_not_found(&self.name))?
            .remove(name)
            .ok_or_else(|| RegistryError::resource_not_found(&self.name, name))?;

        if let (Some(value), Some(closer)) = (record.into_value(), &self.shared.closer)
            && let Err(err) = closer.close(ctx, value)
        {
            tracing::warn!(
                group = %self.name,
                resource = name,
                error = %err,
                "failed to close unregistered resource"
            );
        }

        tracing::debug!(group = %self.name, resource = name, "resource unregistered");
        Ok(())
    }

    /// Names of the resources registered in this group, in no particular
    /// order. Empty if the group no longer exists.
    #[must_use]
    pub fn list(&self) -> Vec<String> {
        self.shared
            .groups
            .read()
            .get(self.name.as_str())
            .map(|records| records.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Returns `true` if `name` is registered in this group.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.shared
            .groups
            .read()
            .get(self.name.as_str())
            .is_some_and(|records| records.contains_key(name))
    }

    /// Returns `true` if `name` is registered and has been opened.
    #[must_use]
    pub fn is_ready(&self, name: &str) -> bool {
        let groups = self.shared.groups.read();
        record(&groups, &self.name, name).is_ok_and(Record::is_ready)
    }

    /// Closes every opened resource of this group and removes the group from
    /// the registry.
    ///
    /// Closer failures are collected as
    /// [`RegistryError::CloseResourceFailed`] and do not stop the pass.
    /// Returns an empty list without doing anything if the group is already
    /// gone. Other groups are untouched.
    pub fn close(&self, ctx: &Context) -> Vec<RegistryError> {
        let mut groups = self.shared.groups.write();
        let Some(records) = groups.remove(self.name.as_str()) else {
            return Vec::new();
        };

        let mut errors = Vec::new();
        self.shared.teardown(ctx, &self.name, records, &mut errors);
        tracing::info!(group = %self.name, failures = errors.len(), "group closed");
        errors
    }

    /// Runs the opener for `name` once as a reachability check.
    ///
    /// The opener is invoked on every call, whether or not the resource is
    /// already open. The opened value is dropped immediately: it is neither
    /// cached nor passed to the closer, and the resource's readiness is left
    /// as it was.
    ///
    /// The read lock is held while the opener runs, so an opener must not
    /// call back into the same registry.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::GroupNotFound`] if the group no longer exists
    /// - [`RegistryError::ResourceNotFound`] if `name` was never registered
    /// - [`RegistryError::PingResourceFailed`] wrapping the opener's error
    pub fn ping(&self, ctx: &Context, name: &str) -> Result<()> {
        let groups = self.shared.groups.read();
        let record = record(&groups, &self.name, name)?;

        match self.shared.opener.open(ctx, record.config()) {
            Ok(_value) => {
                tracing::debug!(group = %self.name, resource = name, "ping succeeded");
                Ok(())
            }
            Err(err) => {
                tracing::debug!(group = %self.name, resource = name, error = %err, "ping failed");
                Err(RegistryError::ping_failed(&self.name, name, err))
            }
        }
    }
}
