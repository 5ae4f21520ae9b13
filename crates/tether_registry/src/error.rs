//! Registry error taxonomy.
//!
//! Every fallible registry operation returns [`RegistryError`]. The variants
//! form a closed set; use [`RegistryError::kind`] (or match on the variant) to
//! detect a condition instead of comparing messages.
//!
//! ```
//! use tether_registry::callback::BoxError;
//! use tether_registry::context::Context;
//! use tether_registry::error::ErrorKind;
//! use tether_registry::registry::Registry;
//!
//! let registry = Registry::new(|_: &Context, cfg: &u32| Ok::<_, BoxError>(*cfg));
//!
//! let err = registry.group("missing").unwrap_err();
//! assert_eq!(err.kind(), ErrorKind::GroupNotFound);
//! ```

use crate::callback::BoxError;

/// Result alias for registry operations.
pub type Result<T, E = RegistryError> = core::result::Result<T, E>;

/// Errors returned by [`Registry`](crate::registry::Registry) and
/// [`Group`](crate::registry::Group) operations.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// The named group is not present in the registry.
    #[error("group {group:?} not found")]
    GroupNotFound {
        /// Name of the missing group.
        group: String,
    },

    /// The resource was never registered in the group.
    #[error("resource {resource:?} not found in group {group:?}")]
    ResourceNotFound {
        /// Group that was searched.
        group: String,
        /// Name of the missing resource.
        resource: String,
    },

    /// The closer failed for a materialized resource.
    #[error("close resource {resource:?} in group {group:?} failed")]
    CloseResourceFailed {
        /// Group owning the resource.
        group: String,
        /// Resource whose teardown failed.
        resource: String,
        /// Error returned by the closer.
        #[source]
        source: BoxError,
    },

    /// The opener failed during [`Group::ping`](crate::registry::Group::ping).
    #[error("ping resource {resource:?} in group {group:?} failed")]
    PingResourceFailed {
        /// Group owning the resource.
        group: String,
        /// Resource that was pinged.
        resource: String,
        /// Error returned by the opener.
        #[source]
        source: BoxError,
    },

    /// The opener failed during lazy creation. Displays as the opener's error.
    #[error(transparent)]
    Open(BoxError),

    /// A [`RegistryBuilder`](crate::registry::RegistryBuilder) was built
    /// without an opener.
    #[error("registry builder requires an opener")]
    MissingOpener,
}

/// Discriminant of a [`RegistryError`], stable across wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`RegistryError::GroupNotFound`].
    GroupNotFound,
    /// See [`RegistryError::ResourceNotFound`].
    ResourceNotFound,
    /// See [`RegistryError::CloseResourceFailed`].
    CloseResourceFailed,
    /// See [`RegistryError::PingResourceFailed`].
    PingResourceFailed,
    /// See [`RegistryError::Open`].
    Open,
    /// See [`RegistryError::MissingOpener`].
    MissingOpener,
}

impl RegistryError {
    pub(crate) fn group_not_found(group: &str) -> Self {
        Self::GroupNotFound {
            group: group.to_owned(),
        }
    }

    pub(crate) fn resource_not_found(group: &str, resource: &str) -> Self {
        Self::ResourceNotFound {
            group: group.to_owned(),
            resource: resource.to_owned(),
        }
    }

    pub(crate) fn close_failed(group: &str, resource: &str, source: BoxError) -> Self {
        Self::CloseResourceFailed {
            group: group.to_owned(),
            resource: resource.to_owned(),
            source,
        }
    }

    pub(crate) fn ping_failed(group: &str, resource: &str, source: BoxError) -> Self {
        Self::PingResourceFailed {
            group: group.to_owned(),
            resource: resource.to_owned(),
            source,
        }
    }

    /// Returns the sentinel kind of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::GroupNotFound { .. } => ErrorKind::GroupNotFound,
            Self::ResourceNotFound { .. } => ErrorKind::ResourceNotFound,
            Self::CloseResourceFailed { .. } => ErrorKind::CloseResourceFailed,
            Self::PingResourceFailed { .. } => ErrorKind::PingResourceFailed,
            Self::Open(_) => ErrorKind::Open,
            Self::MissingOpener => ErrorKind::MissingOpener,
        }
    }

    /// Returns `true` for [`GroupNotFound`](Self::GroupNotFound) and
    /// [`ResourceNotFound`](Self::ResourceNotFound).
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::GroupNotFound | ErrorKind::ResourceNotFound
        )
    }

    /// The group this error refers to, if any.
    #[must_use]
    pub fn group(&self) -> Option<&str> {
        match self {
            Self::GroupNotFound { group }
            | Self::ResourceNotFound { group, .. }
            | Self::CloseResourceFailed { group, .. }
            | Self::PingResourceFailed { group, .. } => Some(group),
            Self::Open(_) | Self::MissingOpener => None,
        }
    }

    /// The resource this error refers to, if any.
    #[must_use]
    pub fn resource(&self) -> Option<&str> {
        match self {
            Self::ResourceNotFound { resource, .. }
            | Self::CloseResourceFailed { resource, .. }
            | Self::PingResourceFailed { resource, .. } => Some(resource),
            Self::GroupNotFound { .. } | Self::Open(_) | Self::MissingOpener => None,
        }
    }

    /// The callback error carried by this error, if any.
    ///
    /// Use this to downcast to the concrete error type an opener or closer
    /// returned.
    #[must_use]
    pub fn callback_error(&self) -> Option<&(dyn core::error::Error + Send + Sync + 'static)> {
        match self {
            Self::CloseResourceFailed { source, .. }
            | Self::PingResourceFailed { source, .. }
            | Self::Open(source) => Some(&**source),
            Self::GroupNotFound { .. } | Self::ResourceNotFound { .. } | Self::MissingOpener => {
                None
            }
        }
    }

    /// Consumes the error, returning the callback error it carries, if any.
    #[must_use]
    pub fn into_callback_error(self) -> Option<BoxError> {
        match self {
            Self::CloseResourceFailed { source, .. }
            | Self::PingResourceFailed { source, .. }
            | Self::Open(source) => Some(source),
            Self::GroupNotFound { .. } | Self::ResourceNotFound { .. } | Self::MissingOpener => {
                None
            }
        }
    }
}
