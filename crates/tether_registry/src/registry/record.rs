//! Per-resource state.

use hashbrown::HashMap;

/// Records of one group, keyed by resource name.
pub(crate) type Records<C, T> = HashMap<String, Record<C, T>>;

/// Groups of the registry, keyed by group name.
pub(crate) type Groups<C, T> = HashMap<String, Records<C, T>>;

/// A registered configuration and, once materialized, its resource.
///
/// `value` is `None` until the first successful open. It is only ever set
/// once; a record is never reset to unready; it is removed instead.
pub(crate) struct Record<C, T> {
    config: C,
    value: Option<T>,
}

impl<C, T> Record<C, T> {
    /// Creates an unready record.
    pub(crate) fn new(config: C) -> Self {
        Self {
            config,
            value: None,
        }
    }

    pub(crate) fn config(&self) -> &C {
        &self.config
    }

    /// The materialized resource, if ready.
    pub(crate) fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub(crate) fn is_ready(&self) -> bool {
        self.value.is_some()
    }

    /// Stores the opened resource, marking the record ready.
    pub(crate) fn materialize(&mut self, value: T) {
        debug_assert!(self.value.is_none(), "record materialized twice");
        self.value = Some(value);
    }

    /// Consumes the record, returning the resource if it was ready.
    pub(crate) fn into_value(self) -> Option<T> {
        self.value
    }
}
