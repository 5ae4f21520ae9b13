//! Declarative group and resource definitions.
//!
//! A [`Manifest`] lists groups and the configurations to register in each. It
//! is applied with [`Registry::apply_manifest`](crate::registry::Registry::apply_manifest),
//! which only registers configurations; resources are still opened lazily.
//!
//! ```
//! use serde::Deserialize;
//! use tether_registry::callback::BoxError;
//! use tether_registry::context::Context;
//! use tether_registry::manifest::Manifest;
//! use tether_registry::registry::Registry;
//!
//! #[derive(Clone, Deserialize)]
//! struct DbConfig { dsn: String }
//!
//! let manifest: Manifest<DbConfig> = Manifest::from_json_str(r#"{
//!     "groups": {
//!         "primary": { "orders": { "dsn": "postgres://orders" } },
//!         "replica": { "orders": { "dsn": "postgres://orders-ro" } }
//!     }
//! }"#).unwrap();
//!
//! let registry = Registry::new(|_: &Context, cfg: &DbConfig| Ok::<_, BoxError>(cfg.dsn.clone()));
//! let report = registry.apply_manifest(&manifest);
//!
//! assert_eq!(report.registered.len(), 2);
//! assert_eq!(
//!     registry.must_group("replica").get(&Context::background(), "orders").unwrap(),
//!     "postgres://orders-ro",
//! );
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Errors raised while loading a [`Manifest`].
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    /// The document is not valid JSON or does not match the manifest shape.
    #[error("invalid manifest: {0}")]
    Json(#[from] serde_json::Error),
}

/// Groups and resource configurations to register in a registry.
///
/// Groups and resources are applied in name order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest<C> {
    /// Group name → resource name → configuration.
    #[serde(default = "BTreeMap::new")]
    pub groups: BTreeMap<String, BTreeMap<String, C>>,
}

impl<C> Default for Manifest<C> {
    fn default() -> Self {
        Self {
            groups: BTreeMap::new(),
        }
    }
}

impl<C> Manifest<C> {
    /// Creates an empty manifest.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `config` under `group`/`resource`, replacing any earlier entry.
    #[must_use]
    pub fn with_resource(
        mut self,
        group: impl Into<String>,
        resource: impl Into<String>,
        config: C,
    ) -> Self {
        self.groups
            .entry(group.into())
            .or_default()
            .insert(resource.into(), config);
        self
    }

    /// Adds an empty group.
    #[must_use]
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.groups.entry(group.into()).or_default();
        self
    }

    /// Total number of resource entries across all groups.
    #[must_use]
    pub fn resource_count(&self) -> usize {
        self.groups.values().map(BTreeMap::len).sum()
    }
}

impl<C: for<'de> Deserialize<'de>> Manifest<C> {
    /// Parses a manifest from a JSON string.
    ///
    /// # Errors
    ///
    /// - [`ManifestError::Json`] if the input is malformed
    pub fn from_json_str(json: &str) -> Result<Self, ManifestError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parses a manifest from JSON bytes.
    ///
    /// # Errors
    ///
    /// - [`ManifestError::Json`] if the input is malformed
    pub fn from_json_slice(json: &[u8]) -> Result<Self, ManifestError> {
        Ok(serde_json::from_slice(json)?)
    }
}

/// Outcome of [`Registry::apply_manifest`](crate::registry::Registry::apply_manifest).
///
/// Entries are `(group, resource)` pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestReport {
    /// Resources that were newly registered.
    pub registered: Vec<(String, String)>,
    /// Resources that were already registered and kept their configuration.
    pub skipped: Vec<(String, String)>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callback::BoxError;
    use crate::context::Context;
    use crate::registry::Registry;
    use crate::testing::CountingOpener;

    fn echo(_: &Context, cfg: &String) -> Result<String, BoxError> {
        Ok(cfg.clone())
    }

    #[test]
    fn parses_json() {
        let manifest: Manifest<String> =
            Manifest::from_json_str(r#"{"groups": {"g": {"a": "one", "b": "two"}, "empty": {}}}"#)
                .unwrap();

        assert_eq!(manifest.groups.len(), 2);
        assert_eq!(manifest.resource_count(), 2);
        assert_eq!(manifest.groups["g"]["b"], "two");
    }

    #[test]
    fn missing_groups_key_is_empty() {
        let manifest: Manifest<String> = Manifest::from_json_slice(b"{}").unwrap();
        assert_eq!(manifest, Manifest::new());
    }

    #[test]
    fn rejects_malformed_json() {
        let err = Manifest::<String>::from_json_str(r#"{"groups": ["g"]}"#).unwrap_err();
        assert!(err.to_string().starts_with("invalid manifest"));
    }

    #[test]
    fn apply_registers_without_opening() {
        let opener = CountingOpener::new(echo);
        let calls = opener.counter();
        let registry = Registry::new(opener);
        let manifest = Manifest::new()
            .with_resource("g", "a", "one".to_string())
            .with_resource("g", "b", "two".to_string())
            .with_group("empty");

        let report = registry.apply_manifest(&manifest);

        assert_eq!(
            report.registered,
            vec![
                ("g".to_string(), "a".to_string()),
                ("g".to_string(), "b".to_string()),
            ]
        );
        assert!(report.skipped.is_empty());
        assert!(registry.contains_group("empty"));
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn apply_keeps_existing_configs() {
        let registry = Registry::new(echo);
        let ctx = Context::background();
        registry.add_group("g");
        registry
            .must_group("g")
            .register(&ctx, "a", "original".to_string())
            .unwrap();

        let report =
            registry.apply_manifest(&Manifest::new().with_resource("g", "a", "new".to_string()));

        assert_eq!(report.skipped, vec![("g".to_string(), "a".to_string())]);
        assert_eq!(
            registry.must_group("g").config(&ctx, "a").unwrap(),
            "original"
        );
    }
}
