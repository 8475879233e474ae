//! Reference-data provider seam.
//!
//! Deployments load bundles from wherever they keep them (database, files,
//! seed jobs); the core only depends on this trait. The static provider
//! serves fixed bundles and is the default for tests and offline use.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::bundle::{ReferenceData, builtin};
use crate::error::RefError;

/// Read-only access to versioned reference bundles.
pub trait ReferenceProvider: Send + Sync {
    /// The bundle currently active for new computations.
    fn get_active(&self) -> Result<Arc<ReferenceData>, RefError>;

    /// A specific bundle by version tag.
    fn get(&self, version: &str) -> Result<Arc<ReferenceData>, RefError>;
}

/// Provider over a fixed in-memory set of bundles.
#[derive(Debug, Clone)]
pub struct StaticReferenceProvider {
    bundles: BTreeMap<String, Arc<ReferenceData>>,
    active: String,
}

impl StaticReferenceProvider {
    /// Provider holding exactly one bundle, which is active.
    pub fn single(bundle: ReferenceData) -> Self {
        let active = bundle.version.clone();
        let mut bundles = BTreeMap::new();
        bundles.insert(active.clone(), Arc::new(bundle));
        Self { bundles, active }
    }

    /// Provider seeded with the builtin bundle.
    pub fn with_builtin() -> Self {
        Self::single(builtin())
    }

    /// Add another bundle; does not change the active version.
    pub fn insert(&mut self, bundle: ReferenceData) {
        self.bundles.insert(bundle.version.clone(), Arc::new(bundle));
    }
}

impl ReferenceProvider for StaticReferenceProvider {
    fn get_active(&self) -> Result<Arc<ReferenceData>, RefError> {
        self.get(&self.active)
    }

    fn get(&self, version: &str) -> Result<Arc<ReferenceData>, RefError> {
        self.bundles
            .get(version)
            .cloned()
            .ok_or_else(|| RefError::VersionNotFound(version.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_provider_serves_active() {
        let provider = StaticReferenceProvider::with_builtin();
        let bundle = provider.get_active().expect("active bundle");
        assert_eq!(bundle.version, crate::bundle::BUILTIN_REFERENCE_VERSION);
    }

    #[test]
    fn unknown_version_is_reported() {
        let provider = StaticReferenceProvider::with_builtin();
        let err = provider.get("1890.1").unwrap_err();
        assert_eq!(err.code(), "reference_version_not_found");
    }

    #[test]
    fn insert_keeps_active_version() {
        let mut provider = StaticReferenceProvider::with_builtin();
        let mut other = builtin();
        other.version = "2025.1".into();
        provider.insert(other);
        assert_eq!(
            provider.get_active().unwrap().version,
            crate::bundle::BUILTIN_REFERENCE_VERSION
        );
        assert!(provider.get("2025.1").is_ok());
    }
}
