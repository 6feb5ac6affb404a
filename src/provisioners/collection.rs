//! Concurrent cache of provisioners keyed by issuer identity.

use super::Provisioner;
use crate::store::ObjectKey;
use dashmap::DashMap;
use std::sync::Arc;

/// Provisioners of ready issuers, keyed by the issuer's [`ObjectKey`].
///
/// Entries are replaced whenever an issuer is reconciled again and are never
/// removed.
#[derive(Debug, Default)]
pub struct Collection {
    provisioners: DashMap<ObjectKey, Arc<Provisioner>>,
}

impl Collection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A collection holding the given provisioners
    #[must_use]
    pub fn with(items: impl IntoIterator<Item = (ObjectKey, Arc<Provisioner>)>) -> Self {
        Self {
            provisioners: items.into_iter().collect(),
        }
    }

    /// Insert or replace the provisioner for an issuer
    pub fn store(&self, key: ObjectKey, provisioner: Arc<Provisioner>) {
        self.provisioners.insert(key, provisioner);
    }

    #[must_use]
    pub fn load(&self, key: &ObjectKey) -> Option<Arc<Provisioner>> {
        self.provisioners.get(key).map(|entry| Arc::clone(entry.value()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.provisioners.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.provisioners.is_empty()
    }
}
