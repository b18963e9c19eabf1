use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockWriteGuard};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use ledgerbridge_core::{Entity, PartnerId};

use crate::normalize::{NormalizedName, NormalizedVat, normalize_name, normalize_vat};

/// Partner entry as held by the ERP registry.
///
/// Normalized forms are derived on demand and never stored: the registry is
/// edited out-of-band and is the only source of truth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartnerRecord {
    pub id: PartnerId,
    pub raw_name: String,
    /// VAT number as typed into the ERP, if any.
    pub raw_vat: Option<String>,
}

impl PartnerRecord {
    pub fn new(id: PartnerId, raw_name: impl Into<String>, raw_vat: Option<&str>) -> Self {
        Self {
            id,
            raw_name: raw_name.into(),
            raw_vat: raw_vat.map(str::to_string),
        }
    }

    pub fn normalized_name(&self) -> NormalizedName {
        normalize_name(&self.raw_name)
    }

    pub fn normalized_vat(&self) -> NormalizedVat {
        normalize_vat(self.raw_vat.as_deref().unwrap_or_default())
    }
}

impl Entity for PartnerRecord {
    type Id = PartnerId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Failure to read the partner registry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("partner registry unavailable: {0}")]
    Unavailable(String),
}

/// Read access to the partner registry (ERP collaborator).
///
/// A resolution call takes one snapshot and works on it for its whole duration.
pub trait PartnerRegistry: Send + Sync {
    fn snapshot(&self) -> Result<Vec<PartnerRecord>, RegistryError>;
}

impl<R> PartnerRegistry for Arc<R>
where
    R: PartnerRegistry + ?Sized,
{
    fn snapshot(&self) -> Result<Vec<PartnerRecord>, RegistryError> {
        (**self).snapshot()
    }
}

/// In-memory partner registry for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryPartnerRegistry {
    inner: RwLock<BTreeMap<PartnerId, PartnerRecord>>,
}

impl InMemoryPartnerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_partners(partners: impl IntoIterator<Item = PartnerRecord>) -> Self {
        let map = partners.into_iter().map(|p| (p.id, p)).collect();
        Self {
            inner: RwLock::new(map),
        }
    }

    pub fn upsert(&self, partner: PartnerRecord) -> Result<(), RegistryError> {
        self.write_map()?.insert(partner.id, partner);
        Ok(())
    }

    pub fn remove(&self, id: PartnerId) -> Result<Option<PartnerRecord>, RegistryError> {
        Ok(self.write_map()?.remove(&id))
    }

    fn write_map(
        &self,
    ) -> Result<RwLockWriteGuard<'_, BTreeMap<PartnerId, PartnerRecord>>, RegistryError> {
        self.inner.write().map_err(|_| poisoned())
    }
}

fn poisoned() -> RegistryError {
    RegistryError::Unavailable("registry lock poisoned".to_string())
}

impl PartnerRegistry for InMemoryPartnerRegistry {
    fn snapshot(&self) -> Result<Vec<PartnerRecord>, RegistryError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalized_forms_are_derived_from_raw_fields() {
        let partner =
            PartnerRecord::new(PartnerId::new(1), "Bagnoli Group Srl", Some("IT00895100709"));
        assert_eq!(partner.normalized_name().as_str(), "bagnoli group");
        assert_eq!(partner.normalized_vat().as_str(), "00895100709");

        let no_vat = PartnerRecord::new(PartnerId::new(2), "Senza Partita", None);
        assert!(no_vat.normalized_vat().is_empty());
    }

    #[test]
    fn snapshot_reflects_later_updates() {
        let registry = InMemoryPartnerRegistry::with_partners([PartnerRecord::new(
            PartnerId::new(1),
            "Old Name",
            None,
        )]);
        assert_eq!(registry.snapshot().unwrap()[0].raw_name, "Old Name");

        registry.upsert(PartnerRecord::new(PartnerId::new(1), "New Name", None)).unwrap();
        registry.upsert(PartnerRecord::new(PartnerId::new(2), "Other", None)).unwrap();
        let snapshot = registry.snapshot().unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].raw_name, "New Name");

        assert!(registry.remove(PartnerId::new(2)).unwrap().is_some());
        assert_eq!(registry.snapshot().unwrap().len(), 1);
    }

    #[test]
    fn poisoned_registry_reports_unavailable_on_every_access() {
        let registry = InMemoryPartnerRegistry::new();
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = registry.inner.write().unwrap();
            panic!("writer died holding the lock");
        }));

        let upserted = registry.upsert(PartnerRecord::new(PartnerId::new(1), "Lost", None));
        match upserted.unwrap_err() {
            RegistryError::Unavailable(_) => {}
        }
        assert!(registry.remove(PartnerId::new(1)).is_err());
        assert!(registry.snapshot().is_err());
    }
}
