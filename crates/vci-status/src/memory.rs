//! # In-Memory Status Registry
//!
//! DashMap-backed reference implementation of [`StatusRegistry`] for tests
//! and local development. Supports outage injection so callers can exercise
//! the engine's rollback behavior when the registry fails mid-transition.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use dashmap::DashMap;

use vci_core::OfferId;

use crate::registry::{RegistryError, StatusListReference, StatusRegistry, StatusValue};

/// In-memory status registry backend.
///
/// Slots are allocated sequentially within a single configured list.
/// Allocation is idempotent per offer id. All operations can be forced to
/// fail via [`InMemoryStatusRegistry::set_available`].
pub struct InMemoryStatusRegistry {
    list_id: String,
    allocations: DashMap<OfferId, u64>,
    slots: DashMap<u64, StatusValue>,
    next_index: AtomicU64,
    available: AtomicBool,
    writes_available: AtomicBool,
}

impl InMemoryStatusRegistry {
    /// Create a registry publishing into the given status list.
    pub fn new(list_id: impl Into<String>) -> Self {
        Self {
            list_id: list_id.into(),
            allocations: DashMap::new(),
            slots: DashMap::new(),
            next_index: AtomicU64::new(0),
            available: AtomicBool::new(true),
            writes_available: AtomicBool::new(true),
        }
    }

    /// Toggle backend availability. While unavailable, every operation
    /// returns [`RegistryError::Unavailable`] — simulating an outage of the
    /// remote status-list service.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Toggle write availability only. While writes are unavailable,
    /// `set_status` fails with [`RegistryError::Unavailable`] but allocation
    /// and reads keep working — the partial-outage shape that exercises a
    /// caller's rollback after a committed local transition.
    pub fn set_writes_available(&self, available: bool) {
        self.writes_available.store(available, Ordering::SeqCst);
    }

    /// Number of allocated slots. Test/reconciliation helper.
    pub fn allocated(&self) -> usize {
        self.allocations.len()
    }

    fn check_available(&self, operation: &str) -> Result<(), RegistryError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(RegistryError::Unavailable {
                reason: format!("{operation}: simulated outage"),
            })
        }
    }
}

impl StatusRegistry for InMemoryStatusRegistry {
    fn allocate(&self, offer_id: OfferId) -> Result<StatusListReference, RegistryError> {
        self.check_available("allocate")?;

        let index = *self.allocations.entry(offer_id).or_insert_with(|| {
            let index = self.next_index.fetch_add(1, Ordering::SeqCst);
            self.slots.insert(index, StatusValue::Valid);
            index
        });

        Ok(StatusListReference {
            list_id: self.list_id.clone(),
            index,
        })
    }

    fn set_status(
        &self,
        reference: &StatusListReference,
        value: StatusValue,
    ) -> Result<(), RegistryError> {
        self.check_available("set_status")?;
        if !self.writes_available.load(Ordering::SeqCst) {
            return Err(RegistryError::Unavailable {
                reason: "set_status: simulated write outage".to_string(),
            });
        }

        if reference.list_id != self.list_id {
            return Err(RegistryError::ReferenceNotFound {
                reference: reference.to_string(),
            });
        }

        match self.slots.get_mut(&reference.index) {
            Some(mut slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(RegistryError::ReferenceNotFound {
                reference: reference.to_string(),
            }),
        }
    }

    fn read_status(&self, reference: &StatusListReference) -> Result<StatusValue, RegistryError> {
        self.check_available("read_status")?;

        if reference.list_id != self.list_id {
            return Err(RegistryError::ReferenceNotFound {
                reference: reference.to_string(),
            });
        }

        self.slots
            .get(&reference.index)
            .map(|slot| *slot)
            .ok_or_else(|| RegistryError::ReferenceNotFound {
                reference: reference.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> InMemoryStatusRegistry {
        InMemoryStatusRegistry::new("https://status.example.com/lists/1")
    }

    #[test]
    fn allocate_assigns_sequential_indices() {
        let reg = registry();
        let a = reg.allocate(OfferId::new()).unwrap();
        let b = reg.allocate(OfferId::new()).unwrap();
        assert_eq!(a.index, 0);
        assert_eq!(b.index, 1);
    }

    #[test]
    fn allocate_is_idempotent_per_offer() {
        let reg = registry();
        let offer = OfferId::new();
        let first = reg.allocate(offer).unwrap();
        let second = reg.allocate(offer).unwrap();
        assert_eq!(first, second);
        assert_eq!(reg.allocated(), 1);
    }

    #[test]
    fn allocated_slot_starts_valid() {
        let reg = registry();
        let r = reg.allocate(OfferId::new()).unwrap();
        assert_eq!(reg.read_status(&r).unwrap(), StatusValue::Valid);
    }

    #[test]
    fn set_status_flips_published_value() {
        let reg = registry();
        let r = reg.allocate(OfferId::new()).unwrap();
        reg.set_status(&r, StatusValue::Suspended).unwrap();
        assert_eq!(reg.read_status(&r).unwrap(), StatusValue::Suspended);
        reg.set_status(&r, StatusValue::Revoked).unwrap();
        assert_eq!(reg.read_status(&r).unwrap(), StatusValue::Revoked);
    }

    #[test]
    fn unknown_reference_is_not_found() {
        let reg = registry();
        let bogus = StatusListReference {
            list_id: "https://status.example.com/lists/1".to_string(),
            index: 999,
        };
        assert!(matches!(
            reg.set_status(&bogus, StatusValue::Valid),
            Err(RegistryError::ReferenceNotFound { .. })
        ));
        assert!(matches!(
            reg.read_status(&bogus),
            Err(RegistryError::ReferenceNotFound { .. })
        ));
    }

    #[test]
    fn foreign_list_is_not_found() {
        let reg = registry();
        let r = reg.allocate(OfferId::new()).unwrap();
        let foreign = StatusListReference {
            list_id: "https://other.example.com/lists/9".to_string(),
            index: r.index,
        };
        assert!(matches!(
            reg.read_status(&foreign),
            Err(RegistryError::ReferenceNotFound { .. })
        ));
    }

    #[test]
    fn outage_fails_every_operation() {
        let reg = registry();
        let r = reg.allocate(OfferId::new()).unwrap();
        reg.set_available(false);

        assert!(matches!(
            reg.allocate(OfferId::new()),
            Err(RegistryError::Unavailable { .. })
        ));
        assert!(matches!(
            reg.set_status(&r, StatusValue::Revoked),
            Err(RegistryError::Unavailable { .. })
        ));
        assert!(matches!(
            reg.read_status(&r),
            Err(RegistryError::Unavailable { .. })
        ));

        // Recovery restores the previously published value.
        reg.set_available(true);
        assert_eq!(reg.read_status(&r).unwrap(), StatusValue::Valid);
    }

    #[test]
    fn write_outage_fails_only_set_status() {
        let reg = registry();
        let r = reg.allocate(OfferId::new()).unwrap();
        reg.set_writes_available(false);

        assert!(reg.allocate(OfferId::new()).is_ok());
        assert_eq!(reg.read_status(&r).unwrap(), StatusValue::Valid);
        assert!(matches!(
            reg.set_status(&r, StatusValue::Revoked),
            Err(RegistryError::Unavailable { .. })
        ));

        reg.set_writes_available(true);
        reg.set_status(&r, StatusValue::Revoked).unwrap();
        assert_eq!(reg.read_status(&r).unwrap(), StatusValue::Revoked);
    }

    #[test]
    fn trait_is_object_and_arc_safe() {
        use std::sync::Arc;
        let reg: Arc<dyn StatusRegistry> = Arc::new(registry());
        let r = reg.allocate(OfferId::new()).unwrap();
        assert_eq!(reg.read_status(&r).unwrap(), StatusValue::Valid);
    }
}
