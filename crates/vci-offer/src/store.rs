//! # Offer Store Contract and In-Memory Reference Implementation
//!
//! Minimal keyed-record persistence contract for credential offers. The
//! conditional write ([`OfferStore::put`] with an expected prior state) is
//! the single atomicity primitive every engine operation relies on: any
//! backend providing single-record linearizable compare-and-swap on
//! `(id, state)` satisfies the contract — locks, transactions, or atomic
//! document updates alike.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use thiserror::Error;

use vci_core::{OfferId, PreAuthorizedCode};

use crate::offer::{CredentialOffer, OfferState};

/// Errors from offer store backends.
#[derive(Error, Debug)]
pub enum StoreError {
    /// No record exists for the given offer id.
    #[error("offer not found: {id}")]
    NotFound {
        /// The missing offer id.
        id: OfferId,
    },

    /// A create was attempted for an id that already has a record.
    #[error("offer already exists: {id}")]
    AlreadyExists {
        /// The conflicting offer id.
        id: OfferId,
    },

    /// A create was attempted with a pre-authorized code already held by a
    /// retained offer. Codes must be unique across all non-purged offers.
    #[error("pre-authorized code already in use")]
    DuplicateCode,

    /// The conditional write lost: the record's state no longer matches the
    /// expected prior state. The caller must re-read before retrying.
    #[error("state conflict on offer {id}: expected {expected}, found {actual}")]
    StateConflict {
        /// The contested offer id.
        id: OfferId,
        /// The state the writer observed at read time.
        expected: OfferState,
        /// The state actually stored at write time.
        actual: OfferState,
    },
}

/// Keyed durable storage for credential offers.
///
/// Pure persistence — no lifecycle logic. Implementations must be
/// `Send + Sync` and provide linearizable conditional writes per record.
pub trait OfferStore: Send + Sync {
    /// Fetch the offer with the given id.
    fn get(&self, id: OfferId) -> Result<CredentialOffer, StoreError>;

    /// Write an offer record.
    ///
    /// With `expected_prior_state = None` this is a create: it fails with
    /// `AlreadyExists` if the id is taken and `DuplicateCode` if the
    /// pre-authorized code is already indexed. With `Some(state)` it is a
    /// compare-and-swap: the write commits only if the stored record is
    /// still in `state`, otherwise `StateConflict` is returned.
    fn put(
        &self,
        offer: CredentialOffer,
        expected_prior_state: Option<OfferState>,
    ) -> Result<(), StoreError>;

    /// Snapshot of all offers not yet in a terminal state.
    ///
    /// Used by the expiry sweep; the snapshot is advisory — every
    /// transition it triggers is still guarded by the conditional write.
    fn scan_non_terminal(&self) -> Vec<CredentialOffer>;
}

/// In-memory offer store.
///
/// Per-entry locking on the underlying map provides the linearizable
/// conditional write; a secondary index enforces pre-authorized code
/// uniqueness at create time.
#[derive(Default)]
pub struct InMemoryOfferStore {
    offers: DashMap<OfferId, CredentialOffer>,
    codes: DashMap<PreAuthorizedCode, OfferId>,
}

impl InMemoryOfferStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of retained offers. Test/maintenance helper.
    pub fn len(&self) -> usize {
        self.offers.len()
    }

    /// Whether the store holds no offers.
    pub fn is_empty(&self) -> bool {
        self.offers.is_empty()
    }
}

impl OfferStore for InMemoryOfferStore {
    fn get(&self, id: OfferId) -> Result<CredentialOffer, StoreError> {
        self.offers
            .get(&id)
            .map(|entry| entry.clone())
            .ok_or(StoreError::NotFound { id })
    }

    fn put(
        &self,
        offer: CredentialOffer,
        expected_prior_state: Option<OfferState>,
    ) -> Result<(), StoreError> {
        match expected_prior_state {
            None => {
                // Claim the code first; entry locking makes the claim atomic.
                match self.codes.entry(offer.pre_authorized_code.clone()) {
                    Entry::Occupied(existing) if *existing.get() != offer.id => {
                        return Err(StoreError::DuplicateCode);
                    }
                    Entry::Occupied(_) => {}
                    Entry::Vacant(vacant) => {
                        vacant.insert(offer.id);
                    }
                }

                match self.offers.entry(offer.id) {
                    Entry::Occupied(_) => Err(StoreError::AlreadyExists { id: offer.id }),
                    Entry::Vacant(vacant) => {
                        vacant.insert(offer);
                        Ok(())
                    }
                }
            }
            Some(expected) => match self.offers.entry(offer.id) {
                Entry::Occupied(mut existing) => {
                    let actual = existing.get().state;
                    if actual != expected {
                        return Err(StoreError::StateConflict {
                            id: offer.id,
                            expected,
                            actual,
                        });
                    }
                    existing.insert(offer);
                    Ok(())
                }
                Entry::Vacant(_) => Err(StoreError::NotFound { id: offer.id }),
            },
        }
    }

    fn scan_non_terminal(&self) -> Vec<CredentialOffer> {
        self.offers
            .iter()
            .filter(|entry| !entry.state.is_terminal())
            .map(|entry| entry.clone())
            .collect()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
