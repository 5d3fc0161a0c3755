//! # Offer Lifecycle Engine
//!
//! Owns the offer state machine and synchronizes it with the status
//! registry. Every state-changing operation follows the same shape:
//! read the current record, validate the target against the transition
//! table, then commit through the store's conditional write guarded by the
//! state observed at read time.
//!
//! ## Registry Synchronization
//!
//! Registry-backed transitions (ISSUED, SUSPENDED, reinstate, REVOKED from
//! issuance) commit the local write first, then publish to the registry. A
//! failed publish rolls the local write back through the same conditional
//! write and surfaces `RegistryError` — stored state and published status
//! never diverge across a registry failure. Slot allocation happens before
//! the local write and is idempotent, so a rolled-back issuance retried
//! later reuses its original slot.
//!
//! ## Expiry
//!
//! Expiry is lazy: any operation that touches a pre-issuance offer past its
//! retrieval deadline persists the EXPIRED transition before answering, so
//! no caller ever acts on a stale OFFERED view. The [`OfferEngine::expire_offers`]
//! sweep does the same in bulk and can run concurrently with user-triggered
//! transitions — it only moves expirable offers forward via the conditional
//! write, so it cannot race past a committed terminal transition.

use std::sync::Arc;

use thiserror::Error;

use vci_core::{OfferId, PreAuthorizedCode, Timestamp, ValidationError};
use vci_status::{RegistryError, StatusRegistry, StatusValue};

use crate::offer::{CredentialOffer, OfferState, TransitionRecord};
use crate::store::{OfferStore, StoreError};

/// Errors from lifecycle engine operations.
#[derive(Error, Debug)]
pub enum OfferError {
    /// The request was malformed (empty configuration ids, missing subject
    /// data, non-positive TTL). Never retried.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// No offer exists for the given id.
    #[error("offer not found: {id}")]
    NotFound {
        /// The missing offer id.
        id: OfferId,
    },

    /// The requested transition is not an edge of the lifecycle graph.
    #[error("invalid transition from {from} to {to}")]
    InvalidTransition {
        /// The offer's current state.
        from: OfferState,
        /// The requested target state.
        to: OfferState,
    },

    /// The offer's retrieval window elapsed before the operation.
    #[error("offer expired: {id}")]
    Expired {
        /// The expired offer id.
        id: OfferId,
    },

    /// The conditional write lost a race with a concurrent writer. The
    /// caller may re-read and retry; the engine never retries inline.
    #[error("concurrent modification of offer {id}")]
    ConcurrentModification {
        /// The contested offer id.
        id: OfferId,
    },

    /// The status registry failed; any guarded local write was rolled back.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Invariant violation inside the engine or store.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Request to create a new credential offer.
#[derive(Debug, Clone)]
pub struct CreateOffer {
    /// Ordered configuration identifiers describing what is offered.
    pub credential_configuration_ids: Vec<String>,
    /// Opaque subject payload: structured claims or a pre-signed assertion.
    pub subject_data: serde_json::Value,
    /// Holder retrieval window in seconds.
    pub ttl_secs: i64,
}

/// The offer lifecycle engine.
///
/// Stateless beyond its collaborators; safe to share behind an `Arc`
/// across arbitrarily concurrent callers as long as the store provides
/// true compare-and-swap semantics on `(id, state)`.
pub struct OfferEngine {
    store: Arc<dyn OfferStore>,
    registry: Arc<dyn StatusRegistry>,
}

impl OfferEngine {
    /// Create an engine over the given store and registry backends.
    pub fn new(store: Arc<dyn OfferStore>, registry: Arc<dyn StatusRegistry>) -> Self {
        Self { store, registry }
    }

    /// Create a new offer in state OFFERED.
    ///
    /// Does not contact the status registry — no public status exists for
    /// an un-retrieved offer.
    pub fn create_offer(
        &self,
        request: CreateOffer,
        now: Timestamp,
    ) -> Result<CredentialOffer, OfferError> {
        if request.credential_configuration_ids.is_empty() {
            return Err(OfferError::InvalidRequest(
                "credential_configuration_ids must not be empty".to_string(),
            ));
        }
        if request
            .credential_configuration_ids
            .iter()
            .any(|id| id.trim().is_empty())
        {
            return Err(OfferError::InvalidRequest(
                "credential_configuration_ids must not contain blank entries".to_string(),
            ));
        }
        if request.subject_data.is_null() {
            return Err(OfferError::InvalidRequest(
                "subject data must be present".to_string(),
            ));
        }

        let expires_at = now
            .plus_secs(request.ttl_secs)
            .map_err(|e: ValidationError| OfferError::InvalidRequest(e.to_string()))?;

        let offer = CredentialOffer {
            id: OfferId::new(),
            state: OfferState::Offered,
            pre_authorized_code: PreAuthorizedCode::new(),
            credential_configuration_ids: request.credential_configuration_ids,
            subject_data: request.subject_data,
            status_list_reference: None,
            created_at: now,
            expires_at,
            transitions: Vec::new(),
        };

        self.store
            .put(offer.clone(), None)
            .map_err(|e| OfferError::Internal(format!("offer create failed: {e}")))?;

        tracing::info!(offer_id = %offer.id, expires_at = %offer.expires_at, "credential offer created");
        Ok(offer)
    }

    /// Fetch an offer, persisting the EXPIRED transition first if its
    /// retrieval window has lapsed.
    pub fn get_offer(&self, id: OfferId, now: Timestamp) -> Result<CredentialOffer, OfferError> {
        let offer = self.read(id)?;
        self.settle_expiry(offer, now)
    }

    /// Holder begins retrieval: OFFERED → IN_PROGRESS, consuming the
    /// pre-authorized code atomically with the state write. Of two
    /// concurrent retrievals, exactly one commits.
    pub fn begin_retrieval(
        &self,
        id: OfferId,
        now: Timestamp,
    ) -> Result<CredentialOffer, OfferError> {
        let offer = self.read(id)?;
        let offer = self.settle_expiry(offer, now)?;
        if offer.state == OfferState::Expired {
            return Err(OfferError::Expired { id });
        }
        if offer.state != OfferState::Offered {
            return Err(OfferError::InvalidTransition {
                from: offer.state,
                to: OfferState::InProgress,
            });
        }

        let updated = offer.transitioned(
            OfferState::InProgress,
            now,
            "holder began retrieval; pre-authorized code consumed",
        );
        self.commit(updated, OfferState::Offered)?;

        tracing::info!(offer_id = %id, "offer retrieval started");
        self.read(id)
    }

    /// Credential produced: IN_PROGRESS → ISSUED, allocating the offer's
    /// status list slot and publishing the initial `valid` value.
    ///
    /// If publishing fails, the local ISSUED write is rolled back and the
    /// registry error is surfaced — the offer never stays ISSUED locally
    /// while unknown to the registry.
    pub fn mark_issued(&self, id: OfferId, now: Timestamp) -> Result<CredentialOffer, OfferError> {
        let offer = self.read(id)?;
        let offer = self.settle_expiry(offer, now)?;
        if offer.state == OfferState::Expired {
            return Err(OfferError::Expired { id });
        }
        if offer.state != OfferState::InProgress {
            return Err(OfferError::InvalidTransition {
                from: offer.state,
                to: OfferState::Issued,
            });
        }

        // Idempotent per offer: a rolled-back issuance retried later gets
        // the same slot back.
        let reference = self.registry.allocate(id).map_err(|e| {
            tracing::warn!(offer_id = %id, error = %e, "status slot allocation failed");
            e
        })?;

        let mut updated = offer.transitioned(OfferState::Issued, now, "credential issued");
        if updated.status_list_reference.is_none() {
            updated.status_list_reference = Some(reference.clone());
        }
        self.commit(updated.clone(), OfferState::InProgress)?;

        if let Err(e) = self.registry.set_status(&reference, StatusValue::Valid) {
            tracing::warn!(offer_id = %id, error = %e, "publishing valid status failed; rolling back issuance");
            self.rollback(&offer, &updated, now);
            return Err(e.into());
        }

        tracing::info!(offer_id = %id, reference = %reference, "offer issued and published as valid");
        Ok(updated)
    }

    /// Administrative status update: SUSPENDED, ISSUED (reinstate), REVOKED,
    /// or CANCELLED per the transition table.
    ///
    /// Registry-backed targets flip the published value after the local
    /// write commits; a registry failure rolls the local write back.
    /// CANCELLED never touches the registry — no public status exists
    /// before issuance.
    pub fn update_status(
        &self,
        id: OfferId,
        target: OfferState,
        now: Timestamp,
    ) -> Result<CredentialOffer, OfferError> {
        match target {
            OfferState::Cancelled => self.cancel(id, now),
            OfferState::Suspended => {
                self.publish_transition(id, target, now, StatusValue::Suspended, "suspended by administrative action")
            }
            OfferState::Issued => {
                self.publish_transition(id, target, now, StatusValue::Valid, "reinstated by administrative action")
            }
            OfferState::Revoked => {
                self.publish_transition(id, target, now, StatusValue::Revoked, "revoked by administrative action")
            }
            other => Err(OfferError::InvalidRequest(format!(
                "state {other} is not externally settable"
            ))),
        }
    }

    /// Maintenance sweep: persist EXPIRED for every expirable offer past
    /// its deadline. Returns the number of offers transitioned.
    ///
    /// Never touches the registry — pre-issuance offers were never
    /// published. Offers losing their conditional write to a concurrent
    /// transition are skipped; the winner already decided their fate.
    pub fn expire_offers(&self, now: Timestamp) -> Result<usize, OfferError> {
        let mut expired = 0;
        for offer in self.store.scan_non_terminal() {
            if !offer.is_retrieval_expired(now) {
                continue;
            }
            let prior = offer.state;
            let updated = offer.transitioned(OfferState::Expired, now, "time-to-live elapsed");
            match self.store.put(updated, Some(prior)) {
                Ok(()) => expired += 1,
                Err(StoreError::StateConflict { .. }) | Err(StoreError::NotFound { .. }) => {}
                Err(e) => return Err(OfferError::Internal(format!("expiry sweep write failed: {e}"))),
            }
        }
        if expired > 0 {
            tracing::info!(expired, "offer expiry sweep completed");
        }
        Ok(expired)
    }

    // ── Internals ────────────────────────────────────────────────────

    fn read(&self, id: OfferId) -> Result<CredentialOffer, OfferError> {
        match self.store.get(id) {
            Ok(offer) => Ok(offer),
            Err(StoreError::NotFound { id }) => Err(OfferError::NotFound { id }),
            Err(e) => Err(OfferError::Internal(format!("offer read failed: {e}"))),
        }
    }

    fn commit(
        &self,
        offer: CredentialOffer,
        expected_prior: OfferState,
    ) -> Result<(), OfferError> {
        let id = offer.id;
        match self.store.put(offer, Some(expected_prior)) {
            Ok(()) => Ok(()),
            Err(StoreError::StateConflict { .. }) => Err(OfferError::ConcurrentModification { id }),
            Err(StoreError::NotFound { id }) => Err(OfferError::NotFound { id }),
            Err(e) => Err(OfferError::Internal(format!("offer write failed: {e}"))),
        }
    }

    /// Persist the EXPIRED transition for a lapsed pre-issuance offer and
    /// return the record the caller should act on.
    ///
    /// A conditional-write loss here means another writer committed first;
    /// the single re-read returns whatever that winner decided.
    fn settle_expiry(
        &self,
        offer: CredentialOffer,
        now: Timestamp,
    ) -> Result<CredentialOffer, OfferError> {
        if !offer.is_retrieval_expired(now) {
            return Ok(offer);
        }

        let prior = offer.state;
        let updated = offer.transitioned(OfferState::Expired, now, "time-to-live elapsed");
        match self.store.put(updated.clone(), Some(prior)) {
            Ok(()) => {
                tracing::info!(offer_id = %updated.id, from = %prior, "offer expired lazily");
                Ok(updated)
            }
            Err(StoreError::StateConflict { .. }) => self.read(updated.id),
            Err(StoreError::NotFound { id }) => Err(OfferError::NotFound { id }),
            Err(e) => Err(OfferError::Internal(format!("lazy expiry write failed: {e}"))),
        }
    }

    /// Administrative cancel: OFFERED or IN_PROGRESS → CANCELLED.
    fn cancel(&self, id: OfferId, now: Timestamp) -> Result<CredentialOffer, OfferError> {
        let offer = self.read(id)?;
        let offer = self.settle_expiry(offer, now)?;
        if offer.state == OfferState::Expired {
            return Err(OfferError::Expired { id });
        }
        if !offer.state.can_transition(OfferState::Cancelled) {
            return Err(OfferError::InvalidTransition {
                from: offer.state,
                to: OfferState::Cancelled,
            });
        }

        let prior = offer.state;
        let updated = offer.transitioned(
            OfferState::Cancelled,
            now,
            "cancelled by administrative action",
        );
        self.commit(updated.clone(), prior)?;

        tracing::info!(offer_id = %id, from = %prior, "offer cancelled");
        Ok(updated)
    }

    /// Commit a registry-backed transition, then flip the published value;
    /// roll the local write back if publishing fails.
    fn publish_transition(
        &self,
        id: OfferId,
        target: OfferState,
        now: Timestamp,
        value: StatusValue,
        reason: &str,
    ) -> Result<CredentialOffer, OfferError> {
        let offer = self.read(id)?;
        if !offer.state.can_transition(target) {
            return Err(OfferError::InvalidTransition {
                from: offer.state,
                to: target,
            });
        }

        let reference = offer.status_list_reference.clone().ok_or_else(|| {
            OfferError::Internal(format!(
                "offer {id} in state {} has no status list reference",
                offer.state
            ))
        })?;

        let prior = offer.state;
        let updated = offer.transitioned(target, now, reason);
        self.commit(updated.clone(), prior)?;

        if let Err(e) = self.registry.set_status(&reference, value) {
            tracing::warn!(offer_id = %id, target = %target, error = %e, "status publication failed; rolling back transition");
            self.rollback(&offer, &updated, now);
            return Err(e.into());
        }

        tracing::info!(offer_id = %id, from = %prior, to = %target, published = %value, "offer status updated");
        Ok(updated)
    }

    /// Revert a committed local write whose registry publication failed.
    ///
    /// Restores the pre-transition state while keeping the committed record
    /// otherwise intact (any newly assigned status list reference, and the
    /// transition itself in the audit trail, followed by its reversal).
    /// A conditional-write loss during rollback can only mean another
    /// writer already moved the offer on; it is logged, not propagated —
    /// the original registry error is what the caller must see.
    fn rollback(&self, prior: &CredentialOffer, committed: &CredentialOffer, now: Timestamp) {
        let mut restored = committed.clone();
        restored.state = prior.state;
        restored.transitions.push(TransitionRecord {
            from_state: committed.state,
            to_state: prior.state,
            timestamp: now,
            reason: "rolled back: status registry unavailable".to_string(),
        });

        if let Err(e) = self.store.put(restored, Some(committed.state)) {
            tracing::error!(
                offer_id = %prior.id,
                error = %e,
                "rollback after registry failure lost its conditional write"
            );
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
