//! # Credential Offer Entity and State Machine
//!
//! Defines [`OfferState`] with its transition table, the
//! [`CredentialOffer`] record, and the transition audit trail. The entity is
//! pure data plus transition predicates — all orchestration (conditional
//! writes, registry publication) lives in [`crate::engine`].

use serde::{Deserialize, Serialize};

use vci_core::{OfferId, PreAuthorizedCode, Timestamp};
use vci_status::StatusListReference;

// ─── Offer State ─────────────────────────────────────────────────────

/// The lifecycle state of a credential offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OfferState {
    /// Offer created; deep link retrievable by the holder.
    Offered,
    /// Holder has begun retrieval; the pre-authorized code is consumed.
    InProgress,
    /// Credential produced and published as valid in the status registry.
    Issued,
    /// Issued credential temporarily suspended by administrative action.
    Suspended,
    /// Issued credential permanently revoked (terminal).
    Revoked,
    /// Offer expired before issuance (terminal, reached by time).
    Expired,
    /// Offer cancelled before issuance (terminal, administrative action).
    Cancelled,
}

impl OfferState {
    /// Whether this state has no outgoing transitions.
    ///
    /// ISSUED is the success state but is not terminal in this sense: it
    /// can still move to SUSPENDED or REVOKED.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Revoked | Self::Expired | Self::Cancelled)
    }

    /// Whether an offer in this state is subject to retrieval expiry.
    ///
    /// Only pre-issuance states expire: `expires_at` bounds the holder's
    /// retrieval window, not the issued credential's validity.
    pub fn is_expirable(&self) -> bool {
        matches!(self, Self::Offered | Self::InProgress)
    }

    /// Whether the transition `self -> to` is an edge of the lifecycle graph.
    ///
    /// This is the complete transition table; the engine rejects every
    /// request that is not an edge here with `InvalidTransition`.
    pub fn can_transition(&self, to: OfferState) -> bool {
        use OfferState::*;
        matches!(
            (self, to),
            (Offered, InProgress)
                | (Offered, Cancelled)
                | (Offered, Expired)
                | (InProgress, Issued)
                | (InProgress, Cancelled)
                | (InProgress, Expired)
                | (Issued, Suspended)
                | (Issued, Revoked)
                | (Suspended, Issued)
                | (Suspended, Revoked)
        )
    }
}

impl std::fmt::Display for OfferState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Offered => "OFFERED",
            Self::InProgress => "IN_PROGRESS",
            Self::Issued => "ISSUED",
            Self::Suspended => "SUSPENDED",
            Self::Revoked => "REVOKED",
            Self::Expired => "EXPIRED",
            Self::Cancelled => "CANCELLED",
        };
        f.write_str(s)
    }
}

// ─── Transition Audit Trail ──────────────────────────────────────────

/// Record of a single offer state transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRecord {
    /// State before the transition.
    pub from_state: OfferState,
    /// State after the transition.
    pub to_state: OfferState,
    /// When the transition was committed.
    pub timestamp: Timestamp,
    /// Reason for the transition.
    pub reason: String,
}

// ─── Credential Offer ────────────────────────────────────────────────

/// A credential offer: a not-yet-collected issuance request visible to a
/// holder via a deep link, tracked through issuance and revocation.
///
/// Offers are never physically deleted — expiry and the terminal states are
/// logical, so a verifier can still resolve "revoked" long after the offer
/// itself stopped being retrievable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredentialOffer {
    /// Globally unique identifier, assigned at creation.
    pub id: OfferId,
    /// Current lifecycle state. Mutated only by the lifecycle engine.
    pub state: OfferState,
    /// Single-use retrieval token embedded in the deep link. Immutable;
    /// consumed when the holder begins retrieval (state leaves OFFERED).
    pub pre_authorized_code: PreAuthorizedCode,
    /// Ordered configuration identifiers describing what is offered.
    /// Set at creation, immutable thereafter.
    pub credential_configuration_ids: Vec<String>,
    /// Opaque payload supplied by the caller at creation: structured claims
    /// or a pre-signed assertion. Never re-validated here beyond presence.
    pub subject_data: serde_json::Value,
    /// Slot in the published status registry, assigned at issuance.
    /// The list identifier never changes once assigned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_list_reference: Option<StatusListReference>,
    /// When the offer was created.
    pub created_at: Timestamp,
    /// End of the holder's retrieval window, computed from the TTL at
    /// creation. Immutable.
    pub expires_at: Timestamp,
    /// Ordered log of all committed state transitions.
    pub transitions: Vec<TransitionRecord>,
}

impl CredentialOffer {
    /// Whether the retrieval window has elapsed for a still-expirable offer.
    ///
    /// Issued, suspended, revoked, and cancelled offers never report
    /// expired — `expires_at` bounds retrieval only.
    pub fn is_retrieval_expired(&self, now: Timestamp) -> bool {
        self.state.is_expirable() && now > self.expires_at
    }

    /// Return a copy of this offer moved to `to`, with the transition
    /// appended to the audit trail.
    ///
    /// Does not validate the edge — callers in the engine validate against
    /// [`OfferState::can_transition`] first, and the store's conditional
    /// write enforces that the source state still holds at commit time.
    pub fn transitioned(&self, to: OfferState, at: Timestamp, reason: &str) -> CredentialOffer {
        let mut next = self.clone();
        next.transitions.push(TransitionRecord {
            from_state: self.state,
            to_state: to,
            timestamp: at,
            reason: reason.to_string(),
        });
        next.state = to;
        next
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
