//! # Status Registry Trait and Wire Types
//!
//! Defines the published status values, the `(list, index)` reference that
//! ties an offer to its slot in a status list, the registry error taxonomy,
//! and the object-safe [`StatusRegistry`] trait the lifecycle engine
//! consumes.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use vci_core::OfferId;

/// The verifier-facing status value published for an issued credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusValue {
    /// Credential is valid.
    Valid,
    /// Credential is temporarily suspended.
    Suspended,
    /// Credential is permanently revoked.
    Revoked,
}

impl fmt::Display for StatusValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Valid => "valid",
            Self::Suspended => "suspended",
            Self::Revoked => "revoked",
        };
        f.write_str(s)
    }
}

/// An offer's slot in a published status list.
///
/// Assigned once, when the offer is first projected into the registry at
/// issuance. The list identifier never changes afterwards; the value at the
/// index changes only through explicit [`StatusRegistry::set_status`] calls.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatusListReference {
    /// Identifier (typically a URI) of the status list holding the slot.
    pub list_id: String,
    /// Zero-based slot index within the list.
    pub index: u64,
}

impl fmt::Display for StatusListReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.list_id, self.index)
    }
}

/// Errors from status registry backends.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// The registry backend is unreachable, timed out, or failed.
    ///
    /// Deliberately non-retryable inline: the engine rolls back any local
    /// write guarded by the failed call and surfaces this error; the caller
    /// owns retry policy.
    #[error("status registry unavailable: {reason}")]
    Unavailable {
        /// Human-readable reason, including the failed operation.
        reason: String,
    },

    /// The referenced status list slot does not exist at the backend.
    #[error("status list reference not found: {reference}")]
    ReferenceNotFound {
        /// The reference that could not be resolved.
        reference: String,
    },
}

/// Capability trait for the external status-list service.
///
/// Implementations must be `Send + Sync` so they can be shared behind an
/// `Arc` across concurrent engine callers. The trait is object-safe to keep
/// the engine decoupled from the deployed backend (in-memory, remote
/// service, file-backed).
pub trait StatusRegistry: Send + Sync {
    /// Allocate a status list slot for an offer and return its reference.
    ///
    /// Idempotent per offer: repeated calls for the same `offer_id` return
    /// the same reference, so a rolled-back issuance retried later reuses
    /// its original slot.
    fn allocate(&self, offer_id: OfferId) -> Result<StatusListReference, RegistryError>;

    /// Set the published status value at the given reference.
    fn set_status(
        &self,
        reference: &StatusListReference,
        value: StatusValue,
    ) -> Result<(), RegistryError>;

    /// Read the currently published value at the given reference.
    ///
    /// For reconciliation and tests only — not on the hot path of offer
    /// mutation.
    fn read_status(&self, reference: &StatusListReference) -> Result<StatusValue, RegistryError>;
}
