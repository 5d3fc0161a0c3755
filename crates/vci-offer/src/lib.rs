//! # vci-offer — Credential Offer Lifecycle Core
//!
//! Owns the credential offer state machine and the engine that keeps three
//! independently-observable views of an offer consistent: the internal offer
//! record, the holder-facing deep link (encodable only while the offer is
//! OFFERED), and the verifier-facing published status.
//!
//! ## States
//!
//! ```text
//! OFFERED ──▶ IN_PROGRESS ──▶ ISSUED ◀──▶ SUSPENDED
//!    │             │             │             │
//!    │             │             └──▶ REVOKED ◀┘  (terminal)
//!    │             │
//!    ├──▶ CANCELLED ◀┘  (terminal, admin action)
//!    └──▶ EXPIRED   ◀┘  (terminal, TTL elapsed)
//! ```
//!
//! ## Consistency Model
//!
//! Every state-changing operation is read → validate → conditional write,
//! where the write is guarded by the state observed at read time. The
//! [`store::OfferStore`] conditional write is the single atomicity primitive;
//! a losing writer observes `ConcurrentModification` and must re-read before
//! retrying. Registry-backed transitions (ISSUED, SUSPENDED, reinstate,
//! REVOKED) commit locally first, then publish; a failed publish rolls the
//! local write back so stored state and published status never diverge.

pub mod engine;
pub mod offer;
pub mod store;

pub use engine::{CreateOffer, OfferEngine, OfferError};
pub use offer::{CredentialOffer, OfferState, TransitionRecord};
pub use store::{InMemoryOfferStore, OfferStore, StoreError};
