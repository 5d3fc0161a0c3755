//! # Offer Facade
//!
//! Typed request/response surface over the lifecycle engine and the deep
//! link codec. Each operation delegates to the engine at the current wall
//! clock, renders the result into response data, and maps failures through
//! [`crate::error::ApiError`].

use serde::{Deserialize, Serialize};

use vci_core::{OfferId, Timestamp};
use vci_deeplink::{encode_offer, DeeplinkConfig};
use vci_offer::{CreateOffer, OfferEngine, OfferState};
use vci_status::StatusValue;

use crate::error::ApiError;

/// Request body for creating a credential offer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOfferRequest {
    /// Ordered configuration identifiers describing the offered credential(s).
    pub credential_configuration_ids: Vec<String>,
    /// Opaque subject payload: structured claims or a pre-signed assertion.
    pub subject_data: serde_json::Value,
    /// Holder retrieval window in seconds.
    pub ttl_secs: i64,
}

/// Response for a created offer: the id used for all later interaction and
/// the deep link to hand to the holder out-of-band (e.g., as a QR code).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOfferResponse {
    /// The new offer's identifier.
    pub id: OfferId,
    /// The holder-facing deep link.
    pub offer_deeplink: String,
}

/// Read view of an offer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfferView {
    /// The offer identifier.
    pub id: OfferId,
    /// Current lifecycle state (after lazy expiry settlement).
    pub state: OfferState,
    /// The caller-supplied subject payload.
    pub subject_data: serde_json::Value,
}

/// Status summary of an offer and, once issued, its published value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusView {
    /// The offer identifier.
    pub id: OfferId,
    /// Current lifecycle state.
    pub state: OfferState,
    /// The verifier-facing published value; absent before the offer is
    /// projected into the status registry at issuance.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_value: Option<StatusValue>,
}

/// Response for a status update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusResponse {
    /// The offer identifier.
    pub id: OfferId,
    /// The committed lifecycle state.
    pub state: OfferState,
}

/// The externally settable status values.
///
/// Internal states (OFFERED, IN_PROGRESS, EXPIRED) are unreachable by
/// construction — callers cannot even request them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TargetStatus {
    /// Temporarily suspend an issued credential.
    Suspended,
    /// Reinstate a suspended credential.
    Issued,
    /// Permanently revoke an issued or suspended credential.
    Revoked,
    /// Cancel an offer before issuance.
    Cancelled,
}

impl From<TargetStatus> for OfferState {
    fn from(target: TargetStatus) -> Self {
        match target {
            TargetStatus::Suspended => OfferState::Suspended,
            TargetStatus::Issued => OfferState::Issued,
            TargetStatus::Revoked => OfferState::Revoked,
            TargetStatus::Cancelled => OfferState::Cancelled,
        }
    }
}

/// The caller-facing facade over the offer lifecycle.
pub struct OfferFacade {
    engine: OfferEngine,
    deeplink: DeeplinkConfig,
}

impl OfferFacade {
    /// Create a facade over the given engine and deep link configuration.
    pub fn new(engine: OfferEngine, deeplink: DeeplinkConfig) -> Self {
        Self { engine, deeplink }
    }

    /// Create a new credential offer and render its deep link.
    pub fn create_offer(
        &self,
        request: CreateOfferRequest,
    ) -> Result<CreateOfferResponse, ApiError> {
        let offer = self.engine.create_offer(
            CreateOffer {
                credential_configuration_ids: request.credential_configuration_ids,
                subject_data: request.subject_data,
                ttl_secs: request.ttl_secs,
            },
            Timestamp::now(),
        )?;

        let offer_deeplink = encode_offer(&offer, &self.deeplink)?;
        Ok(CreateOfferResponse {
            id: offer.id,
            offer_deeplink,
        })
    }

    /// Fetch the offer data, if any is still retained.
    pub fn get_offer(&self, id: OfferId) -> Result<OfferView, ApiError> {
        let offer = self.engine.get_offer(id, Timestamp::now())?;
        Ok(OfferView {
            id: offer.id,
            state: offer.state,
            subject_data: offer.subject_data,
        })
    }

    /// Render the offer's deep link.
    ///
    /// Fails with `GONE` once the offer has left OFFERED — the
    /// pre-authorized code is consumed by retrieval, and lazily-observed
    /// expiry is persisted before this answer is produced.
    pub fn get_deeplink(&self, id: OfferId) -> Result<String, ApiError> {
        let offer = self.engine.get_offer(id, Timestamp::now())?;
        if offer.state != OfferState::Offered {
            return Err(ApiError::Gone(format!(
                "offer {id} is no longer retrievable (state {})",
                offer.state
            )));
        }
        Ok(encode_offer(&offer, &self.deeplink)?)
    }

    /// Current status of the offer or, once issued, the credential.
    ///
    /// The published value is derived from the committed lifecycle state:
    /// the engine rolls back any transition the registry did not accept,
    /// so local state is authoritative for what is published.
    pub fn get_status(&self, id: OfferId) -> Result<StatusView, ApiError> {
        let offer = self.engine.get_offer(id, Timestamp::now())?;
        let published_value = if offer.status_list_reference.is_some() {
            match offer.state {
                OfferState::Issued => Some(StatusValue::Valid),
                OfferState::Suspended => Some(StatusValue::Suspended),
                OfferState::Revoked => Some(StatusValue::Revoked),
                _ => None,
            }
        } else {
            None
        };
        Ok(StatusView {
            id: offer.id,
            state: offer.state,
            published_value,
        })
    }

    /// Set the status of the offer or the credential associated with it.
    pub fn set_status(
        &self,
        id: OfferId,
        target: TargetStatus,
    ) -> Result<UpdateStatusResponse, ApiError> {
        let offer = self
            .engine
            .update_status(id, target.into(), Timestamp::now())?;
        Ok(UpdateStatusResponse {
            id: offer.id,
            state: offer.state,
        })
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
