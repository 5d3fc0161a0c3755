//! # External Error Mapping
//!
//! Maps internal failure kinds (engine, store, registry, codec) to the
//! external result codes callers see. The mapping never invents semantics:
//! every internal error surfaces under exactly one external code, and
//! server-side failures are logged at the boundary.

use thiserror::Error;

use vci_deeplink::DeeplinkError;
use vci_offer::OfferError;
use vci_status::RegistryError;

/// Caller-facing error with a stable machine-readable code.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Malformed input; never retried.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// No offer exists for the given id.
    #[error("not found: {0}")]
    NotFound(String),

    /// The offer exists but is no longer retrievable (state left OFFERED,
    /// including lazily-observed expiry).
    #[error("gone: {0}")]
    Gone(String),

    /// The requested status change is not an edge of the lifecycle graph.
    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    /// The operation lost a race with a concurrent writer; the caller may
    /// re-read and retry.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The status registry is unavailable; local and published state were
    /// left consistent. The caller decides retry and backoff.
    #[error("status registry unavailable: {0}")]
    RegistryUnavailable(String),

    /// Internal invariant violation. Details are logged, not exposed.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Stable machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "INVALID_REQUEST",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Gone(_) => "GONE",
            Self::InvalidTransition(_) => "INVALID_TRANSITION",
            Self::Conflict(_) => "CONFLICT",
            Self::RegistryUnavailable(_) => "REGISTRY_UNAVAILABLE",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<OfferError> for ApiError {
    fn from(err: OfferError) -> Self {
        match &err {
            OfferError::InvalidRequest(_) => Self::InvalidRequest(err.to_string()),
            OfferError::NotFound { .. } => Self::NotFound(err.to_string()),
            OfferError::InvalidTransition { .. } => Self::InvalidTransition(err.to_string()),
            OfferError::Expired { .. } => Self::Gone(err.to_string()),
            OfferError::ConcurrentModification { .. } => Self::Conflict(err.to_string()),
            OfferError::Registry(registry_err) => {
                tracing::warn!(error = %registry_err, "status registry failure surfaced to caller");
                match registry_err {
                    RegistryError::Unavailable { .. } | RegistryError::ReferenceNotFound { .. } => {
                        Self::RegistryUnavailable(err.to_string())
                    }
                }
            }
            OfferError::Internal(_) => {
                tracing::error!(error = %err, "internal lifecycle error");
                Self::Internal(err.to_string())
            }
        }
    }
}

impl From<DeeplinkError> for ApiError {
    fn from(err: DeeplinkError) -> Self {
        match &err {
            // The facade checks state before encoding, so an unencodable
            // offer reaching the codec is an invariant violation.
            DeeplinkError::NotEncodable { .. } => {
                tracing::error!(error = %err, "codec rejected an offer the facade deemed encodable");
                Self::Internal(err.to_string())
            }
            DeeplinkError::MalformedDeeplink { .. } => Self::InvalidRequest(err.to_string()),
        }
    }
}
