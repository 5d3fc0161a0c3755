//! # Domain Identity Newtypes
//!
//! Newtype wrappers for the identifiers of the issuance stack. These prevent
//! accidental identifier confusion — you cannot pass a `PreAuthorizedCode`
//! where an `OfferId` is expected, even though both are UUIDs underneath.
//!
//! ## Security Invariant
//!
//! The pre-authorized code is a bearer secret: whoever presents it may
//! collect the offered credential. It is generated from a v4 UUID (122 bits
//! of randomness) and is single-use — the lifecycle engine consumes it when
//! the holder begins retrieval.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

/// Unique identifier for a credential offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OfferId(pub Uuid);

/// Single-use bearer token embedded in the offer deep link.
///
/// Grants retrieval rights without prior holder authentication, so it must
/// be unguessable. Unique across all retained offers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PreAuthorizedCode(pub Uuid);

impl OfferId {
    /// Generate a new random offer identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for OfferId {
    fn default() -> Self {
        Self::new()
    }
}

impl PreAuthorizedCode {
    /// Generate a new random pre-authorized code.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for PreAuthorizedCode {
    fn default() -> Self {
        Self::new()
    }
}

impl std::str::FromStr for OfferId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| ValidationError::InvalidIdentifier(format!("offer id {s:?}: {e}")))
    }
}

impl std::str::FromStr for PreAuthorizedCode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| ValidationError::InvalidIdentifier(format!("pre-authorized code: {e}")))
    }
}

impl std::fmt::Display for OfferId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for PreAuthorizedCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
