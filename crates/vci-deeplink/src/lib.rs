//! # vci-deeplink — Credential Offer Deep Link Codec
//!
//! Pure, stateless encode/decode between an OFFERED credential offer and
//! the `openid-credential-offer://` URI handed to the holder out-of-band
//! (typically as a QR code). No side effects, no I/O.
//!
//! ## Wire Shape
//!
//! The URI query carries a single `credential_offer` parameter holding
//! compact JSON, percent-encoded:
//!
//! ```text
//! openid-credential-offer://?credential_offer=%7B%22grants%22%3A%7B...%7D%2C
//!     %22credential_issuer%22%3A...%2C%22credential_configuration_ids%22%3A%5B...%5D%7D
//! ```
//!
//! The JSON object contains a `grants` map keyed by the fixed
//! pre-authorized-code grant-type URN, the issuer identifier, and the
//! ordered `credential_configuration_ids`. Field order and compact
//! serialization are part of the holder-facing contract and are reproduced
//! exactly.

pub mod codec;

pub use codec::{
    decode_offer, encode_offer, CredentialOfferParameters, DeeplinkConfig, DeeplinkError,
    OfferGrants, PreAuthorizedCodeGrant, CREDENTIAL_OFFER_SCHEME, PRE_AUTHORIZED_GRANT_TYPE,
};
