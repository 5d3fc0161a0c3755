//! # Deep Link Encode/Decode
//!
//! The encoder is only valid while an offer is OFFERED — once the holder
//! begins retrieval the pre-authorized code is consumed and the offer has
//! no encodable deep link. The decoder is the exact inverse and exists for
//! verification and tests: `decode_offer(encode_offer(o))` reproduces the
//! grant code and the configuration-id sequence in order.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use vci_offer::{CredentialOffer, OfferState};

/// URI scheme of the holder-facing deep link.
pub const CREDENTIAL_OFFER_SCHEME: &str = "openid-credential-offer";

/// Grant-type identifier keying the pre-authorized-code grant.
pub const PRE_AUTHORIZED_GRANT_TYPE: &str =
    "urn:ietf:params:oauth:grant-type:pre-authorized_code";

/// Name of the query parameter carrying the offer object.
const CREDENTIAL_OFFER_PARAM: &str = "credential_offer";

/// Codec errors.
#[derive(Error, Debug)]
pub enum DeeplinkError {
    /// The offer has no usable pre-authorized code — encoding is only
    /// valid while the offer is OFFERED.
    #[error("offer not encodable: {reason}")]
    NotEncodable {
        /// Why the offer cannot be encoded.
        reason: String,
    },

    /// The URI violated the deep-link structure.
    #[error("malformed deeplink: {reason}")]
    MalformedDeeplink {
        /// The structural violation.
        reason: String,
    },
}

/// Issuer-side codec configuration.
///
/// The issuer identifier is deployment configuration, not per-offer data —
/// it names the credential issuer endpoint the wallet will contact.
#[derive(Debug, Clone)]
pub struct DeeplinkConfig {
    /// Issuer base identifier placed in the `credential_issuer` field
    /// (e.g., `https://issuer.example.com`).
    pub credential_issuer: String,
}

/// The pre-authorized-code grant object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreAuthorizedCodeGrant {
    /// The single-use retrieval code.
    #[serde(rename = "pre-authorized_code")]
    pub pre_authorized_code: String,
}

/// The `grants` map of the offer object.
///
/// Only the pre-authorized-code grant type is issued; the fixed URN key is
/// part of the wire contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferGrants {
    /// The pre-authorized-code grant, keyed by its grant-type URN.
    #[serde(rename = "urn:ietf:params:oauth:grant-type:pre-authorized_code")]
    pub pre_authorized_code: PreAuthorizedCodeGrant,
}

/// The structured object carried in the `credential_offer` query parameter.
///
/// Field declaration order matters: it fixes the serialized byte order of
/// the holder-facing deep link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialOfferParameters {
    /// Grant map keyed by grant-type identifier.
    pub grants: OfferGrants,
    /// Issuer base identifier.
    pub credential_issuer: String,
    /// Ordered configuration identifiers of the offered credential(s).
    pub credential_configuration_ids: Vec<String>,
}

/// Encode an OFFERED offer into its holder-facing deep link URI.
///
/// # Errors
///
/// Returns [`DeeplinkError::NotEncodable`] if the offer is not in state
/// OFFERED — the pre-authorized code is consumed by retrieval and terminal
/// offers have no retrievable link.
pub fn encode_offer(
    offer: &CredentialOffer,
    config: &DeeplinkConfig,
) -> Result<String, DeeplinkError> {
    if offer.state != OfferState::Offered {
        return Err(DeeplinkError::NotEncodable {
            reason: format!(
                "pre-authorized code unusable in state {}; deep links exist only while OFFERED",
                offer.state
            ),
        });
    }

    let parameters = CredentialOfferParameters {
        grants: OfferGrants {
            pre_authorized_code: PreAuthorizedCodeGrant {
                pre_authorized_code: offer.pre_authorized_code.to_string(),
            },
        },
        credential_issuer: config.credential_issuer.clone(),
        credential_configuration_ids: offer.credential_configuration_ids.clone(),
    };

    // Compact JSON, then percent-encoded into the query component.
    let json = serde_json::to_string(&parameters).map_err(|e| DeeplinkError::NotEncodable {
        reason: format!("offer serialization failed: {e}"),
    })?;
    let encoded: String = url::form_urlencoded::byte_serialize(json.as_bytes()).collect();

    Ok(format!(
        "{CREDENTIAL_OFFER_SCHEME}://?{CREDENTIAL_OFFER_PARAM}={encoded}"
    ))
}

/// Decode a deep link URI back into its offer parameters.
///
/// # Errors
///
/// Returns [`DeeplinkError::MalformedDeeplink`] on any structural
/// violation: unparseable URI, wrong scheme, missing `credential_offer`
/// parameter, invalid JSON, or an empty grant code or configuration list.
pub fn decode_offer(uri: &str) -> Result<CredentialOfferParameters, DeeplinkError> {
    let url = Url::parse(uri).map_err(|e| DeeplinkError::MalformedDeeplink {
        reason: format!("URI parse failed: {e}"),
    })?;

    if url.scheme() != CREDENTIAL_OFFER_SCHEME {
        return Err(DeeplinkError::MalformedDeeplink {
            reason: format!(
                "unexpected scheme {:?}, expected {CREDENTIAL_OFFER_SCHEME:?}",
                url.scheme()
            ),
        });
    }

    let payload = url
        .query_pairs()
        .find(|(key, _)| key == CREDENTIAL_OFFER_PARAM)
        .map(|(_, value)| value.into_owned())
        .ok_or_else(|| DeeplinkError::MalformedDeeplink {
            reason: format!("missing {CREDENTIAL_OFFER_PARAM:?} query parameter"),
        })?;

    let parameters: CredentialOfferParameters =
        serde_json::from_str(&payload).map_err(|e| DeeplinkError::MalformedDeeplink {
            reason: format!("offer object parse failed: {e}"),
        })?;

    if parameters
        .grants
        .pre_authorized_code
        .pre_authorized_code
        .is_empty()
    {
        return Err(DeeplinkError::MalformedDeeplink {
            reason: "empty pre-authorized code".to_string(),
        });
    }
    if parameters.credential_configuration_ids.is_empty() {
        return Err(DeeplinkError::MalformedDeeplink {
            reason: "empty credential_configuration_ids".to_string(),
        });
    }

    Ok(parameters)
}

// ─── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use vci_core::{OfferId, PreAuthorizedCode, Timestamp};

    fn config() -> DeeplinkConfig {
        DeeplinkConfig {
            credential_issuer: "https://issuer.example.com".to_string(),
        }
    }

    fn offered(configuration_ids: &[&str]) -> CredentialOffer {
        let created = Timestamp::parse("2026-01-15T12:00:00Z").unwrap();
        CredentialOffer {
            id: OfferId::new(),
            state: OfferState::Offered,
            pre_authorized_code: PreAuthorizedCode::new(),
            credential_configuration_ids: configuration_ids
                .iter()
                .map(|s| s.to_string())
                .collect(),
            subject_data: serde_json::json!({"firstName": "Edward"}),
            status_list_reference: None,
            created_at: created,
            expires_at: created.plus_secs(3600).unwrap(),
            transitions: Vec::new(),
        }
    }

    #[test]
    fn encode_produces_scheme_and_parameter() {
        let uri = encode_offer(&offered(&["pid-sd-jwt"]), &config()).unwrap();
        assert!(uri.starts_with("openid-credential-offer://?credential_offer="));
    }

    #[test]
    fn roundtrip_preserves_code_and_configuration_order() {
        let offer = offered(&["pid-sd-jwt", "diploma-sd-jwt", "residence-mdoc"]);
        let uri = encode_offer(&offer, &config()).unwrap();
        let decoded = decode_offer(&uri).unwrap();

        assert_eq!(
            decoded.grants.pre_authorized_code.pre_authorized_code,
            offer.pre_authorized_code.to_string()
        );
        assert_eq!(
            decoded.credential_configuration_ids,
            vec!["pid-sd-jwt", "diploma-sd-jwt", "residence-mdoc"]
        );
        assert_eq!(decoded.credential_issuer, "https://issuer.example.com");
    }

    #[test]
    fn encoded_json_field_order_is_fixed() {
        let uri = encode_offer(&offered(&["pid-sd-jwt"]), &config()).unwrap();
        // grants before credential_issuer before credential_configuration_ids.
        let grants_at = uri.find("%22grants%22").unwrap();
        let issuer_at = uri.find("%22credential_issuer%22").unwrap();
        let ids_at = uri.find("%22credential_configuration_ids%22").unwrap();
        assert!(grants_at < issuer_at && issuer_at < ids_at);
    }

    #[test]
    fn decode_reference_deeplink_from_api_documentation() {
        // Published example from the issuer management API docs.
        let uri = "openid-credential-offer://?credential_offer=%7B%22grants%22%3A%7B%22urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Apre-authorized_code%22%3A%7B%22pre-authorized_code%22%3A%22b614c966-0c1d-4636-9aec-e2496d242d25%22%7D%7D%2C%22credential_issuer%22%3A%22https%3A%2F%2Fissuer-agent-oid4vci-d.bit.admin.ch%22%2C%22credential_configuration_ids%22%3A%5B%22myIssuerMetadataCredentialSupportedId%22%5D%7D";
        let decoded = decode_offer(uri).unwrap();

        assert_eq!(
            decoded.grants.pre_authorized_code.pre_authorized_code,
            "b614c966-0c1d-4636-9aec-e2496d242d25"
        );
        assert_eq!(
            decoded.credential_issuer,
            "https://issuer-agent-oid4vci-d.bit.admin.ch"
        );
        assert_eq!(
            decoded.credential_configuration_ids,
            vec!["myIssuerMetadataCredentialSupportedId"]
        );
    }

    #[test]
    fn encode_reproduces_reference_deeplink_bytes() {
        // Re-encoding the documented example must reproduce it exactly.
        let reference = "openid-credential-offer://?credential_offer=%7B%22grants%22%3A%7B%22urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Apre-authorized_code%22%3A%7B%22pre-authorized_code%22%3A%22b614c966-0c1d-4636-9aec-e2496d242d25%22%7D%7D%2C%22credential_issuer%22%3A%22https%3A%2F%2Fissuer-agent-oid4vci-d.bit.admin.ch%22%2C%22credential_configuration_ids%22%3A%5B%22myIssuerMetadataCredentialSupportedId%22%5D%7D";

        let mut offer = offered(&["myIssuerMetadataCredentialSupportedId"]);
        offer.pre_authorized_code = PreAuthorizedCode(
            "b614c966-0c1d-4636-9aec-e2496d242d25".parse().unwrap(),
        );
        let config = DeeplinkConfig {
            credential_issuer: "https://issuer-agent-oid4vci-d.bit.admin.ch".to_string(),
        };

        assert_eq!(encode_offer(&offer, &config).unwrap(), reference);
    }

    #[test]
    fn encode_consumed_offer_is_not_encodable() {
        let at = Timestamp::parse("2026-01-15T12:05:00Z").unwrap();
        for state in [
            OfferState::InProgress,
            OfferState::Issued,
            OfferState::Expired,
            OfferState::Cancelled,
            OfferState::Revoked,
        ] {
            let offer = offered(&["pid-sd-jwt"]).transitioned(state, at, "test");
            assert!(
                matches!(
                    encode_offer(&offer, &config()),
                    Err(DeeplinkError::NotEncodable { .. })
                ),
                "state {state} must not be encodable"
            );
        }
    }

    #[test]
    fn decode_rejects_wrong_scheme() {
        let uri = encode_offer(&offered(&["pid-sd-jwt"]), &config()).unwrap();
        let wrong = uri.replacen("openid-credential-offer", "https", 1);
        assert!(matches!(
            decode_offer(&wrong),
            Err(DeeplinkError::MalformedDeeplink { .. })
        ));
    }

    #[test]
    fn decode_rejects_missing_parameter() {
        assert!(matches!(
            decode_offer("openid-credential-offer://?other=1"),
            Err(DeeplinkError::MalformedDeeplink { .. })
        ));
    }

    #[test]
    fn decode_rejects_invalid_json_payload() {
        assert!(matches!(
            decode_offer("openid-credential-offer://?credential_offer=%7Bnot-json"),
            Err(DeeplinkError::MalformedDeeplink { .. })
        ));
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(decode_offer("").is_err());
        assert!(decode_offer("not a uri at all").is_err());
    }

    #[test]
    fn decode_rejects_empty_configuration_ids() {
        let payload = serde_json::json!({
            "grants": {
                "urn:ietf:params:oauth:grant-type:pre-authorized_code": {
                    "pre-authorized_code": "b614c966-0c1d-4636-9aec-e2496d242d25"
                }
            },
            "credential_issuer": "https://issuer.example.com",
            "credential_configuration_ids": []
        })
        .to_string();
        let encoded: String = url::form_urlencoded::byte_serialize(payload.as_bytes()).collect();
        let uri = format!("openid-credential-offer://?credential_offer={encoded}");
        assert!(matches!(
            decode_offer(&uri),
            Err(DeeplinkError::MalformedDeeplink { .. })
        ));
    }
}
