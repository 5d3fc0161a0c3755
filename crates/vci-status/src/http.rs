//! # HTTP Status Registry Adapter
//!
//! [`StatusRegistry`] implementation backed by a remote status-list service
//! over HTTP. Wraps a `reqwest::Client` with the service base URL, bearer
//! authentication, and a per-request timeout.
//!
//! ## Error Handling
//!
//! Transport failures, timeouts, and HTTP 5xx responses map to
//! [`RegistryError::Unavailable`]; HTTP 404 maps to
//! [`RegistryError::ReferenceNotFound`]. The adapter never retries — the
//! lifecycle engine rolls back its guarded write and the caller decides
//! whether to retry the whole operation.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use vci_core::OfferId;

use crate::registry::{RegistryError, StatusListReference, StatusRegistry, StatusValue};

/// Configuration for the HTTP status registry adapter.
#[derive(Debug, Clone)]
pub struct HttpStatusRegistryConfig {
    /// Base URL of the status-list service (e.g., `https://status.example.com/api/v1`).
    pub base_url: String,
    /// Bearer token for service authentication.
    pub api_key: String,
    /// Per-request deadline in seconds (default: 30). A request exceeding it
    /// surfaces as [`RegistryError::Unavailable`].
    pub timeout_secs: u64,
}

impl HttpStatusRegistryConfig {
    /// Create a new configuration with the default deadline.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            timeout_secs: 30,
        }
    }
}

/// HTTP client for a remote status-list service.
#[derive(Debug)]
pub struct HttpStatusRegistry {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Serialize)]
struct AllocateRequest {
    offer_id: OfferId,
}

#[derive(Deserialize)]
struct EntryResponse {
    list_id: String,
    index: u64,
    #[serde(default)]
    value: Option<StatusValue>,
}

#[derive(Serialize)]
struct SetStatusRequest<'a> {
    list_id: &'a str,
    index: u64,
    value: StatusValue,
}

impl HttpStatusRegistry {
    /// Create a new adapter from configuration.
    pub fn new(config: HttpStatusRegistryConfig) -> Result<Self, RegistryError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers({
                let mut headers = reqwest::header::HeaderMap::new();
                headers.insert(
                    reqwest::header::AUTHORIZATION,
                    reqwest::header::HeaderValue::from_str(&format!("Bearer {}", config.api_key))
                        .map_err(|_| RegistryError::Unavailable {
                            reason: "invalid API key characters".into(),
                        })?,
                );
                headers.insert(
                    reqwest::header::CONTENT_TYPE,
                    reqwest::header::HeaderValue::from_static("application/json"),
                );
                headers
            })
            .build()
            .map_err(|e| RegistryError::Unavailable {
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        let base_url = config.base_url.trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    /// Send a request and handle transport and 5xx errors consistently.
    async fn send_request(
        &self,
        request: reqwest::RequestBuilder,
        operation: &str,
    ) -> Result<reqwest::Response, RegistryError> {
        let resp = request.send().await.map_err(|e| {
            tracing::warn!(operation, error = %e, "status registry request failed");
            if e.is_timeout() {
                RegistryError::Unavailable {
                    reason: format!("{operation}: deadline exceeded"),
                }
            } else {
                RegistryError::Unavailable {
                    reason: format!("{operation}: {e}"),
                }
            }
        })?;

        if resp.status().is_server_error() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(operation, %status, "status registry returned server error");
            return Err(RegistryError::Unavailable {
                reason: format!("{operation}: HTTP {status}: {body}"),
            });
        }

        Ok(resp)
    }

    fn runtime_handle(operation: &str) -> Result<tokio::runtime::Handle, RegistryError> {
        tokio::runtime::Handle::try_current().map_err(|_| RegistryError::Unavailable {
            reason: format!("{operation}: no async runtime available for HTTP request"),
        })
    }

    fn entry_url(&self, reference: &StatusListReference) -> String {
        let encoded_list: String =
            url::form_urlencoded::byte_serialize(reference.list_id.as_bytes()).collect();
        format!(
            "{}/entries?list_id={}&index={}",
            self.base_url, encoded_list, reference.index
        )
    }
}

impl StatusRegistry for HttpStatusRegistry {
    fn allocate(&self, offer_id: OfferId) -> Result<StatusListReference, RegistryError> {
        let rt = Self::runtime_handle("allocate")?;

        let url = format!("{}/entries", self.base_url);
        let body = AllocateRequest { offer_id };

        rt.block_on(async {
            let resp = self
                .send_request(self.client.post(&url).json(&body), "allocate")
                .await?;

            if !resp.status().is_success() {
                return Err(RegistryError::Unavailable {
                    reason: format!("allocate: HTTP {}", resp.status()),
                });
            }

            let entry: EntryResponse =
                resp.json().await.map_err(|e| RegistryError::Unavailable {
                    reason: format!("allocate: response deserialization failed: {e}"),
                })?;

            Ok(StatusListReference {
                list_id: entry.list_id,
                index: entry.index,
            })
        })
    }

    fn set_status(
        &self,
        reference: &StatusListReference,
        value: StatusValue,
    ) -> Result<(), RegistryError> {
        let rt = Self::runtime_handle("set_status")?;

        let url = format!("{}/entries", self.base_url);
        let body = SetStatusRequest {
            list_id: &reference.list_id,
            index: reference.index,
            value,
        };

        rt.block_on(async {
            let resp = self
                .send_request(self.client.patch(&url).json(&body), "set_status")
                .await?;

            if resp.status() == reqwest::StatusCode::NOT_FOUND {
                return Err(RegistryError::ReferenceNotFound {
                    reference: reference.to_string(),
                });
            }
            if !resp.status().is_success() {
                return Err(RegistryError::Unavailable {
                    reason: format!("set_status: HTTP {}", resp.status()),
                });
            }

            Ok(())
        })
    }

    fn read_status(&self, reference: &StatusListReference) -> Result<StatusValue, RegistryError> {
        let rt = Self::runtime_handle("read_status")?;

        let url = self.entry_url(reference);

        rt.block_on(async {
            let resp = self
                .send_request(self.client.get(&url), "read_status")
                .await?;

            if resp.status() == reqwest::StatusCode::NOT_FOUND {
                return Err(RegistryError::ReferenceNotFound {
                    reference: reference.to_string(),
                });
            }
            if !resp.status().is_success() {
                return Err(RegistryError::Unavailable {
                    reason: format!("read_status: HTTP {}", resp.status()),
                });
            }

            let entry: EntryResponse =
                resp.json().await.map_err(|e| RegistryError::Unavailable {
                    reason: format!("read_status: response deserialization failed: {e}"),
                })?;

            entry.value.ok_or_else(|| RegistryError::Unavailable {
                reason: "read_status: response missing value".to_string(),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter(base_url: &str) -> HttpStatusRegistry {
        HttpStatusRegistry::new(HttpStatusRegistryConfig {
            base_url: base_url.to_string(),
            api_key: "test-key".to_string(),
            timeout_secs: 1,
        })
        .unwrap()
    }

    #[test]
    fn config_default_timeout_is_30s() {
        let config = HttpStatusRegistryConfig::new("https://status.example.com", "k");
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let reg = adapter("https://status.example.com/api/v1/");
        assert_eq!(reg.base_url, "https://status.example.com/api/v1");
    }

    #[test]
    fn entry_url_percent_encodes_list_id() {
        let reg = adapter("https://status.example.com/api/v1");
        let reference = StatusListReference {
            list_id: "https://status.example.com/lists/1".to_string(),
            index: 5,
        };
        let url = reg.entry_url(&reference);
        assert!(url.contains("list_id=https%3A%2F%2Fstatus.example.com%2Flists%2F1"));
        assert!(url.ends_with("&index=5"));
    }

    #[test]
    fn no_runtime_maps_to_unavailable() {
        // Outside a tokio runtime, calls must fail cleanly rather than panic.
        let reg = adapter("https://status.example.com/api/v1");
        let result = reg.allocate(OfferId::new());
        assert!(matches!(result, Err(RegistryError::Unavailable { .. })));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn connection_refused_maps_to_unavailable() {
        // Port 1 is guaranteed closed.
        let reg = adapter("http://127.0.0.1:1");
        let result = tokio::task::spawn_blocking(move || reg.allocate(OfferId::new()))
            .await
            .unwrap();
        assert!(matches!(result, Err(RegistryError::Unavailable { .. })));
    }
}
