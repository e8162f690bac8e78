//! Zone-listing API client.
//!
//! Fetches the zones managed under the registrar account with a single
//! authenticated GET and decodes `{ "result": [ {id, name, status}, ... ] }`.

use crate::error::ExpiryError;
use crate::types::{Zone, ZoneListResponse};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Default zone-listing endpoint.
pub const DEFAULT_ZONES_URL: &str = "https://api.cloudflare.com/client/v4/zones?per_page=50";

/// Anything that can list the zones to export.
#[async_trait]
pub trait ZoneSource: Send + Sync {
    /// List all zones.
    ///
    /// # Errors
    ///
    /// Returns [`ExpiryError::ZoneFetchFailed`] when the API is unreachable,
    /// answers with a non-success status, or sends a malformed body.
    async fn list_zones(&self) -> Result<Vec<Zone>, ExpiryError>;
}

/// HTTP client for the zone-listing API.
#[derive(Clone)]
pub struct ZoneClient {
    /// HTTP client for making API requests
    http_client: reqwest::Client,
    /// Full URL of the listing endpoint
    url: String,
    /// Bearer token
    token: String,
}

impl ZoneClient {
    /// Create a client for `url` authenticated with `token`.
    pub fn new<U: Into<String>, T: Into<String>>(
        url: U,
        token: T,
        timeout: Duration,
    ) -> Result<Self, ExpiryError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("domain-expiry-exporter/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ExpiryError::internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            url: url.into(),
            token: token.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl std::fmt::Debug for ZoneClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZoneClient")
            .field("url", &self.url)
            .field("token", &"<redacted>")
            .finish()
    }
}

#[async_trait]
impl ZoneSource for ZoneClient {
    async fn list_zones(&self) -> Result<Vec<Zone>, ExpiryError> {
        debug!(url = %self.url, "fetching zone list");

        let response = self
            .http_client
            .get(&self.url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .bearer_auth(&self.token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExpiryError::zone_fetch_with_status(
                format!("Zone API answered {}", status),
                status.as_u16(),
            ));
        }

        let body = response.bytes().await?;
        let parsed: ZoneListResponse = serde_json::from_slice(&body)?;

        debug!(count = parsed.result.len(), "zone list fetched");
        Ok(parsed.result)
    }
}
