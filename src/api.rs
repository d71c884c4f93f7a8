//! HTTP client for the country IP list provider.
//!
//! Every call answers a JSON envelope `{"success": bool, "data": ...}`.
//! Three modes exist: `countries` (code to name map), `country` (one
//! country's address array) and `all` (per-country entries for one IP
//! version). A transport failure, a non-2xx status, unparseable JSON or
//! `success=false` all surface as [`Error::Fetch`]; cache builds degrade
//! a failed version to an empty list instead of aborting.

use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::cache::RawCountry;
use crate::error::Error;

/// Provider endpoint queried when `--api-url` is not given.
pub const DEFAULT_API_URL: &str = "https://cable.ayra.ch/ip/api.php";

const TIMEOUT_SECS: u64 = 30;
const MAX_RETRIES: u32 = 3;
const RETRY_DELAY_MS: u64 = 500;

/// Address list versions served by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpVersion {
    V4,
    V6,
}

impl IpVersion {
    fn query(self) -> &'static str {
        match self {
            IpVersion::V4 => "4",
            IpVersion::V6 => "6",
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    success: bool,
    #[serde(default)]
    data: serde_json::Value,
}

/// HTTP client bound to one provider base URL.
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(TIMEOUT_SECS))
            .user_agent(format!("countryblock/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }

    /// Raw per-country entries for one IP version (`mode=all`).
    pub async fn raw_entries(&self, version: IpVersion) -> Result<Vec<RawCountry>, Error> {
        let data = self.fetch("all", &[("v", version.query())]).await?;
        serde_json::from_value(data)
            .map_err(|e| Error::Fetch(format!("Malformed mode=all payload: {}", e)))
    }

    /// One country's address list, straight from the provider
    /// (`mode=country`).
    pub async fn country_addresses(&self, code: &str) -> Result<Vec<String>, Error> {
        let code = code.to_uppercase();
        let data = self.fetch("country", &[("c", code.as_str())]).await?;
        serde_json::from_value(data)
            .map_err(|e| Error::Fetch(format!("Malformed mode=country payload: {}", e)))
    }

    /// One provider query with retry, unwrapping the response envelope.
    async fn fetch(
        &self,
        mode: &str,
        params: &[(&str, &str)],
    ) -> Result<serde_json::Value, Error> {
        let mut last_error = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                let delay = RETRY_DELAY_MS * (1 << (attempt - 1));
                debug!("Retry {} after {}ms for mode={}", attempt, delay, mode);
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }

            match self.fetch_once(mode, params).await {
                Ok(value) => return Ok(value),
                Err(e) => last_error = Some(e),
            }
        }

        Err(last_error.unwrap_or_else(|| Error::Fetch("Unknown error".to_string())))
    }

    async fn fetch_once(
        &self,
        mode: &str,
        params: &[(&str, &str)],
    ) -> Result<serde_json::Value, Error> {
        let mut query: Vec<(&str, &str)> = vec![("mode", mode)];
        query.extend_from_slice(params);

        let response = self
            .client
            .get(&self.base_url)
            .query(&query)
            .send()
            .await
            .map_err(|e| Error::Fetch(format!("mode={}: {}", mode, e)))?;

        if !response.status().is_success() {
            return Err(Error::Fetch(format!(
                "mode={}: HTTP {}",
                mode,
                response.status()
            )));
        }

        let envelope: ApiResponse = response
            .json()
            .await
            .map_err(|e| Error::Fetch(format!("mode={}: invalid JSON: {}", mode, e)))?;

        if !envelope.success {
            return Err(Error::Fetch(format!(
                "mode={}: provider reported failure",
                mode
            )));
        }

        Ok(envelope.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ip_version_query_values() {
        assert_eq!(IpVersion::V4.query(), "4");
        assert_eq!(IpVersion::V6.query(), "6");
    }

    #[test]
    fn test_envelope_success_with_entries() {
        let body = r#"{
            "success": true,
            "data": [
                {"code": "CH", "name": "Switzerland", "addr": ["1.2.3.0/24"]},
                {"code": "DE", "name": "Germany", "addr": []}
            ]
        }"#;
        let envelope: ApiResponse = serde_json::from_str(body).unwrap();
        assert!(envelope.success);

        let entries: Vec<RawCountry> = serde_json::from_value(envelope.data).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].code, "CH");
        assert_eq!(entries[0].addresses, vec!["1.2.3.0/24"]);
        assert!(entries[1].addresses.is_empty());
    }

    #[test]
    fn test_envelope_failure_has_no_usable_data() {
        let body = r#"{"success": false, "data": "no such country"}"#;
        let envelope: ApiResponse = serde_json::from_str(body).unwrap();
        assert!(!envelope.success);
    }

    #[test]
    fn test_envelope_missing_data_defaults_to_null() {
        let body = r#"{"success": true}"#;
        let envelope: ApiResponse = serde_json::from_str(body).unwrap();
        assert!(envelope.data.is_null());
        // Null data is a malformed payload for mode=all
        assert!(serde_json::from_value::<Vec<RawCountry>>(envelope.data).is_err());
    }

    #[test]
    fn test_country_address_payload_shape() {
        let data = serde_json::json!(["1.2.3.0/24", "2001:db8::/32"]);
        let addresses: Vec<String> = serde_json::from_value(data).unwrap();
        assert_eq!(addresses.len(), 2);
    }

    #[tokio::test]
    async fn test_unreachable_provider_is_fetch_error() {
        // Connection refused locally; exercises the retry loop end.
        let client = ApiClient::new("http://127.0.0.1:1/api.php").unwrap();
        let result = client.raw_entries(IpVersion::V4).await;
        assert!(matches!(result, Err(Error::Fetch(_))));
    }
}
