//! HTTP adapter for the remote licensing API.

use crate::wire::{self, EditBody};
use async_trait::async_trait;
use keydesk_core::dates;
use keydesk_core::{
    EditKeyRequest, Error, GenerateKeyRequest, KeyRecord, LicenseApi, Namespace, ResetReply,
    Result,
};
use serde_json::Value;
use std::fmt;
use tracing::{debug, error, info, warn};

/// Licensing API configuration.
#[derive(Clone)]
pub struct LicenseApiConfig {
    /// Shared secret sent as the `apiKey` parameter.
    pub api_key: String,
    /// API base URL.
    pub api_url: String,
    /// `service` parameter of the hardware id reset endpoint.
    pub hwid_service: String,
}

impl Default for LicenseApiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_url: "https://pandadevelopment.net/api".to_string(),
            hwid_service: "aroelhub".to_string(),
        }
    }
}

impl fmt::Debug for LicenseApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LicenseApiConfig")
            .field("api_key", &"***")
            .field("api_url", &self.api_url)
            .field("hwid_service", &self.hwid_service)
            .finish()
    }
}

/// reqwest-backed `LicenseApi`.
pub struct HttpLicenseApi {
    config: LicenseApiConfig,
    client: reqwest::Client,
}

// The API key travels in the query string, so reqwest errors must not
// carry the request URL into logs.
fn network(err: reqwest::Error) -> Error {
    Error::Network(err.without_url().to_string())
}

impl HttpLicenseApi {
    /// Create a new client.
    pub fn new(config: LicenseApiConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_url.trim_end_matches('/'), path)
    }

    async fn fetch(&self, namespace: Namespace, id: &str) -> Result<Option<KeyRecord>> {
        let (path, shapes) = match namespace {
            Namespace::Active => ("/key/fetch", wire::ACTIVE_KEY_SHAPES),
            Namespace::Generated => ("/generated-key/fetch", wire::GENERATED_KEY_SHAPES),
        };

        debug!(%namespace, id, "Fetching key");

        let response = self
            .client
            .get(self.url(path))
            .query(&[("apiKey", self.config.api_key.as_str()), ("fetch", id)])
            .send()
            .await
            .map_err(network)?;

        let status = response.status();
        let body = response.text().await.map_err(network)?;

        if !status.is_success() {
            debug!(%namespace, status = %status, body = %body, "Key fetch returned no key");
            return Ok(None);
        }

        if body.trim().is_empty() {
            debug!(%namespace, "Key fetch returned an empty body");
            return Ok(None);
        }

        let Ok(value) = serde_json::from_str::<Value>(&body) else {
            debug!(%namespace, body = %body, "Key fetch returned malformed JSON");
            return Ok(None);
        };

        let record = wire::extract_key(&value, shapes);
        if record.is_none() {
            debug!(%namespace, "Key fetch reply has no usable key payload");
        }
        Ok(record)
    }
}

#[async_trait]
impl LicenseApi for HttpLicenseApi {
    async fn fetch_active(&self, id: &str) -> Result<Option<KeyRecord>> {
        self.fetch(Namespace::Active, id).await
    }

    async fn fetch_generated(&self, id: &str) -> Result<Option<KeyRecord>> {
        self.fetch(Namespace::Generated, id).await
    }

    async fn generate_key(&self, request: &GenerateKeyRequest) -> Result<String> {
        info!(note = %request.note, days = request.days, "Generating license key");

        let query = [
            ("apiKey", self.config.api_key.clone()),
            ("expire", dates::format_api(request.expire)),
            ("note", request.note.clone()),
            ("count", request.count.to_string()),
            ("isPremium", request.is_premium.to_string()),
            ("expiresByDaysKey", request.expires_by_days.to_string()),
            ("daysKey", request.days.to_string()),
        ];

        let response = self
            .client
            .get(self.url("/generate-key/get"))
            .query(&query)
            .send()
            .await
            .map_err(network)?;

        let status = response.status();
        let body = response.text().await.map_err(network)?;

        if !status.is_success() {
            error!(status = %status, body = %body, "Key generation failed");
            return Err(Error::Remote(format!("Key generation failed: {}", status)));
        }

        let value: Value = serde_json::from_str(&body).map_err(|e| {
            Error::Remote(format!("Malformed key generation reply: {}", e))
        })?;

        if let Some(message) = wire::reported_failure(&value) {
            warn!(message = %message, "Key generation rejected");
            return Err(Error::Remote(message));
        }

        wire::extract_text(&value, wire::GENERATED_VALUE_SHAPES)
            .ok_or_else(|| Error::Remote("No key in key generation reply".to_string()))
    }

    async fn edit_key(&self, namespace: Namespace, request: &EditKeyRequest) -> Result<()> {
        let path = match namespace {
            Namespace::Active => "/key/edit",
            Namespace::Generated => "/generated-key/edit",
        };

        let body = EditBody {
            api_key: &self.config.api_key,
            key_value: &request.key_value,
            expires_by_days_key: request.expires_by_days,
            days_key: request.days,
            note: &request.note,
            is_premium: request.is_premium,
            no_hwid_validation: request.no_hwid_validation,
        };

        debug!(%namespace, key = %request.key_value, days = request.days, "Editing key");

        let response = self
            .client
            .post(self.url(path))
            .json(&body)
            .send()
            .await
            .map_err(network)?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            error!(%namespace, status = %status, body = %text, "Key edit failed");
            return Err(Error::Remote(format!("Failed to update key: {}", status)));
        }

        info!(%namespace, key = %request.key_value, "Key edited");
        Ok(())
    }

    async fn reset_hwid(&self, key_value: &str) -> Result<ResetReply> {
        let response = self
            .client
            .get(self.url("/reset-hwid"))
            .query(&[
                ("service", self.config.hwid_service.as_str()),
                ("key", key_value),
            ])
            .send()
            .await
            .map_err(network)?;

        let status = response.status();
        let body = response.text().await.map_err(network)?;

        let error = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|value| value.get("error").and_then(Value::as_str).map(str::to_string));

        debug!(key = key_value, status = %status, error = ?error, "HWID reset replied");

        Ok(ResetReply {
            success: status.is_success(),
            status: status.as_u16(),
            error,
        })
    }

    async fn execution_count(&self) -> Result<u64> {
        let response = self
            .client
            .get(self.url("/execution-count"))
            .query(&[("apiKey", self.config.api_key.as_str())])
            .send()
            .await
            .map_err(network)?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Remote(format!(
                "Execution count fetch failed: {}",
                status
            )));
        }

        let body = response.text().await.map_err(network)?;
        let value: Value = serde_json::from_str(&body).map_err(|e| {
            Error::Remote(format!("Malformed execution count reply: {}", e))
        })?;
        Ok(value
            .get("executionCount")
            .and_then(Value::as_u64)
            .unwrap_or(0))
    }
}
