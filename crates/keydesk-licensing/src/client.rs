//! Key lifecycle over a `LicenseApi`: fallback resolution, issuing,
//! extension and hardware id resets.

use chrono::NaiveDate;
use keydesk_core::dates;
use keydesk_core::{
    CooldownSignal, EditKeyRequest, Error, GenerateKeyRequest, KeyRecord, LicenseApi, LicenseKey,
    Result,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of extending a key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Extension {
    /// The key as resolved before the edit.
    pub key: LicenseKey,
    pub previous_expiry: NaiveDate,
    /// Local estimate: `previous_expiry + additional_days`.
    pub new_expiry: NaiveDate,
    /// Day count sent to the remote.
    pub total_days: i64,
    /// What the remote derives from the day count (`today + total_days`).
    /// The remote value is authoritative when it differs from `new_expiry`.
    pub remote_estimate: NaiveDate,
}

/// Licensing client implementing the key lifecycle contracts.
#[derive(Clone)]
pub struct LicenseClient {
    api: Arc<dyn LicenseApi>,
}

impl LicenseClient {
    pub fn new(api: Arc<dyn LicenseApi>) -> Self {
        Self { api }
    }

    /// Resolve an owner id or key value, Active namespace first.
    ///
    /// `NotFound` means neither namespace holds a usable key.
    pub async fn resolve(&self, id: &str) -> Result<LicenseKey> {
        if let Some(record) = self.api.fetch_active(id).await? {
            debug!(id, key = %record.identifier, "Resolved active key");
            return Ok(LicenseKey::Active(record));
        }

        debug!(id, "No active key, trying generated namespace");

        if let Some(record) = self.api.fetch_generated(id).await? {
            debug!(id, key = %record.identifier, "Resolved generated key");
            return Ok(LicenseKey::Generated(record));
        }

        debug!(id, "No key in either namespace");
        Err(Error::NotFound(id.to_string()))
    }

    /// Issue a key for `owner_id`, refusing when one already resolves.
    pub async fn create(&self, owner_id: &str, duration_days: i64) -> Result<LicenseKey> {
        self.create_on(owner_id, duration_days, dates::today()).await
    }

    /// [`create`](Self::create) with an explicit current date.
    pub async fn create_on(
        &self,
        owner_id: &str,
        duration_days: i64,
        today: NaiveDate,
    ) -> Result<LicenseKey> {
        if duration_days < 1 {
            return Err(Error::InvalidInput(format!(
                "Duration must be at least one day, got {}",
                duration_days
            )));
        }

        match self.resolve(owner_id).await {
            Ok(existing) => {
                warn!(owner_id, key = %existing.identifier(), "Owner already has a key");
                return Err(Error::AlreadyExists {
                    key: existing.identifier().to_string(),
                });
            }
            Err(Error::NotFound(_)) => {}
            Err(e) => return Err(e),
        }

        let expire = dates::add_days(today, duration_days);
        let request = GenerateKeyRequest {
            expire,
            note: owner_id.to_string(),
            count: 1,
            is_premium: true,
            expires_by_days: true,
            days: duration_days,
        };

        let value = self.api.generate_key(&request).await?;
        info!(owner_id, key = %value, duration_days, "License key issued");

        Ok(LicenseKey::Generated(KeyRecord {
            identifier: value,
            owner_id: Some(owner_id.to_string()),
            is_premium: true,
            hardware_id: None,
            requires_hardware_validation: true,
            expires_at: Some(expire),
            days_remaining: Some(duration_days),
        }))
    }

    /// Add `additional_days` to the key owned by `owner_id`.
    pub async fn extend(&self, owner_id: &str, additional_days: i64) -> Result<Extension> {
        self.extend_on(owner_id, additional_days, dates::today()).await
    }

    /// [`extend`](Self::extend) with an explicit current date.
    pub async fn extend_on(
        &self,
        owner_id: &str,
        additional_days: i64,
        today: NaiveDate,
    ) -> Result<Extension> {
        let key = self.resolve(owner_id).await?;
        let record = key.record();

        let previous_expiry = match (record.expires_at, record.days_remaining) {
            (Some(expires_at), _) => expires_at,
            (None, Some(days)) => dates::add_days(today, days),
            (None, None) => today,
        };
        let new_expiry = dates::add_days(previous_expiry, additional_days);
        let total_days = record
            .days_remaining
            .unwrap_or(0)
            .checked_add(additional_days)
            .ok_or_else(|| {
                Error::Remote(format!(
                    "Day count of key {} out of range",
                    record.identifier
                ))
            })?;

        let request = EditKeyRequest {
            key_value: record.identifier.clone(),
            expires_by_days: true,
            days: total_days,
            note: record
                .owner_id
                .clone()
                .unwrap_or_else(|| owner_id.to_string()),
            is_premium: record.is_premium,
            no_hwid_validation: !record.requires_hardware_validation,
        };

        self.api.edit_key(key.namespace(), &request).await?;

        info!(
            owner_id,
            key = %record.identifier,
            namespace = %key.namespace(),
            total_days,
            new_expiry = %new_expiry,
            "License key extended"
        );

        Ok(Extension {
            previous_expiry,
            new_expiry,
            total_days,
            remote_estimate: dates::add_days(today, total_days),
            key,
        })
    }

    /// Reset the hardware id bound to an Active key.
    ///
    /// Generated keys are rejected before any remote call.
    pub async fn reset_hardware_id(&self, key: &LicenseKey) -> Result<()> {
        if !key.is_resettable() {
            return Err(Error::InvalidInput(format!(
                "Key {} has no bound hardware id",
                key.identifier()
            )));
        }

        let reply = self.api.reset_hwid(key.identifier()).await?;

        if let Some(message) = reply.error {
            if let Some(signal) = CooldownSignal::parse(&message) {
                warn!(key = %key.identifier(), minutes = signal.total_minutes, "HWID reset on cooldown");
                return Err(Error::OnCooldown {
                    minutes_remaining: signal.total_minutes,
                });
            }
            return Err(Error::Remote(message));
        }

        if !reply.success {
            return Err(Error::Remote(format!("HWID reset failed: {}", reply.status)));
        }

        info!(key = %key.identifier(), "HWID reset");
        Ok(())
    }

    /// Total executions recorded by the remote.
    pub async fn execution_count(&self) -> Result<u64> {
        self.api.execution_count().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use keydesk_core::{Namespace, ResetReply};
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeApi {
        active: HashMap<String, KeyRecord>,
        generated: HashMap<String, KeyRecord>,
        reset_reply: ResetReply,
        generated_requests: Mutex<Vec<GenerateKeyRequest>>,
        edits: Mutex<Vec<(Namespace, EditKeyRequest)>>,
        resets: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl LicenseApi for FakeApi {
        async fn fetch_active(&self, id: &str) -> Result<Option<KeyRecord>> {
            Ok(self.active.get(id).cloned())
        }

        async fn fetch_generated(&self, id: &str) -> Result<Option<KeyRecord>> {
            Ok(self.generated.get(id).cloned())
        }

        async fn generate_key(&self, request: &GenerateKeyRequest) -> Result<String> {
            self.generated_requests.lock().unwrap().push(request.clone());
            Ok("NEW-KEY".to_string())
        }

        async fn edit_key(&self, namespace: Namespace, request: &EditKeyRequest) -> Result<()> {
            self.edits.lock().unwrap().push((namespace, request.clone()));
            Ok(())
        }

        async fn reset_hwid(&self, key_value: &str) -> Result<ResetReply> {
            self.resets.lock().unwrap().push(key_value.to_string());
            Ok(self.reset_reply.clone())
        }

        async fn execution_count(&self) -> Result<u64> {
            Ok(7)
        }
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn client(api: FakeApi) -> (LicenseClient, Arc<FakeApi>) {
        let api = Arc::new(api);
        (LicenseClient::new(api.clone()), api)
    }

    #[tokio::test]
    async fn test_resolve_prefers_active() {
        let mut api = FakeApi::default();
        api.active.insert("u1".into(), KeyRecord::new("ACTIVE"));
        api.generated.insert("u1".into(), KeyRecord::new("GENERATED"));
        let (client, _) = client(api);

        let key = client.resolve("u1").await.unwrap();
        assert_eq!(key.namespace(), Namespace::Active);
        assert_eq!(key.identifier(), "ACTIVE");
    }

    #[tokio::test]
    async fn test_resolve_falls_back_to_generated() {
        let mut api = FakeApi::default();
        api.generated.insert("u1".into(), KeyRecord::new("GENERATED"));
        let (client, _) = client(api);

        let key = client.resolve("u1").await.unwrap();
        assert_eq!(key.namespace(), Namespace::Generated);
    }

    #[tokio::test]
    async fn test_resolve_not_found() {
        let (client, _) = client(FakeApi::default());
        assert!(matches!(client.resolve("nobody").await, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_create_refuses_existing_owner() {
        let mut api = FakeApi::default();
        api.generated.insert("u1".into(), KeyRecord::new("EXISTING"));
        let (client, api) = client(api);

        let err = client.create("u1", 30).await.unwrap_err();
        assert!(matches!(err, Error::AlreadyExists { ref key } if key == "EXISTING"));
        assert!(api.generated_requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_sends_duration_basis_request() {
        let (client, api) = client(FakeApi::default());

        let key = client.create_on("u1", 7, day(2025, 1, 28)).await.unwrap();
        assert_eq!(key.namespace(), Namespace::Generated);
        assert_eq!(key.identifier(), "NEW-KEY");

        let requests = api.generated_requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].expire, day(2025, 2, 4));
        assert_eq!(requests[0].note, "u1");
        assert_eq!(requests[0].count, 1);
        assert!(requests[0].is_premium && requests[0].expires_by_days);
        assert_eq!(requests[0].days, 7);
    }

    #[tokio::test]
    async fn test_create_rejects_non_positive_duration() {
        let (client, api) = client(FakeApi::default());
        assert!(matches!(
            client.create("u1", 0).await,
            Err(Error::InvalidInput(_))
        ));
        assert!(api.generated_requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_extend_from_days_remaining() {
        let mut api = FakeApi::default();
        api.active.insert(
            "u1".into(),
            KeyRecord::new("K").with_owner("u1").with_days_remaining(10).premium(true),
        );
        let (client, api) = client(api);
        let today = day(2025, 3, 1);

        let ext = client.extend_on("u1", 5, today).await.unwrap();
        assert_eq!(ext.total_days, 15);
        assert_eq!(ext.previous_expiry, day(2025, 3, 11));
        assert_eq!(ext.new_expiry, day(2025, 3, 16));
        assert_eq!(ext.remote_estimate, day(2025, 3, 16));

        let edits = api.edits.lock().unwrap();
        assert_eq!(edits[0].0, Namespace::Active);
        assert_eq!(edits[0].1.days, 15);
        assert!(edits[0].1.is_premium);
    }

    #[tokio::test]
    async fn test_extend_rejects_overflowing_day_count() {
        let mut api = FakeApi::default();
        api.active.insert(
            "u1".into(),
            KeyRecord::new("K").with_days_remaining(i64::MAX),
        );
        let (client, api) = client(api);

        let err = client.extend_on("u1", 5, day(2025, 3, 1)).await.unwrap_err();
        assert!(matches!(err, Error::Remote(_)));
        assert!(api.edits.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_extend_prefers_expires_at() {
        let mut api = FakeApi::default();
        api.generated.insert(
            "u1".into(),
            KeyRecord::new("K")
                .with_expires_at(day(2025, 12, 30))
                .with_days_remaining(30),
        );
        let (client, api) = client(api);

        let ext = client.extend_on("u1", 3, day(2025, 12, 1)).await.unwrap();
        assert_eq!(ext.previous_expiry, day(2025, 12, 30));
        assert_eq!(ext.new_expiry, day(2026, 1, 2));
        assert_eq!(ext.total_days, 33);
        assert_eq!(ext.remote_estimate, day(2026, 1, 3));

        let edits = api.edits.lock().unwrap();
        assert_eq!(edits[0].0, Namespace::Generated);
        // Missing note falls back to the owner id.
        assert_eq!(edits[0].1.note, "u1");
    }

    #[tokio::test]
    async fn test_extend_without_expiry_basis_starts_today() {
        let mut api = FakeApi::default();
        api.active.insert("u1".into(), KeyRecord::new("K"));
        let (client, _) = client(api);
        let today = day(2025, 6, 1);

        let ext = client.extend_on("u1", 2, today).await.unwrap();
        assert_eq!(ext.previous_expiry, today);
        assert_eq!(ext.total_days, 2);
    }

    #[tokio::test]
    async fn test_reset_on_cooldown() {
        let mut api = FakeApi::default();
        api.reset_reply = ResetReply {
            success: true,
            status: 200,
            error: Some("Cooldown active, try again in 90 minutes".to_string()),
        };
        let (client, _) = client(api);

        let key = LicenseKey::Active(KeyRecord::new("K"));
        let err = client.reset_hardware_id(&key).await.unwrap_err();
        assert!(matches!(err, Error::OnCooldown { minutes_remaining } if minutes_remaining == 90.0));
    }

    #[tokio::test]
    async fn test_reset_generated_key_never_reaches_remote() {
        let (client, api) = client(FakeApi::default());

        let key = LicenseKey::Generated(KeyRecord::new("K"));
        assert!(matches!(
            client.reset_hardware_id(&key).await,
            Err(Error::InvalidInput(_))
        ));
        assert!(api.resets.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reset_failure_status() {
        let mut api = FakeApi::default();
        api.reset_reply = ResetReply {
            success: false,
            status: 500,
            error: None,
        };
        let (client, _) = client(api);

        let key = LicenseKey::Active(KeyRecord::new("K"));
        assert!(matches!(
            client.reset_hardware_id(&key).await,
            Err(Error::Remote(_))
        ));
    }
}
