//! Port traits.
//!
//! `LicenseApi` is the seam between the key lifecycle engine and the remote
//! licensing service.

use crate::Result;
use crate::key::{KeyRecord, Namespace};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Parameters for issuing a new generated key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateKeyRequest {
    /// Absolute expiration date.
    pub expire: NaiveDate,
    /// Owner id, stored by the remote as the key note.
    pub note: String,
    pub count: u32,
    pub is_premium: bool,
    /// Let the remote derive expiration from `days`.
    pub expires_by_days: bool,
    pub days: i64,
}

/// Parameters for editing an existing key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditKeyRequest {
    pub key_value: String,
    pub expires_by_days: bool,
    pub days: i64,
    pub note: String,
    pub is_premium: bool,
    pub no_hwid_validation: bool,
}

/// Raw reply of a hardware id reset.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResetReply {
    /// HTTP status was 2xx.
    pub success: bool,
    pub status: u16,
    /// `error` text from the reply body, if any.
    pub error: Option<String>,
}

/// Remote licensing service.
///
/// Fetch operations return `Ok(None)` when the namespace holds no usable key
/// for the identifier; `Err` is reserved for transport failures.
#[async_trait]
pub trait LicenseApi: Send + Sync {
    /// Look up a key in the Active namespace by owner id or key value.
    async fn fetch_active(&self, id: &str) -> Result<Option<KeyRecord>>;

    /// Look up a key in the Generated namespace by owner id or key value.
    async fn fetch_generated(&self, id: &str) -> Result<Option<KeyRecord>>;

    /// Issue a key and return its value.
    async fn generate_key(&self, request: &GenerateKeyRequest) -> Result<String>;

    /// Edit a key using the namespace's edit schema.
    async fn edit_key(&self, namespace: Namespace, request: &EditKeyRequest) -> Result<()>;

    /// Reset the hardware id bound to an Active key.
    async fn reset_hwid(&self, key_value: &str) -> Result<ResetReply>;

    /// Total script executions recorded by the remote.
    async fn execution_count(&self) -> Result<u64>;
}
