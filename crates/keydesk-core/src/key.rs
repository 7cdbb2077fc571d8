//! License key data model.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The remote key store a key lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Namespace {
    /// Bound to a hardware id.
    Active,
    /// Issued but not yet bound.
    Generated,
}

impl Namespace {
    pub fn as_str(&self) -> &'static str {
        match self {
            Namespace::Active => "active",
            Namespace::Generated => "generated",
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Namespace-independent key attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyRecord {
    /// Key value, unique within its namespace.
    pub identifier: String,
    /// User the key was issued to (the remote "note").
    pub owner_id: Option<String>,
    pub is_premium: bool,
    /// Bound hardware id (Active keys only).
    pub hardware_id: Option<String>,
    pub requires_hardware_validation: bool,
    /// Absolute expiration, as a local calendar date.
    pub expires_at: Option<NaiveDate>,
    /// Day count used by duration-basis expiration.
    pub days_remaining: Option<i64>,
}

impl KeyRecord {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            owner_id: None,
            is_premium: false,
            hardware_id: None,
            requires_hardware_validation: false,
            expires_at: None,
            days_remaining: None,
        }
    }

    pub fn with_owner(mut self, owner_id: impl Into<String>) -> Self {
        self.owner_id = Some(owner_id.into());
        self
    }

    pub fn with_expires_at(mut self, date: NaiveDate) -> Self {
        self.expires_at = Some(date);
        self
    }

    pub fn with_days_remaining(mut self, days: i64) -> Self {
        self.days_remaining = Some(days);
        self
    }

    pub fn with_hardware_id(mut self, hwid: impl Into<String>) -> Self {
        self.hardware_id = Some(hwid.into());
        self
    }

    pub fn premium(mut self, is_premium: bool) -> Self {
        self.is_premium = is_premium;
        self
    }
}

/// A license key tagged with the namespace it was resolved from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "namespace", content = "record", rename_all = "snake_case")]
pub enum LicenseKey {
    Active(KeyRecord),
    Generated(KeyRecord),
}

impl LicenseKey {
    pub fn new(namespace: Namespace, record: KeyRecord) -> Self {
        match namespace {
            Namespace::Active => LicenseKey::Active(record),
            Namespace::Generated => LicenseKey::Generated(record),
        }
    }

    pub fn namespace(&self) -> Namespace {
        match self {
            LicenseKey::Active(_) => Namespace::Active,
            LicenseKey::Generated(_) => Namespace::Generated,
        }
    }

    pub fn record(&self) -> &KeyRecord {
        match self {
            LicenseKey::Active(record) | LicenseKey::Generated(record) => record,
        }
    }

    pub fn identifier(&self) -> &str {
        &self.record().identifier
    }

    /// Hardware id, which only Active keys can carry.
    pub fn hardware_id(&self) -> Option<&str> {
        match self {
            LicenseKey::Active(record) => record.hardware_id.as_deref(),
            LicenseKey::Generated(_) => None,
        }
    }

    /// Whether a hardware id reset can apply to this key.
    pub fn is_resettable(&self) -> bool {
        matches!(self, LicenseKey::Active(_))
    }
}
