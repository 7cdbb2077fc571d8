//! Wire formats of the licensing API and their normalization.
//!
//! Each endpoint answers in more than one JSON layout. Extraction walks an
//! ordered list of JSON pointers and keeps the first usable payload.

use keydesk_core::KeyRecord;
use keydesk_core::dates;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Layouts of the Active-namespace fetch reply.
pub const ACTIVE_KEY_SHAPES: &[&str] = &["/key", "/data/key"];

/// Layouts of the Generated-namespace fetch reply.
pub const GENERATED_KEY_SHAPES: &[&str] = &["/generatedKey", "/data/generatedKey"];

/// Layouts of the generate reply, most specific first.
pub const GENERATED_VALUE_SHAPES: &[&str] = &[
    "/generatedKeys/0/value",
    "/data/keys/0/value",
    "/data/keys/0",
    "/generatedKeys/0",
];

/// Key object as returned by both fetch endpoints.
///
/// Only the identifier is required. Other fields are read leniently and fall
/// back to their defaults when the remote sends an unexpected JSON type.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteKey {
    value: Option<Value>,
    id: Option<Value>,
    key: Option<Value>,
    note: Option<Value>,
    is_premium: Option<Value>,
    expires_at: Option<Value>,
    hwid: Option<Value>,
    no_hwid_validation: Option<Value>,
    days_key: Option<Value>,
}

impl RemoteKey {
    fn into_record(self) -> Option<KeyRecord> {
        let identifier = [&self.value, &self.id, &self.key]
            .into_iter()
            .flatten()
            .find_map(scalar_text)?;

        Some(KeyRecord {
            identifier,
            owner_id: self.note.as_ref().and_then(scalar_text),
            is_premium: self.is_premium.as_ref().and_then(lenient_bool).unwrap_or(false),
            hardware_id: self.hwid.as_ref().and_then(scalar_text),
            requires_hardware_validation: !self
                .no_hwid_validation
                .as_ref()
                .and_then(lenient_bool)
                .unwrap_or(false),
            expires_at: self
                .expires_at
                .as_ref()
                .and_then(Value::as_str)
                .and_then(dates::parse_remote),
            days_remaining: self.days_key.as_ref().and_then(lenient_int),
        })
    }
}

/// Non-empty string or number, as text.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// `true`/`false`, `1`/`0`, or their string forms.
fn lenient_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_f64()? {
            x if x == 0.0 => Some(false),
            x if x == 1.0 => Some(true),
            _ => None,
        },
        Value::String(s) => match s.trim() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Whole number given as an integer, an integral float, or a string.
fn lenient_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(integral)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(integral))
        }
        _ => None,
    }
}

fn integral(x: f64) -> Option<i64> {
    if x.is_finite() && x.fract() == 0.0 && x >= i64::MIN as f64 && x < i64::MAX as f64 {
        Some(x as i64)
    } else {
        None
    }
}

/// First key object found under `shapes` that carries an identifier.
pub fn extract_key(body: &Value, shapes: &[&str]) -> Option<KeyRecord> {
    shapes.iter().find_map(|pointer| {
        let candidate = body.pointer(pointer)?;
        if !candidate.is_object() {
            return None;
        }
        serde_json::from_value::<RemoteKey>(candidate.clone())
            .ok()?
            .into_record()
    })
}

/// First scalar found under `shapes`.
pub fn extract_text(body: &Value, shapes: &[&str]) -> Option<String> {
    shapes
        .iter()
        .find_map(|pointer| body.pointer(pointer).and_then(scalar_text))
}

/// Whether a reply body explicitly reports failure, and with which message.
pub fn reported_failure(body: &Value) -> Option<String> {
    let failed = body.get("success").and_then(Value::as_bool) == Some(false)
        || body
            .get("status")
            .and_then(Value::as_str)
            .is_some_and(|status| status != "success");

    if !failed {
        return None;
    }

    Some(
        body.get("message")
            .and_then(Value::as_str)
            .unwrap_or("Failed to generate key")
            .to_string(),
    )
}

/// Body of `/key/edit` and `/generated-key/edit`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditBody<'a> {
    pub api_key: &'a str,
    pub key_value: &'a str,
    pub expires_by_days_key: bool,
    pub days_key: i64,
    pub note: &'a str,
    pub is_premium: bool,
    pub no_hwid_validation: bool,
}
