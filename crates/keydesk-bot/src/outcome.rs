//! Normalized action outcomes handed to the presentation layer.

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use keydesk_core::cooldown::format_minutes;
use keydesk_core::{Error, Namespace};
use serde::{Deserialize, Serialize};
use tracing::error;

/// Inbound actions, from slash commands and panel buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Script,
    ResetHwid,
    Stats,
    Whitelist,
    Extend,
    Panel,
    Payment,
}

impl ActionKind {
    /// Command or button id the action is registered under.
    pub fn command_name(&self) -> &'static str {
        match self {
            ActionKind::Script => "getscript",
            ActionKind::ResetHwid => "resethwid",
            ActionKind::Stats => "getstats",
            ActionKind::Whitelist => "whitelist",
            ActionKind::Extend => "extend",
            ActionKind::Panel => "panel",
            ActionKind::Payment => "payment",
        }
    }

    /// Only the designated owner may run these.
    pub fn is_owner_only(&self) -> bool {
        matches!(
            self,
            ActionKind::Whitelist | ActionKind::Extend | ActionKind::Panel
        )
    }

    /// Declared cooldown, `None` for the configured default.
    pub fn cooldown_secs(&self) -> Option<u64> {
        match self {
            ActionKind::Panel | ActionKind::Payment => Some(5),
            _ => None,
        }
    }

    /// Reply shown when the remote API fails during this action.
    pub fn remote_failure_message(&self) -> &'static str {
        match self {
            ActionKind::Script => "Error fetching your license key. Please try again.",
            ActionKind::ResetHwid => {
                "Failed to reset HWID. Please contact an administrator for assistance."
            }
            ActionKind::Stats => "Error fetching your stats!",
            ActionKind::Whitelist => "Failed to generate key. Please try again later.",
            ActionKind::Extend => "Failed to extend license. Please try again later.",
            ActionKind::Panel | ActionKind::Payment => {
                "There was an error while executing this command!"
            }
        }
    }
}

/// Fixed plan durations for whitelisting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Plan {
    Weekly,
    Monthly,
}

impl Plan {
    pub fn days(&self) -> i64 {
        match self {
            Plan::Weekly => 7,
            Plan::Monthly => 30,
        }
    }

    pub fn duration_label(&self) -> String {
        match self {
            Plan::Weekly => "7 days (Weekly Plan)".to_string(),
            Plan::Monthly => "30 days (Monthly Plan)".to_string(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Weekly => "weekly",
            Plan::Monthly => "monthly",
        }
    }
}

/// Action requested by an inbound event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    GetScript,
    ResetHwid,
    GetStats,
    Whitelist {
        target: String,
        plan: Option<Plan>,
        duration_days: Option<i64>,
    },
    Extend {
        target: String,
        days: i64,
    },
    SendPanel {
        channel_id: Option<String>,
    },
    Payment,
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::GetScript => ActionKind::Script,
            Action::ResetHwid => ActionKind::ResetHwid,
            Action::GetStats => ActionKind::Stats,
            Action::Whitelist { .. } => ActionKind::Whitelist,
            Action::Extend { .. } => ActionKind::Extend,
            Action::SendPanel { .. } => ActionKind::Panel,
            Action::Payment => ActionKind::Payment,
        }
    }

    /// User the action is about: the target for owner actions, else the actor.
    pub fn subject<'a>(&'a self, actor_id: &'a str) -> &'a str {
        match self {
            Action::Whitelist { target, .. } | Action::Extend { target, .. } => target,
            _ => actor_id,
        }
    }
}

/// One inbound chat event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundEvent {
    pub actor_id: String,
    pub action: Action,
}

impl InboundEvent {
    pub fn new(actor_id: impl Into<String>, action: Action) -> Self {
        Self {
            actor_id: actor_id.into(),
            action,
        }
    }
}

/// Key details shown by the stats action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyStats {
    pub key: String,
    pub namespace: Namespace,
    pub note: Option<String>,
    pub is_premium: bool,
    pub expires_display: Option<String>,
    pub hardware_id: Option<String>,
    pub requires_hardware_validation: bool,
}

/// Successful action result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Payload {
    Script {
        key: String,
        namespace: Namespace,
        script: String,
    },
    HwidReset {
        key: String,
    },
    /// Generated keys carry no hardware binding, so there is nothing to reset.
    HwidAlreadyClear {
        key: String,
    },
    Stats(KeyStats),
    Created {
        key: String,
        target: String,
        duration_days: i64,
        duration_label: String,
        plan_label: String,
        expires_display: String,
        grant_role: Option<String>,
    },
    Extended {
        key: String,
        target: String,
        previous_expiry: String,
        new_expiry: String,
        remote_estimate: String,
        days_added: i64,
        total_days: i64,
    },
    Panel {
        channel_id: String,
    },
    PaymentInfo,
}

/// Typed action failure. Remote diagnostics never reach this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum Failure {
    NotFound { id: String },
    AlreadyExists { owner: String, key: String },
    OnCooldown { minutes_remaining: f64, display: String },
    Remote { message: String },
    Denied { retry_at: DateTime<Utc> },
    Forbidden,
    InvalidInput { reason: String },
}

impl Failure {
    /// Convert an engine error raised while acting on `subject`.
    ///
    /// Remote-side errors are logged in full and replaced by the action's
    /// generic reply.
    pub fn from_error(kind: ActionKind, subject: &str, err: Error) -> Self {
        match err {
            Error::NotFound(_) => Failure::NotFound {
                id: subject.to_string(),
            },
            Error::AlreadyExists { key } => Failure::AlreadyExists {
                owner: subject.to_string(),
                key,
            },
            Error::OnCooldown { minutes_remaining } => Failure::OnCooldown {
                minutes_remaining,
                display: format_minutes(minutes_remaining),
            },
            Error::InvalidInput(reason) => Failure::InvalidInput { reason },
            other => {
                error!(
                    action = kind.command_name(),
                    subject,
                    error = %other,
                    "Action failed against licensing API"
                );
                Failure::Remote {
                    message: kind.remote_failure_message().to_string(),
                }
            }
        }
    }
}

/// Normalized `{ok, kind, payload | error}` result of one action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub ok: bool,
    pub kind: ActionKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Payload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<Failure>,
}

impl Outcome {
    pub fn success(kind: ActionKind, payload: Payload) -> Self {
        Self {
            ok: true,
            kind,
            payload: Some(payload),
            error: None,
        }
    }

    pub fn failure(kind: ActionKind, error: Failure) -> Self {
        Self {
            ok: false,
            kind,
            payload: None,
            error: Some(error),
        }
    }
}
