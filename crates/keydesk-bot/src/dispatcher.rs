//! Maps inbound events onto the key lifecycle.
//!
//! Every event ends in exactly one [`Outcome`]: owner check, then cooldown
//! gate, then the licensing calls for the action.

use crate::outcome::{
    Action, Failure, InboundEvent, KeyStats, Outcome, Payload, Plan,
};
use crate::rate_limit::{Acquire, DEFAULT_COOLDOWN_SECS, RateLimiter};
use chrono::{DateTime, NaiveDate, Utc};
use keydesk_core::dates;
use keydesk_core::{Error, LicenseKey, Result};
use keydesk_licensing::LicenseClient;
use std::sync::Arc;
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

/// Longest single extension accepted.
pub const MAX_EXTEND_DAYS: i64 = 365;

/// Dispatcher settings taken from the bot configuration.
#[derive(Debug, Clone)]
pub struct DispatchSettings {
    /// Designated owner; `None` denies every owner-only action.
    pub owner_id: Option<String>,
    /// Role granted to newly whitelisted users.
    pub customer_role_id: Option<String>,
    /// Loader URL embedded in the script snippet.
    pub loader_url: String,
    pub default_cooldown_secs: u64,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            owner_id: None,
            customer_role_id: None,
            loader_url: String::new(),
            default_cooldown_secs: DEFAULT_COOLDOWN_SECS,
        }
    }
}

/// Dispatches one inbound event at a time to the licensing client.
pub struct ActionDispatcher {
    licenses: LicenseClient,
    limiter: Arc<RateLimiter>,
    settings: DispatchSettings,
}

impl ActionDispatcher {
    pub fn new(
        licenses: LicenseClient,
        limiter: Arc<RateLimiter>,
        settings: DispatchSettings,
    ) -> Self {
        Self {
            licenses,
            limiter,
            settings,
        }
    }

    pub fn licenses(&self) -> &LicenseClient {
        &self.licenses
    }

    /// Handle an event now.
    pub async fn dispatch(&self, event: InboundEvent) -> Outcome {
        self.dispatch_at(event, Utc::now(), dates::today()).await
    }

    /// Handle an event with explicit clocks: `now` for cooldowns, `today`
    /// for expiration arithmetic.
    pub async fn dispatch_at(
        &self,
        event: InboundEvent,
        now: DateTime<Utc>,
        today: NaiveDate,
    ) -> Outcome {
        let kind = event.action.kind();
        let span = info_span!(
            "action",
            action_id = %Uuid::new_v4(),
            action = kind.command_name(),
            actor = %event.actor_id,
        );

        async move {
            if kind.is_owner_only() && !self.is_owner(&event.actor_id) {
                warn!("Owner-only action refused");
                return Outcome::failure(kind, Failure::Forbidden);
            }

            let cooldown = kind
                .cooldown_secs()
                .unwrap_or(self.settings.default_cooldown_secs);
            if let Acquire::Denied { retry_at } = self
                .limiter
                .try_acquire_at(kind.command_name(), &event.actor_id, cooldown, now)
                .await
            {
                return Outcome::failure(kind, Failure::Denied { retry_at });
            }

            let subject = event.action.subject(&event.actor_id).to_string();
            match self.run(&event, today).await {
                Ok(payload) => {
                    info!("Action completed");
                    Outcome::success(kind, payload)
                }
                Err(err) => Outcome::failure(kind, Failure::from_error(kind, &subject, err)),
            }
        }
        .instrument(span)
        .await
    }

    fn is_owner(&self, actor_id: &str) -> bool {
        self.settings
            .owner_id
            .as_deref()
            .is_some_and(|owner| !owner.is_empty() && owner == actor_id)
    }

    async fn run(&self, event: &InboundEvent, today: NaiveDate) -> Result<Payload> {
        let actor = event.actor_id.as_str();

        match &event.action {
            Action::GetScript => {
                let key = self.licenses.resolve(actor).await?;
                Ok(Payload::Script {
                    script: self.script_for(key.identifier()),
                    key: key.identifier().to_string(),
                    namespace: key.namespace(),
                })
            }
            Action::ResetHwid => {
                let key = self.licenses.resolve(actor).await?;
                if !key.is_resettable() {
                    return Ok(Payload::HwidAlreadyClear {
                        key: key.identifier().to_string(),
                    });
                }
                self.licenses.reset_hardware_id(&key).await?;
                Ok(Payload::HwidReset {
                    key: key.identifier().to_string(),
                })
            }
            Action::GetStats => {
                let key = self.licenses.resolve(actor).await?;
                Ok(Payload::Stats(stats_for(&key)))
            }
            Action::Whitelist {
                target,
                plan,
                duration_days,
            } => self.whitelist(target, *plan, *duration_days, today).await,
            Action::Extend { target, days } => self.extend(target, *days, today).await,
            Action::SendPanel { channel_id } => match channel_id {
                Some(channel_id) if !channel_id.is_empty() => Ok(Payload::Panel {
                    channel_id: channel_id.clone(),
                }),
                _ => Err(Error::InvalidInput(
                    "Selected channel is invalid or not text-based.".to_string(),
                )),
            },
            Action::Payment => Ok(Payload::PaymentInfo),
        }
    }

    async fn whitelist(
        &self,
        target: &str,
        plan: Option<Plan>,
        duration_days: Option<i64>,
        today: NaiveDate,
    ) -> Result<Payload> {
        let (days, duration_label) = match (plan, duration_days) {
            (Some(plan), _) => (plan.days(), plan.duration_label()),
            (None, Some(days)) if days >= 1 => (days, format!("{} days (Manual)", days)),
            (None, Some(days)) => {
                return Err(Error::InvalidInput(format!(
                    "Duration must be at least 1 day, got {}.",
                    days
                )));
            }
            (None, None) => {
                return Err(Error::InvalidInput(
                    "You must specify a plan (weekly/monthly) or a custom duration.".to_string(),
                ));
            }
        };

        let key = self.licenses.create_on(target, days, today).await?;
        let expires = key
            .record()
            .expires_at
            .unwrap_or_else(|| dates::add_days(today, days));

        Ok(Payload::Created {
            key: key.identifier().to_string(),
            target: target.to_string(),
            duration_days: days,
            plan_label: plan
                .map(|plan| plan.as_str().to_string())
                .unwrap_or_else(|| duration_label.clone()),
            duration_label,
            expires_display: dates::format_display(expires),
            grant_role: self.settings.customer_role_id.clone(),
        })
    }

    async fn extend(&self, target: &str, days: i64, today: NaiveDate) -> Result<Payload> {
        if !(1..=MAX_EXTEND_DAYS).contains(&days) {
            return Err(Error::InvalidInput(format!(
                "Additional days must be between 1 and {}.",
                MAX_EXTEND_DAYS
            )));
        }

        let ext = self.licenses.extend_on(target, days, today).await?;

        Ok(Payload::Extended {
            key: ext.key.identifier().to_string(),
            target: target.to_string(),
            previous_expiry: dates::format_display(ext.previous_expiry),
            new_expiry: dates::format_display(ext.new_expiry),
            remote_estimate: dates::format_display(ext.remote_estimate),
            days_added: days,
            total_days: ext.total_days,
        })
    }

    fn script_for(&self, key: &str) -> String {
        format!(
            "script_key = \"{}\"\nloadstring(game:HttpGet(\"{}\"))()",
            key, self.settings.loader_url
        )
    }
}

fn stats_for(key: &LicenseKey) -> KeyStats {
    let record = key.record();
    KeyStats {
        key: record.identifier.clone(),
        namespace: key.namespace(),
        note: record.owner_id.clone(),
        is_premium: record.is_premium,
        expires_display: record.expires_at.map(dates::format_display),
        hardware_id: key.hardware_id().map(str::to_string),
        requires_hardware_validation: record.requires_hardware_validation,
    }
}
