//! Chat text and Discord embeds for action outcomes.

use crate::outcome::{ActionKind, Failure, KeyStats, Outcome, Payload};
use serde_json::{Value, json};

const EMBED_COLOR: u32 = 0xFFFFFF;
const EMBED_AUTHOR: &str = "Aroel — Service & Purchase";
const EMBED_FOOTER: &str = "© Aroel";

fn mention(user_id: &str) -> String {
    format!("<@{}>", user_id)
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "Yes" } else { "No" }
}

/// User-facing reply text for an outcome.
pub fn message(outcome: &Outcome) -> String {
    match (&outcome.payload, &outcome.error) {
        (Some(payload), _) => success_message(payload),
        (None, Some(failure)) => failure_message(outcome.kind, failure),
        (None, None) => outcome.kind.remote_failure_message().to_string(),
    }
}

fn success_message(payload: &Payload) -> String {
    match payload {
        Payload::Script { script, .. } => script.clone(),
        Payload::HwidReset { .. } => "HWID reset successfully! You can now use the script.".to_string(),
        Payload::HwidAlreadyClear { .. } => {
            "Your HWID has already been reset! You can use the script on any device.".to_string()
        }
        Payload::Stats(stats) => format!("License stats for `{}`", stats.key),
        Payload::Created {
            target,
            duration_label,
            expires_display,
            ..
        } => format!(
            "{} has been whitelisted for **{}** (expires on **{}**).",
            mention(target),
            duration_label,
            expires_display
        ),
        Payload::Extended {
            target,
            days_added,
            new_expiry,
            remote_estimate,
            ..
        } => {
            let mut text = format!(
                "Successfully extended {}'s license by {} days. New expiration: {}",
                mention(target),
                days_added,
                new_expiry
            );
            if remote_estimate != new_expiry {
                text.push_str(&format!(
                    " (licensing server counts from today: {})",
                    remote_estimate
                ));
            }
            text
        }
        Payload::Panel { channel_id } => format!("Panel successfully sent to <#{}>", channel_id),
        Payload::PaymentInfo => {
            "Payment methods: QRIS, DANA, BANK JAGO, PayPal. For methods other than QRIS, please tag the admin."
                .to_string()
        }
    }
}

fn failure_message(kind: ActionKind, failure: &Failure) -> String {
    match failure {
        Failure::Denied { retry_at } => format!(
            "Please wait, you are on a cooldown for `{}`. You can use it again <t:{}:R>.",
            kind.command_name(),
            retry_at.timestamp()
        ),
        Failure::Forbidden => "You don't have permission to use this command.".to_string(),
        Failure::NotFound { id } => match kind {
            ActionKind::Script => {
                "No license key found for you. Make sure you're whitelisted!".to_string()
            }
            ActionKind::Extend => format!(
                "{} does not have a license key to extend. Use /whitelist to create one first.",
                mention(id)
            ),
            _ => "No license key found for you.".to_string(),
        },
        Failure::AlreadyExists { owner, key } => format!(
            "{} already has a license key! Key found: {}",
            mention(owner),
            key
        ),
        Failure::OnCooldown { display, .. } => {
            format!("HWID reset is on cooldown! You can reset again in {}.", display)
        }
        Failure::Remote { message } => message.clone(),
        Failure::InvalidInput { reason } => reason.clone(),
    }
}

fn embed_shell(title: &str, description: &str, fields: Vec<Value>) -> Value {
    json!({
        "title": title,
        "description": description,
        "color": EMBED_COLOR,
        "author": { "name": EMBED_AUTHOR },
        "footer": { "text": EMBED_FOOTER },
        "fields": fields,
    })
}

fn field(name: &str, value: impl Into<String>, inline: bool) -> Value {
    json!({ "name": name, "value": value.into(), "inline": inline })
}

fn stats_embed(stats: &KeyStats) -> Value {
    let na = || "N/A".to_string();
    let fields = vec![
        field("Key Value", stats.key.clone(), false),
        field("Note", stats.note.clone().unwrap_or_else(na), false),
        field("Premium", yes_no(stats.is_premium), true),
        field("Expires At", stats.expires_display.clone().unwrap_or_else(na), true),
        field("HWID", stats.hardware_id.clone().unwrap_or_else(na), false),
        field(
            "No HWID Validation",
            yes_no(!stats.requires_hardware_validation),
            true,
        ),
        field("Key Type", stats.namespace.to_string(), true),
    ];
    json!({ "embeds": [embed_shell("Your License Stats", "", fields)] })
}

/// Discord message body for outcomes that render as an embed.
pub fn embed(outcome: &Outcome) -> Option<Value> {
    match outcome.payload.as_ref()? {
        Payload::Stats(stats) => Some(stats_embed(stats)),
        Payload::Created {
            key,
            plan_label,
            duration_label,
            expires_display,
            ..
        } => {
            let fields = vec![
                field("— LICENSE KEY (press to copy)", key.clone(), false),
                field("— PLAN", plan_label.clone(), false),
                field("— DURATION", duration_label.clone(), false),
                field("— EXPIRE DATE", expires_display.clone(), false),
                field(
                    "— GUIDE",
                    "Use the panel buttons to copy your script, reset your HWID, or check your stats.",
                    false,
                ),
            ];
            Some(json!({
                "embeds": [embed_shell(
                    "You have been whitelisted",
                    "Thank you for your purchase. Your license key is below.",
                    fields,
                )]
            }))
        }
        Payload::Extended {
            key,
            target,
            previous_expiry,
            new_expiry,
            remote_estimate,
            days_added,
            total_days,
        } => {
            let fields = vec![
                field("— USER", mention(target), false),
                field("— LICENSE KEY", key.clone(), false),
                field("— PREVIOUS EXPIRATION", previous_expiry.clone(), true),
                field("— NEW EXPIRATION", new_expiry.clone(), true),
                field("— SERVER EXPIRATION", remote_estimate.clone(), true),
                field("— DAYS ADDED", format!("{} days", days_added), true),
                field("— TOTAL DURATION", format!("{} days", total_days), true),
            ];
            Some(json!({
                "embeds": [embed_shell(
                    "License Extended Successfully",
                    &format!("Successfully extended {}'s license key.", mention(target)),
                    fields,
                )]
            }))
        }
        Payload::Panel { .. } => Some(json!({
            "embeds": [embed_shell(
                "Customer Control Panel",
                "This panel is for customers. Use the buttons below to redeem your key, copy the script, or reset your HWID.",
                vec![],
            )],
            "allowed_mentions": { "parse": [] },
            "components": [{
                "type": 1,
                "components": [
                    button(ActionKind::Script, "Copy Script", ButtonStyle::Success),
                    button(ActionKind::ResetHwid, "Reset HWID", ButtonStyle::Primary),
                    button(ActionKind::Stats, "Get Stats", ButtonStyle::Primary),
                ]
            }]
        })),
        _ => None,
    }
}

#[derive(Clone, Copy)]
enum ButtonStyle {
    Primary = 1,
    Success = 3,
}

fn button(kind: ActionKind, label: &str, style: ButtonStyle) -> Value {
    json!({
        "type": 2,
        "custom_id": kind.command_name(),
        "label": label,
        "style": style as u8,
    })
}
