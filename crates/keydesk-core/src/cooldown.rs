//! Cooldown signals embedded in remote error messages.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

const COOLDOWN_MARKER: &str = "Cooldown active";

static MINUTES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+(?:\.\d+)?)\s+minutes").expect("cooldown pattern is valid")
});

/// A remote-reported wait before an action may be retried.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CooldownSignal {
    pub total_minutes: f64,
}

impl CooldownSignal {
    /// Parse a message such as `"Cooldown active, try again in 125.5 minutes"`.
    ///
    /// Returns `None` unless the message carries the cooldown marker and a
    /// decimal number directly followed by the word `minutes`.
    pub fn parse(message: &str) -> Option<Self> {
        if !message.contains(COOLDOWN_MARKER) {
            return None;
        }

        let captures = MINUTES.captures(message)?;
        let total_minutes = captures.get(1)?.as_str().parse::<f64>().ok()?;

        Some(Self { total_minutes })
    }

    /// `"{h}h {m}m"` when at least an hour remains, else `"{m} minutes"`.
    pub fn display(&self) -> String {
        format_minutes(self.total_minutes)
    }
}

/// Render a minute count the way cooldown replies show it.
pub fn format_minutes(total_minutes: f64) -> String {
    let hours = (total_minutes / 60.0).floor();
    let remainder = (total_minutes % 60.0).round();

    if hours > 0.0 {
        format!("{}h {}m", hours as i64, remainder as i64)
    } else {
        format!("{} minutes", remainder as i64)
    }
}
