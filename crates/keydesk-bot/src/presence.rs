//! Rotating bot presence.

use keydesk_licensing::LicenseClient;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::watch;
use tokio::time::{Duration, interval};
use tracing::{debug, info, warn};

/// Activity verb shown before the status text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activity {
    Watching,
    Playing,
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Activity::Watching => write!(f, "Watching"),
            Activity::Playing => write!(f, "Playing"),
        }
    }
}

/// One computed status line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Presence {
    pub activity: Activity,
    pub text: String,
}

impl Presence {
    pub fn new(activity: Activity, text: impl Into<String>) -> Self {
        Self {
            activity,
            text: text.into(),
        }
    }
}

impl Default for Presence {
    fn default() -> Self {
        Self::new(Activity::Watching, EXECUTIONS_FALLBACK)
    }
}

impl fmt::Display for Presence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.activity, self.text)
    }
}

const EXECUTIONS_FALLBACK: &str = "total executions";

/// Cycles the execution counter and a set of static lines.
pub struct PresenceRotator {
    licenses: LicenseClient,
    lines: Vec<String>,
    interval_secs: u64,
    position: usize,
}

impl PresenceRotator {
    pub fn new(licenses: LicenseClient, lines: Vec<String>, interval_secs: u64) -> Self {
        Self {
            licenses,
            lines,
            interval_secs: interval_secs.max(1),
            position: 0,
        }
    }

    fn slots(&self) -> usize {
        self.lines.len() + 1
    }

    /// Compute the next status and advance the rotation.
    pub async fn next_status(&mut self) -> Presence {
        let slot = self.position;
        self.position = (self.position + 1) % self.slots();

        match slot {
            0 => match self.licenses.execution_count().await {
                Ok(count) => Presence::new(Activity::Watching, format!("{} total executions", count)),
                Err(e) => {
                    warn!(error = %e, "Execution count unavailable");
                    Presence::new(Activity::Watching, EXECUTIONS_FALLBACK)
                }
            },
            n => Presence::new(Activity::Playing, self.lines[n - 1].clone()),
        }
    }

    /// Publish a new status every interval until shutdown.
    pub async fn run(&mut self, tx: watch::Sender<Presence>, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = interval(Duration::from_secs(self.interval_secs));

        info!(
            interval_secs = self.interval_secs,
            "Starting presence rotation"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let presence = self.next_status().await;
                    debug!(presence = %presence, "Updated presence");
                    if tx.send(presence).is_err() {
                        info!("No presence subscribers left");
                        break;
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("Presence rotation shutting down");
                        break;
                    }
                }
            }
        }
    }
}
