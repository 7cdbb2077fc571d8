//! Per-command, per-user invocation cooldowns.
//!
//! Windows expire lazily: a window whose cooldown has elapsed is treated as
//! absent on access and dropped. `sweep_at` clears all stale windows and
//! `spawn_sweeper` runs it on a timer.

use chrono::{DateTime, TimeDelta, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::{Duration, interval};
use tracing::{debug, info};

/// Cooldown applied when a command declares none.
pub const DEFAULT_COOLDOWN_SECS: u64 = 3;

/// Result of an acquire attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acquire {
    Allowed,
    Denied { retry_at: DateTime<Utc> },
}

#[derive(Debug, Clone, Copy)]
struct RateWindow {
    last_invoked_at: DateTime<Utc>,
    cooldown: TimeDelta,
}

impl RateWindow {
    fn expires_at(&self) -> DateTime<Utc> {
        self.last_invoked_at
            .checked_add_signed(self.cooldown)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    fn is_stale(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at()
    }
}

fn cooldown_delta(cooldown_secs: u64) -> TimeDelta {
    i64::try_from(cooldown_secs)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .unwrap_or(TimeDelta::MAX)
}

/// Process-local cooldown gate keyed by (command, user).
#[derive(Default)]
pub struct RateLimiter {
    windows: Mutex<HashMap<(String, String), RateWindow>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Try to invoke `command` as `user_id` now.
    pub async fn try_acquire(&self, command: &str, user_id: &str, cooldown_secs: u64) -> Acquire {
        self.try_acquire_at(command, user_id, cooldown_secs, Utc::now())
            .await
    }

    /// [`try_acquire`](Self::try_acquire) at an explicit instant.
    pub async fn try_acquire_at(
        &self,
        command: &str,
        user_id: &str,
        cooldown_secs: u64,
        now: DateTime<Utc>,
    ) -> Acquire {
        let cooldown = cooldown_delta(cooldown_secs);
        let key = (command.to_string(), user_id.to_string());
        let mut windows = self.windows.lock().await;

        if let Some(window) = windows.get(&key) {
            let retry_at = window
                .last_invoked_at
                .checked_add_signed(cooldown)
                .unwrap_or(DateTime::<Utc>::MAX_UTC);
            if now < retry_at {
                debug!(command, user_id, retry_at = %retry_at, "Invocation denied by cooldown");
                return Acquire::Denied { retry_at };
            }
        }

        windows.insert(
            key,
            RateWindow {
                last_invoked_at: now,
                cooldown,
            },
        );
        Acquire::Allowed
    }

    /// Last invocation time of a live window, `None` once it has expired.
    pub async fn window_at(
        &self,
        command: &str,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Option<DateTime<Utc>> {
        let key = (command.to_string(), user_id.to_string());
        let mut windows = self.windows.lock().await;

        match windows.get(&key) {
            Some(window) if window.is_stale(now) => {
                windows.remove(&key);
                None
            }
            Some(window) => Some(window.last_invoked_at),
            None => None,
        }
    }

    /// Drop every expired window. Returns how many were removed.
    pub async fn sweep_at(&self, now: DateTime<Utc>) -> usize {
        let mut windows = self.windows.lock().await;
        let before = windows.len();
        windows.retain(|_, window| !window.is_stale(now));
        before - windows.len()
    }

    /// Number of windows currently held, stale or not.
    pub async fn len(&self) -> usize {
        self.windows.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.windows.lock().await.is_empty()
    }

    /// Sweep expired windows every `period` until `shutdown` flips to true.
    pub fn spawn_sweeper(
        self: Arc<Self>,
        period: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval(period);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let removed = self.sweep_at(Utc::now()).await;
                        if removed > 0 {
                            debug!(removed, "Swept expired cooldown windows");
                        }
                    }
                    _ = shutdown.changed() => {
                        if *shutdown.borrow() {
                            info!("Cooldown sweeper shutting down");
                            break;
                        }
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    #[tokio::test]
    async fn test_second_call_within_cooldown_is_denied() {
        let limiter = RateLimiter::new();

        assert_eq!(limiter.try_acquire_at("whitelist", "u1", 5, at(0)).await, Acquire::Allowed);
        assert_eq!(
            limiter.try_acquire_at("whitelist", "u1", 5, at(2)).await,
            Acquire::Denied { retry_at: at(5) }
        );
    }

    #[tokio::test]
    async fn test_window_absent_after_cooldown() {
        let limiter = RateLimiter::new();

        limiter.try_acquire_at("whitelist", "u1", 5, at(0)).await;
        limiter.try_acquire_at("whitelist", "u1", 5, at(4)).await;

        assert!(limiter.window_at("whitelist", "u1", at(5)).await.is_none());
        assert_eq!(limiter.try_acquire_at("whitelist", "u1", 5, at(5)).await, Acquire::Allowed);
    }

    #[tokio::test]
    async fn test_denied_attempt_does_not_extend_window() {
        let limiter = RateLimiter::new();

        limiter.try_acquire_at("panel", "u1", 5, at(0)).await;
        limiter.try_acquire_at("panel", "u1", 5, at(3)).await;

        assert_eq!(limiter.window_at("panel", "u1", at(4)).await, Some(at(0)));
    }

    #[tokio::test]
    async fn test_windows_are_per_command_and_user() {
        let limiter = RateLimiter::new();

        limiter.try_acquire_at("extend", "u1", 3, at(0)).await;
        assert_eq!(limiter.try_acquire_at("extend", "u2", 3, at(1)).await, Acquire::Allowed);
        assert_eq!(limiter.try_acquire_at("panel", "u1", 3, at(1)).await, Acquire::Allowed);
    }

    #[tokio::test]
    async fn test_sweep_removes_only_stale_windows() {
        let limiter = RateLimiter::new();

        limiter.try_acquire_at("getscript", "u1", 3, at(0)).await;
        limiter.try_acquire_at("panel", "u1", 5, at(0)).await;

        assert_eq!(limiter.sweep_at(at(4)).await, 1);
        assert_eq!(limiter.len().await, 1);
        assert_eq!(limiter.sweep_at(at(5)).await, 1);
        assert!(limiter.is_empty().await);
    }

    #[tokio::test]
    async fn test_sweeper_stops_on_shutdown() {
        let limiter = Arc::new(RateLimiter::new());
        let (tx, rx) = watch::channel(false);

        let handle = limiter.clone().spawn_sweeper(Duration::from_millis(10), rx);
        tx.send(true).unwrap();
        handle.await.unwrap();
    }
}
