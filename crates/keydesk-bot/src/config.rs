//! Bot configuration, read from the process environment and `.env`.

use crate::dispatcher::DispatchSettings;
use crate::rate_limit::DEFAULT_COOLDOWN_SECS;
use config::{Config, Environment};
use keydesk_core::{Error, Result};
use keydesk_licensing::LicenseApiConfig;
use serde::Deserialize;
use std::fmt;

/// Runtime configuration.
#[derive(Clone, Deserialize)]
pub struct BotConfig {
    /// Licensing API key. Required.
    pub api_key: String,
    /// Owner allowed to run owner-only actions.
    #[serde(default)]
    pub discord_owner_id: Option<String>,
    /// Role granted on whitelisting.
    #[serde(default)]
    pub discord_customer_role_id: Option<String>,
    #[serde(default)]
    pub discord_guild_id: Option<String>,
    #[serde(default = "default_license_api_url")]
    pub license_api_url: String,
    #[serde(default = "default_hwid_service")]
    pub hwid_service: String,
    #[serde(default)]
    pub loader_url: String,
    #[serde(default = "default_presence_interval_secs")]
    pub presence_interval_secs: u64,
    /// Static presence lines separated by `|`.
    #[serde(default = "default_presence_lines")]
    pub presence_lines: String,
    #[serde(default = "default_cooldown_secs")]
    pub default_cooldown_secs: u64,
}

fn default_license_api_url() -> String {
    "https://pandadevelopment.net/api".to_string()
}

fn default_hwid_service() -> String {
    "aroelhub".to_string()
}

fn default_presence_interval_secs() -> u64 {
    15
}

fn default_presence_lines() -> String {
    "best script CDID|light, stable, and customizable script".to_string()
}

fn default_cooldown_secs() -> u64 {
    DEFAULT_COOLDOWN_SECS
}

impl BotConfig {
    /// Load `.env` if present, then read the process environment.
    pub fn load() -> Result<Self> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                return Err(Error::Config(format!("Failed to read .env: {}", e)));
            }
        }
        Self::from_environment(Environment::default())
    }

    /// Build from an explicit environment source.
    pub fn from_environment(source: Environment) -> Result<Self> {
        let config: BotConfig = Config::builder()
            .add_source(source)
            .build()
            .and_then(Config::try_deserialize)
            .map_err(|e| Error::Config(e.to_string()))?;

        if config.api_key.trim().is_empty() {
            return Err(Error::Config("API_KEY must not be empty".to_string()));
        }
        Ok(config)
    }

    pub fn license_config(&self) -> LicenseApiConfig {
        LicenseApiConfig {
            api_key: self.api_key.clone(),
            api_url: self.license_api_url.trim_end_matches('/').to_string(),
            hwid_service: self.hwid_service.clone(),
        }
    }

    pub fn dispatch_settings(&self) -> DispatchSettings {
        DispatchSettings {
            owner_id: non_empty(&self.discord_owner_id),
            customer_role_id: non_empty(&self.discord_customer_role_id),
            loader_url: self.loader_url.clone(),
            default_cooldown_secs: self.default_cooldown_secs,
        }
    }

    pub fn presence_lines(&self) -> Vec<String> {
        self.presence_lines
            .split('|')
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotConfig")
            .field("api_key", &"<redacted>")
            .field("discord_owner_id", &self.discord_owner_id)
            .field("discord_customer_role_id", &self.discord_customer_role_id)
            .field("discord_guild_id", &self.discord_guild_id)
            .field("license_api_url", &self.license_api_url)
            .field("hwid_service", &self.hwid_service)
            .field("loader_url", &self.loader_url)
            .field("presence_interval_secs", &self.presence_interval_secs)
            .field("presence_lines", &self.presence_lines)
            .field("default_cooldown_secs", &self.default_cooldown_secs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> Environment {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Environment::default().source(Some(map))
    }

    #[test]
    fn test_defaults_applied() {
        let config = BotConfig::from_environment(env(&[("API_KEY", "k")])).unwrap();

        assert_eq!(config.license_api_url, "https://pandadevelopment.net/api");
        assert_eq!(config.hwid_service, "aroelhub");
        assert_eq!(config.presence_interval_secs, 15);
        assert_eq!(config.default_cooldown_secs, 3);
        assert_eq!(config.presence_lines().len(), 2);
        assert!(config.dispatch_settings().owner_id.is_none());
    }

    #[test]
    fn test_missing_api_key_is_config_error() {
        let err = BotConfig::from_environment(env(&[("HWID_SERVICE", "svc")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_overrides_and_blank_owner() {
        let config = BotConfig::from_environment(env(&[
            ("API_KEY", "k"),
            ("DISCORD_OWNER_ID", "  "),
            ("DISCORD_CUSTOMER_ROLE_ID", "role-1"),
            ("LICENSE_API_URL", "http://localhost:9000/api/"),
            ("DEFAULT_COOLDOWN_SECS", "10"),
        ]))
        .unwrap();

        let settings = config.dispatch_settings();
        assert!(settings.owner_id.is_none());
        assert_eq!(settings.customer_role_id.as_deref(), Some("role-1"));
        assert_eq!(settings.default_cooldown_secs, 10);
        assert_eq!(config.license_config().api_url, "http://localhost:9000/api");
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = BotConfig::from_environment(env(&[("API_KEY", "super-secret")])).unwrap();
        assert!(!format!("{:?}", config).contains("super-secret"));
    }
}
