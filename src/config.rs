// Configuration for the booking core

use anyhow::{ensure, Context};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::availability::OverlapRule;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookingConfig {
    pub overlap_rule: OverlapRule,
    // Bookings can only be cancelled while check-in is at least this many days away
    pub cancellation_notice_days: u32,
    pub currency: String,
    pub reference_prefix: String,
    pub notifier: NotifierConfig,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            overlap_rule: OverlapRule::HalfOpen,
            cancellation_notice_days: 1,
            currency: "KES".to_string(),
            reference_prefix: "KEN-HTL".to_string(),
            notifier: NotifierConfig::default(),
        }
    }
}

// Mail relay used for booking confirmations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifierConfig {
    // No relay configured means confirmations are only logged
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub timeout_ms: u64,
    pub sender: String,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            timeout_ms: 5000,
            sender: "bookings@kenyanhospitality.co.ke".to_string(),
        }
    }
}

impl BookingConfig {
    pub fn from_json_str(json: &str) -> anyhow::Result<Self> {
        let config: BookingConfig =
            serde_json::from_str(json).context("failed to parse booking config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read booking config from {}", path.display()))?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            !self.reference_prefix.trim().is_empty(),
            "reference_prefix must not be empty"
        );
        ensure!(!self.currency.trim().is_empty(), "currency must not be empty");
        ensure!(
            self.notifier.timeout_ms > 0,
            "notifier.timeout_ms must be positive"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BookingConfig::default();
        assert_eq!(config.overlap_rule, OverlapRule::HalfOpen);
        assert_eq!(config.cancellation_notice_days, 1);
        assert_eq!(config.currency, "KES");
        assert!(config.notifier.base_url.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = BookingConfig::from_json_str(
            r#"{
                "overlap_rule": "inclusive",
                "notifier": { "base_url": "https://mail.example.com", "timeout_ms": 250 }
            }"#,
        )
        .unwrap();

        assert_eq!(config.overlap_rule, OverlapRule::Inclusive);
        assert_eq!(config.reference_prefix, "KEN-HTL");
        assert_eq!(
            config.notifier.base_url.as_deref(),
            Some("https://mail.example.com")
        );
        assert_eq!(config.notifier.timeout_ms, 250);
        assert_eq!(config.notifier.sender, NotifierConfig::default().sender);
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(BookingConfig::from_json_str(r#"{ "reference_prefix": " " }"#).is_err());
        assert!(BookingConfig::from_json_str(r#"{ "notifier": { "timeout_ms": 0 } }"#).is_err());
        assert!(BookingConfig::from_json_str("not json").is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let err = BookingConfig::load("does/not/exist.json").unwrap_err();
        assert!(err.to_string().contains("does/not/exist.json"));
    }
}
