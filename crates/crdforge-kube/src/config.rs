//! Reconcile configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ReconcileError, Result};

/// Timing of the readiness poll
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileConfig {
    /// Delay between readiness checks
    #[serde(default = "default_poll_interval", with = "humantime_serde")]
    pub poll_interval: Duration,

    /// How long to wait for a definition to be established
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            poll_interval: default_poll_interval(),
            timeout: default_timeout(),
        }
    }
}

fn default_poll_interval() -> Duration {
    Duration::from_millis(500)
}

fn default_timeout() -> Duration {
    Duration::from_secs(60)
}

impl ReconcileConfig {
    /// Parse from YAML, filling missing fields with defaults
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self =
            serde_yaml::from_str(yaml).map_err(|e| ReconcileError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject a zero poll interval
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval.is_zero() {
            return Err(ReconcileError::InvalidConfig(
                "pollInterval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ReconcileConfig::default();
        assert_eq!(config.poll_interval, Duration::from_millis(500));
        assert_eq!(config.timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_from_yaml() {
        let config = ReconcileConfig::from_yaml("pollInterval: 2s\ntimeout: 5m\n").unwrap();
        assert_eq!(config.poll_interval, Duration::from_secs(2));
        assert_eq!(config.timeout, Duration::from_secs(300));
    }

    #[test]
    fn test_from_yaml_partial() {
        let config = ReconcileConfig::from_yaml("timeout: 10s\n").unwrap();
        assert_eq!(config.poll_interval, Duration::from_millis(500));
        assert_eq!(config.timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let err = ReconcileConfig::from_yaml("pollInterval: 0s\n").unwrap_err();
        assert!(matches!(err, ReconcileError::InvalidConfig(_)));
    }

    #[test]
    fn test_bad_duration_rejected() {
        assert!(ReconcileConfig::from_yaml("timeout: soon\n").is_err());
    }
}
