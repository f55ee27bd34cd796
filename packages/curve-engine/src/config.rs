use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::index::IndexModel;

/// Default delay between two polls of a growing log
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 5000;

/// Intervals below this are accepted but logged as a warning
pub const RECOMMENDED_MIN_POLL_INTERVAL_MS: u64 = 1000;

/// Streaming configuration, loaded from defaults, a JSON file or the environment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Delay between the end of one poll and the start of the next
    pub poll_interval_ms: u64,
    /// Replaces the index model's lookback distance when set
    pub lookback_override: Option<f64>,
    /// Replaces the index model's forward safety distance when set
    pub safety_forward_override: Option<f64>,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            lookback_override: None,
            safety_forward_override: None,
        }
    }
}

impl StreamConfig {
    /// Load configuration from environment variables, falling back to defaults
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            poll_interval_ms: match env::var("CURVE_POLL_INTERVAL_MS") {
                Ok(v) => v.trim().parse().map_err(|_| {
                    ConfigError::InvalidValue(format!("CURVE_POLL_INTERVAL_MS='{}'", v))
                })?,
                Err(_) => DEFAULT_POLL_INTERVAL_MS,
            },
            lookback_override: parse_optional_f64("CURVE_LOOKBACK")?,
            safety_forward_override: parse_optional_f64("CURVE_SAFETY_FORWARD")?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn lookback(&self, index: &IndexModel) -> f64 {
        self.lookback_override
            .unwrap_or_else(|| index.lookback_offset())
    }

    pub fn safety_forward(&self, index: &IndexModel) -> f64 {
        self.safety_forward_override
            .unwrap_or_else(|| index.safety_forward_offset())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("lookback_override", self.lookback_override),
            ("safety_forward_override", self.safety_forward_override),
        ] {
            if let Some(v) = value {
                if !v.is_finite() || v < 0.0 {
                    return Err(ConfigError::InvalidValue(format!(
                        "{} must be a finite non-negative number, got {}",
                        name, v
                    )));
                }
            }
        }

        if self.poll_interval_ms < RECOMMENDED_MIN_POLL_INTERVAL_MS {
            log::warn!(
                "Poll interval of {} ms is below the recommended {} ms",
                self.poll_interval_ms,
                RECOMMENDED_MIN_POLL_INTERVAL_MS
            );
        }
        Ok(())
    }
}

fn parse_optional_f64(name: &str) -> Result<Option<f64>, ConfigError> {
    match env::var(name) {
        Ok(v) => v
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue(format!("{}='{}'", name, v))),
        Err(_) => Ok(None),
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = StreamConfig::default();
        assert_eq!(config.poll_interval(), Duration::from_secs(5));
        assert_eq!(config.lookback(&IndexModel::time()), 1200.0);
        assert_eq!(config.safety_forward(&IndexModel::depth()), 1_000_000.0);
    }

    #[test]
    fn test_overrides() {
        let config = StreamConfig {
            lookback_override: Some(5.0),
            safety_forward_override: Some(100.0),
            ..Default::default()
        };
        assert_eq!(config.lookback(&IndexModel::depth()), 5.0);
        assert_eq!(config.safety_forward(&IndexModel::time()), 100.0);
    }

    #[test]
    fn test_from_json_file_partial() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"poll_interval_ms": 2500}}"#).unwrap();

        let config = StreamConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.poll_interval_ms, 2500);
        assert_eq!(config.lookback_override, None);
    }

    #[test]
    fn test_from_json_file_rejects_negative_lookback() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"lookback_override": -3}}"#).unwrap();

        assert!(matches!(
            StreamConfig::from_json_file(file.path()),
            Err(ConfigError::InvalidValue(_))
        ));
    }

    // Only test that touches the CURVE_* variables
    #[test]
    fn test_from_env() {
        env::set_var("CURVE_POLL_INTERVAL_MS", "750");
        env::set_var("CURVE_LOOKBACK", "30");
        env::remove_var("CURVE_SAFETY_FORWARD");

        let config = StreamConfig::from_env().unwrap();
        assert_eq!(config.poll_interval_ms, 750);
        assert_eq!(config.lookback_override, Some(30.0));
        assert_eq!(config.safety_forward_override, None);

        env::set_var("CURVE_LOOKBACK", "soon");
        assert!(StreamConfig::from_env().is_err());

        env::remove_var("CURVE_POLL_INTERVAL_MS");
        env::remove_var("CURVE_LOOKBACK");
    }

    #[test]
    fn test_huge_interval_saturates() {
        let config = StreamConfig::default().with_poll_interval(Duration::MAX);
        assert_eq!(config.poll_interval_ms, u64::MAX);

        let config = StreamConfig::default().with_poll_interval(Duration::from_millis(1500));
        assert_eq!(config.poll_interval_ms, 1500);
    }

    #[test]
    fn test_short_interval_is_allowed() {
        let config = StreamConfig::default().with_poll_interval(Duration::from_millis(100));
        assert!(config.validate().is_ok());
    }
}
