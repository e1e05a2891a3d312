use crate::debounce::{DEFAULT_COOLDOWN_CYCLES, DEFAULT_RECENT_CAPACITY, DebounceSettings};
use crate::feed::DEFAULT_FRAME_INTERVAL;
use crate::ledger::TollSchedule;
use crate::traffic::DEFAULT_MIN_CONFIDENCE;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";
pub const DEFAULT_SERVER_PORT: u16 = 8080;
pub const DEFAULT_NOTIFY_TIMEOUT_MS: u64 = 2000;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub app: AppSection,
    pub logging: LoggingSection,
    #[serde(default)]
    pub server: Option<ServerSection>,
    #[serde(default)]
    pub debounce: Option<DebounceSection>,
    #[serde(default)]
    pub toll: Option<TollSection>,
    #[serde(default)]
    pub detection: Option<DetectionSection>,
    #[serde(default)]
    pub notify: Option<NotifySection>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppSection {
    pub name: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSection {
    pub level: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSection {
    /// Port to listen on (default: 8080)
    pub port: Option<u16>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DebounceSection {
    /// Processing cycles during which no plate is confirmed after one is (default: 40)
    pub cooldown_cycles: Option<u32>,
    /// Recently confirmed plates kept for duplicate suppression (default: 10)
    pub recent_capacity: Option<usize>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TollSection {
    pub short_trip_minutes: Option<f64>,
    pub short_trip_fee: Option<u32>,
    pub medium_trip_minutes: Option<f64>,
    pub medium_trip_fee: Option<u32>,
    pub long_trip_fee: Option<u32>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DetectionSection {
    /// Detections at or below this confidence are not counted (default: 0.25)
    pub min_confidence: Option<f64>,
    /// JSON-lines file of recorded frames to replay at startup
    pub replay_path: Option<PathBuf>,
    pub frame_interval_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NotifySection {
    /// `http://` endpoint receiving each toll transaction
    pub endpoint: Option<String>,
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

pub fn load_default() -> Result<Config, ConfigError> {
    load_from_path(DEFAULT_CONFIG_PATH)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&contents)?;
    config.validate()?;
    Ok(config)
}

impl Config {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.debounce_settings().recent_capacity == 0 {
            return Err(ConfigError::Invalid(
                "debounce.recent_capacity must be at least 1".to_string(),
            ));
        }
        let schedule = self.toll_schedule();
        if !(schedule.short_trip_minutes >= 0.0
            && schedule.short_trip_minutes < schedule.medium_trip_minutes)
        {
            return Err(ConfigError::Invalid(
                "toll trip bounds must satisfy 0 <= short < medium".to_string(),
            ));
        }
        let min_confidence = self.min_confidence();
        if !(0.0..=1.0).contains(&min_confidence) {
            return Err(ConfigError::Invalid(
                "detection.min_confidence must be within [0, 1]".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the configured log level, falling back to INFO when unknown.
    pub fn log_level(&self) -> tracing::Level {
        self.logging.level.parse().unwrap_or(tracing::Level::INFO)
    }

    /// Returns the server port (default: 8080)
    pub fn server_port(&self) -> u16 {
        self.server
            .as_ref()
            .and_then(|s| s.port)
            .unwrap_or(DEFAULT_SERVER_PORT)
    }

    pub fn debounce_settings(&self) -> DebounceSettings {
        let section = self.debounce.as_ref();
        DebounceSettings {
            cooldown_cycles: section
                .and_then(|s| s.cooldown_cycles)
                .unwrap_or(DEFAULT_COOLDOWN_CYCLES),
            recent_capacity: section
                .and_then(|s| s.recent_capacity)
                .unwrap_or(DEFAULT_RECENT_CAPACITY),
        }
    }

    pub fn toll_schedule(&self) -> TollSchedule {
        let defaults = TollSchedule::default();
        let Some(section) = self.toll.as_ref() else {
            return defaults;
        };
        TollSchedule {
            short_trip_minutes: section
                .short_trip_minutes
                .unwrap_or(defaults.short_trip_minutes),
            short_trip_fee: section.short_trip_fee.unwrap_or(defaults.short_trip_fee),
            medium_trip_minutes: section
                .medium_trip_minutes
                .unwrap_or(defaults.medium_trip_minutes),
            medium_trip_fee: section.medium_trip_fee.unwrap_or(defaults.medium_trip_fee),
            long_trip_fee: section.long_trip_fee.unwrap_or(defaults.long_trip_fee),
        }
    }

    pub fn min_confidence(&self) -> f64 {
        self.detection
            .as_ref()
            .and_then(|d| d.min_confidence)
            .unwrap_or(DEFAULT_MIN_CONFIDENCE)
    }

    pub fn replay_path(&self) -> Option<&Path> {
        let path = self.detection.as_ref()?.replay_path.as_deref()?;
        if path.as_os_str().is_empty() {
            None
        } else {
            Some(path)
        }
    }

    pub fn frame_interval(&self) -> Duration {
        self.detection
            .as_ref()
            .and_then(|d| d.frame_interval_ms)
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_FRAME_INTERVAL)
    }

    /// Returns the notification endpoint, treating an empty string as unset.
    pub fn notify_endpoint(&self) -> Option<&str> {
        self.notify
            .as_ref()?
            .endpoint
            .as_deref()
            .filter(|endpoint| !endpoint.is_empty())
    }

    pub fn notify_timeout(&self) -> Duration {
        let millis = self
            .notify
            .as_ref()
            .and_then(|n| n.timeout_ms)
            .unwrap_or(DEFAULT_NOTIFY_TIMEOUT_MS);
        Duration::from_millis(millis)
    }
}
