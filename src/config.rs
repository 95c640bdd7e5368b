use serde::{Deserialize, Deserializer};
use std::time::Duration;
use thiserror::Error;

use crate::feed::{parse_offset, AltitudeUnit, FeedSettings, TimeNormalizer, TimePolicy};

const DEFAULT_LOCAL_OFFSET: &str = "+9h";
/// One wall second plays back at most about eleven and a half days.
const MAX_MULTIPLIER: f64 = 1_000_000.0;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid {field}: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub feed: FeedConfig,
    pub time: TimeConfig,
    /// Unit of `alt` on the wire. Deliberately has no default.
    pub altitude_unit: AltitudeUnit,
    #[serde(default)]
    pub clock: ClockConfig,
    #[serde(default)]
    pub web: WebConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    #[serde(default = "default_url")]
    pub url: String,
    #[serde(default = "default_connect_timeout", deserialize_with = "de_duration")]
    pub connect_timeout: Duration,
    #[serde(default)]
    pub reconnect: ReconnectConfig,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            connect_timeout: default_connect_timeout(),
            reconnect: ReconnectConfig::default(),
        }
    }
}

fn default_url() -> String {
    "ws://localhost:3000".to_string()
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(5)
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReconnectConfig {
    #[serde(default = "default_initial_delay", deserialize_with = "de_duration")]
    pub initial_delay: Duration,
    #[serde(default = "default_max_delay", deserialize_with = "de_duration")]
    pub max_delay: Duration,
    /// Give up after this many consecutive failures. `None` retries forever.
    #[serde(default)]
    pub max_attempts: Option<u32>,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: default_initial_delay(),
            max_delay: default_max_delay(),
            max_attempts: None,
        }
    }
}

fn default_initial_delay() -> Duration {
    Duration::from_secs(1)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(30)
}

#[derive(Debug, Clone, Deserialize)]
pub struct TimeConfig {
    pub policy: TimePolicy,
    #[serde(default)]
    pub local_offset: Option<String>,
}

impl TimeConfig {
    pub fn normalizer(&self) -> Result<TimeNormalizer, ConfigError> {
        match self.policy {
            TimePolicy::StrictIso => {
                if self.local_offset.is_some() {
                    log::warn!("time.local_offset is ignored under the strict_iso policy");
                }
                Ok(TimeNormalizer::strict_iso())
            }
            TimePolicy::LocalShift => {
                let raw = self.local_offset.as_deref().unwrap_or(DEFAULT_LOCAL_OFFSET);
                let offset = parse_offset(raw).map_err(|message| ConfigError::Invalid {
                    field: "time.local_offset",
                    message,
                })?;
                Ok(TimeNormalizer::local_shift(offset))
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClockConfig {
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
    #[serde(default = "default_tick_interval", deserialize_with = "de_duration")]
    pub tick_interval: Duration,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            multiplier: default_multiplier(),
            tick_interval: default_tick_interval(),
        }
    }
}

fn default_multiplier() -> f64 {
    1.0
}

fn default_tick_interval() -> Duration {
    Duration::from_millis(50)
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

fn de_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    humantime::parse_duration(s.trim()).map_err(serde::de::Error::custom)
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    pub fn from_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        fn invalid(field: &'static str, message: &str) -> Result<(), ConfigError> {
            Err(ConfigError::Invalid {
                field,
                message: message.to_string(),
            })
        }

        if !self.feed.url.starts_with("ws://") {
            return invalid("feed.url", "expected a ws:// url");
        }
        if self.feed.reconnect.initial_delay > self.feed.reconnect.max_delay {
            return invalid("feed.reconnect", "initial_delay exceeds max_delay");
        }
        if !self.clock.multiplier.is_finite() || self.clock.multiplier < 0.0 {
            return invalid("clock.multiplier", "must be a non-negative number");
        }
        if self.clock.multiplier > MAX_MULTIPLIER {
            return invalid("clock.multiplier", "must not exceed 1e6");
        }
        if self.clock.tick_interval.is_zero() {
            return invalid("clock.tick_interval", "must be greater than zero");
        }
        self.time.normalizer()?;
        Ok(())
    }

    pub fn feed_settings(&self) -> Result<FeedSettings, ConfigError> {
        Ok(FeedSettings {
            normalizer: self.time.normalizer()?,
            altitude_unit: self.altitude_unit,
            clock_multiplier: self.clock.multiplier,
        })
    }
}
