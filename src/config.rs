//! Configuration types for block-race

use crate::contestant::Roster;
use crate::report::ReportFormat;
use crate::telemetry::LogFormat;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Racing endpoints, in declaration order
    pub contestants: Vec<ContestantConfig>,
    pub race: RaceConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// One racing endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct ContestantConfig {
    /// Display name, unique within the roster
    pub name: String,
    /// WebSocket JSON-RPC endpoint used for the `newHeads` subscription
    pub ws_url: String,
    /// HTTP JSON-RPC endpoint; required for the primary contestant
    pub http_url: Option<String>,
}

/// Race settings
#[derive(Debug, Clone, Deserialize)]
pub struct RaceConfig {
    /// Contestant whose HTTP endpoint supplies canonical block timestamps.
    /// Has no advantage in the ranking.
    pub primary: String,

    /// Print aggregate statistics every this many settled blocks
    #[serde(default = "default_blocks_per_aggregate")]
    pub blocks_per_aggregate: u64,
}

fn default_blocks_per_aggregate() -> u64 {
    10
}

/// Feed transport settings shared by all contestants
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    /// Maximum reconnection attempts (0 = infinite)
    #[serde(default)]
    pub max_reconnects: u32,

    #[serde(default = "default_initial_reconnect_delay_ms")]
    pub initial_reconnect_delay_ms: u64,

    #[serde(default = "default_max_reconnect_delay_ms")]
    pub max_reconnect_delay_ms: u64,

    #[serde(default = "default_ping_interval_secs")]
    pub ping_interval_secs: u64,

    /// Timeout for block timestamp requests
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_initial_reconnect_delay_ms() -> u64 {
    1_000
}
fn default_max_reconnect_delay_ms() -> u64 {
    60_000
}
fn default_ping_interval_secs() -> u64 {
    30
}
fn default_request_timeout_secs() -> u64 {
    10
}

impl FeedConfig {
    pub fn initial_reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.initial_reconnect_delay_ms)
    }

    pub fn max_reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.max_reconnect_delay_ms)
    }

    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(self.ping_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            max_reconnects: 0,
            initial_reconnect_delay_ms: default_initial_reconnect_delay_ms(),
            max_reconnect_delay_ms: default_max_reconnect_delay_ms(),
            ping_interval_secs: default_ping_interval_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Result output settings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportConfig {
    #[serde(default)]
    pub format: ReportFormat,
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_format: LogFormat,
    /// Serve Prometheus metrics on this port when set
    pub metrics_port: Option<u16>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            metrics_port: None,
        }
    }
}

/// Startup configuration errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("at least one contestant must be configured")]
    NoContestants,

    #[error("contestant names must not be empty")]
    EmptyName,

    #[error("contestant {0:?} is declared more than once")]
    DuplicateContestant(String),

    #[error("primary contestant {0:?} is not in the contestant list")]
    UnknownPrimary(String),

    #[error("primary contestant {0:?} needs an http_url for block timestamps")]
    PrimaryWithoutHttpUrl(String),

    #[error("blocks_per_aggregate must be at least 1")]
    ZeroAggregatePeriod,
}

impl Config {
    /// Load and validate configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Like [`Config::load`], but a missing file is `Ok(None)`
    ///
    /// Any other read error, a parse error or a failed validation is
    /// returned as an error.
    pub fn load_if_exists(path: impl AsRef<std::path::Path>) -> anyhow::Result<Option<Self>> {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_toml(&content).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the rules that cannot be expressed in the TOML schema
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.roster()?;

        let primary = self
            .primary()
            .ok_or_else(|| ConfigError::UnknownPrimary(self.race.primary.clone()))?;
        if primary.http_url.is_none() {
            return Err(ConfigError::PrimaryWithoutHttpUrl(primary.name.clone()));
        }

        if self.race.blocks_per_aggregate == 0 {
            return Err(ConfigError::ZeroAggregatePeriod);
        }

        Ok(())
    }

    /// The contestant roster, in declaration order
    pub fn roster(&self) -> Result<Roster, ConfigError> {
        Roster::new(self.contestants.iter().map(|c| c.name.clone()))
    }

    /// Configuration of the primary contestant
    pub fn primary(&self) -> Option<&ContestantConfig> {
        self.contestants
            .iter()
            .find(|c| c.name == self.race.primary)
    }
}
