//! Process configuration shared by the collector and the dashboard.
//!
//! A [`TrackerConfig`] is built once at startup and passed by reference to
//! every component. Every field has a default; the builder and the
//! environment overrides only change what differs.

use crate::classify::Thresholds;
use crate::types::city::{default_cities, City};
use crate::weather::client::{DEFAULT_API_BASE_URL, DEFAULT_REQUEST_TIMEOUT};
use crate::weather::retry::RetryPolicy;
use bon::Builder;
use std::net::{AddrParseError, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_DATA_FILE: &str = "data/weather_anomalies.csv";
pub const DEFAULT_DEDUP_WINDOW: Duration = Duration::from_secs(300);
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(600);
pub const DEFAULT_LISTEN_PORT: u16 = 8501;

pub const ENV_DATA_FILE: &str = "WEATHER_ANOMALY_DATA_FILE";
pub const ENV_API_URL: &str = "WEATHER_ANOMALY_API_URL";
pub const ENV_LISTEN_ADDR: &str = "WEATHER_ANOMALY_ADDR";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Environment variable {0} is set but empty")]
    EmptyValue(&'static str),

    #[error("Invalid listen address '{value}' in {var}")]
    InvalidAddress {
        var: &'static str,
        value: String,
        #[source]
        source: AddrParseError,
    },
}

/// Configuration for one process.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use weather_anomalies::TrackerConfig;
///
/// let config = TrackerConfig::builder()
///     .data_file("/tmp/anomalies.csv")
///     .dedup_window(Duration::from_secs(60))
///     .build();
/// assert_eq!(config.cities.len(), 6);
/// ```
#[derive(Debug, Clone, Builder)]
pub struct TrackerConfig {
    /// Cities to poll, in collection order.
    #[builder(default = default_cities())]
    pub cities: Vec<City>,

    #[builder(default)]
    pub thresholds: Thresholds,

    /// A run starting less than this long after the last logged run is skipped.
    #[builder(default = DEFAULT_DEDUP_WINDOW)]
    pub dedup_window: Duration,

    #[builder(into, default = PathBuf::from(DEFAULT_DATA_FILE))]
    pub data_file: PathBuf,

    #[builder(into, default = DEFAULT_API_BASE_URL.to_string())]
    pub api_base_url: String,

    #[builder(default = DEFAULT_REQUEST_TIMEOUT)]
    pub request_timeout: Duration,

    #[builder(default)]
    pub retry: RetryPolicy,

    /// How long the dashboard serves a loaded dataset before reading the file again.
    #[builder(default = DEFAULT_CACHE_TTL)]
    pub cache_ttl: Duration,

    #[builder(default = SocketAddr::from(([127, 0, 0, 1], DEFAULT_LISTEN_PORT)))]
    pub listen_addr: SocketAddr,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl TrackerConfig {
    /// Default configuration with overrides read from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from a key lookup. Unset keys keep their current value.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = non_empty(&lookup, ENV_DATA_FILE)? {
            self.data_file = PathBuf::from(path);
        }
        if let Some(url) = non_empty(&lookup, ENV_API_URL)? {
            self.api_base_url = url;
        }
        if let Some(addr) = non_empty(&lookup, ENV_LISTEN_ADDR)? {
            self.listen_addr = addr
                .parse()
                .map_err(|source| ConfigError::InvalidAddress {
                    var: ENV_LISTEN_ADDR,
                    value: addr.clone(),
                    source,
                })?;
        }
        Ok(self)
    }

    /// Names of every registry city, in collection order.
    pub fn city_names(&self) -> impl Iterator<Item = &str> {
        self.cities.iter().map(|c| c.name.as_str())
    }
}

fn non_empty<F>(lookup: &F, var: &'static str) -> Result<Option<String>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        Some(value) if value.trim().is_empty() => Err(ConfigError::EmptyValue(var)),
        Some(value) => Ok(Some(value.trim().to_string())),
        None => Ok(None),
    }
}
