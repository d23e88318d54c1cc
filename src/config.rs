use std::path::Path;
use std::time::Duration;

use anyhow::Context as _;
use mac_address::MacAddress;
use serde_derive::Deserialize;

pub const DEFAULT_SCAN_TIMEOUT_MILLIS: u64 = 50;
pub const DEFAULT_MAX_RESULTS: usize = 10;
pub const DEFAULT_QUEUE_CAPACITY: usize = 25;
pub const DEFAULT_POLL_INTERVAL_MILLIS: u64 = 10;

#[derive(Deserialize, Debug, Clone)]
pub struct AppConfig {
    pub mqtt: Option<MqttConfig>,
    pub scan: Option<ScanConfig>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct MqttConfig {
    pub host: String,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub publisher_id: Option<String>,
    pub topic_path: Option<String>,
    pub keep_alive_seconds: Option<u64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
pub struct ScanConfig {
    pub scan_timeout_millis: Option<u64>,
    pub max_results: Option<usize>,
    pub queue_capacity: Option<usize>,
    pub poll_interval_millis: Option<u64>,
    /// Restricts the filter to a single beacon address.
    pub device_address: Option<MacAddress>,
}

impl ScanConfig {
    pub fn scan_timeout(&self) -> Duration {
        Duration::from_millis(
            self.scan_timeout_millis
                .unwrap_or(DEFAULT_SCAN_TIMEOUT_MILLIS),
        )
    }

    pub fn max_results(&self) -> usize {
        self.max_results.unwrap_or(DEFAULT_MAX_RESULTS).max(1)
    }

    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity.unwrap_or(DEFAULT_QUEUE_CAPACITY).max(1)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(
            self.poll_interval_millis
                .unwrap_or(DEFAULT_POLL_INTERVAL_MILLIS)
                .max(1),
        )
    }
}

impl AppConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config = toml::de::from_str(&contents)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        Ok(config)
    }

    pub fn scan(&self) -> ScanConfig {
        self.scan.clone().unwrap_or_default()
    }
}
