use crate::types::{CountryConfig, CountryPolicy, ScanConfig, ScanType};
use crate::{Error, Result};
use serde::Deserialize;
use std::time::Duration;

/// How `scan` waits for the driver to finish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanWait {
    /// Use the driver's synchronous scan primitive, bounded by the timeout.
    Blocking,
    /// Start the scan and wait for the scan-done event.
    Event,
}

/// Runtime configuration of a [`crate::WifiManager`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerConfig {
    /// Maximum number of records kept from one scan.
    pub scan_capacity: usize,
    /// Upper bound on the whole scan wait.
    pub scan_timeout: Duration,
    pub dwell_min: Duration,
    pub dwell_max: Duration,
    pub show_hidden: bool,
    pub scan_wait: ScanWait,
    pub country: Option<CountryConfig>,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            scan_capacity: 50,
            scan_timeout: Duration::from_millis(5000),
            dwell_min: Duration::from_millis(100),
            dwell_max: Duration::from_millis(200),
            show_hidden: true,
            scan_wait: ScanWait::Blocking,
            country: None,
        }
    }
}

impl ManagerConfig {
    /// Parses a standalone manager config document.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let parsed: ManagerConfigFile = toml::from_str(s)?;
        Self::try_from(parsed)
    }

    pub fn validate(&self) -> Result<()> {
        if self.scan_capacity == 0 {
            return Err(Error::ConfigInvalid("scan_capacity must be at least 1".into()));
        }
        if self.scan_timeout.is_zero() {
            return Err(Error::ConfigInvalid("scan_timeout_ms must be positive".into()));
        }
        if self.dwell_min > self.dwell_max {
            return Err(Error::ConfigInvalid(format!(
                "dwell_min_ms ({:?}) exceeds dwell_max_ms ({:?})",
                self.dwell_min, self.dwell_max
            )));
        }
        if let Some(country) = &self.country {
            if country.code.len() != 2 || !country.code.bytes().all(|b| b.is_ascii_alphabetic()) {
                return Err(Error::ConfigInvalid(format!(
                    "country code {:?} is not two ASCII letters",
                    country.code
                )));
            }
            let last = u16::from(country.start_channel) + u16::from(country.channel_count);
            if country.start_channel == 0 || country.channel_count == 0 || last > 15 {
                return Err(Error::ConfigInvalid(format!(
                    "country channels {}+{} outside 1..=14",
                    country.start_channel, country.channel_count
                )));
            }
        }
        Ok(())
    }

    /// Active scan across all channels, hidden networks included when configured.
    pub fn scan_config(&self) -> ScanConfig {
        ScanConfig {
            ssid: None,
            bssid: None,
            channel: 0,
            show_hidden: self.show_hidden,
            scan_type: ScanType::Active,
            dwell_min: self.dwell_min,
            dwell_max: self.dwell_max,
        }
    }
}

/// File shape of the manager section, every key optional.
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ManagerConfigFile {
    scan_capacity: usize,
    scan_timeout_ms: u64,
    dwell_min_ms: u64,
    dwell_max_ms: u64,
    show_hidden: bool,
    scan_wait: ScanWait,
    country: Option<CountryConfigFile>,
}

impl Default for ManagerConfigFile {
    fn default() -> Self {
        let d = ManagerConfig::default();
        Self {
            scan_capacity: d.scan_capacity,
            scan_timeout_ms: d.scan_timeout.as_millis() as u64,
            dwell_min_ms: d.dwell_min.as_millis() as u64,
            dwell_max_ms: d.dwell_max.as_millis() as u64,
            show_hidden: d.show_hidden,
            scan_wait: d.scan_wait,
            country: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CountryConfigFile {
    code: String,
    #[serde(default = "default_start_channel")]
    start_channel: u8,
    #[serde(default = "default_channel_count")]
    channel_count: u8,
    #[serde(default = "default_max_tx_power")]
    max_tx_power_dbm: i8,
    #[serde(default = "default_manual")]
    manual: bool,
}

fn default_start_channel() -> u8 {
    1
}

fn default_channel_count() -> u8 {
    13
}

fn default_max_tx_power() -> i8 {
    20
}

fn default_manual() -> bool {
    true
}

impl From<CountryConfigFile> for CountryConfig {
    fn from(t: CountryConfigFile) -> Self {
        CountryConfig {
            code: t.code.to_ascii_uppercase(),
            start_channel: t.start_channel,
            channel_count: t.channel_count,
            max_tx_power_dbm: t.max_tx_power_dbm,
            policy: if t.manual {
                CountryPolicy::Manual
            } else {
                CountryPolicy::Auto
            },
        }
    }
}

impl TryFrom<ManagerConfigFile> for ManagerConfig {
    type Error = Error;

    fn try_from(t: ManagerConfigFile) -> Result<Self> {
        let config = ManagerConfig {
            scan_capacity: t.scan_capacity,
            scan_timeout: Duration::from_millis(t.scan_timeout_ms),
            dwell_min: Duration::from_millis(t.dwell_min_ms),
            dwell_max: Duration::from_millis(t.dwell_max_ms),
            show_hidden: t.show_hidden,
            scan_wait: t.scan_wait,
            country: t.country.map(CountryConfig::from),
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = ManagerConfig::from_toml_str("").unwrap();
        assert_eq!(config, ManagerConfig::default());
        assert_eq!(config.scan_capacity, 50);
        assert_eq!(config.scan_wait, ScanWait::Blocking);
    }

    #[test]
    fn parses_full_document() {
        let config = ManagerConfig::from_toml_str(
            r#"
            scan_capacity = 8
            scan_timeout_ms = 3000
            dwell_min_ms = 50
            dwell_max_ms = 120
            show_hidden = false
            scan_wait = "event"

            [country]
            code = "br"
            "#,
        )
        .unwrap();
        assert_eq!(config.scan_capacity, 8);
        assert_eq!(config.scan_timeout, Duration::from_secs(3));
        assert_eq!(config.scan_wait, ScanWait::Event);
        let country = config.country.unwrap();
        assert_eq!(country.code, "BR");
        assert_eq!((country.start_channel, country.channel_count), (1, 13));
        assert_eq!(country.policy, CountryPolicy::Manual);

        let scan = ManagerConfig::default().scan_config();
        assert_eq!(scan.channel, 0);
        assert_eq!(scan.scan_type, ScanType::Active);
        assert!(scan.show_hidden);
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(matches!(
            ManagerConfig::from_toml_str("scan_capacity = 0"),
            Err(Error::ConfigInvalid(_))
        ));
        assert!(matches!(
            ManagerConfig::from_toml_str("dwell_min_ms = 300"),
            Err(Error::ConfigInvalid(_))
        ));
        assert!(matches!(
            ManagerConfig::from_toml_str("[country]\ncode = \"BRA\""),
            Err(Error::ConfigInvalid(_))
        ));
        assert!(matches!(
            ManagerConfig::from_toml_str("[country]\ncode = \"US\"\nstart_channel = 10\nchannel_count = 6"),
            Err(Error::ConfigInvalid(_))
        ));
        assert!(matches!(
            ManagerConfig::from_toml_str("bogus = 1"),
            Err(Error::Config(_))
        ));
    }
}
