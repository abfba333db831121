//! Configuration management for rfscan.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.
//!
//! Environment variables take the `RFSCAN_` prefix and a double underscore
//! between section and key, e.g. `RFSCAN_SCAN__DATA_RATE=2mbps`.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::radio::{DataRate, NUM_CHANNELS};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default configuration directory name.
const CONFIG_DIR_NAME: &str = "rfscan";

/// Environment variable prefix.
const ENV_PREFIX: &str = "RFSCAN_";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `RFSCAN_`)
/// 2. TOML config file at `~/.config/rfscan/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Radio wiring.
    pub radio: RadioConfig,
    /// Scan parameters.
    pub scan: ScanConfig,
}

/// How the radio is wired to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadioConfig {
    /// spidev node the radio's CSN is wired to (`/dev/spidev<bus>.<cs>`).
    pub spi_device: PathBuf,
    /// SPI clock in Hz.
    pub spi_speed_hz: u32,
    /// GPIO character device holding the CE line.
    pub gpio_chip: PathBuf,
    /// GPIO line offset of the CE pin (BCM numbering on a Raspberry Pi).
    pub ce_pin: u32,
}

/// Scan parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Air data rate used when none is chosen on the command line.
    pub data_rate: DataRate,
    /// Number of channels to sweep, starting at channel 0.
    pub num_channels: usize,
    /// Sweeps summarized by each output line.
    pub passes_per_line: u32,
    /// Time spent listening on each channel, in microseconds.
    pub dwell_us: u64,
    /// Number of recent sweeps remembered per channel.
    pub history_depth: usize,
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            spi_device: PathBuf::from("/dev/spidev0.0"),
            spi_speed_hz: 10_000_000,
            gpio_chip: PathBuf::from("/dev/gpiochip0"),
            ce_pin: 22,
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            data_rate: DataRate::Mbps1,
            num_channels: NUM_CHANNELS,
            passes_per_line: 100,
            dwell_us: 130,
            history_depth: 5,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.scan.num_channels == 0 || self.scan.num_channels > NUM_CHANNELS {
            return Err(Error::ConfigValidation {
                message: format!(
                    "num_channels must be between 1 and {NUM_CHANNELS} (got {})",
                    self.scan.num_channels
                ),
            });
        }

        if self.scan.passes_per_line == 0 {
            return Err(Error::ConfigValidation {
                message: "passes_per_line must be greater than 0".to_string(),
            });
        }

        if self.scan.dwell_us == 0 {
            return Err(Error::ConfigValidation {
                message: "dwell_us must be greater than 0".to_string(),
            });
        }

        if self.scan.history_depth == 0 {
            return Err(Error::ConfigValidation {
                message: "history_depth must be greater than 0".to_string(),
            });
        }

        if self.radio.spi_speed_hz == 0 {
            return Err(Error::ConfigValidation {
                message: "spi_speed_hz must be greater than 0".to_string(),
            });
        }

        Ok(())
    }

    /// Get the listen dwell as a Duration.
    #[must_use]
    pub fn dwell(&self) -> Duration {
        Duration::from_micros(self.scan.dwell_us)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.scan.data_rate, DataRate::Mbps1);
        assert_eq!(config.scan.num_channels, 126);
        assert_eq!(config.scan.passes_per_line, 100);
        assert_eq!(config.scan.dwell_us, 130);
        assert_eq!(config.scan.history_depth, 5);
    }

    #[test]
    fn test_default_radio_config() {
        let radio = RadioConfig::default();

        assert_eq!(radio.spi_device, PathBuf::from("/dev/spidev0.0"));
        assert_eq!(radio.gpio_chip, PathBuf::from("/dev/gpiochip0"));
        assert_eq!(radio.ce_pin, 22);
        assert_eq!(radio.spi_speed_hz, 10_000_000);
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_zero_channels() {
        let mut config = Config::default();
        config.scan.num_channels = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("num_channels"));
    }

    #[test]
    fn test_validate_too_many_channels() {
        let mut config = Config::default();
        config.scan.num_channels = 127;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("got 127"));
    }

    #[test]
    fn test_validate_zero_passes() {
        let mut config = Config::default();
        config.scan.passes_per_line = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("passes_per_line"));
    }

    #[test]
    fn test_validate_zero_dwell() {
        let mut config = Config::default();
        config.scan.dwell_us = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("dwell_us"));
    }

    #[test]
    fn test_validate_zero_history() {
        let mut config = Config::default();
        config.scan.history_depth = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("history_depth"));
    }

    #[test]
    fn test_validate_zero_spi_speed() {
        let mut config = Config::default();
        config.radio.spi_speed_hz = 0;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_dwell() {
        assert_eq!(Config::default().dwell(), Duration::from_micros(130));
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.to_string_lossy().contains("rfscan"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_load_nonexistent_config() {
        figment::Jail::expect_with(|_jail| {
            let config = Config::load_from(Some(PathBuf::from("/nonexistent/config.toml")))
                .map_err(|e| e.to_string())?;
            assert_eq!(config, Config::default());
            Ok(())
        });
    }

    #[test]
    fn test_load_from_toml_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "rfscan.toml",
                r#"
                [radio]
                spi_device = "/dev/spidev1.0"
                ce_pin = 25

                [scan]
                data_rate = "250kbps"
                passes_per_line = 20
                "#,
            )?;

            let config = Config::load_from(Some(PathBuf::from("rfscan.toml")))
                .map_err(|e| e.to_string())?;
            assert_eq!(config.radio.spi_device, PathBuf::from("/dev/spidev1.0"));
            assert_eq!(config.radio.ce_pin, 25);
            assert_eq!(config.scan.data_rate, DataRate::Kbps250);
            assert_eq!(config.scan.passes_per_line, 20);
            // untouched values keep their defaults
            assert_eq!(config.scan.dwell_us, 130);
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("rfscan.toml", "[scan]\ndata_rate = \"250kbps\"\n")?;
            jail.set_env("RFSCAN_SCAN__DATA_RATE", "2mbps");
            jail.set_env("RFSCAN_RADIO__CE_PIN", "17");

            let config = Config::load_from(Some(PathBuf::from("rfscan.toml")))
                .map_err(|e| e.to_string())?;
            assert_eq!(config.scan.data_rate, DataRate::Mbps2);
            assert_eq!(config.radio.ce_pin, 17);
            Ok(())
        });
    }

    #[test]
    fn test_env_single_underscore_is_not_nested() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("RFSCAN_SCAN_DATA_RATE", "2mbps");

            let config = Config::load_from(Some(PathBuf::from("missing.toml")))
                .map_err(|e| e.to_string())?;
            assert_eq!(config.scan.data_rate, DataRate::Mbps1);
            Ok(())
        });
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("rfscan.toml", "[scan]\npasses_per_line = 0\n")?;

            let result = Config::load_from(Some(PathBuf::from("rfscan.toml")));
            assert!(matches!(result, Err(Error::ConfigValidation { .. })));
            Ok(())
        });
    }

    #[test]
    fn test_load_rejects_unknown_rate() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("rfscan.toml", "[scan]\ndata_rate = \"11mbps\"\n")?;

            let result = Config::load_from(Some(PathBuf::from("rfscan.toml")));
            assert!(matches!(result, Err(Error::ConfigLoad(_))));
            Ok(())
        });
    }

    #[test]
    fn test_scan_config_serialize() {
        let json = serde_json::to_string(&ScanConfig::default()).unwrap();
        assert!(json.contains("\"data_rate\":\"1mbps\""));
        assert!(json.contains("passes_per_line"));
    }

    #[test]
    fn test_scan_config_deserialize() {
        let json = r#"{"num_channels": 80, "dwell_us": 200}"#;
        let scan: ScanConfig = serde_json::from_str(json).unwrap();
        assert_eq!(scan.num_channels, 80);
        assert_eq!(scan.dwell_us, 200);
        assert_eq!(scan.passes_per_line, 100);
    }
}
