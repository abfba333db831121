//! Transceiver abstraction used by the scanner.
//!
//! The [`Transceiver`] trait is the seam between the scanning loop and a
//! concrete radio: the Linux nRF24L01 backend on hardware, or the
//! [`SimulatedRadio`] in tests and demos.

#[cfg(target_os = "linux")]
pub mod linux;
pub mod simulated;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::RadioConfig;
use crate::error::Result;

pub use simulated::SimulatedRadio;

/// Highest channel an nRF24L01 can tune to.
pub const MAX_CHANNEL: u8 = 125;

/// Number of supported channels (0..=125).
pub const NUM_CHANNELS: usize = MAX_CHANNEL as usize + 1;

/// Base frequency of channel 0 in MHz.
pub const BASE_FREQUENCY_MHZ: u16 = 2400;

/// Reading pipe addresses used to pick up noise.
///
/// With a 2-byte address width these look like an RF preamble, so the radio
/// treats background energy as the start of a packet.
pub const NOISE_ADDRESSES: [[u8; 2]; 2] = [[0x00, 0x55], [0x00, 0xAA]];

/// Air data rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DataRate {
    /// 1 Mbps.
    #[default]
    #[serde(rename = "1mbps")]
    Mbps1,
    /// 2 Mbps.
    #[serde(rename = "2mbps")]
    Mbps2,
    /// 250 kbps.
    #[serde(rename = "250kbps")]
    Kbps250,
}

impl DataRate {
    /// All rates in menu order.
    pub const ALL: [Self; 3] = [Self::Mbps1, Self::Mbps2, Self::Kbps250];

    /// Resolve an interactive menu answer.
    ///
    /// Only the first character matters: `'2'` selects 2 Mbps, `'3'` selects
    /// 250 kbps, anything else (including an empty line) falls back to 1 Mbps.
    #[must_use]
    pub fn from_menu_choice(input: &str) -> Self {
        match input.chars().next() {
            Some('2') => Self::Mbps2,
            Some('3') => Self::Kbps250,
            _ => Self::Mbps1,
        }
    }
}

impl fmt::Display for DataRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mbps1 => write!(f, "1 Mbps"),
            Self::Mbps2 => write!(f, "2 Mbps"),
            Self::Kbps250 => write!(f, "250 kbps"),
        }
    }
}

/// Frequency of `channel` in MHz.
#[must_use]
pub fn frequency_mhz(channel: u8) -> u16 {
    BASE_FREQUENCY_MHZ + u16::from(channel)
}

/// A snapshot of the radio's configuration for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RadioDetails {
    /// Backend that produced the snapshot.
    pub backend: String,
    /// Currently tuned channel.
    pub channel: u8,
    /// Air data rate.
    pub data_rate: DataRate,
    /// Whether the CRC is enabled.
    pub crc_enabled: bool,
    /// Address width in bytes.
    pub address_width: u8,
    /// Auto-acknowledgement bitmask (one bit per pipe).
    pub auto_ack: u8,
    /// Enabled reading pipes bitmask.
    pub rx_pipes: u8,
    /// Pipe 0 address, LSB first.
    pub pipe0_address: Vec<u8>,
    /// Pipe 1 address, LSB first.
    pub pipe1_address: Vec<u8>,
    /// Whether the radio is powered up.
    pub powered: bool,
    /// Whether the radio is in primary RX mode.
    pub primary_rx: bool,
}

impl fmt::Display for RadioDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Backend\t\t\t= {}", self.backend)?;
        writeln!(
            f,
            "Channel\t\t\t= {} ({} MHz)",
            self.channel,
            frequency_mhz(self.channel)
        )?;
        writeln!(f, "Data Rate\t\t= {}", self.data_rate)?;
        writeln!(
            f,
            "CRC Length\t\t= {}",
            if self.crc_enabled { "enabled" } else { "Disabled" }
        )?;
        writeln!(f, "Address Length\t\t= {} bytes", self.address_width)?;
        writeln!(f, "Auto Acknowledgment\t= {:#08b}", self.auto_ack)?;
        writeln!(f, "Enabled RX Pipes\t= {:#08b}", self.rx_pipes)?;
        writeln!(f, "Pipe 0 Address\t\t= {}", hex_address(&self.pipe0_address))?;
        writeln!(f, "Pipe 1 Address\t\t= {}", hex_address(&self.pipe1_address))?;
        writeln!(
            f,
            "Power Mode\t\t= {}",
            if self.powered { "Standby-I" } else { "Power Down" }
        )?;
        write!(
            f,
            "Primary Mode\t\t= {}",
            if self.primary_rx { "RX" } else { "TX" }
        )
    }
}

/// Render an LSB-first address as MSB-first hex.
fn hex_address(address: &[u8]) -> String {
    let digits: String = address.iter().rev().map(|b| format!("{b:02X}")).collect();
    format!("0x{digits}")
}

/// Open the radio to scan with.
///
/// `simulate` selects the [`SimulatedRadio::demo`] noise profile; otherwise
/// the nRF24L01 described by `config` is opened.
///
/// # Errors
///
/// Returns an error if the hardware cannot be opened, or if hardware is
/// requested on a platform without a backend.
pub fn open_backend(config: &RadioConfig, simulate: bool) -> Result<Box<dyn Transceiver>> {
    if simulate {
        tracing::info!("using simulated radio");
        return Ok(Box::new(SimulatedRadio::demo()));
    }

    #[cfg(target_os = "linux")]
    {
        tracing::debug!(spi = %config.spi_device.display(), ce_pin = config.ce_pin, "opening radio");
        Ok(Box::new(linux::open(config)?))
    }

    #[cfg(not(target_os = "linux"))]
    {
        let _ = config;
        Err(crate::error::Error::backend_unavailable(
            "hardware scanning requires Linux; pass --simulate to use a simulated radio",
        ))
    }
}

/// A radio the scanner can drive.
///
/// The method set mirrors what a channel scan needs: configuration, moving
/// between standby and RX, tuning, and sampling the received power detector.
pub trait Transceiver: Send {
    /// Initialize the hardware.
    ///
    /// Returns `false` if the radio does not respond.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying bus fails.
    fn begin(&mut self) -> Result<bool>;

    /// Set the air data rate.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying bus fails.
    fn set_data_rate(&mut self, rate: DataRate) -> Result<()>;

    /// Enable or disable auto-acknowledgement on all pipes.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying bus fails.
    fn set_auto_ack(&mut self, enabled: bool) -> Result<()>;

    /// Disable the CRC so that any received frame is accepted.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying bus fails.
    fn disable_crc(&mut self) -> Result<()>;

    /// Set the address width in bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying bus fails.
    fn set_address_width(&mut self, width: u8) -> Result<()>;

    /// Open a reading pipe on `address` (LSB first).
    ///
    /// # Errors
    ///
    /// Returns an error for unsupported pipes or if the bus fails.
    fn open_reading_pipe(&mut self, pipe: u8, address: &[u8]) -> Result<()>;

    /// Enter RX mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying bus fails.
    fn start_listening(&mut self) -> Result<()>;

    /// Leave RX mode for standby.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying bus fails.
    fn stop_listening(&mut self) -> Result<()>;

    /// Discard any received payloads.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying bus fails.
    fn flush_rx(&mut self) -> Result<()>;

    /// Tune to `channel`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidChannel`] above [`MAX_CHANNEL`], or an
    /// error if the bus fails.
    fn set_channel(&mut self, channel: u8) -> Result<()>;

    /// Sample the received power detector.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying bus fails.
    fn test_rpd(&mut self) -> Result<bool>;

    /// Power the radio down.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying bus fails.
    fn power_down(&mut self) -> Result<()>;

    /// Read back the current configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying bus fails.
    fn details(&mut self) -> Result<RadioDetails>;
}

impl<T: Transceiver + ?Sized> Transceiver for Box<T> {
    fn begin(&mut self) -> Result<bool> {
        (**self).begin()
    }

    fn set_data_rate(&mut self, rate: DataRate) -> Result<()> {
        (**self).set_data_rate(rate)
    }

    fn set_auto_ack(&mut self, enabled: bool) -> Result<()> {
        (**self).set_auto_ack(enabled)
    }

    fn disable_crc(&mut self) -> Result<()> {
        (**self).disable_crc()
    }

    fn set_address_width(&mut self, width: u8) -> Result<()> {
        (**self).set_address_width(width)
    }

    fn open_reading_pipe(&mut self, pipe: u8, address: &[u8]) -> Result<()> {
        (**self).open_reading_pipe(pipe, address)
    }

    fn start_listening(&mut self) -> Result<()> {
        (**self).start_listening()
    }

    fn stop_listening(&mut self) -> Result<()> {
        (**self).stop_listening()
    }

    fn flush_rx(&mut self) -> Result<()> {
        (**self).flush_rx()
    }

    fn set_channel(&mut self, channel: u8) -> Result<()> {
        (**self).set_channel(channel)
    }

    fn test_rpd(&mut self) -> Result<bool> {
        (**self).test_rpd()
    }

    fn power_down(&mut self) -> Result<()> {
        (**self).power_down()
    }

    fn details(&mut self) -> Result<RadioDetails> {
        (**self).details()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_menu_choice() {
        assert_eq!(DataRate::from_menu_choice("1"), DataRate::Mbps1);
        assert_eq!(DataRate::from_menu_choice("2"), DataRate::Mbps2);
        assert_eq!(DataRate::from_menu_choice("3"), DataRate::Kbps250);
    }

    #[test]
    fn test_from_menu_choice_defaults_to_1mbps() {
        assert_eq!(DataRate::from_menu_choice(""), DataRate::Mbps1);
        assert_eq!(DataRate::from_menu_choice("9"), DataRate::Mbps1);
        assert_eq!(DataRate::from_menu_choice("fast"), DataRate::Mbps1);
    }

    #[test]
    fn test_from_menu_choice_uses_first_char_only() {
        assert_eq!(DataRate::from_menu_choice("25"), DataRate::Mbps2);
        assert_eq!(DataRate::from_menu_choice("3 please"), DataRate::Kbps250);
        assert_eq!(DataRate::from_menu_choice(" 2"), DataRate::Mbps1);
    }

    #[test]
    fn test_data_rate_display() {
        assert_eq!(DataRate::Mbps1.to_string(), "1 Mbps");
        assert_eq!(DataRate::Mbps2.to_string(), "2 Mbps");
        assert_eq!(DataRate::Kbps250.to_string(), "250 kbps");
    }

    #[test]
    fn test_data_rate_serde_names() {
        assert_eq!(
            serde_json::to_string(&DataRate::Kbps250).unwrap(),
            "\"250kbps\""
        );
        let rate: DataRate = serde_json::from_str("\"2mbps\"").unwrap();
        assert_eq!(rate, DataRate::Mbps2);
    }

    #[test]
    fn test_frequency_mhz() {
        assert_eq!(frequency_mhz(0), 2400);
        assert_eq!(frequency_mhz(76), 2476);
        assert_eq!(frequency_mhz(MAX_CHANNEL), 2525);
    }

    #[test]
    fn test_num_channels() {
        assert_eq!(NUM_CHANNELS, 126);
    }

    #[test]
    fn test_hex_address_is_msb_first() {
        assert_eq!(hex_address(&NOISE_ADDRESSES[0]), "0x5500");
        assert_eq!(hex_address(&NOISE_ADDRESSES[1]), "0xAA00");
    }

    #[test]
    fn test_open_backend_simulated() {
        let mut radio = open_backend(&RadioConfig::default(), true).unwrap();
        assert!(radio.begin().unwrap());
        assert_eq!(radio.details().unwrap().backend, "simulated");
    }

    #[test]
    fn test_open_backend_missing_hardware() {
        let config = RadioConfig {
            spi_device: "/nonexistent/spidev".into(),
            ..RadioConfig::default()
        };
        assert!(open_backend(&config, false).is_err());
    }

    #[test]
    fn test_details_display() {
        let details = RadioDetails {
            backend: "simulated".to_string(),
            channel: 76,
            data_rate: DataRate::Mbps2,
            crc_enabled: false,
            address_width: 2,
            auto_ack: 0,
            rx_pipes: 0b11,
            pipe0_address: vec![0x00, 0x55],
            pipe1_address: vec![0x00, 0xAA],
            powered: true,
            primary_rx: false,
        };
        let text = details.to_string();
        assert!(text.contains("2476 MHz"));
        assert!(text.contains("2 Mbps"));
        assert!(text.contains("Disabled"));
        assert!(text.contains("0xAA00"));
        assert!(text.contains("Standby-I"));
    }
}
