//! [`Transceiver`] implementation on the `rf24-rs` driver.

use std::fmt;

use rfscan_linux::rf24_rs::radio::prelude::*;
use rfscan_linux::rf24_rs::{CrcLength, DataRate as AirRate};
use rfscan_linux::{BoardHardware, Radio};
use tracing::warn;

use super::{DataRate, RadioDetails, Transceiver, MAX_CHANNEL};
use crate::config::RadioConfig;
use crate::error::{Error, Result};

/// Pipes the nRF24L01 can listen on.
const PIPE_COUNT: usize = 6;

/// Auto-ack bits for all pipes.
const ALL_PIPES_MASK: u8 = 0b0011_1111;

/// An nRF24L01 on Linux, with the settings this crate programmed into it.
///
/// The driver does not read back per-pipe addresses or the auto-ack mask, so
/// those are remembered here for [`Transceiver::details`].
pub struct LinuxRadio {
    radio: Radio,
    auto_ack: bool,
    pipes: [Option<Vec<u8>>; PIPE_COUNT],
}

impl fmt::Debug for LinuxRadio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinuxRadio")
            .field("auto_ack", &self.auto_ack)
            .field("pipes", &self.pipes)
            .finish_non_exhaustive()
    }
}

impl LinuxRadio {
    /// Wrap a driver instance.
    #[must_use]
    pub fn new(radio: Radio) -> Self {
        Self {
            radio,
            auto_ack: true,
            pipes: Default::default(),
        }
    }

    fn rx_pipes(&self) -> u8 {
        self.pipes
            .iter()
            .enumerate()
            .filter(|(_, address)| address.is_some())
            .fold(0, |mask, (pipe, _)| mask | (1 << pipe))
    }

    fn pipe_address(&self, pipe: usize) -> Vec<u8> {
        self.pipes[pipe].clone().unwrap_or_default()
    }
}

/// Open the radio described by `config`.
///
/// # Errors
///
/// Returns an error if the SPI device or the CE line cannot be opened.
pub fn open(config: &RadioConfig) -> Result<LinuxRadio> {
    let board = BoardHardware::open(
        &config.spi_device,
        config.spi_speed_hz,
        &config.gpio_chip,
        config.ce_pin,
    )
    .map_err(|e| Error::radio("open", e.to_string()))?;
    Ok(LinuxRadio::new(board.into_radio()))
}

fn convert<E: fmt::Debug>(operation: &'static str, err: E) -> Error {
    Error::radio(operation, format!("{err:?}"))
}

fn air_rate(rate: DataRate) -> AirRate {
    match rate {
        DataRate::Mbps1 => AirRate::Mbps1,
        DataRate::Mbps2 => AirRate::Mbps2,
        DataRate::Kbps250 => AirRate::Kbps250,
    }
}

fn data_rate(rate: AirRate) -> DataRate {
    match rate {
        AirRate::Mbps2 => DataRate::Mbps2,
        AirRate::Kbps250 => DataRate::Kbps250,
        AirRate::Mbps1 => DataRate::Mbps1,
    }
}

fn check_channel(channel: u8) -> Result<()> {
    if channel > MAX_CHANNEL {
        return Err(Error::InvalidChannel {
            channel,
            max: MAX_CHANNEL,
        });
    }
    Ok(())
}

fn check_pipe(pipe: u8) -> Result<usize> {
    let index = usize::from(pipe);
    if index >= PIPE_COUNT {
        return Err(Error::InvalidPipe(pipe));
    }
    Ok(index)
}

impl Transceiver for LinuxRadio {
    fn begin(&mut self) -> Result<bool> {
        match self.radio.init() {
            Ok(()) => Ok(true),
            Err(e) => {
                warn!(error = ?e, "radio init failed");
                Ok(false)
            }
        }
    }

    fn set_data_rate(&mut self, rate: DataRate) -> Result<()> {
        self.radio
            .set_data_rate(air_rate(rate))
            .map_err(|e| convert("set_data_rate", e))
    }

    fn set_auto_ack(&mut self, enabled: bool) -> Result<()> {
        self.radio
            .set_auto_ack(enabled)
            .map_err(|e| convert("set_auto_ack", e))?;
        self.auto_ack = enabled;
        Ok(())
    }

    fn disable_crc(&mut self) -> Result<()> {
        self.radio
            .set_crc_length(CrcLength::Disabled)
            .map_err(|e| convert("disable_crc", e))
    }

    fn set_address_width(&mut self, width: u8) -> Result<()> {
        self.radio
            .set_address_length(width)
            .map_err(|e| convert("set_address_width", e))
    }

    fn open_reading_pipe(&mut self, pipe: u8, address: &[u8]) -> Result<()> {
        let index = check_pipe(pipe)?;
        self.radio
            .open_rx_pipe(pipe, address)
            .map_err(|e| convert("open_reading_pipe", e))?;
        self.pipes[index] = Some(address.to_vec());
        Ok(())
    }

    fn start_listening(&mut self) -> Result<()> {
        self.radio
            .as_rx()
            .map_err(|e| convert("start_listening", e))
    }

    fn stop_listening(&mut self) -> Result<()> {
        self.radio
            .as_tx()
            .map_err(|e| convert("stop_listening", e))
    }

    fn flush_rx(&mut self) -> Result<()> {
        self.radio.flush_rx().map_err(|e| convert("flush_rx", e))
    }

    fn set_channel(&mut self, channel: u8) -> Result<()> {
        check_channel(channel)?;
        self.radio
            .set_channel(channel)
            .map_err(|e| convert("set_channel", e))
    }

    fn test_rpd(&mut self) -> Result<bool> {
        self.radio.rpd().map_err(|e| convert("test_rpd", e))
    }

    fn power_down(&mut self) -> Result<()> {
        self.radio.power_down().map_err(|e| convert("power_down", e))
    }

    fn details(&mut self) -> Result<RadioDetails> {
        let channel = self
            .radio
            .get_channel()
            .map_err(|e| convert("details", e))?;
        let rate = self
            .radio
            .get_data_rate()
            .map_err(|e| convert("details", e))?;
        let crc = self
            .radio
            .get_crc_length()
            .map_err(|e| convert("details", e))?;
        let address_width = self
            .radio
            .get_address_length()
            .map_err(|e| convert("details", e))?;

        Ok(RadioDetails {
            backend: rfscan_linux::backend_name().to_string(),
            channel,
            data_rate: data_rate(rate),
            crc_enabled: !matches!(crc, CrcLength::Disabled),
            address_width,
            auto_ack: if self.auto_ack { ALL_PIPES_MASK } else { 0 },
            rx_pipes: self.rx_pipes(),
            pipe0_address: self.pipe_address(0),
            pipe1_address: self.pipe_address(1),
            powered: self.radio.is_powered(),
            primary_rx: self.radio.is_rx(),
        })
    }
}
