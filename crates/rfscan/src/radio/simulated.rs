//! In-memory transceiver with a deterministic noise profile.
//!
//! Used by the test suite and by `rfscan scan --simulate` on machines without
//! a radio attached.

use std::collections::BTreeMap;

use tracing::trace;

use super::{DataRate, RadioDetails, Transceiver, MAX_CHANNEL};
use crate::error::{Error, Result};

/// A software radio that reports carriers according to a noise profile.
///
/// Each noisy channel has a period `n`: every `n`-th listen window on that
/// channel sees power above the detector threshold.
#[derive(Debug, Clone)]
pub struct SimulatedRadio {
    responsive: bool,
    noise: BTreeMap<u8, u32>,
    windows: BTreeMap<u8, u32>,
    carrier: bool,
    channel: u8,
    data_rate: DataRate,
    crc_enabled: bool,
    auto_ack: bool,
    address_width: u8,
    pipes: [Option<Vec<u8>>; 2],
    listening: bool,
    powered: bool,
    flush_count: u64,
    listen_count: u64,
}

impl Default for SimulatedRadio {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedRadio {
    /// Create a quiet, responsive radio.
    #[must_use]
    pub fn new() -> Self {
        Self {
            responsive: true,
            noise: BTreeMap::new(),
            windows: BTreeMap::new(),
            carrier: false,
            channel: 76,
            data_rate: DataRate::Mbps1,
            crc_enabled: true,
            auto_ack: true,
            address_width: 5,
            pipes: [None, None],
            listening: false,
            powered: false,
            flush_count: 0,
            listen_count: 0,
        }
    }

    /// Create a radio that fails the hardware-init check.
    #[must_use]
    pub fn unresponsive() -> Self {
        Self {
            responsive: false,
            ..Self::new()
        }
    }

    /// A busy 2.4 GHz band: two Wi-Fi access points and a narrow interferer.
    #[must_use]
    pub fn demo() -> Self {
        let mut radio = Self::new();
        // Wi-Fi channel 1 (2412 MHz, ~22 MHz wide)
        for channel in 1..=23 {
            radio = radio.with_noise(channel, if (9..=15).contains(&channel) { 2 } else { 5 });
        }
        // Wi-Fi channel 6 (2437 MHz)
        for channel in 26..=48 {
            radio = radio.with_noise(channel, if (34..=40).contains(&channel) { 3 } else { 7 });
        }
        radio.with_noise(80, 11)
    }

    /// Report a carrier on `channel` every `period` listen windows.
    ///
    /// A period of 1 means the channel is always busy; 0 clears the channel.
    #[must_use]
    pub fn with_noise(mut self, channel: u8, period: u32) -> Self {
        if period == 0 {
            self.noise.remove(&channel);
        } else {
            self.noise.insert(channel, period);
        }
        self
    }

    /// Number of `flush_rx` calls so far.
    #[must_use]
    pub fn flush_count(&self) -> u64 {
        self.flush_count
    }

    /// Number of listen windows opened so far.
    #[must_use]
    pub fn listen_count(&self) -> u64 {
        self.listen_count
    }

    /// Whether the radio is in RX mode.
    #[must_use]
    pub fn is_listening(&self) -> bool {
        self.listening
    }

    /// Whether the radio is powered up.
    #[must_use]
    pub fn is_powered(&self) -> bool {
        self.powered
    }

    /// Whether auto-acknowledgement is enabled.
    #[must_use]
    pub fn auto_ack(&self) -> bool {
        self.auto_ack
    }

    /// The address opened on `pipe`, if any.
    #[must_use]
    pub fn pipe_address(&self, pipe: u8) -> Option<&[u8]> {
        self.pipes.get(usize::from(pipe))?.as_deref()
    }
}

impl Transceiver for SimulatedRadio {
    fn begin(&mut self) -> Result<bool> {
        if self.responsive {
            self.powered = true;
        }
        Ok(self.responsive)
    }

    fn set_data_rate(&mut self, rate: DataRate) -> Result<()> {
        self.data_rate = rate;
        Ok(())
    }

    fn set_auto_ack(&mut self, enabled: bool) -> Result<()> {
        self.auto_ack = enabled;
        Ok(())
    }

    fn disable_crc(&mut self) -> Result<()> {
        self.crc_enabled = false;
        Ok(())
    }

    fn set_address_width(&mut self, width: u8) -> Result<()> {
        self.address_width = width.clamp(2, 5);
        Ok(())
    }

    fn open_reading_pipe(&mut self, pipe: u8, address: &[u8]) -> Result<()> {
        let slot = self
            .pipes
            .get_mut(usize::from(pipe))
            .ok_or(Error::InvalidPipe(pipe))?;
        let len = address.len().min(usize::from(self.address_width));
        *slot = Some(address[..len].to_vec());
        Ok(())
    }

    fn start_listening(&mut self) -> Result<()> {
        self.listening = true;
        self.listen_count += 1;

        let window = self.windows.entry(self.channel).or_insert(0);
        *window += 1;
        self.carrier = self
            .noise
            .get(&self.channel)
            .is_some_and(|period| *window % period == 0);
        trace!(channel = self.channel, carrier = self.carrier, "listen window");
        Ok(())
    }

    fn stop_listening(&mut self) -> Result<()> {
        self.listening = false;
        Ok(())
    }

    fn flush_rx(&mut self) -> Result<()> {
        self.flush_count += 1;
        Ok(())
    }

    fn set_channel(&mut self, channel: u8) -> Result<()> {
        if channel > MAX_CHANNEL {
            return Err(Error::InvalidChannel {
                channel,
                max: MAX_CHANNEL,
            });
        }
        self.channel = channel;
        self.carrier = false;
        Ok(())
    }

    fn test_rpd(&mut self) -> Result<bool> {
        Ok(self.carrier)
    }

    fn power_down(&mut self) -> Result<()> {
        self.listening = false;
        self.powered = false;
        Ok(())
    }

    fn details(&mut self) -> Result<RadioDetails> {
        let enabled = self
            .pipes
            .iter()
            .enumerate()
            .filter(|(_, p)| p.is_some())
            .fold(0_u8, |mask, (i, _)| mask | (1 << i));
        Ok(RadioDetails {
            backend: "simulated".to_string(),
            channel: self.channel,
            data_rate: self.data_rate,
            crc_enabled: self.crc_enabled,
            address_width: self.address_width,
            auto_ack: if self.auto_ack { 0b11_1111 } else { 0 },
            rx_pipes: enabled,
            pipe0_address: self.pipes[0].clone().unwrap_or_default(),
            pipe1_address: self.pipes[1].clone().unwrap_or_default(),
            powered: self.powered,
            primary_rx: self.listening,
        })
    }
}
