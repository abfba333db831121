//! The channel scanning loop.
//!
//! A [`Scanner`] owns a [`Transceiver`], puts it into a promiscuous receive
//! configuration, and repeatedly sweeps the spectrum sampling the received
//! power detector on each channel. Each output line summarizes
//! `passes_per_line` sweeps as one hex digit per channel; the line is redrawn
//! in place (`'\r'`) after every sweep so it fills in live.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{debug, info};

use crate::activity::ChannelActivity;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::histogram::{header_lines, Histogram};
use crate::radio::{DataRate, RadioDetails, Transceiver, NOISE_ADDRESSES, NUM_CHANNELS};
use crate::report::ScanReport;

/// Address width that lets noise pass as a preamble.
const NOISE_ADDRESS_WIDTH: u8 = 2;

/// Parameters for a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanSettings {
    /// Air data rate.
    pub data_rate: DataRate,
    /// Channels to sweep, starting at 0.
    pub num_channels: usize,
    /// Sweeps per output line.
    pub passes_per_line: u32,
    /// Listen time per channel before sampling.
    pub dwell: Duration,
    /// Sweeps remembered per channel for the summary.
    pub history_depth: usize,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            data_rate: DataRate::Mbps1,
            num_channels: NUM_CHANNELS,
            passes_per_line: 100,
            dwell: Duration::from_micros(130),
            history_depth: 5,
        }
    }
}

impl ScanSettings {
    /// Build settings from the loaded configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            data_rate: config.scan.data_rate,
            num_channels: config.scan.num_channels.min(NUM_CHANNELS),
            passes_per_line: config.scan.passes_per_line,
            dwell: config.dwell(),
            history_depth: config.scan.history_depth,
        }
    }

    /// Replace the data rate.
    #[must_use]
    pub fn with_data_rate(mut self, data_rate: DataRate) -> Self {
        self.data_rate = data_rate;
        self
    }
}

/// When a run should end on its own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunLimits {
    /// Stop after this many complete output lines.
    pub max_lines: Option<u64>,
    /// Stop once this much time has elapsed.
    pub duration: Option<Duration>,
}

impl RunLimits {
    /// Run until stopped through the [`ScanHandle`].
    #[must_use]
    pub fn unlimited() -> Self {
        Self::default()
    }

    /// Stop after `lines` output lines.
    #[must_use]
    pub fn lines(lines: u64) -> Self {
        Self {
            max_lines: Some(lines),
            duration: None,
        }
    }

    /// Stop after `duration`.
    #[must_use]
    pub fn duration(duration: Duration) -> Self {
        Self {
            max_lines: None,
            duration: Some(duration),
        }
    }
}

/// A cloneable stop signal for a running scan.
#[derive(Debug, Clone, Default)]
pub struct ScanHandle {
    stop_signal: Arc<AtomicBool>,
}

impl ScanHandle {
    /// Create a new handle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the scan to stop at the next channel boundary.
    pub fn stop(&self) {
        self.stop_signal.store(true, Ordering::SeqCst);
    }

    /// Check if a stop has been requested.
    #[must_use]
    pub fn should_stop(&self) -> bool {
        self.stop_signal.load(Ordering::SeqCst)
    }

    /// Clear a pending stop request.
    pub fn reset(&self) {
        self.stop_signal.store(false, Ordering::SeqCst);
    }
}

/// Drives a [`Transceiver`] through repeated spectrum sweeps.
#[derive(Debug)]
pub struct Scanner<R> {
    radio: R,
    settings: ScanSettings,
}

impl<R: Transceiver> Scanner<R> {
    /// Create a scanner; call [`Scanner::configure`] before scanning.
    #[must_use]
    pub fn new(radio: R, settings: ScanSettings) -> Self {
        Self { radio, settings }
    }

    /// The active settings.
    #[must_use]
    pub fn settings(&self) -> &ScanSettings {
        &self.settings
    }

    /// Borrow the radio.
    #[must_use]
    pub fn radio(&self) -> &R {
        &self.radio
    }

    /// Take the radio back.
    #[must_use]
    pub fn into_radio(self) -> R {
        self.radio
    }

    /// Replace the data rate applied by [`Scanner::apply_settings`].
    pub fn set_data_rate(&mut self, data_rate: DataRate) {
        self.settings.data_rate = data_rate;
    }

    /// Run the hardware-init check.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RadioNotResponding`] if the radio does not answer, or
    /// any error raised by the radio.
    pub fn begin(&mut self) -> Result<()> {
        if self.radio.begin()? {
            debug!("radio responded to init");
            Ok(())
        } else {
            Err(Error::RadioNotResponding)
        }
    }

    /// Put an initialized radio into the noise-catching configuration.
    ///
    /// Auto-ack and CRC are disabled so any energy is accepted, the address
    /// width is cut to two bytes, and both reading pipes listen on addresses
    /// that resemble a preamble. The radio is left in standby with an empty
    /// RX FIFO.
    ///
    /// # Errors
    ///
    /// Returns any error raised by the radio.
    pub fn apply_settings(&mut self) -> Result<()> {
        self.radio.set_data_rate(self.settings.data_rate)?;
        self.radio.set_auto_ack(false)?;
        self.radio.disable_crc()?;
        self.radio.set_address_width(NOISE_ADDRESS_WIDTH)?;
        for (pipe, address) in (0_u8..).zip(NOISE_ADDRESSES.iter()) {
            self.radio.open_reading_pipe(pipe, address)?;
        }

        // Get into standby mode
        self.radio.start_listening()?;
        self.radio.stop_listening()?;
        self.radio.flush_rx()?;

        info!(data_rate = %self.settings.data_rate, "radio configured for scanning");
        Ok(())
    }

    /// [`Scanner::begin`] followed by [`Scanner::apply_settings`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::RadioNotResponding`] if the hardware-init check fails,
    /// or any error raised by the radio.
    pub fn configure(&mut self) -> Result<()> {
        self.begin()?;
        self.apply_settings()
    }

    /// Read back the radio's configuration.
    ///
    /// # Errors
    ///
    /// Returns any error raised by the radio.
    pub fn details(&mut self) -> Result<RadioDetails> {
        self.radio.details()
    }

    /// Listen on `channel` for one dwell and report whether a signal was seen.
    ///
    /// The detector is sampled while still in RX, which reads more reliably
    /// on Linux, and once more after leaving RX. A detection flushes the RX
    /// FIFO to discard noise packets.
    ///
    /// # Errors
    ///
    /// Returns any error raised by the radio.
    pub fn scan_channel(&mut self, channel: u8) -> Result<bool> {
        self.radio.set_channel(channel)?;

        self.radio.start_listening()?;
        if !self.settings.dwell.is_zero() {
            thread::sleep(self.settings.dwell);
        }
        let found_in_rx = self.radio.test_rpd()?;
        self.radio.stop_listening()?;

        let found = found_in_rx || self.radio.test_rpd()?;
        if found {
            self.radio.flush_rx()?;
        }
        Ok(found)
    }

    /// Sweep and print until a limit is reached or `handle` is stopped.
    ///
    /// Writes the vertical channel header first, then one line per
    /// `passes_per_line` sweeps. Every channel's digit is flushed as soon as
    /// it is sampled.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigValidation`] when there are no channels or no
    /// passes per line to scan, or an error if the radio fails or `out`
    /// cannot be written.
    pub fn run<W: Write>(
        &mut self,
        out: &mut W,
        handle: &ScanHandle,
        limits: RunLimits,
    ) -> Result<ScanReport> {
        let num_channels = self.settings.num_channels.min(NUM_CHANNELS);
        if num_channels == 0 || self.settings.passes_per_line == 0 {
            return Err(Error::ConfigValidation {
                message: format!(
                    "cannot scan {num_channels} channels with {} passes per line",
                    self.settings.passes_per_line
                ),
            });
        }
        let started_at = Utc::now();
        let deadline = limits.duration.map(|d| Instant::now() + d);

        let mut histogram = Histogram::new(num_channels);
        let mut activity = ChannelActivity::new(num_channels, self.settings.history_depth);
        let mut lines = 0_u64;
        let mut sweeps = 0_u64;

        write_header(out, num_channels)?;

        'scan: loop {
            let past_deadline = deadline.is_some_and(|d| Instant::now() >= d);
            if handle.should_stop()
                || past_deadline
                || limits.max_lines.is_some_and(|max| lines >= max)
            {
                break;
            }

            // Clear measurement values
            histogram.reset();
            let mut line_started = false;

            for _ in 0..self.settings.passes_per_line {
                for ch in 0..num_channels {
                    let past_deadline = deadline.is_some_and(|d| Instant::now() >= d);
                    if handle.should_stop() || past_deadline {
                        if line_started {
                            writeln!(out)?;
                        }
                        break 'scan;
                    }

                    let channel = u8::try_from(ch)
                        .map_err(|_| Error::internal(format!("channel index {ch} overflows u8")))?;
                    let found = self.scan_channel(channel)?;
                    if found {
                        histogram.record(ch);
                    }
                    activity.observe(ch, found);

                    write!(out, "{}", histogram.glyph(ch))?;
                    out.flush()?;
                    line_started = true;
                }
                sweeps += 1;
                write!(out, "\r")?;
                out.flush()?;
            }

            writeln!(out)?;
            lines += 1;
            debug!(line = lines, sweeps, "line complete");
        }

        let interrupted = handle.should_stop();
        info!(lines, sweeps, interrupted, "scan finished");
        Ok(ScanReport::from_activity(
            &activity,
            self.settings.data_rate,
            started_at,
            lines,
            sweeps,
            interrupted,
        ))
    }

    /// Power the radio down.
    ///
    /// # Errors
    ///
    /// Returns any error raised by the radio.
    pub fn shutdown(&mut self) -> Result<()> {
        debug!("powering radio down");
        self.radio.power_down()
    }
}

/// Write the four-line vertical channel header.
///
/// # Errors
///
/// Returns an error if `out` cannot be written.
pub fn write_header<W: Write>(out: &mut W, num_channels: usize) -> std::io::Result<()> {
    for line in header_lines(num_channels) {
        writeln!(out, "{line}")?;
    }
    out.flush()
}
