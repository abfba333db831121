//! Board setup for an nRF24L01 wired to a Linux SPI bus.
//!
//! Opens the spidev node and the CE line and hands them, with a delay
//! provider, to the `rf24-rs` driver.

use std::fmt;
use std::path::{Path, PathBuf};

use linux_embedded_hal::gpio_cdev::{self, Chip, LineRequestFlags};
use linux_embedded_hal::spidev::{SpiModeFlags, Spidev, SpidevOptions};
use linux_embedded_hal::{CdevPin, Delay, SpidevDevice};
use rf24_rs::radio::RF24;
use thiserror::Error;
use tracing::debug;

/// GPIO consumer label shown by `gpioinfo`.
const GPIO_CONSUMER: &str = "rfscan-ce";

/// The driver type produced by [`BoardHardware::into_radio`].
pub type Radio = RF24<SpidevDevice, CdevPin, Delay>;

/// Errors raised while setting up the board.
#[derive(Debug, Error)]
pub enum BoardError {
    /// The SPI device could not be opened or configured.
    #[error("failed to open SPI device {path}: {source}")]
    SpiOpen {
        /// Path to the spidev node.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The CE line could not be requested.
    #[error("failed to request CE line {line} on {chip}: {source}")]
    Gpio {
        /// Path to the GPIO character device.
        chip: PathBuf,
        /// Line offset on the chip.
        line: u32,
        /// The underlying error.
        #[source]
        source: gpio_cdev::Error,
    },
}

/// Result type for board setup.
pub type Result<T> = std::result::Result<T, BoardError>;

/// The peripherals an nRF24L01 needs.
pub struct BoardHardware {
    /// SPI bus.
    pub spi: SpidevDevice,
    /// Chip-enable output.
    pub ce_pin: CdevPin,
    /// Delay provider for the driver's settling times.
    pub delay: Delay,
    spi_path: PathBuf,
}

impl fmt::Debug for BoardHardware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoardHardware")
            .field("spi_path", &self.spi_path)
            .finish_non_exhaustive()
    }
}

impl BoardHardware {
    /// Open the SPI bus at `spi_path` and CE as `ce_line` on `gpio_chip`.
    ///
    /// # Errors
    ///
    /// Returns an error if the SPI device cannot be opened and configured or
    /// the CE line cannot be requested as an output.
    pub fn open(
        spi_path: impl AsRef<Path>,
        spi_speed_hz: u32,
        gpio_chip: impl AsRef<Path>,
        ce_line: u32,
    ) -> Result<Self> {
        let spi_path = spi_path.as_ref().to_path_buf();
        let spi = open_spi(&spi_path, spi_speed_hz).map_err(|source| BoardError::SpiOpen {
            path: spi_path.clone(),
            source,
        })?;

        let chip_path = gpio_chip.as_ref().to_path_buf();
        let ce_pin = open_ce(&chip_path, ce_line).map_err(|source| BoardError::Gpio {
            chip: chip_path.clone(),
            line: ce_line,
            source,
        })?;

        debug!(spi = %spi_path.display(), ce_line, spi_speed_hz, "board hardware ready");

        Ok(Self {
            spi: SpidevDevice(spi),
            ce_pin,
            delay: Delay,
            spi_path,
        })
    }

    /// Path of the SPI device in use.
    #[must_use]
    pub fn spi_path(&self) -> &Path {
        &self.spi_path
    }

    /// Build the radio driver on this hardware.
    #[must_use]
    pub fn into_radio(self) -> Radio {
        RF24::new(self.ce_pin, self.spi, self.delay)
    }
}

fn open_spi(path: &Path, speed_hz: u32) -> std::io::Result<Spidev> {
    let mut spi = Spidev::open(path)?;
    let options = SpidevOptions::new()
        .bits_per_word(8)
        .max_speed_hz(speed_hz)
        .mode(SpiModeFlags::SPI_MODE_0)
        .build();
    spi.configure(&options)?;
    Ok(spi)
}

fn open_ce(chip: &Path, line: u32) -> std::result::Result<CdevPin, gpio_cdev::Error> {
    let handle = Chip::new(chip)?
        .get_line(line)?
        .request(LineRequestFlags::OUTPUT, 0, GPIO_CONSUMER)?;
    CdevPin::new(handle)
}
