//! `rfscan` - 2.4 GHz channel scanner
//!
//! This library sweeps an nRF24L01 transceiver across its channels, counts
//! detected signal energy per channel, and renders a rolling histogram that
//! helps pick a quiet channel before deploying a wireless link.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod activity;
pub mod cli;
pub mod config;
pub mod error;
pub mod histogram;
pub mod logging;
pub mod radio;
pub mod report;
pub mod scanner;

pub use activity::ChannelActivity;
pub use config::Config;
pub use error::{Error, Result};
pub use histogram::Histogram;
pub use logging::init_logging;
pub use radio::{DataRate, RadioDetails, SimulatedRadio, Transceiver};
pub use report::ScanReport;
pub use scanner::{RunLimits, ScanHandle, ScanSettings, Scanner};
