//! Linux board support for rfscan.
//!
//! Wires an nRF24L01(+) on a spidev node (`/dev/spidevA.B`), with CE on a GPIO
//! character device line, to the `rf24-rs` driver.

#![cfg(target_os = "linux")]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod board;

pub use board::{BoardError, BoardHardware, Radio};
pub use rf24_rs;

/// Get the backend name.
#[must_use]
pub fn backend_name() -> &'static str {
    "Linux spidev"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_name() {
        assert_eq!(backend_name(), "Linux spidev");
    }
}
