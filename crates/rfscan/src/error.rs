//! Error types for rfscan.
//!
//! This module defines all error types used throughout the rfscan crate,
//! providing detailed context for debugging and user-friendly error messages.

use thiserror::Error;

/// The main error type for rfscan operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Radio Errors ===
    /// The radio did not answer the hardware-init check.
    #[error("Radio hardware not responding!")]
    RadioNotResponding,

    /// A transceiver operation failed.
    #[error("radio operation '{operation}' failed: {message}")]
    Radio {
        /// Name of the operation that failed.
        operation: &'static str,
        /// Description of what went wrong.
        message: String,
    },

    /// A channel outside the supported range was requested.
    #[error("channel {channel} is out of range (0-{max})")]
    InvalidChannel {
        /// The requested channel.
        channel: u8,
        /// The highest supported channel.
        max: u8,
    },

    /// A reading pipe the radio does not have was requested.
    #[error("reading pipe {0} is not supported")]
    InvalidPipe(u8),

    /// The selected backend cannot be used on this platform.
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === I/O Errors ===
    /// Terminal or file system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // === Serialization Errors ===
    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for rfscan operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new radio operation error.
    #[must_use]
    pub fn radio(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Radio {
            operation,
            message: message.into(),
        }
    }

    /// Create a new backend unavailable error.
    #[must_use]
    pub fn backend_unavailable(message: impl Into<String>) -> Self {
        Self::BackendUnavailable(message.into())
    }

    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this error is the hardware-init failure.
    #[must_use]
    pub fn is_not_responding(&self) -> bool {
        matches!(self, Self::RadioNotResponding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::RadioNotResponding;
        assert_eq!(err.to_string(), "Radio hardware not responding!");

        let err = Error::radio("set_channel", "bus error");
        assert_eq!(
            err.to_string(),
            "radio operation 'set_channel' failed: bus error"
        );
    }

    #[test]
    fn test_error_is_not_responding() {
        assert!(Error::RadioNotResponding.is_not_responding());
        assert!(!Error::internal("test").is_not_responding());
    }

    #[test]
    fn test_invalid_channel_display() {
        let err = Error::InvalidChannel {
            channel: 130,
            max: 125,
        };
        assert_eq!(err.to_string(), "channel 130 is out of range (0-125)");
    }

    #[test]
    fn test_invalid_pipe_display() {
        assert_eq!(
            Error::InvalidPipe(4).to_string(),
            "reading pipe 4 is not supported"
        );
    }

    #[test]
    fn test_backend_unavailable() {
        let err = Error::backend_unavailable("use --simulate");
        assert!(err.to_string().contains("use --simulate"));
    }

    #[test]
    fn test_internal_error() {
        let err = Error::internal("something went wrong");
        assert_eq!(err.to_string(), "internal error: something went wrong");
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.to_string().contains("pipe closed"));
    }

    #[test]
    fn test_from_json_error() {
        let json_result: std::result::Result<i32, serde_json::Error> =
            serde_json::from_str("not valid json");
        if let Err(json_err) = json_result {
            let err: Error = json_err.into();
            assert!(matches!(err, Error::Json(_)));
        }
    }

    #[test]
    fn test_from_figment_error() {
        let err: Error = figment::Error::from("bad value".to_string()).into();
        assert!(matches!(err, Error::ConfigLoad(_)));
        assert!(err.to_string().contains("bad value"));
    }

    #[test]
    fn test_config_validation_error_display() {
        let err = Error::ConfigValidation {
            message: "passes_per_line must be greater than 0".to_string(),
        };
        assert!(err.to_string().contains("passes_per_line"));
    }
}
