//! Error types for tribute.
//!
//! The countdown calculator and the dust generator are total and never fail.
//! Errors only arise at the edges: loading configuration, parsing command-line
//! instants, and writing output.

use thiserror::Error;

/// The main error type for tribute operations.
#[derive(Error, Debug)]
pub enum Error {
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

    // === Input Errors ===
    /// A wall-clock instant could not be parsed.
    #[error("invalid instant '{input}': expected YYYY-MM-DDTHH:MM:SS")]
    InvalidInstant {
        /// The text that failed to parse.
        input: String,
    },

    // === Output Errors ===
    /// Writing command output failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization of command output failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for tribute operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new configuration validation error.
    #[must_use]
    pub fn config_validation(message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            message: message.into(),
        }
    }

    /// Create a new invalid instant error.
    #[must_use]
    pub fn invalid_instant(input: impl Into<String>) -> Self {
        Self::InvalidInstant {
            input: input.into(),
        }
    }

    /// Check if this error came from configuration loading or validation.
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::ConfigLoad(_) | Self::ConfigValidation { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_validation_error_display() {
        let err = Error::config_validation("burst_size must be greater than 0");
        assert_eq!(
            err.to_string(),
            "invalid configuration: burst_size must be greater than 0"
        );
    }

    #[test]
    fn test_invalid_instant_display() {
        let err = Error::invalid_instant("yesterday");
        let msg = err.to_string();
        assert!(msg.contains("yesterday"));
        assert!(msg.contains("YYYY-MM-DD"));
    }

    #[test]
    fn test_is_config_error() {
        assert!(Error::config_validation("bad").is_config_error());
        assert!(!Error::from(std::io::Error::other("bad")).is_config_error());
        assert!(!Error::invalid_instant("x").is_config_error());
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
        let err: Error = figment::Error::from("missing field".to_string()).into();
        assert!(err.is_config_error());
        assert!(err.to_string().contains("missing field"));
    }
}
