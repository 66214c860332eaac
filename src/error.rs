//! # Error Types
//!
//! Custom error types for the servo controller using `thiserror`.

use thiserror::Error;

/// Main error type for the servo controller
#[derive(Debug, Error)]
pub enum ServoError {
    /// Configuration file could not be parsed
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// Configuration parsed but holds an out-of-range value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Input device errors (disconnect, read failure)
    #[error("Input device error: {0}")]
    Input(String),

    /// No usable input device was found
    #[error("No gamepad found under /dev/input")]
    InputNotFound,

    /// Actuator rejected or failed a command
    #[error("Actuator error: {0}")]
    Actuator(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for the servo controller
pub type Result<T> = std::result::Result<T, ServoError>;
