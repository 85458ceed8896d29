//! Error types for the inkpanel hardware library.

use thiserror::Error;

use crate::epd::PanelState;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when interacting with the panel.
#[derive(Error, Debug)]
pub enum Error {
    /// The busy line never cleared within the configured timeout.
    #[error("Panel stayed busy for {waited_ms}ms")]
    HardwareTimeout { waited_ms: u64 },

    /// SPI write failed.
    #[error("SPI transmission failed: {0}")]
    Transmission(String),

    /// GPIO line could not be driven or read.
    #[error("GPIO pin error: {0}")]
    Pin(String),

    /// GPIO line could not be exported or configured.
    #[error("GPIO {pin} setup failed: {reason}")]
    PinSetup { pin: u64, reason: String },

    /// SPI device could not be opened or configured.
    #[error("SPI device {device} unavailable: {reason}")]
    Bus { device: String, reason: String },

    /// Operation not allowed in the current panel state.
    #[error("Cannot {operation} while panel is {state}")]
    InvalidState {
        operation: &'static str,
        state: PanelState,
    },

    /// Invalid refresh mode value.
    #[error("Invalid refresh mode: {0}")]
    InvalidRefreshMode(String),

    /// Invalid orientation value.
    #[error("Invalid orientation: {0}")]
    InvalidOrientation(String),

    /// Framebuffer size mismatch.
    #[error("Framebuffer size mismatch: expected {expected}, got {actual}")]
    FramebufferSize { expected: usize, actual: usize },
}
