//! Inkpanel Hardware Library
//!
//! Provides the SPI/GPIO handshake driver, framebuffer and orientation
//! mapping for small e-paper panels (Waveshare 2.13" class) wired to a
//! single-board computer.

pub mod epd;
pub mod error;
pub mod geometry;
pub mod linux;
pub mod orientation;
pub mod panel;

pub use epd::{Color, EpdDevice, Framebuffer, PanelState, RefreshMode};
pub use error::{Error, Result};
pub use geometry::{BusSettings, PanelGeometry, PinAssignment};
pub use orientation::Orientation;
pub use panel::{present, Panel};

/// Native panel dimensions (source lines x gate lines).
pub const EPD_WIDTH: u16 = 122;
pub const EPD_HEIGHT: u16 = 250;
