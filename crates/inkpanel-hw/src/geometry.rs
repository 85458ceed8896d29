//! Panel geometry and wiring.

use std::time::Duration;

use crate::{EPD_HEIGHT, EPD_WIDTH};

/// Default busy-wait timeout.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(10);

/// BCM GPIO numbers of the panel control lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinAssignment {
    /// Reset line (output, active low).
    pub reset: u64,
    /// Data/command select (output, low = command).
    pub dc: u64,
    /// Chip select (output, active low).
    pub cs: u64,
    /// Busy status (input, high = busy).
    pub busy: u64,
    /// Panel power enable (output, active high).
    pub power: u64,
}

impl Default for PinAssignment {
    fn default() -> Self {
        Self {
            reset: 17,
            dc: 25,
            cs: 8,
            busy: 24,
            power: 18,
        }
    }
}

/// SPI bus settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusSettings {
    /// spidev device node.
    pub device: String,
    /// Clock rate in Hz.
    pub speed_hz: u32,
    /// SPI mode (0-3).
    pub mode: u8,
}

impl Default for BusSettings {
    fn default() -> Self {
        Self {
            device: "/dev/spidev0.0".to_string(),
            speed_hz: 4_000_000,
            mode: 0,
        }
    }
}

/// Physical description of an attached panel. Immutable once the driver owns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelGeometry {
    /// Native width in pixels (source lines).
    pub width: u16,
    /// Native height in pixels (gate lines).
    pub height: u16,
    pub pins: PinAssignment,
    pub bus: BusSettings,
    /// Upper bound for a single busy-wait.
    pub busy_timeout: Duration,
}

impl Default for PanelGeometry {
    fn default() -> Self {
        Self {
            width: EPD_WIDTH,
            height: EPD_HEIGHT,
            pins: PinAssignment::default(),
            bus: BusSettings::default(),
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }
}

impl PanelGeometry {
    /// Bytes per framebuffer row; rows are padded to a whole byte.
    pub fn bytes_per_row(&self) -> usize {
        (self.width as usize).div_ceil(8)
    }

    /// Size in bytes of a full frame.
    pub fn buffer_len(&self) -> usize {
        self.bytes_per_row() * self.height as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_geometry() {
        let geometry = PanelGeometry::default();
        assert_eq!((geometry.width, geometry.height), (122, 250));
        assert_eq!(geometry.bytes_per_row(), 16);
        assert_eq!(geometry.buffer_len(), 4000);
    }
}
