//! Linux spidev + sysfs GPIO backing for the panel interface.
//!
//! [`open`] is the single hardware setup step: it exports and configures every
//! line, opens the SPI device and hands back an owned interface. Lines are
//! unexported again when the interface is dropped.

use embedded_hal::digital::{ErrorType, InputPin, OutputPin, PinState};
use linux_embedded_hal::spidev::{SpiModeFlags, SpidevOptions};
use linux_embedded_hal::sysfs_gpio::Direction;
use linux_embedded_hal::{Delay, SpidevDevice, SysfsPin, SysfsPinError};
use tracing::{debug, info, warn};

use crate::epd::Interface;
use crate::{Error, PanelGeometry, Result};

/// Interface type backed by the Linux kernel drivers.
pub type LinuxInterface = Interface<SpidevDevice, ExportedPin, ExportedPin, Delay>;

/// A sysfs GPIO line that is unexported when dropped.
pub struct ExportedPin {
    pin: SysfsPin,
    number: u64,
}

impl ExportedPin {
    fn export(number: u64, direction: Direction) -> Result<Self> {
        let setup_error = |e: linux_embedded_hal::sysfs_gpio::Error| Error::PinSetup {
            pin: number,
            reason: e.to_string(),
        };
        let pin = SysfsPin::new(number);
        pin.export().map_err(setup_error)?;
        pin.set_direction(direction).map_err(setup_error)?;
        debug!("GPIO {} exported ({:?})", number, direction);
        Ok(Self { pin, number })
    }

    /// Exports an output line driven to `initial`.
    pub fn output(number: u64, initial: PinState) -> Result<Self> {
        let direction = match initial {
            PinState::High => Direction::High,
            PinState::Low => Direction::Low,
        };
        Self::export(number, direction)
    }

    /// Exports an input line.
    pub fn input(number: u64) -> Result<Self> {
        Self::export(number, Direction::In)
    }

    /// BCM line number.
    pub fn number(&self) -> u64 {
        self.number
    }
}

impl Drop for ExportedPin {
    fn drop(&mut self) {
        if let Err(e) = self.pin.unexport() {
            warn!("Failed to unexport GPIO {}: {}", self.number, e);
        }
    }
}

impl ErrorType for ExportedPin {
    type Error = SysfsPinError;
}

impl OutputPin for ExportedPin {
    fn set_low(&mut self) -> std::result::Result<(), Self::Error> {
        self.pin.set_low()
    }

    fn set_high(&mut self) -> std::result::Result<(), Self::Error> {
        self.pin.set_high()
    }
}

impl InputPin for ExportedPin {
    fn is_high(&mut self) -> std::result::Result<bool, Self::Error> {
        self.pin.is_high()
    }

    fn is_low(&mut self) -> std::result::Result<bool, Self::Error> {
        self.pin.is_low()
    }
}

fn spi_mode(mode: u8) -> SpiModeFlags {
    let base = match mode {
        1 => SpiModeFlags::SPI_MODE_1,
        2 => SpiModeFlags::SPI_MODE_2,
        3 => SpiModeFlags::SPI_MODE_3,
        _ => SpiModeFlags::SPI_MODE_0,
    };
    // Chip select is driven as a GPIO line around each transfer.
    base | SpiModeFlags::SPI_NO_CS
}

/// Opens the SPI bus and claims every panel line described by `geometry`.
pub fn open(geometry: &PanelGeometry) -> Result<LinuxInterface> {
    let bus = &geometry.bus;
    let bus_error = |reason: String| Error::Bus {
        device: bus.device.clone(),
        reason,
    };

    let mut spi = SpidevDevice::open(&bus.device).map_err(|e| bus_error(format!("{e:?}")))?;
    let options = SpidevOptions::new()
        .bits_per_word(8)
        .max_speed_hz(bus.speed_hz)
        .mode(spi_mode(bus.mode))
        .build();
    spi.configure(&options)
        .map_err(|e| bus_error(e.to_string()))?;

    let pins = &geometry.pins;
    let power = ExportedPin::output(pins.power, PinState::Low)?;
    let reset = ExportedPin::output(pins.reset, PinState::High)?;
    let dc = ExportedPin::output(pins.dc, PinState::Low)?;
    let cs = ExportedPin::output(pins.cs, PinState::High)?;
    let busy = ExportedPin::input(pins.busy)?;

    info!(
        "Panel bus opened ({} @ {} Hz, mode {}; rst={} dc={} cs={} busy={} pwr={})",
        bus.device,
        bus.speed_hz,
        bus.mode,
        reset.number(),
        dc.number(),
        cs.number(),
        busy.number(),
        power.number()
    );

    Ok(Interface::new(
        spi,
        reset,
        dc,
        cs,
        power,
        busy,
        Delay,
        geometry.busy_timeout,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spi_mode_disables_kernel_cs() {
        assert!(spi_mode(0).contains(SpiModeFlags::SPI_NO_CS));
        assert!(spi_mode(3).contains(SpiModeFlags::SPI_MODE_3));
    }

    // Hardware tests are skipped by default
    #[test]
    #[ignore]
    fn test_open_default_panel() {
        let interface = open(&PanelGeometry::default());
        assert!(interface.is_ok());
    }
}
