//! SPI and GPIO line handling.
//!
//! The panel is driven through embedded-hal traits, so the same driver runs
//! against Linux spidev/sysfs lines and against simulated lines in tests.

use std::fmt::Debug;
use std::time::{Duration, Instant};

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::spi::SpiDevice;
use tracing::{debug, trace};

use crate::{Error, Result};

/// Busy line poll increment in milliseconds.
pub const BUSY_POLL_MS: u32 = 10;

/// Time the reset line is held in each level.
pub const RESET_DELAY_MS: u32 = 200;

/// spidev refuses transfers larger than its buffer (4096 bytes by default).
const MAX_TRANSFER: usize = 4096;

/// Line-level operations the panel driver needs.
pub trait DisplayInterface {
    /// Sends a command byte (D/C low).
    fn send_command(&mut self, command: u8) -> Result<()>;

    /// Sends parameter or pixel bytes (D/C high).
    fn send_data(&mut self, data: &[u8]) -> Result<()>;

    /// Drives the initial line levels and enables panel power.
    fn power_on(&mut self) -> Result<()>;

    /// Pulses the reset line.
    fn reset(&mut self) -> Result<()>;

    /// Blocks until the busy line clears, failing with
    /// [`Error::HardwareTimeout`] once the deadline has passed.
    fn busy_wait(&mut self) -> Result<()>;

    /// Returns every line to its idle level. Power is deasserted last.
    fn release(&mut self) -> Result<()>;
}

fn pin_error<E: Debug>(e: E) -> Error {
    Error::Pin(format!("{e:?}"))
}

fn bus_error<E: Debug>(e: E) -> Error {
    Error::Transmission(format!("{e:?}"))
}

/// Hardware interface over an SPI device and five GPIO lines.
pub struct Interface<SPI, OUT, BUSY, D> {
    spi: SPI,
    reset: OUT,
    dc: OUT,
    cs: OUT,
    power: OUT,
    busy: BUSY,
    delay: D,
    busy_timeout: Duration,
}

impl<SPI, OUT, BUSY, D> Interface<SPI, OUT, BUSY, D>
where
    SPI: SpiDevice,
    OUT: OutputPin,
    BUSY: InputPin,
    D: DelayNs,
{
    /// Creates a new interface. Lines are not touched until [`DisplayInterface::power_on`].
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        spi: SPI,
        reset: OUT,
        dc: OUT,
        cs: OUT,
        power: OUT,
        busy: BUSY,
        delay: D,
        busy_timeout: Duration,
    ) -> Self {
        Self {
            spi,
            reset,
            dc,
            cs,
            power,
            busy,
            delay,
            busy_timeout,
        }
    }

    /// Returns the busy-wait timeout.
    pub fn busy_timeout(&self) -> Duration {
        self.busy_timeout
    }

    fn write_selected(&mut self, bytes: &[u8]) -> Result<()> {
        self.cs.set_low().map_err(pin_error)?;
        let written = bytes
            .chunks(MAX_TRANSFER)
            .try_for_each(|chunk| self.spi.write(chunk).map_err(bus_error));
        // Deselect even when the transfer failed.
        self.cs.set_high().map_err(pin_error)?;
        written
    }
}

impl<SPI, OUT, BUSY, D> DisplayInterface for Interface<SPI, OUT, BUSY, D>
where
    SPI: SpiDevice,
    OUT: OutputPin,
    BUSY: InputPin,
    D: DelayNs,
{
    fn send_command(&mut self, command: u8) -> Result<()> {
        self.dc.set_low().map_err(pin_error)?;
        self.write_selected(&[command])
    }

    fn send_data(&mut self, data: &[u8]) -> Result<()> {
        if data.is_empty() {
            return Ok(());
        }
        self.dc.set_high().map_err(pin_error)?;
        self.write_selected(data)
    }

    fn power_on(&mut self) -> Result<()> {
        self.cs.set_high().map_err(pin_error)?;
        self.dc.set_low().map_err(pin_error)?;
        self.reset.set_high().map_err(pin_error)?;
        self.power.set_high().map_err(pin_error)?;
        debug!("Panel power enabled");
        Ok(())
    }

    fn reset(&mut self) -> Result<()> {
        self.reset.set_low().map_err(pin_error)?;
        self.delay.delay_ms(RESET_DELAY_MS);
        self.reset.set_high().map_err(pin_error)?;
        self.delay.delay_ms(RESET_DELAY_MS);
        Ok(())
    }

    fn busy_wait(&mut self) -> Result<()> {
        let started = Instant::now();
        let deadline = started + self.busy_timeout;

        loop {
            if !self.busy.is_high().map_err(pin_error)? {
                trace!("Busy cleared after {:?}", started.elapsed());
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(Error::HardwareTimeout {
                    waited_ms: started.elapsed().as_millis() as u64,
                });
            }
            self.delay.delay_ms(BUSY_POLL_MS);
        }
    }

    fn release(&mut self) -> Result<()> {
        // Every line is driven even if an earlier one fails; power goes last.
        let first_error = [
            self.cs.set_high(),
            self.dc.set_low(),
            self.reset.set_low(),
            self.power.set_low(),
        ]
        .into_iter()
        .find_map(|result| result.err());

        match first_error {
            Some(e) => Err(pin_error(e)),
            None => {
                debug!("Panel lines released, power off");
                Ok(())
            }
        }
    }
}
