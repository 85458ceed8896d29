//! Panel abstraction used by the display worker.

use tracing::{error, warn};

use crate::epd::{Color, Framebuffer, PanelState, RefreshMode};
use crate::{Error, Result};

/// A refreshable monochrome panel.
pub trait Panel {
    /// Native (width, height) in pixels.
    fn dimensions(&self) -> (u16, u16);

    /// Current lifecycle state.
    fn state(&self) -> PanelState;

    /// Powers the panel, resets it and loads the waveform for `mode`.
    fn initialize(&mut self, mode: RefreshMode) -> Result<()>;

    /// Transmits a full frame and waits for the refresh to finish.
    fn draw(&mut self, frame: &Framebuffer) -> Result<()>;

    /// Transmits a uniform frame.
    fn clear(&mut self, color: Color) -> Result<()>;

    /// Enters deep sleep.
    fn sleep(&mut self) -> Result<()>;

    /// Leaves deep sleep.
    fn wake(&mut self) -> Result<()>;

    /// Releases lines and bus. Further calls are no-ops.
    fn teardown(&mut self) -> Result<()>;

    /// Initializes, retrying on [`Error::HardwareTimeout`] up to `attempts` times.
    fn initialize_with_retry(&mut self, mode: RefreshMode, attempts: u32) -> Result<()> {
        let attempts = attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.initialize(mode) {
                Ok(()) => return Ok(()),
                Err(e @ Error::HardwareTimeout { .. }) if attempt < attempts => {
                    warn!(
                        "Panel initialization attempt {}/{} failed: {}",
                        attempt, attempts, e
                    );
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl<P: Panel + ?Sized> Panel for Box<P> {
    fn dimensions(&self) -> (u16, u16) {
        (**self).dimensions()
    }

    fn state(&self) -> PanelState {
        (**self).state()
    }

    fn initialize(&mut self, mode: RefreshMode) -> Result<()> {
        (**self).initialize(mode)
    }

    fn draw(&mut self, frame: &Framebuffer) -> Result<()> {
        (**self).draw(frame)
    }

    fn clear(&mut self, color: Color) -> Result<()> {
        (**self).clear(color)
    }

    fn sleep(&mut self) -> Result<()> {
        (**self).sleep()
    }

    fn wake(&mut self) -> Result<()> {
        (**self).wake()
    }

    fn teardown(&mut self) -> Result<()> {
        (**self).teardown()
    }
}

/// Draws a frame. A failed transmission is followed by exactly one white
/// clear so the panel is not left half-written; the draw error is returned
/// either way.
pub fn present<P: Panel + ?Sized>(panel: &mut P, frame: &Framebuffer) -> Result<()> {
    match panel.draw(frame) {
        Err(e @ Error::Transmission(_)) => {
            warn!("Draw failed ({}), clearing panel", e);
            if let Err(clear_err) = panel.clear(Color::White) {
                error!("Recovery clear failed: {}", clear_err);
            }
            Err(e)
        }
        other => other,
    }
}
