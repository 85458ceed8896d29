//! Panel driver state machine.

use tracing::{debug, info, warn};

use super::framebuffer::{Color, Framebuffer};
use super::interface::DisplayInterface;
use super::protocol::{
    build_deep_sleep, build_display_frame, build_init_sequence, build_memory_area,
    build_memory_pointer, Command, Instruction, RefreshMode,
};
use crate::panel::Panel;
use crate::{Error, PanelGeometry, Result};

/// Operation holding the panel busy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusyOp {
    Init,
    Draw,
    Clear,
}

/// Driver lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelState {
    Uninitialized,
    Initializing,
    Idle,
    Busy(BusyOp),
    Sleeping,
    Released,
}

impl std::fmt::Display for PanelState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PanelState::Uninitialized => write!(f, "uninitialized"),
            PanelState::Initializing => write!(f, "initializing"),
            PanelState::Idle => write!(f, "idle"),
            PanelState::Busy(op) => write!(f, "busy ({:?})", op),
            PanelState::Sleeping => write!(f, "sleeping"),
            PanelState::Released => write!(f, "released"),
        }
    }
}

/// E-paper panel controller.
///
/// Owns the interface for its whole lifetime; lines are released on
/// [`Panel::teardown`] or, failing that, on drop.
pub struct EpdDevice<I: DisplayInterface> {
    interface: I,
    geometry: PanelGeometry,
    state: PanelState,
    mode: RefreshMode,
}

impl<I: DisplayInterface> EpdDevice<I> {
    /// Wraps an interface. Nothing is sent until [`Panel::initialize`].
    pub fn new(interface: I, geometry: PanelGeometry) -> Self {
        Self {
            interface,
            geometry,
            state: PanelState::Uninitialized,
            mode: RefreshMode::default(),
        }
    }

    /// Returns the active refresh mode.
    pub fn mode(&self) -> RefreshMode {
        self.mode
    }

    /// Returns the panel geometry.
    pub fn geometry(&self) -> &PanelGeometry {
        &self.geometry
    }

    /// Reinitializes only if the requested mode differs from the active one.
    pub fn set_mode(&mut self, mode: RefreshMode) -> Result<()> {
        if mode == self.mode && self.state == PanelState::Idle {
            return Ok(());
        }
        self.initialize(mode)
    }

    fn send(&mut self, instruction: &Instruction) -> Result<()> {
        self.interface.send_command(instruction.command as u8)?;
        self.interface.send_data(&instruction.data)
    }

    fn require_idle(&self, operation: &'static str) -> Result<()> {
        match self.state {
            PanelState::Idle => Ok(()),
            state => Err(Error::InvalidState { operation, state }),
        }
    }

    /// Runs `f` in the given busy state. The state returns to idle whatever
    /// the outcome.
    fn busy<F>(&mut self, op: BusyOp, f: F) -> Result<()>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        self.state = PanelState::Busy(op);
        let result = f(self);
        self.state = PanelState::Idle;
        result
    }

    fn send_init_sequence(&mut self, mode: RefreshMode) -> Result<()> {
        self.interface.power_on()?;
        self.interface.reset()?;
        for instruction in build_init_sequence(self.geometry.height, mode) {
            self.send(&instruction)?;
        }
        Ok(())
    }

    fn write_frame(&mut self, data: &[u8]) -> Result<()> {
        let (width, height) = (self.geometry.width, self.geometry.height);
        for instruction in build_memory_area(width, height)
            .iter()
            .chain(build_memory_pointer().iter())
        {
            self.send(instruction)?;
        }
        self.interface.busy_wait()?;

        self.interface.send_command(Command::WriteRam as u8)?;
        self.interface.send_data(data)?;

        for instruction in build_display_frame().iter() {
            self.send(instruction)?;
        }
        self.interface.busy_wait()
    }
}

impl<I: DisplayInterface> Panel for EpdDevice<I> {
    fn dimensions(&self) -> (u16, u16) {
        (self.geometry.width, self.geometry.height)
    }

    fn state(&self) -> PanelState {
        self.state
    }

    fn initialize(&mut self, mode: RefreshMode) -> Result<()> {
        if self.state == PanelState::Released {
            return Err(Error::InvalidState {
                operation: "initialize",
                state: self.state,
            });
        }

        self.state = PanelState::Initializing;
        if let Err(e) = self.send_init_sequence(mode) {
            self.state = PanelState::Uninitialized;
            return Err(e);
        }

        // The waveform for `mode` is loaded now, whether or not busy clears.
        self.mode = mode;
        self.busy(BusyOp::Init, |dev| dev.interface.busy_wait())?;
        info!("Panel initialized ({} refresh)", mode);
        Ok(())
    }

    fn draw(&mut self, frame: &Framebuffer) -> Result<()> {
        self.require_idle("draw")?;
        let expected = self.geometry.buffer_len();
        if frame.data().len() != expected
            || frame.width() != self.geometry.width
            || frame.height() != self.geometry.height
        {
            return Err(Error::FramebufferSize {
                expected,
                actual: frame.data().len(),
            });
        }

        self.busy(BusyOp::Draw, |dev| dev.write_frame(frame.data()))?;
        debug!("Frame drawn ({} bytes)", expected);
        Ok(())
    }

    fn clear(&mut self, color: Color) -> Result<()> {
        self.require_idle("clear")?;
        let frame = vec![color.fill_byte(); self.geometry.buffer_len()];
        self.busy(BusyOp::Clear, |dev| dev.write_frame(&frame))?;
        debug!("Panel cleared to {:?}", color);
        Ok(())
    }

    fn sleep(&mut self) -> Result<()> {
        match self.state {
            PanelState::Sleeping => return Ok(()),
            _ => self.require_idle("sleep")?,
        }
        // Deep sleep must only be entered with the busy line low.
        self.interface.busy_wait()?;
        self.send(&build_deep_sleep())?;
        self.state = PanelState::Sleeping;
        debug!("Panel entered deep sleep");
        Ok(())
    }

    fn wake(&mut self) -> Result<()> {
        match self.state {
            PanelState::Idle => Ok(()),
            PanelState::Sleeping => {
                debug!("Waking panel");
                self.initialize(self.mode)
            }
            state => Err(Error::InvalidState {
                operation: "wake",
                state,
            }),
        }
    }

    fn teardown(&mut self) -> Result<()> {
        if self.state == PanelState::Released {
            return Ok(());
        }
        let released = self.interface.release();
        self.state = PanelState::Released;
        released?;
        info!("Panel released");
        Ok(())
    }
}

impl<I: DisplayInterface> Drop for EpdDevice<I> {
    fn drop(&mut self) {
        if let Err(e) = self.teardown() {
            warn!("Failed to release panel lines: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::interface::mock::{
        interface, interface_with_stuck_pin, transactions, BusEvent, Log, MockInterface,
    };
    use super::*;

    fn device(log: &Log, busy_polls: Option<u32>, fail_over: Option<usize>) -> EpdDevice<MockInterface> {
        EpdDevice::new(
            interface(log, busy_polls, fail_over),
            PanelGeometry::default(),
        )
    }

    #[test]
    fn test_initialize_then_draw_every_mode() {
        for mode in RefreshMode::ALL {
            let log = Log::default();
            let mut dev = device(&log, Some(2), None);
            dev.initialize(mode).unwrap();
            assert_eq!(dev.state(), PanelState::Idle);
            assert_eq!(dev.mode(), mode);

            dev.draw(&Framebuffer::filled(122, 250, Color::White)).unwrap();
            assert_eq!(dev.state(), PanelState::Idle);

            let tx = transactions(&log);
            let lut = tx.iter().find(|(cmd, _)| *cmd == 0x32).unwrap();
            assert_eq!(lut.1.as_slice(), mode.lut());

            let ram = tx.iter().find(|(cmd, _)| *cmd == 0x24).unwrap();
            assert_eq!(ram.1.len(), 4000);
            assert!(ram.1.iter().all(|&b| b == 0xFF));

            let tail: Vec<u8> = tx.iter().rev().take(3).map(|(cmd, _)| *cmd).collect();
            assert_eq!(tail, vec![0xFF, 0x20, 0x22]);
        }
    }

    #[test]
    fn test_initialize_timeout_surfaces() {
        let log = Log::default();
        let mut dev = device(&log, None, None);
        assert!(matches!(
            dev.initialize(RefreshMode::FullUpdate),
            Err(Error::HardwareTimeout { .. })
        ));
        // Busy never sticks.
        assert_eq!(dev.state(), PanelState::Idle);
    }

    #[test]
    fn test_timed_out_initialize_keeps_requested_mode() {
        let log = Log::default();
        let mut dev = device(&log, None, None);
        assert!(dev.initialize(RefreshMode::PartialUpdate).is_err());
        assert_eq!(dev.mode(), RefreshMode::PartialUpdate);
        assert_eq!(dev.state(), PanelState::Idle);

        // Already in the loaded mode, so no reinitialization is sent.
        let before = transactions(&log).len();
        dev.set_mode(RefreshMode::PartialUpdate).unwrap();
        assert_eq!(transactions(&log).len(), before);
    }

    #[test]
    fn test_teardown_with_stuck_line_still_powers_off() {
        let log = Log::default();
        let mut dev = EpdDevice::new(
            interface_with_stuck_pin(&log, "cs"),
            PanelGeometry::default(),
        );
        assert!(matches!(dev.teardown(), Err(Error::Pin(_))));
        assert_eq!(dev.state(), PanelState::Released);
        assert_eq!(
            log.lock().unwrap().last().cloned(),
            Some(BusEvent::Level("pwr", false))
        );
    }

    #[test]
    fn test_draw_requires_initialization() {
        let log = Log::default();
        let mut dev = device(&log, Some(0), None);
        assert!(matches!(
            dev.draw(&Framebuffer::new(122, 250)),
            Err(Error::InvalidState { .. })
        ));
    }

    #[test]
    fn test_draw_rejects_wrong_size() {
        let log = Log::default();
        let mut dev = device(&log, Some(0), None);
        dev.initialize(RefreshMode::FullUpdate).unwrap();
        assert!(matches!(
            dev.draw(&Framebuffer::new(250, 122)),
            Err(Error::FramebufferSize { .. })
        ));
    }

    #[test]
    fn test_draw_transmission_error_returns_to_idle() {
        let log = Log::default();
        let mut dev = device(&log, Some(0), Some(64));
        dev.initialize(RefreshMode::FullUpdate).unwrap();
        assert!(matches!(
            dev.draw(&Framebuffer::new(122, 250)),
            Err(Error::Transmission(_))
        ));
        assert_eq!(dev.state(), PanelState::Idle);
    }

    #[test]
    fn test_sleep_and_wake() {
        let log = Log::default();
        let mut dev = device(&log, Some(0), None);
        dev.initialize(RefreshMode::PartialUpdate).unwrap();
        dev.sleep().unwrap();
        assert_eq!(dev.state(), PanelState::Sleeping);
        assert_eq!(transactions(&log).last().unwrap(), &(0x10, vec![0x01]));

        assert!(dev.draw(&Framebuffer::new(122, 250)).is_err());

        dev.wake().unwrap();
        assert_eq!(dev.state(), PanelState::Idle);
        assert_eq!(dev.mode(), RefreshMode::PartialUpdate);
    }

    #[test]
    fn test_set_mode_reinitializes_only_on_change() {
        let log = Log::default();
        let mut dev = device(&log, Some(0), None);
        dev.initialize(RefreshMode::FullUpdate).unwrap();
        let before = transactions(&log).len();

        dev.set_mode(RefreshMode::FullUpdate).unwrap();
        assert_eq!(transactions(&log).len(), before);

        dev.set_mode(RefreshMode::PartialUpdate).unwrap();
        assert!(transactions(&log).len() > before);
        assert_eq!(dev.mode(), RefreshMode::PartialUpdate);
    }

    #[test]
    fn test_drop_releases_lines() {
        let log = Log::default();
        {
            let mut dev = device(&log, Some(0), None);
            dev.initialize(RefreshMode::FullUpdate).unwrap();
        }
        let last = log.lock().unwrap().last().cloned();
        assert_eq!(last, Some(BusEvent::Level("pwr", false)));
    }

    #[test]
    fn test_teardown_is_final() {
        let log = Log::default();
        let mut dev = device(&log, Some(0), None);
        dev.teardown().unwrap();
        assert_eq!(dev.state(), PanelState::Released);
        assert!(dev.initialize(RefreshMode::FullUpdate).is_err());
        assert!(dev.teardown().is_ok());
    }
}
