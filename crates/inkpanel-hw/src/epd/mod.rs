//! E-paper panel module.
//!
//! Drives a 122x250 monochrome panel over SPI with D/C, RST, CS, BUSY and
//! power lines.

mod device;
mod interface;
mod protocol;

pub mod framebuffer;

pub use device::{BusyOp, EpdDevice, PanelState};
pub use framebuffer::{Color, Framebuffer};
pub use interface::{DisplayInterface, Interface, BUSY_POLL_MS, RESET_DELAY_MS};
pub use protocol::{Command, Instruction, RefreshMode};
