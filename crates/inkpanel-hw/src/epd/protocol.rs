//! Panel command set and instruction sequences.
//!
//! Command framing: the command byte is clocked with D/C low, its parameter
//! bytes follow with D/C high. Pixel data is one long parameter of
//! `WriteRam`.

use crate::{Error, Result};
use std::str::FromStr;

/// Waveform table length in bytes.
pub const LUT_SIZE: usize = 30;

/// Waveform for a full refresh (flashing, no ghosting).
pub const LUT_FULL_UPDATE: [u8; LUT_SIZE] = [
    0x22, 0x55, 0xAA, 0x55, 0xAA, 0x55, 0xAA, 0x11, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x1E, 0x1E, 0x1E, 0x1E, 0x1E, 0x1E, 0x1E, 0x1E, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00,
];

/// Waveform for a partial refresh (fast, may ghost).
pub const LUT_PARTIAL_UPDATE: [u8; LUT_SIZE] = [
    0x18, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x0F, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

/// Panel controller commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Command {
    DriverOutputControl = 0x01,
    BoosterSoftStart = 0x0C,
    DeepSleepMode = 0x10,
    DataEntryMode = 0x11,
    MasterActivation = 0x20,
    DisplayUpdateControl2 = 0x22,
    WriteRam = 0x24,
    WriteVcom = 0x2C,
    WriteLut = 0x32,
    SetDummyLinePeriod = 0x3A,
    SetGateTime = 0x3B,
    SetRamXRange = 0x44,
    SetRamYRange = 0x45,
    SetRamXCounter = 0x4E,
    SetRamYCounter = 0x4F,
    Terminate = 0xFF,
}

/// Refresh mode, selecting the waveform loaded at initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshMode {
    #[default]
    FullUpdate,
    PartialUpdate,
}

impl RefreshMode {
    /// All supported modes.
    pub const ALL: [RefreshMode; 2] = [RefreshMode::FullUpdate, RefreshMode::PartialUpdate];

    /// Waveform table for this mode.
    pub fn lut(&self) -> &'static [u8; LUT_SIZE] {
        match self {
            RefreshMode::FullUpdate => &LUT_FULL_UPDATE,
            RefreshMode::PartialUpdate => &LUT_PARTIAL_UPDATE,
        }
    }
}

impl FromStr for RefreshMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "full" | "full-update" | "full_update" => Ok(RefreshMode::FullUpdate),
            "partial" | "partial-update" | "partial_update" => Ok(RefreshMode::PartialUpdate),
            _ => Err(Error::InvalidRefreshMode(s.to_string())),
        }
    }
}

impl std::fmt::Display for RefreshMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RefreshMode::FullUpdate => write!(f, "full"),
            RefreshMode::PartialUpdate => write!(f, "partial"),
        }
    }
}

/// A command byte with its parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub command: Command,
    pub data: Vec<u8>,
}

impl Instruction {
    fn new(command: Command, data: &[u8]) -> Self {
        Self {
            command,
            data: data.to_vec(),
        }
    }
}

/// Builds the controller setup sequence for the given panel height and mode.
pub fn build_init_sequence(height: u16, mode: RefreshMode) -> Vec<Instruction> {
    let last_gate = height - 1;
    let mut lut = Vec::with_capacity(LUT_SIZE);
    lut.extend_from_slice(mode.lut());

    vec![
        Instruction::new(
            Command::DriverOutputControl,
            &[(last_gate & 0xFF) as u8, (last_gate >> 8) as u8, 0x00],
        ),
        Instruction::new(Command::BoosterSoftStart, &[0xD7, 0xD6, 0x9D]),
        Instruction::new(Command::WriteVcom, &[0xA8]),
        Instruction::new(Command::SetDummyLinePeriod, &[0x1A]),
        Instruction::new(Command::SetGateTime, &[0x08]),
        // X increment, Y increment
        Instruction::new(Command::DataEntryMode, &[0x03]),
        Instruction {
            command: Command::WriteLut,
            data: lut,
        },
    ]
}

/// Builds the RAM window covering the whole panel.
pub fn build_memory_area(width: u16, height: u16) -> [Instruction; 2] {
    let x_end = ((width - 1) >> 3) as u8;
    let y_end = height - 1;
    [
        Instruction::new(Command::SetRamXRange, &[0x00, x_end]),
        Instruction::new(
            Command::SetRamYRange,
            &[0x00, 0x00, (y_end & 0xFF) as u8, (y_end >> 8) as u8],
        ),
    ]
}

/// Builds the RAM address counter reset to the window origin.
pub fn build_memory_pointer() -> [Instruction; 2] {
    [
        Instruction::new(Command::SetRamXCounter, &[0x00]),
        Instruction::new(Command::SetRamYCounter, &[0x00, 0x00]),
    ]
}

/// Builds the refresh trigger issued after RAM has been written.
pub fn build_display_frame() -> [Instruction; 3] {
    [
        Instruction::new(Command::DisplayUpdateControl2, &[0xC4]),
        Instruction::new(Command::MasterActivation, &[]),
        Instruction::new(Command::Terminate, &[]),
    ]
}

/// Builds the deep sleep entry command.
pub fn build_deep_sleep() -> Instruction {
    Instruction::new(Command::DeepSleepMode, &[0x01])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_sequence() {
        let seq = build_init_sequence(250, RefreshMode::FullUpdate);
        assert_eq!(seq[0].command, Command::DriverOutputControl);
        assert_eq!(seq[0].data, vec![0xF9, 0x00, 0x00]);
        assert_eq!(seq.last().unwrap().command, Command::WriteLut);
        assert_eq!(seq.last().unwrap().data.as_slice(), &LUT_FULL_UPDATE);

        let seq = build_init_sequence(250, RefreshMode::PartialUpdate);
        assert_eq!(seq.last().unwrap().data.as_slice(), &LUT_PARTIAL_UPDATE);
    }

    #[test]
    fn test_memory_area() {
        let [x, y] = build_memory_area(122, 250);
        assert_eq!(x.command as u8, 0x44);
        assert_eq!(x.data, vec![0x00, 0x0F]);
        assert_eq!(y.command as u8, 0x45);
        assert_eq!(y.data, vec![0x00, 0x00, 0xF9, 0x00]);
    }

    #[test]
    fn test_refresh_mode_from_str() {
        assert_eq!(
            "full".parse::<RefreshMode>().unwrap(),
            RefreshMode::FullUpdate
        );
        assert_eq!(
            "Partial".parse::<RefreshMode>().unwrap(),
            RefreshMode::PartialUpdate
        );
        assert!("fast".parse::<RefreshMode>().is_err());
    }
}
